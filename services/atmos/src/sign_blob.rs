use async_trait::async_trait;
use cloudsign_core::canonical::{blob_path, PathLayout};
use cloudsign_core::signature::{SecretEncoding, SignatureAlgorithm};
use cloudsign_core::time::{now, DateTime};
use cloudsign_core::utils::PATH_ENCODE_SET;
use cloudsign_core::{
    BlobCapabilities, BlobOperation, BlobRequest, Context, Error, Result, SignBlobRequest,
    SignedRequest, SigningRequest, SigningStyle,
};
use http::{HeaderValue, Uri};
use percent_encoding::utf8_percent_encode;

use crate::constants::*;
use crate::sign_request::{sign_header, sign_query};
use crate::{Config, Credential};

/// BlobRequestSigner builds Atmos shareable urls for namespace objects.
///
/// GET and DELETE are signed in the query string. PUT can't be time-boxed
/// and is signed with `x-emc-*` headers instead.
#[derive(Debug, Clone)]
pub struct BlobRequestSigner {
    endpoint: Uri,
    algorithm: SignatureAlgorithm,
    secret_encoding: SecretEncoding,
    time: Option<DateTime>,
}

impl BlobRequestSigner {
    /// Create a signer for the Atmos service at `endpoint`.
    pub fn new(endpoint: Uri) -> Self {
        Self {
            endpoint,
            algorithm: SignatureAlgorithm::HmacSha256Base64,
            secret_encoding: SecretEncoding::Raw,
            time: None,
        }
    }

    /// Create a signer from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.endpoint()?)
            .with_algorithm(config.algorithm)
            .with_secret_encoding(config.secret_encoding))
    }

    /// Set the url signing algorithm.
    pub fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set how the secret is decoded for url signing.
    pub fn with_secret_encoding(mut self, encoding: SecretEncoding) -> Self {
        self.secret_encoding = encoding;
        self
    }

    /// Specify the signing time of header signatures.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignBlobRequest for BlobRequestSigner {
    type Credential = Credential;

    fn style(&self) -> SigningStyle {
        SigningStyle::Query
    }

    fn capabilities(&self) -> BlobCapabilities {
        BlobCapabilities {
            timeboxed_put: false,
            remove: true,
            expiring_remove: true,
        }
    }

    async fn sign_blob_request(
        &self,
        _: &Context,
        credential: &Self::Credential,
        req: BlobRequest,
    ) -> Result<SignedRequest> {
        let path = blob_path(
            &PathLayout::Prefixed(NAMESPACE_PREFIX.to_string()),
            &req.container,
            Some(&req.name),
        )?;
        let path = utf8_percent_encode(&path, PATH_ENCODE_SET).to_string();
        let mut ctx = SigningRequest::from_endpoint(req.method(), &self.endpoint, &path)?;
        ctx.headers = req.headers;

        if let Some(metadata) = req.metadata.as_ref().filter(|m| !m.user_metadata.is_empty()) {
            let meta = metadata
                .user_metadata
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ");
            ctx.headers.insert(X_EMC_META, HeaderValue::from_str(&meta)?);
        }

        match req.expires_at {
            Some(expires_at) => {
                if req.operation == BlobOperation::Put {
                    return Err(Error::unsupported(
                        "atmos shareable urls can't authorize uploads",
                    ));
                }
                sign_query(
                    &mut ctx,
                    credential,
                    expires_at,
                    self.algorithm,
                    self.secret_encoding,
                )?
            }
            None => sign_header(&mut ctx, credential, self.time.unwrap_or_else(now))?,
        }

        ctx.into_signed_request(req.expires_at)
    }
}
