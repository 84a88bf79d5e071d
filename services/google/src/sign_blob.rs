use async_trait::async_trait;
use cloudsign_core::time::{now, DateTime};
use cloudsign_core::{
    BlobCapabilities, BlobOperation, BlobRequest, Context, Result, SignBlobRequest,
    SignedRequest, SigningRequest, SigningStyle,
};
use http::header::HeaderName;
use http::{HeaderValue, Uri};
use percent_encoding::utf8_percent_encode;

use crate::constants::*;
use crate::credential::Credential;
use crate::sign_request::{sign_bearer, sign_v2_url};
use crate::Config;

/// BlobRequestSigner signs blob operations as V2 signed URLs.
///
/// Every operation is time-boxed, including DELETE. Non-expiring GETs fall
/// back to the bearer token.
#[derive(Debug, Clone)]
pub struct BlobRequestSigner {
    endpoint: Uri,
    time: Option<DateTime>,
}

impl BlobRequestSigner {
    /// Create a signer for the storage service at `endpoint`.
    pub fn new(endpoint: Uri) -> Self {
        Self {
            endpoint,
            time: None,
        }
    }

    /// Create a signer from config.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.endpoint()?))
    }

    /// Specify the signing time.
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
            timeboxed_put: true,
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
        let path = format!(
            "/{}/{}",
            utf8_percent_encode(&req.container, &GOOG_URI_ENCODE_SET),
            utf8_percent_encode(&req.name, &GOOG_URI_ENCODE_SET)
        );
        let mut ctx = SigningRequest::from_endpoint(req.method(), &self.endpoint, &path)?;
        ctx.headers = req.headers;

        if req.operation == BlobOperation::Put {
            if let Some(metadata) = &req.metadata {
                for (k, v) in &metadata.user_metadata {
                    let name = HeaderName::try_from(format!(
                        "{X_GOOG_META_PREFIX}{}",
                        k.to_lowercase()
                    ))?;
                    ctx.headers.insert(name, HeaderValue::from_str(v)?);
                }
            }
        }

        match req.expires_at {
            Some(expires_at) => sign_v2_url(
                &mut ctx,
                &credential.service_account,
                self.time.unwrap_or_else(now),
                expires_at,
            )?,
            None => sign_bearer(&mut ctx, &credential.token)?,
        }

        ctx.into_signed_request(req.expires_at)
    }
}
