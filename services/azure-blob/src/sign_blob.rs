use async_trait::async_trait;
use cloudsign_core::time::{now, DateTime};
use cloudsign_core::utils::PATH_ENCODE_SET;
use cloudsign_core::{
    BlobOperation, BlobRequest, Context, Error, Result, SignBlobRequest, SignedRequest,
    SigningRequest, SigningStyle,
};
use http::{HeaderValue, Uri};
use percent_encoding::utf8_percent_encode;

use crate::constants::*;
use crate::sign_request::{encode_query, meta_header, sign_service_sas, sign_shared_key};
use crate::{Config, Credential};

/// BlobRequestSigner signs blob operations against one storage account.
///
/// Non-expiring requests carry a Shared Key `Authorization` header,
/// time-boxed ones a service SAS.
#[derive(Debug, Clone)]
pub struct BlobRequestSigner {
    endpoint: Uri,
    time: Option<DateTime>,
}

impl BlobRequestSigner {
    /// Create a signer for the blob service at `endpoint`.
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
        SigningStyle::Header
    }

    async fn sign_blob_request(
        &self,
        _: &Context,
        credential: &Self::Credential,
        req: BlobRequest,
    ) -> Result<SignedRequest> {
        let path = format!(
            "/{}/{}",
            utf8_percent_encode(&req.container, PATH_ENCODE_SET),
            utf8_percent_encode(&req.name, PATH_ENCODE_SET)
        );
        let mut ctx = SigningRequest::from_endpoint(req.method(), &self.endpoint, &path)?;
        ctx.headers = req.headers;

        if req.operation == BlobOperation::Put {
            ctx.headers
                .insert(X_MS_BLOB_TYPE, HeaderValue::from_static("BlockBlob"));
            if let Some(metadata) = &req.metadata {
                for (k, v) in &metadata.user_metadata {
                    ctx.headers.insert(meta_header(k)?, HeaderValue::from_str(v)?);
                }
            }
        }

        match (credential, req.expires_at) {
            (
                Credential::SharedKey {
                    account_name,
                    account_key,
                },
                Some(expires_at),
            ) => sign_service_sas(&mut ctx, account_name, account_key, expires_at)?,
            (
                Credential::SharedKey {
                    account_name,
                    account_key,
                },
                None,
            ) => sign_shared_key(
                &mut ctx,
                account_name,
                account_key,
                self.time.unwrap_or_else(now),
            )?,
            (Credential::SasToken { .. }, Some(_)) => {
                return Err(Error::unsupported(
                    "SAS token credentials carry their own expiry and can't sign time-boxed requests",
                ))
            }
            (Credential::SasToken { token }, None) => ctx.query_append(token),
        }

        encode_query(&mut ctx);
        ctx.into_signed_request(req.expires_at)
    }
}
