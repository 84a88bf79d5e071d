use async_trait::async_trait;
use cloudsign_core::utils::PATH_ENCODE_SET;
use cloudsign_core::{
    BlobCapabilities, BlobRequest, Context, Result, SessionCache, SignBlobRequest, SignedRequest,
    SigningRequest, SigningStyle,
};
use http::HeaderValue;
use percent_encoding::utf8_percent_encode;

use crate::sign_request::{sign_temp_url, sign_token};
use crate::{Config, Session, TempUrlKey, TempUrlKeyProvider};

/// BlobRequestSigner builds Swift object requests.
///
/// The object url is `<storage url>/<container>/<name>`, where the storage
/// url comes from the session catalog for the configured region.
#[derive(Debug, Clone)]
pub struct BlobRequestSigner {
    config: Config,
    keys: SessionCache<TempUrlKey>,
}

impl BlobRequestSigner {
    /// Create a signer sharing keystone sessions with `sessions`.
    pub fn new(config: Config, sessions: SessionCache<Session>) -> Self {
        let keys = SessionCache::new(TempUrlKeyProvider::new(config.clone(), sessions));
        Self { config, keys }
    }

    /// Temporary URL key cache of this signer.
    pub fn temp_url_keys(&self) -> &SessionCache<TempUrlKey> {
        &self.keys
    }
}

#[async_trait]
impl SignBlobRequest for BlobRequestSigner {
    type Credential = Session;

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
        ctx: &Context,
        credential: &Self::Credential,
        req: BlobRequest,
    ) -> Result<SignedRequest> {
        let account = credential.storage_url(self.config.region.as_deref(), self.config.api_version())?;
        let path = format!(
            "/{}/{}",
            utf8_percent_encode(&req.container, PATH_ENCODE_SET),
            utf8_percent_encode(&req.name, PATH_ENCODE_SET)
        );
        let mut signing = SigningRequest::from_endpoint(req.method(), &account, &path)?;
        signing.headers = req.headers;

        if let Some(metadata) = &req.metadata {
            for (k, v) in &metadata.user_metadata {
                let name = http::header::HeaderName::from_bytes(
                    format!("x-object-meta-{}", k.to_lowercase()).as_bytes(),
                )?;
                signing.headers.insert(name, HeaderValue::from_str(v)?);
            }
        }

        match req.expires_at {
            Some(expires_at) => {
                let key = self.keys.get(ctx).await?;
                sign_temp_url(&mut signing, &key, expires_at)?;
            }
            None => sign_token(&mut signing, credential)?,
        }

        signing.into_signed_request(req.expires_at)
    }
}
