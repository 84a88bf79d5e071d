use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use cloudsign_core::time::{now, DateTime};
use cloudsign_core::utils::PATH_ENCODE_SET;
use cloudsign_core::{
    BlobCapabilities, BlobOperation, BlobRequest, Context, Error, Result, SignBlobRequest,
    SignedRequest, SigningRequest, SigningStyle,
};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, Method, Uri};
use log::debug;
use percent_encoding::utf8_percent_encode;
use serde_json::json;

use crate::api::{call, DownloadAuthorizationResponse, ListBucketsResponse, UploadUrlResponse};
use crate::constants::*;
use crate::Session;

/// BlobRequestSigner builds B2 downloads and uploads.
///
/// - Time-boxed GET asks `b2_get_download_authorization` for a token scoped
///   to the file, valid until the requested expiry.
/// - PUT mints a fresh upload url and becomes a `POST` to it.
/// - DELETE and time-boxed PUT can't be signed.
#[derive(Debug, Default)]
pub struct BlobRequestSigner {
    buckets: Mutex<HashMap<String, String>>,
}

impl BlobRequestSigner {
    /// Create a new signer.
    pub fn new() -> Self {
        Self::default()
    }

    async fn bucket_id(&self, ctx: &Context, session: &Session, name: &str) -> Result<String> {
        if let Some(id) = self.buckets.lock().expect("lock poisoned").get(name) {
            return Ok(id.clone());
        }

        let resp: ListBucketsResponse = call(
            ctx,
            session,
            B2_LIST_BUCKETS,
            json!({ "accountId": session.account_id, "bucketName": name }),
        )
        .await?;
        let bucket = resp
            .buckets
            .into_iter()
            .find(|b| b.bucket_name == name)
            .ok_or_else(|| {
                Error::not_found(format!("bucket {name} not found")).with_context("container", name)
            })?;

        debug!("resolved b2 bucket {name} to {}", bucket.bucket_id);
        self.buckets
            .lock()
            .expect("lock poisoned")
            .insert(name.to_string(), bucket.bucket_id.clone());
        Ok(bucket.bucket_id)
    }

    async fn sign_download(
        &self,
        ctx: &Context,
        session: &Session,
        req: BlobRequest,
    ) -> Result<SignedRequest> {
        let path = format!(
            "/file/{}/{}",
            utf8_percent_encode(&req.container, PATH_ENCODE_SET),
            utf8_percent_encode(&req.name, PATH_ENCODE_SET)
        );
        let mut signing = SigningRequest::from_endpoint(Method::GET, &session.download_url, &path)?;
        signing.headers = req.headers;

        let token = match req.expires_at {
            Some(expires_at) => {
                let bucket_id = self.bucket_id(ctx, session, &req.container).await?;
                let resp: DownloadAuthorizationResponse = call(
                    ctx,
                    session,
                    B2_GET_DOWNLOAD_AUTHORIZATION,
                    json!({
                        "bucketId": bucket_id,
                        "fileNamePrefix": req.name,
                        "validDurationInSeconds": valid_duration(expires_at),
                    }),
                )
                .await?;
                resp.authorization_token
            }
            None => session.authorization_token.clone(),
        };

        signing.header_insert(AUTHORIZATION, &token, true)?;
        signing.into_signed_request(req.expires_at)
    }

    async fn sign_upload(
        &self,
        ctx: &Context,
        session: &Session,
        req: BlobRequest,
    ) -> Result<SignedRequest> {
        let bucket_id = self.bucket_id(ctx, session, &req.container).await?;
        let resp: UploadUrlResponse = call(
            ctx,
            session,
            B2_GET_UPLOAD_URL,
            json!({ "bucketId": bucket_id }),
        )
        .await?;

        let upload_url: Uri = resp.upload_url.parse()?;
        let mut signing = SigningRequest::from_endpoint(Method::POST, &upload_url, "/")?;
        signing.path = upload_url.path().to_string();
        signing.headers = req.headers;

        signing.header_insert(AUTHORIZATION, &resp.authorization_token, true)?;
        signing.header_insert(
            X_BZ_FILE_NAME,
            &utf8_percent_encode(&req.name, PATH_ENCODE_SET).to_string(),
            false,
        )?;
        if !signing.headers.contains_key(CONTENT_TYPE) {
            signing.header_insert(CONTENT_TYPE, AUTO_CONTENT_TYPE, false)?;
        }
        if !signing.headers.contains_key(X_BZ_CONTENT_SHA1) {
            signing.header_insert(X_BZ_CONTENT_SHA1, DO_NOT_VERIFY, false)?;
        }
        if let Some(metadata) = &req.metadata {
            for (k, v) in &metadata.user_metadata {
                let name = HeaderName::from_bytes(
                    format!("{X_BZ_INFO_PREFIX}{}", k.to_lowercase()).as_bytes(),
                )?;
                let value = utf8_percent_encode(v, PATH_ENCODE_SET).to_string();
                signing.headers.insert(name, HeaderValue::from_str(&value)?);
            }
        }

        signing.into_signed_request(None)
    }
}

#[async_trait]
impl SignBlobRequest for BlobRequestSigner {
    type Credential = Session;

    fn style(&self) -> SigningStyle {
        SigningStyle::Header
    }

    fn capabilities(&self) -> BlobCapabilities {
        BlobCapabilities {
            timeboxed_put: false,
            remove: false,
            expiring_remove: false,
        }
    }

    async fn sign_blob_request(
        &self,
        ctx: &Context,
        credential: &Self::Credential,
        req: BlobRequest,
    ) -> Result<SignedRequest> {
        match (req.operation, req.expires_at) {
            (BlobOperation::Get, _) => self.sign_download(ctx, credential, req).await,
            (BlobOperation::Put, None) => self.sign_upload(ctx, credential, req).await,
            (BlobOperation::Put, Some(_)) => Err(Error::unsupported(
                "b2 upload urls can't be time-boxed",
            )),
            (BlobOperation::Remove, _) => Err(Error::unsupported(
                "b2 deletes need the file version id, use b2_delete_file_version",
            )),
        }
    }
}

/// Seconds from now until `expires_at`, within what B2 accepts.
fn valid_duration(expires_at: DateTime) -> i64 {
    let max = MAX_DOWNLOAD_AUTHORIZATION.as_secs() as i64;
    (expires_at.timestamp() - now().timestamp()).clamp(1, max)
}
