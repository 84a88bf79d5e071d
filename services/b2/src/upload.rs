use async_trait::async_trait;
use cloudsign_core::{
    Context, MintUploadTarget, Result, SessionCache, UploadKind, UploadTarget,
};
use http::request::Parts;
use serde_json::json;

use crate::api::{call, UploadUrlResponse};
use crate::constants::*;
use crate::Session;

/// B2UploadTargets mints `b2_upload_file` and `b2_upload_part` targets.
///
/// Use it with [`cloudsign_core::UploadRetryFilter`] to move a failed upload
/// to a fresh pod.
#[derive(Debug, Clone)]
pub struct B2UploadTargets {
    sessions: SessionCache<Session>,
}

impl B2UploadTargets {
    /// Create a minter authenticating through `sessions`.
    pub fn new(sessions: SessionCache<Session>) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl MintUploadTarget for B2UploadTargets {
    fn classify(&self, req: &Parts) -> Option<UploadKind> {
        let mut segments = req.uri.path().split('/');
        while let Some(segment) = segments.next() {
            let kind: fn(String) -> UploadKind = match segment {
                B2_UPLOAD_FILE => UploadKind::File,
                B2_UPLOAD_PART => UploadKind::Part,
                _ => continue,
            };
            return segments
                .next()
                .filter(|id| !id.is_empty())
                .map(|id| kind(id.to_string()));
        }
        None
    }

    async fn mint(&self, ctx: &Context, kind: &UploadKind) -> Result<UploadTarget> {
        let session = self.sessions.get(ctx).await?;
        let resp: UploadUrlResponse = match kind {
            UploadKind::File(bucket_id) => {
                call(ctx, &session, B2_GET_UPLOAD_URL, json!({ "bucketId": bucket_id })).await?
            }
            UploadKind::Part(file_id) => {
                call(
                    ctx,
                    &session,
                    B2_GET_UPLOAD_PART_URL,
                    json!({ "fileId": file_id }),
                )
                .await?
            }
        };

        Ok(UploadTarget {
            url: resp.upload_url.parse()?,
            authorization_token: resp.authorization_token,
        })
    }

    fn invalidate(&self) {
        self.sessions.invalidate()
    }
}
