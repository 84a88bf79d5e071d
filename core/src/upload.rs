//! Upload target rotation.
//!
//! Some providers hand out a dedicated upload URL plus token per upload.
//! When the storage node behind it fails, resending to the same URL is
//! pointless: a fresh target has to be minted first. [`UploadRetryFilter`]
//! recognizes those failures and rewrites the request in place, leaving
//! generic retry and backoff to the caller's HTTP stack.

use std::fmt::{self, Debug};

use http::header::AUTHORIZATION;
use http::request::Parts;
use http::{HeaderValue, StatusCode, Uri};

use crate::utils::Redact;
use crate::{Context, Error, Result};

/// Error code returned with 401 when an upload token ran out.
pub const EXPIRED_AUTH_TOKEN: &str = "expired_auth_token";

/// A minted upload endpoint and the token authorizing it.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadTarget {
    /// Full upload URL.
    pub url: Uri,
    /// Token sent as `Authorization`.
    pub authorization_token: String,
}

impl Debug for UploadTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTarget")
            .field("url", &self.url)
            .field("authorization_token", &Redact::from(&self.authorization_token))
            .finish()
    }
}

/// Shape of an upload request, carrying the id its target is minted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadKind {
    /// Single shot upload into the container with this id.
    File(String),
    /// Part upload of the large file with this id.
    Part(String),
}

/// MintUploadTarget is implemented by providers with per-upload targets.
#[async_trait::async_trait]
pub trait MintUploadTarget: Debug + Send + Sync + 'static {
    /// Recognize an upload request by its path, `None` for anything else.
    fn classify(&self, req: &Parts) -> Option<UploadKind>;

    /// Mint a fresh target for `kind`.
    async fn mint(&self, ctx: &Context, kind: &UploadKind) -> Result<UploadTarget>;

    /// Drop the cached account session.
    fn invalidate(&self) {}
}

/// What the caller should do after a failed upload attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The request was rewritten to a fresh target, send it again.
    Retry,
    /// Not an upload target failure, hand it to the regular error path.
    Propagate,
}

/// Re-mints upload targets when the current one stops working.
#[derive(Debug)]
pub struct UploadRetryFilter<M> {
    minter: M,
    max_attempts: u32,
}

impl<M: MintUploadTarget> UploadRetryFilter<M> {
    /// Attempts allowed before giving up, including the first one.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Create a filter around `minter`.
    pub fn new(minter: M) -> Self {
        Self {
            minter,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Set the attempt bound.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// The wrapped minter.
    pub fn minter(&self) -> &M {
        &self.minter
    }

    /// Inspect a failed attempt.
    ///
    /// `attempt` counts from 1 for the first send. `error_code` is the
    /// provider's error code from the response body, when there is one.
    pub async fn on_failure(
        &self,
        ctx: &Context,
        req: &mut Parts,
        status: StatusCode,
        error_code: Option<&str>,
        attempt: u32,
    ) -> Result<RetryDecision> {
        let Some(kind) = self.minter.classify(req) else {
            return Ok(RetryDecision::Propagate);
        };

        let expired_token =
            status == StatusCode::UNAUTHORIZED && error_code == Some(EXPIRED_AUTH_TOKEN);
        let node_failure = status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
        if !expired_token && !node_failure {
            return Ok(RetryDecision::Propagate);
        }

        if attempt >= self.max_attempts {
            return Err(Error::upload_target_expired(format!(
                "upload target still failing after {attempt} attempts"
            ))
            .with_context("method", req.method.as_str())
            .with_context("status", status.as_str())
            .with_context("resource", req.uri.path()));
        }

        if expired_token {
            log::debug!("upload token expired, invalidating session");
            self.minter.invalidate();
        }

        let target = self.minter.mint(ctx, &kind).await?;
        log::debug!(
            "retrying {kind:?} upload on fresh target {} after {status}",
            target.url
        );

        let mut token = HeaderValue::from_str(&target.authorization_token)?;
        token.set_sensitive(true);
        req.headers.insert(AUTHORIZATION, token);
        req.uri = target.url;

        Ok(RetryDecision::Retry)
    }
}
