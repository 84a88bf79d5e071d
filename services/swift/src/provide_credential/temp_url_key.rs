use async_trait::async_trait;
use bytes::Bytes;
use cloudsign_core::{Context, Error, ProvideCredential, Result, SessionCache};
use http::{HeaderValue, Method, StatusCode};
use log::debug;

use crate::constants::*;
use crate::{Config, Session, TempUrlKey};

/// TempUrlKeyProvider returns the configured temporary URL key, or reads
/// `X-Account-Meta-Temp-URL-Key` from the account with a `HEAD`.
#[derive(Debug, Clone)]
pub struct TempUrlKeyProvider {
    config: Config,
    sessions: SessionCache<Session>,
}

impl TempUrlKeyProvider {
    /// Create a provider authenticating through `sessions`.
    pub fn new(config: Config, sessions: SessionCache<Session>) -> Self {
        Self { config, sessions }
    }
}

#[async_trait]
impl ProvideCredential for TempUrlKeyProvider {
    type Credential = TempUrlKey;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        if let Some(key) = &self.config.temp_url_key {
            return Ok(Some(TempUrlKey(key.clone())));
        }

        let session = self.sessions.get(ctx).await?;
        let account = session.storage_url(self.config.region.as_deref(), self.config.api_version())?;

        debug!("fetching temp url key from account {account}");
        let mut token = HeaderValue::from_str(&session.token)?;
        token.set_sensitive(true);
        let req = http::Request::builder()
            .method(Method::HEAD)
            .uri(account.clone())
            .header(X_AUTH_TOKEN, token)
            .body(Bytes::new())?;
        let resp = ctx.http_send(req).await?;

        if resp.status() == StatusCode::UNAUTHORIZED {
            self.sessions.invalidate();
            return Err(Error::credential_expired("swift rejected the session token")
                .with_context("url", account.to_string()));
        }
        if !resp.status().is_success() {
            return Err(Error::unexpected("failed to read swift account metadata")
                .with_context("status", resp.status().as_str())
                .with_context("url", account.to_string()));
        }

        match resp.headers().get(X_ACCOUNT_META_TEMP_URL_KEY) {
            Some(v) => Ok(Some(TempUrlKey(v.to_str()?.to_string()))),
            None => Err(Error::config_invalid(
                "swift account has no temp url key, set X-Account-Meta-Temp-URL-Key",
            )
            .with_context("url", account.to_string())),
        }
    }
}
