use async_trait::async_trait;
use bytes::Bytes;
use cloudsign_core::hash::base64_encode;
use cloudsign_core::time::{add_duration, now};
use cloudsign_core::{Context, ProvideCredential, Result};
use http::header::AUTHORIZATION;
use http::{HeaderValue, Method};
use log::debug;

use crate::api::{parse, AuthorizeAccountResponse};
use crate::constants::*;
use crate::{Config, Session};

/// AuthorizeAccountProvider exchanges an application key for a 24 hour
/// account session through `b2_authorize_account`.
#[derive(Debug, Clone)]
pub struct AuthorizeAccountProvider {
    config: Config,
}

impl AuthorizeAccountProvider {
    /// Create a provider for `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ProvideCredential for AuthorizeAccountProvider {
    type Credential = Session;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let (id, key) = self.config.application_key()?;
        let url = self.config.authorize_url();

        let mut basic = HeaderValue::from_str(&format!(
            "Basic {}",
            base64_encode(format!("{id}:{key}").as_bytes())
        ))?;
        basic.set_sensitive(true);

        debug!("authorizing b2 account with key {id}");
        let issued_at = now();
        let req = http::Request::builder()
            .method(Method::GET)
            .uri(&url)
            .header(AUTHORIZATION, basic)
            .body(Bytes::new())?;
        let resp = ctx.http_send(req).await?;

        let resp: AuthorizeAccountResponse =
            parse(B2_AUTHORIZE_ACCOUNT, resp).map_err(|err| err.with_context("url", url))?;

        Ok(Some(Session {
            account_id: resp.account_id,
            authorization_token: resp.authorization_token,
            api_url: resp.api_url.parse()?,
            download_url: resp.download_url.parse()?,
            expires_at: Some(add_duration(issued_at, SESSION_LIFETIME)?),
        }))
    }
}
