use std::fmt::{Debug, Formatter};

use cloudsign_core::utils::Redact;
use cloudsign_core::{Context, Error, Result};

use crate::constants::*;

/// Config carries all the configuration for Backblaze B2.
#[derive(Clone, Default)]
pub struct Config {
    /// Application key id, loaded from [`B2_APPLICATION_KEY_ID`].
    pub application_key_id: Option<String>,
    /// Application key, loaded from [`B2_APPLICATION_KEY`].
    pub application_key: Option<String>,
    /// Authorization API base, [`DEFAULT_API_URL`] if unset.
    pub api_url: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("application_key_id", &self.application_key_id)
            .field("application_key", &Redact::from(&self.application_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl Config {
    /// Set application key id and key.
    pub fn with_application_key(mut self, id: impl Into<String>, key: impl Into<String>) -> Self {
        self.application_key_id = Some(id.into());
        self.application_key = Some(key.into());
        self
    }

    /// Set authorization API base.
    pub fn with_api_url(mut self, v: impl Into<String>) -> Self {
        self.api_url = Some(v.into());
        self
    }

    /// Load config from env, keeping values already set.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.application_key_id.is_none() {
            self.application_key_id = ctx.env_var(B2_APPLICATION_KEY_ID);
        }
        if self.application_key.is_none() {
            self.application_key = ctx.env_var(B2_APPLICATION_KEY);
        }
        if self.api_url.is_none() {
            self.api_url = ctx.env_var(B2_API_URL);
        }
        self
    }

    pub(crate) fn application_key(&self) -> Result<(&str, &str)> {
        match (&self.application_key_id, &self.application_key) {
            (Some(id), Some(key)) if !id.is_empty() && !key.is_empty() => Ok((id, key)),
            _ => Err(Error::config_invalid(
                "b2 application key id and key must be configured",
            )),
        }
    }

    pub(crate) fn authorize_url(&self) -> String {
        let base = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        format!(
            "{}{API_PREFIX}/{B2_AUTHORIZE_ACCOUNT}",
            base.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsign_core::StaticEnv;

    #[test]
    fn test_from_env() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (B2_APPLICATION_KEY_ID, "key-id"),
            (B2_APPLICATION_KEY, "application-key-secret"),
        ]));

        let config = Config::default().from_env(&ctx);
        assert_eq!(config.application_key().unwrap(), ("key-id", "application-key-secret"));
        assert_eq!(
            config.authorize_url(),
            "https://api.backblazeb2.com/b2api/v2/b2_authorize_account"
        );
        assert!(!format!("{config:?}").contains("application-key-secret"));

        assert!(Config::default().application_key().is_err());
    }
}
