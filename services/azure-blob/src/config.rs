use std::fmt::{Debug, Formatter};

use cloudsign_core::utils::Redact;
use cloudsign_core::{Context, Error, Result};
use http::Uri;

use crate::constants::*;

/// Config carries all the configuration for Azure Blob Storage services.
#[derive(Clone, Default)]
pub struct Config {
    /// `account_name` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZBLOB_ACCOUNT_NAME`] or `AZURE_STORAGE_ACCOUNT_NAME`
    pub account_name: Option<String>,
    /// `account_key` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZBLOB_ACCOUNT_KEY`] or `AZURE_STORAGE_ACCOUNT_KEY`
    pub account_key: Option<String>,
    /// `sas_token` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZURE_STORAGE_SAS_TOKEN`]
    pub sas_token: Option<String>,
    /// `endpoint` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`AZBLOB_ENDPOINT`]
    ///
    /// Defaults to `https://<account_name>.blob.core.windows.net`.
    pub endpoint: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("account_name", &self.account_name)
            .field("account_key", &Redact::from(&self.account_key))
            .field("sas_token", &Redact::from(&self.sas_token))
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Config {
    /// Set account name.
    pub fn with_account_name(mut self, v: impl Into<String>) -> Self {
        self.account_name = Some(v.into());
        self
    }

    /// Set account key.
    pub fn with_account_key(mut self, v: impl Into<String>) -> Self {
        self.account_key = Some(v.into());
        self
    }

    /// Set sas token.
    pub fn with_sas_token(mut self, v: impl Into<String>) -> Self {
        self.sas_token = Some(v.into());
        self
    }

    /// Set endpoint.
    pub fn with_endpoint(mut self, v: impl Into<String>) -> Self {
        self.endpoint = Some(v.into());
        self
    }

    /// Load config from env, keeping values already set.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();

        if self.account_name.is_none() {
            self.account_name = envs
                .get(AZBLOB_ACCOUNT_NAME)
                .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_NAME))
                .cloned();
        }
        if self.account_key.is_none() {
            self.account_key = envs
                .get(AZBLOB_ACCOUNT_KEY)
                .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_KEY))
                .cloned();
        }
        if self.sas_token.is_none() {
            self.sas_token = envs.get(AZURE_STORAGE_SAS_TOKEN).cloned();
        }
        if self.endpoint.is_none() {
            self.endpoint = envs.get(AZBLOB_ENDPOINT).cloned();
        }

        self
    }

    /// Blob service endpoint.
    pub fn endpoint(&self) -> Result<Uri> {
        let endpoint = match (&self.endpoint, &self.account_name) {
            (Some(endpoint), _) => endpoint.clone(),
            (None, Some(account)) => format!("https://{account}.blob.core.windows.net"),
            (None, None) => {
                return Err(Error::config_invalid(
                    "either endpoint or account_name must be configured",
                ))
            }
        };

        endpoint.parse().map_err(|e| {
            Error::config_invalid(format!("invalid endpoint {endpoint}")).with_source(e)
        })
    }
}
