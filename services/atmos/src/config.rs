use std::fmt::{Debug, Formatter};

use cloudsign_core::signature::{SecretEncoding, SignatureAlgorithm};
use cloudsign_core::utils::Redact;
use cloudsign_core::{Context, Error, Result};
use http::Uri;

use crate::constants::*;

/// Config carries all the configuration for Atmos services.
#[derive(Clone)]
pub struct Config {
    /// `endpoint` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ATMOS_ENDPOINT`]
    pub endpoint: Option<String>,
    /// `uid` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ATMOS_UID`]
    pub uid: Option<String>,
    /// `secret` value will be loaded from:
    ///
    /// - this field if it's `is_some`
    /// - env value: [`ATMOS_SECRET`]
    pub secret: Option<String>,
    /// Algorithm of signed urls, HMAC-SHA256 Base64 by default.
    pub algorithm: SignatureAlgorithm,
    /// How the secret is turned into key bytes for signed urls.
    pub secret_encoding: SecretEncoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            uid: None,
            secret: None,
            algorithm: SignatureAlgorithm::HmacSha256Base64,
            secret_encoding: SecretEncoding::Raw,
        }
    }
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("endpoint", &self.endpoint)
            .field("uid", &self.uid)
            .field("secret", &Redact::from(&self.secret))
            .field("algorithm", &self.algorithm)
            .field("secret_encoding", &self.secret_encoding)
            .finish()
    }
}

impl Config {
    /// Set endpoint.
    pub fn with_endpoint(mut self, v: impl Into<String>) -> Self {
        self.endpoint = Some(v.into());
        self
    }

    /// Set uid.
    pub fn with_uid(mut self, v: impl Into<String>) -> Self {
        self.uid = Some(v.into());
        self
    }

    /// Set secret.
    pub fn with_secret(mut self, v: impl Into<String>) -> Self {
        self.secret = Some(v.into());
        self
    }

    /// Set the signed url algorithm.
    pub fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the secret encoding of signed urls.
    pub fn with_secret_encoding(mut self, encoding: SecretEncoding) -> Self {
        self.secret_encoding = encoding;
        self
    }

    /// Load config from env, keeping values already set.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        if self.endpoint.is_none() {
            self.endpoint = ctx.env_var(ATMOS_ENDPOINT);
        }
        if self.uid.is_none() {
            self.uid = ctx.env_var(ATMOS_UID);
        }
        if self.secret.is_none() {
            self.secret = ctx.env_var(ATMOS_SECRET);
        }
        self
    }

    /// Parsed endpoint.
    pub fn endpoint(&self) -> Result<Uri> {
        let Some(endpoint) = &self.endpoint else {
            return Err(Error::config_invalid("atmos endpoint must be configured"));
        };
        endpoint.parse().map_err(|e| {
            Error::config_invalid(format!("invalid endpoint {endpoint}")).with_source(e)
        })
    }
}
