use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use cloudsign_core::normalize_version;
use cloudsign_core::utils::Redact;
use cloudsign_core::{Context, Error, Result};

use crate::constants::*;

/// Keystone identity API generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeystoneVersion {
    /// `/v2.0/tokens`, tenants and `serviceCatalog`.
    V2,
    /// `/v3/auth/tokens`, domains, projects and `X-Subject-Token`.
    V3,
}

impl FromStr for KeystoneVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_version(s).as_str() {
            "2" => Ok(KeystoneVersion::V2),
            "3" => Ok(KeystoneVersion::V3),
            _ => Err(Error::config_invalid(format!(
                "unsupported keystone version {s}"
            ))),
        }
    }
}

/// Config carries all the configuration for Swift services.
#[derive(Clone, Default)]
pub struct Config {
    /// Keystone base url, loaded from [`OS_AUTH_URL`].
    pub auth_url: Option<String>,
    /// Keystone version, loaded from [`OS_IDENTITY_API_VERSION`] or guessed
    /// from `auth_url`.
    pub auth_version: Option<KeystoneVersion>,
    /// User name, loaded from [`OS_USERNAME`].
    pub username: Option<String>,
    /// Password, loaded from [`OS_PASSWORD`].
    pub password: Option<String>,
    /// Project (v3) or tenant (v2) name, loaded from [`OS_PROJECT_NAME`] or
    /// [`OS_TENANT_NAME`].
    pub project_name: Option<String>,
    /// User domain for v3, loaded from [`OS_USER_DOMAIN_NAME`].
    pub user_domain_name: Option<String>,
    /// Project domain for v3, loaded from [`OS_PROJECT_DOMAIN_NAME`].
    pub project_domain_name: Option<String>,
    /// Region of the object store, loaded from [`OS_REGION_NAME`].
    pub region: Option<String>,
    /// Object store API version, [`DEFAULT_API_VERSION`] if unset.
    pub api_version: Option<String>,
    /// Account temporary URL key, loaded from [`SWIFT_TEMP_URL_KEY`].
    ///
    /// Fetched from the account when unset.
    pub temp_url_key: Option<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("auth_url", &self.auth_url)
            .field("auth_version", &self.auth_version)
            .field("username", &self.username)
            .field("password", &Redact::from(&self.password))
            .field("project_name", &self.project_name)
            .field("user_domain_name", &self.user_domain_name)
            .field("project_domain_name", &self.project_domain_name)
            .field("region", &self.region)
            .field("api_version", &self.api_version)
            .field("temp_url_key", &Redact::from(&self.temp_url_key))
            .finish()
    }
}

impl Config {
    /// Set keystone url.
    pub fn with_auth_url(mut self, v: impl Into<String>) -> Self {
        self.auth_url = Some(v.into());
        self
    }

    /// Set keystone version.
    pub fn with_auth_version(mut self, v: KeystoneVersion) -> Self {
        self.auth_version = Some(v);
        self
    }

    /// Set user name and password.
    pub fn with_user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set project or tenant name.
    pub fn with_project_name(mut self, v: impl Into<String>) -> Self {
        self.project_name = Some(v.into());
        self
    }

    /// Set user and project domain.
    pub fn with_domain_name(mut self, v: impl Into<String>) -> Self {
        let v = v.into();
        self.user_domain_name = Some(v.clone());
        self.project_domain_name = Some(v);
        self
    }

    /// Set region.
    pub fn with_region(mut self, v: impl Into<String>) -> Self {
        self.region = Some(v.into());
        self
    }

    /// Set object store API version.
    pub fn with_api_version(mut self, v: impl Into<String>) -> Self {
        self.api_version = Some(v.into());
        self
    }

    /// Set temporary URL key.
    pub fn with_temp_url_key(mut self, v: impl Into<String>) -> Self {
        self.temp_url_key = Some(v.into());
        self
    }

    /// Load config from env, keeping values already set.
    pub fn from_env(mut self, ctx: &Context) -> Self {
        let envs = ctx.env_vars();
        let load = |field: &mut Option<String>, keys: &[&str]| {
            if field.is_none() {
                *field = keys.iter().find_map(|k| envs.get(*k).cloned());
            }
        };

        load(&mut self.auth_url, &[OS_AUTH_URL]);
        load(&mut self.username, &[OS_USERNAME]);
        load(&mut self.password, &[OS_PASSWORD]);
        load(&mut self.project_name, &[OS_PROJECT_NAME, OS_TENANT_NAME]);
        load(&mut self.user_domain_name, &[OS_USER_DOMAIN_NAME]);
        load(&mut self.project_domain_name, &[OS_PROJECT_DOMAIN_NAME]);
        load(&mut self.region, &[OS_REGION_NAME]);
        load(&mut self.temp_url_key, &[SWIFT_TEMP_URL_KEY]);

        if self.auth_version.is_none() {
            self.auth_version = envs
                .get(OS_IDENTITY_API_VERSION)
                .and_then(|v| v.parse().ok());
        }
        self
    }

    /// Keystone version, guessed from `auth_url` when not configured.
    pub fn keystone_version(&self) -> KeystoneVersion {
        if let Some(v) = self.auth_version {
            return v;
        }
        match &self.auth_url {
            Some(url) if url.trim_end_matches('/').ends_with("/v2.0") => KeystoneVersion::V2,
            _ => KeystoneVersion::V3,
        }
    }

    /// Object store API version to resolve.
    pub fn api_version(&self) -> &str {
        self.api_version.as_deref().unwrap_or(DEFAULT_API_VERSION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsign_core::StaticEnv;
    use test_case::test_case;

    #[test_case("2", Some(KeystoneVersion::V2))]
    #[test_case("2.0", Some(KeystoneVersion::V2))]
    #[test_case("v3", Some(KeystoneVersion::V3))]
    #[test_case("4", None)]
    fn test_keystone_version(input: &str, expected: Option<KeystoneVersion>) {
        assert_eq!(input.parse::<KeystoneVersion>().ok(), expected);
    }

    #[test]
    fn test_from_env() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (OS_AUTH_URL, "https://keystone.example.com/v2.0"),
            (OS_USERNAME, "demo"),
            (OS_PASSWORD, "secret"),
            (OS_TENANT_NAME, "tenant"),
            (OS_REGION_NAME, "RegionOne"),
        ]));

        let config = Config::default().with_region("RegionTwo").from_env(&ctx);
        assert_eq!(config.project_name.as_deref(), Some("tenant"));
        assert_eq!(config.region.as_deref(), Some("RegionTwo"));
        assert_eq!(config.keystone_version(), KeystoneVersion::V2);
        assert_eq!(config.api_version(), "1");
        assert!(!format!("{config:?}").contains("secret"));
    }
}
