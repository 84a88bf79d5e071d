//! Provider selection.
//!
//! [`ProviderSigner`] is a closed union over the compiled-in providers. The
//! variant is picked once at construction and every blob operation
//! dispatches to it, so callers hold one type regardless of provider.

use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use cloudsign_core::{
    BlobCapabilities, BlobMetadata, BlobSigner, Context, Error, GetOptions, Result,
    SignedRequest, SigningStyle,
};
use log::debug;

/// Providers known to this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// EMC Atmos.
    Atmos,
    /// Azure Blob Storage.
    Azure,
    /// Backblaze B2.
    B2,
    /// Google Cloud Storage.
    Google,
    /// OpenStack Swift.
    Swift,
}

impl ProviderKind {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Atmos => "atmos",
            ProviderKind::Azure => "azure",
            ProviderKind::B2 => "b2",
            ProviderKind::Google => "google",
            ProviderKind::Swift => "swift",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atmos" => Ok(ProviderKind::Atmos),
            "azure" | "azblob" => Ok(ProviderKind::Azure),
            "b2" | "backblaze" => Ok(ProviderKind::B2),
            "google" | "gcs" => Ok(ProviderKind::Google),
            "swift" | "openstack" => Ok(ProviderKind::Swift),
            _ => Err(Error::config_invalid(format!("unknown provider {s}"))),
        }
    }
}

/// One provider's blob signer, selected at construction.
#[derive(Debug, Clone)]
pub enum ProviderSigner {
    /// Signature over method, path, identity and expiry in query parameters.
    #[cfg(feature = "atmos")]
    PathQuery(BlobSigner<cloudsign_atmos::Credential>),
    /// Keyed MAC over request headers, SAS for time-boxed URLs.
    #[cfg(feature = "azure")]
    HeaderMac(BlobSigner<cloudsign_azure_blob::Credential>),
    /// Authenticated session plus a temporary URL key.
    #[cfg(feature = "swift")]
    TemporaryUrlKey(BlobSigner<cloudsign_swift::Session>),
    /// JWT assertion session plus RSA signed URLs.
    #[cfg(feature = "google")]
    JwtAssertion(BlobSigner<cloudsign_google::Credential>),
    /// Account session with per-upload targets.
    #[cfg(feature = "b2")]
    B2(BlobSigner<cloudsign_b2::Session>),
}

macro_rules! dispatch {
    ($self:ident, $signer:ident => $e:expr) => {
        match $self {
            #[cfg(feature = "atmos")]
            ProviderSigner::PathQuery($signer) => $e,
            #[cfg(feature = "azure")]
            ProviderSigner::HeaderMac($signer) => $e,
            #[cfg(feature = "swift")]
            ProviderSigner::TemporaryUrlKey($signer) => $e,
            #[cfg(feature = "google")]
            ProviderSigner::JwtAssertion($signer) => $e,
            #[cfg(feature = "b2")]
            ProviderSigner::B2($signer) => $e,
        }
    };
}

impl ProviderSigner {
    /// Build the signer of `kind` from env values read through `ctx`.
    pub fn from_env(ctx: Context, kind: ProviderKind) -> Result<Self> {
        debug!("building {kind} signer from env");
        match kind {
            #[cfg(feature = "atmos")]
            ProviderKind::Atmos => {
                let config = cloudsign_atmos::Config::default().from_env(&ctx);
                Self::atmos(ctx, &config)
            }
            #[cfg(feature = "azure")]
            ProviderKind::Azure => {
                let config = cloudsign_azure_blob::Config::default().from_env(&ctx);
                Self::azure(ctx, &config)
            }
            #[cfg(feature = "b2")]
            ProviderKind::B2 => {
                let config = cloudsign_b2::Config::default().from_env(&ctx);
                Ok(Self::b2(ctx, &config))
            }
            #[cfg(feature = "google")]
            ProviderKind::Google => {
                let config = cloudsign_google::Config::default().from_env(&ctx);
                Self::google(ctx, &config)
            }
            #[cfg(feature = "swift")]
            ProviderKind::Swift => {
                let config = cloudsign_swift::Config::default().from_env(&ctx);
                Ok(Self::swift(ctx, &config))
            }
            #[allow(unreachable_patterns)]
            kind => Err(Error::unsupported(format!(
                "provider {kind} is not enabled in this build"
            ))),
        }
    }

    /// Atmos signer with static or env credentials.
    #[cfg(feature = "atmos")]
    pub fn atmos(ctx: Context, config: &cloudsign_atmos::Config) -> Result<Self> {
        Ok(ProviderSigner::PathQuery(BlobSigner::new(
            ctx,
            cloudsign_atmos::DefaultCredentialProvider::new(config),
            cloudsign_atmos::BlobRequestSigner::from_config(config)?,
        )))
    }

    /// Azure Blob signer with a shared key or SAS token.
    #[cfg(feature = "azure")]
    pub fn azure(ctx: Context, config: &cloudsign_azure_blob::Config) -> Result<Self> {
        Ok(ProviderSigner::HeaderMac(BlobSigner::new(
            ctx,
            cloudsign_azure_blob::DefaultCredentialProvider::new(config),
            cloudsign_azure_blob::BlobRequestSigner::from_config(config)?,
        )))
    }

    /// B2 signer authorizing with an application key.
    ///
    /// Pass [`BlobSigner::session`] of the returned signer to
    /// [`cloudsign_b2::B2UploadTargets::new`] to share the account session
    /// with upload retries.
    #[cfg(feature = "b2")]
    pub fn b2(ctx: Context, config: &cloudsign_b2::Config) -> Self {
        ProviderSigner::B2(BlobSigner::new(
            ctx,
            cloudsign_b2::AuthorizeAccountProvider::new(config.clone()),
            cloudsign_b2::BlobRequestSigner::new(),
        ))
    }

    /// Google Cloud Storage signer with a service account key.
    #[cfg(feature = "google")]
    pub fn google(ctx: Context, config: &cloudsign_google::Config) -> Result<Self> {
        Ok(ProviderSigner::JwtAssertion(BlobSigner::new(
            ctx,
            cloudsign_google::ServiceAccountCredentialProvider::new(config.clone()),
            cloudsign_google::BlobRequestSigner::from_config(config)?,
        )))
    }

    /// Swift signer authenticating against Keystone.
    #[cfg(feature = "swift")]
    pub fn swift(ctx: Context, config: &cloudsign_swift::Config) -> Self {
        let sessions = cloudsign_core::SessionCache::new(
            cloudsign_swift::KeystoneCredentialProvider::new(config.clone()),
        );
        ProviderSigner::TemporaryUrlKey(BlobSigner::with_session(
            ctx,
            sessions.clone(),
            cloudsign_swift::BlobRequestSigner::new(config.clone(), sessions),
        ))
    }

    /// Provider behind this signer.
    pub fn kind(&self) -> ProviderKind {
        match self {
            #[cfg(feature = "atmos")]
            ProviderSigner::PathQuery(_) => ProviderKind::Atmos,
            #[cfg(feature = "azure")]
            ProviderSigner::HeaderMac(_) => ProviderKind::Azure,
            #[cfg(feature = "swift")]
            ProviderSigner::TemporaryUrlKey(_) => ProviderKind::Swift,
            #[cfg(feature = "google")]
            ProviderSigner::JwtAssertion(_) => ProviderKind::Google,
            #[cfg(feature = "b2")]
            ProviderSigner::B2(_) => ProviderKind::B2,
        }
    }

    /// Where the provider places its signature.
    pub fn style(&self) -> SigningStyle {
        dispatch!(self, s => s.style())
    }

    /// Signing contracts of the provider.
    pub fn capabilities(&self) -> BlobCapabilities {
        dispatch!(self, s => s.capabilities())
    }

    /// Drop the cached session.
    pub fn invalidate(&self) {
        dispatch!(self, s => s.invalidate())
    }

    /// Sign a GET valid for the default lifetime.
    pub async fn sign_get_blob(&self, container: &str, name: &str) -> Result<SignedRequest> {
        dispatch!(self, s => s.sign_get_blob(container, name).await)
    }

    /// Sign a GET valid for `ttl`.
    pub async fn sign_get_blob_with_ttl(
        &self,
        container: &str,
        name: &str,
        ttl: Duration,
    ) -> Result<SignedRequest> {
        dispatch!(self, s => s.sign_get_blob_with_ttl(container, name, ttl).await)
    }

    /// Sign a GET carrying range or conditional headers.
    pub async fn sign_get_blob_with_options(
        &self,
        container: &str,
        name: &str,
        options: &GetOptions,
    ) -> Result<SignedRequest> {
        dispatch!(self, s => s.sign_get_blob_with_options(container, name, options).await)
    }

    /// Sign a PUT.
    pub async fn sign_put_blob(
        &self,
        container: &str,
        blob: &BlobMetadata,
    ) -> Result<SignedRequest> {
        dispatch!(self, s => s.sign_put_blob(container, blob).await)
    }

    /// Sign a PUT valid for `ttl`.
    pub async fn sign_put_blob_with_ttl(
        &self,
        container: &str,
        blob: &BlobMetadata,
        ttl: Duration,
    ) -> Result<SignedRequest> {
        dispatch!(self, s => s.sign_put_blob_with_ttl(container, blob, ttl).await)
    }

    /// Sign a DELETE.
    pub async fn sign_remove_blob(&self, container: &str, name: &str) -> Result<SignedRequest> {
        dispatch!(self, s => s.sign_remove_blob(container, name).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsign_core::{ErrorKind, StaticEnv};
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("atmos", ProviderKind::Atmos; "atmos")]
    #[test_case("Azure", ProviderKind::Azure; "azure mixed case")]
    #[test_case(" gcs ", ProviderKind::Google; "google alias")]
    #[test_case("openstack", ProviderKind::Swift; "swift alias")]
    #[test_case("backblaze", ProviderKind::B2; "b2 alias")]
    fn test_parse_kind(input: &str, expected: ProviderKind) {
        assert_eq!(input.parse::<ProviderKind>().unwrap(), expected);
    }

    #[test]
    fn test_parse_unknown_kind() {
        let err = "s3".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[cfg(feature = "atmos")]
    #[tokio::test]
    async fn test_atmos_from_env() {
        let _ = env_logger::builder().is_test(true).try_init();

        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            ("ATMOS_ENDPOINT", "https://atmos.example.com"),
            ("ATMOS_UID", "tenant/user"),
            ("ATMOS_SECRET", "secret"),
        ]));
        let signer = ProviderSigner::from_env(ctx, ProviderKind::Atmos).unwrap();
        assert_eq!(signer.kind(), ProviderKind::Atmos);
        assert_eq!(signer.style(), SigningStyle::Query);

        let signed = signer.sign_get_blob("container", "name").await.unwrap();
        assert_eq!(signed.uri.path(), "/rest/namespace/container/name");
        assert_eq!(signed.query_param("uid").as_deref(), Some("tenant/user"));
        assert!(signed.expires().is_some());

        let err = signer
            .sign_put_blob_with_ttl(
                "container",
                &BlobMetadata::new("name"),
                Duration::from_secs(60),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }

    #[cfg(feature = "azure")]
    #[tokio::test]
    async fn test_azure_header_mac() {
        let config = cloudsign_azure_blob::Config::default()
            .with_account_name("account")
            .with_account_key("ZmFrZS1henVyZS1hY2NvdW50LWtleQ==");
        let signer = ProviderSigner::azure(Context::new(), &config).unwrap();
        assert_eq!(signer.style(), SigningStyle::Header);

        let signed = signer
            .sign_put_blob("container", &BlobMetadata::new("name"))
            .await
            .unwrap();
        assert!(signed.headers["authorization"]
            .to_str()
            .unwrap()
            .starts_with("SharedKey account:"));
    }

    #[cfg(feature = "b2")]
    #[tokio::test]
    async fn test_b2_refuses_before_authorizing() {
        let config = cloudsign_b2::Config::default().with_application_key("id", "key");
        let signer = ProviderSigner::b2(Context::new(), &config);
        let caps = signer.capabilities();
        assert!(!caps.timeboxed_put);
        assert!(!caps.remove);

        let err = signer.sign_remove_blob("bucket", "name").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        let err = signer
            .sign_put_blob_with_ttl("bucket", &BlobMetadata::new("name"), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);

        let ProviderSigner::B2(inner) = &signer else {
            panic!("expected b2 signer");
        };
        assert_eq!(inner.session().refresh_count(), 0);
    }

    #[cfg(feature = "google")]
    #[test]
    fn test_google_rejects_invalid_endpoint() {
        let config = cloudsign_google::Config::default().with_endpoint("not a uri");
        let err = ProviderSigner::google(Context::new(), &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }
}
