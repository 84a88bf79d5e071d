use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use cloudsign_core::time::{parse_rfc3339, DateTime};
use cloudsign_core::{
    Context, Error, InterfaceKind, ProvideCredential, Result, ServiceCatalog, ServiceEndpoint,
};
use http::header::CONTENT_TYPE;
use http::{Method, StatusCode};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::json;

use crate::constants::*;
use crate::{Config, KeystoneVersion, Session};

/// KeystoneCredentialProvider authenticates against OpenStack Keystone with
/// a user name and password.
///
/// - v2: `POST /v2.0/tokens`, token id in the body.
/// - v3: `POST /v3/auth/tokens`, token in `X-Subject-Token`.
#[derive(Debug, Clone)]
pub struct KeystoneCredentialProvider {
    config: Config,
}

impl KeystoneCredentialProvider {
    /// Create a provider for `config`.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn token_url(&self, version: KeystoneVersion) -> Result<String> {
        let Some(auth_url) = &self.config.auth_url else {
            return Err(Error::config_invalid("keystone auth url must be configured"));
        };
        let base = auth_url.trim_end_matches('/');
        let base = base
            .strip_suffix("/v2.0")
            .or_else(|| base.strip_suffix("/v3"))
            .unwrap_or(base);

        Ok(match version {
            KeystoneVersion::V2 => format!("{base}/v2.0/tokens"),
            KeystoneVersion::V3 => format!("{base}/v3/auth/tokens"),
        })
    }

    fn request_body(&self, version: KeystoneVersion) -> Result<serde_json::Value> {
        let (Some(username), Some(password)) = (&self.config.username, &self.config.password)
        else {
            return Err(Error::config_invalid(
                "keystone username and password must be configured",
            ));
        };

        let body = match version {
            KeystoneVersion::V2 => {
                let mut auth = json!({
                    "passwordCredentials": {
                        "username": username,
                        "password": password,
                    }
                });
                if let Some(tenant) = &self.config.project_name {
                    auth["tenantName"] = json!(tenant);
                }
                json!({ "auth": auth })
            }
            KeystoneVersion::V3 => {
                let user_domain = self
                    .config
                    .user_domain_name
                    .as_deref()
                    .unwrap_or(DEFAULT_DOMAIN);
                let mut auth = json!({
                    "identity": {
                        "methods": ["password"],
                        "password": {
                            "user": {
                                "name": username,
                                "domain": { "name": user_domain },
                                "password": password,
                            }
                        }
                    }
                });
                if let Some(project) = &self.config.project_name {
                    let project_domain = self
                        .config
                        .project_domain_name
                        .as_deref()
                        .unwrap_or(DEFAULT_DOMAIN);
                    auth["scope"] = json!({
                        "project": {
                            "name": project,
                            "domain": { "name": project_domain },
                        }
                    });
                }
                json!({ "auth": auth })
            }
        };
        Ok(body)
    }
}

#[async_trait]
impl ProvideCredential for KeystoneCredentialProvider {
    type Credential = Session;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let version = self.config.keystone_version();
        let url = self.token_url(version)?;
        let body = serde_json::to_vec(&self.request_body(version)?)
            .map_err(|e| Error::unexpected("failed to encode keystone request").with_source(e))?;

        debug!("authenticating against keystone {version:?} at {url}");
        let req = http::Request::builder()
            .method(Method::POST)
            .uri(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(Bytes::from(body))?;
        let resp = ctx.http_send(req).await?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::credential_denied("keystone rejected the credentials")
                .with_context("status", status.as_str())
                .with_context("url", url));
        }
        if !status.is_success() {
            return Err(Error::unexpected(format!(
                "keystone authentication failed: {}",
                String::from_utf8_lossy(resp.body())
            ))
            .with_context("status", status.as_str())
            .with_context("url", url));
        }

        let session = match version {
            KeystoneVersion::V2 => parse_v2(resp.body())?,
            KeystoneVersion::V3 => {
                let token = resp
                    .headers()
                    .get(X_SUBJECT_TOKEN)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| {
                        Error::unexpected("keystone v3 response carries no X-Subject-Token")
                    })?;
                parse_v3(token, resp.body())?
            }
        };

        debug!(
            "keystone session expires at {:?} with {} catalog endpoints",
            session.expires_at,
            session.catalog.endpoints().len()
        );
        Ok(Some(session))
    }
}

#[derive(Deserialize)]
struct V2Response {
    access: V2Access,
}

#[derive(Deserialize)]
struct V2Access {
    token: V2Token,
    #[serde(rename = "serviceCatalog", default)]
    service_catalog: Vec<V2Service>,
}

#[derive(Deserialize)]
struct V2Token {
    id: String,
    issued_at: Option<String>,
    expires: Option<String>,
}

#[derive(Deserialize)]
struct V2Service {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<V2Endpoint>,
}

#[derive(Deserialize)]
struct V2Endpoint {
    region: Option<String>,
    #[serde(rename = "publicURL")]
    public_url: Option<String>,
    #[serde(rename = "internalURL")]
    internal_url: Option<String>,
    #[serde(rename = "adminURL")]
    admin_url: Option<String>,
    #[serde(rename = "versionId")]
    version_id: Option<String>,
}

#[derive(Deserialize)]
struct V3Response {
    token: V3Token,
}

#[derive(Deserialize)]
struct V3Token {
    issued_at: Option<String>,
    expires_at: Option<String>,
    #[serde(default)]
    catalog: Vec<V3Service>,
}

#[derive(Deserialize)]
struct V3Service {
    #[serde(rename = "type")]
    service_type: String,
    #[serde(default)]
    endpoints: Vec<V3Endpoint>,
}

#[derive(Deserialize)]
struct V3Endpoint {
    interface: String,
    region: Option<String>,
    region_id: Option<String>,
    url: String,
}

/// Parse a keystone v2 token response.
pub(crate) fn parse_v2(body: &[u8]) -> Result<Session> {
    let resp: V2Response = serde_json::from_slice(body)
        .map_err(|e| Error::unexpected("failed to parse keystone v2 response").with_source(e))?;

    let mut endpoints = Vec::new();
    for service in resp.access.service_catalog {
        for e in service.endpoints {
            let urls = [
                (InterfaceKind::Public, e.public_url),
                (InterfaceKind::Internal, e.internal_url),
                (InterfaceKind::Admin, e.admin_url),
            ];
            for (interface, url) in urls {
                let Some(url) = url else { continue };
                if let Some(endpoint) = endpoint(
                    &service.service_type,
                    interface,
                    &url,
                    e.region.as_deref(),
                    e.version_id.as_deref(),
                ) {
                    endpoints.push(endpoint);
                }
            }
        }
    }

    let token = resp.access.token;
    Ok(Session {
        token: token.id,
        issued_at: token.issued_at.as_deref().map(parse_time).transpose()?,
        expires_at: token.expires.as_deref().map(parse_time).transpose()?,
        catalog: Arc::new(ServiceCatalog::new(PROVIDER_ID, endpoints)),
    })
}

/// Parse a keystone v3 token response, `token` comes from `X-Subject-Token`.
pub(crate) fn parse_v3(token: &str, body: &[u8]) -> Result<Session> {
    let resp: V3Response = serde_json::from_slice(body)
        .map_err(|e| Error::unexpected("failed to parse keystone v3 response").with_source(e))?;

    let mut endpoints = Vec::new();
    for service in resp.token.catalog {
        for e in service.endpoints {
            let Ok(interface) = e.interface.parse::<InterfaceKind>() else {
                warn!("skipping endpoint with unknown interface {}", e.interface);
                continue;
            };
            let region = e.region.as_deref().or(e.region_id.as_deref());
            if let Some(endpoint) = endpoint(&service.service_type, interface, &e.url, region, None)
            {
                endpoints.push(endpoint);
            }
        }
    }

    Ok(Session {
        token: token.to_string(),
        issued_at: resp.token.issued_at.as_deref().map(parse_time).transpose()?,
        expires_at: resp.token.expires_at.as_deref().map(parse_time).transpose()?,
        catalog: Arc::new(ServiceCatalog::new(PROVIDER_ID, endpoints)),
    })
}

fn endpoint(
    service_type: &str,
    interface: InterfaceKind,
    url: &str,
    region: Option<&str>,
    version: Option<&str>,
) -> Option<ServiceEndpoint> {
    let Ok(url) = url.parse() else {
        warn!("skipping {service_type} endpoint with invalid url {url}");
        return None;
    };

    let mut endpoint = ServiceEndpoint::new(service_type, interface, url);
    if let Some(region) = region.filter(|r| !r.is_empty()) {
        endpoint = endpoint.with_region(region);
    }
    if let Some(version) = version {
        endpoint = endpoint.with_api_version(version);
    }
    Some(endpoint)
}

/// Keystone v2 omits the offset on `issued_at`, those times are UTC.
fn parse_time(s: &str) -> Result<DateTime> {
    parse_rfc3339(s).or_else(|_| parse_rfc3339(&format!("{s}Z")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsign_core::time::format_rfc3339;
    use pretty_assertions::assert_eq;

    const V2_RESPONSE: &str = r#"{
        "access": {
            "token": {
                "id": "v2-token",
                "issued_at": "2030-01-01T00:00:00.000000",
                "expires": "2030-01-02T00:00:00Z"
            },
            "serviceCatalog": [
                {
                    "type": "object-store",
                    "name": "swift",
                    "endpoints": [
                        {
                            "region": "RegionOne",
                            "publicURL": "https://swift.example.com/v1/AUTH_demo",
                            "internalURL": "http://10.0.0.1/v1/AUTH_demo",
                            "adminURL": "http://10.0.0.1/admin"
                        }
                    ]
                },
                {
                    "type": "identity",
                    "endpoints": [
                        { "region": "RegionOne", "publicURL": "https://keystone.example.com/v2.0" }
                    ]
                }
            ]
        }
    }"#;

    const V3_RESPONSE: &str = r#"{
        "token": {
            "issued_at": "2030-01-01T00:00:00.000000Z",
            "expires_at": "2030-01-02T00:00:00.000000Z",
            "catalog": [
                {
                    "type": "object-store",
                    "endpoints": [
                        { "interface": "internal", "region": "RegionOne", "url": "http://10.0.0.1/v1/AUTH_p" },
                        { "interface": "public", "region_id": "RegionTwo", "url": "https://two.example.com/v1/AUTH_p" },
                        { "interface": "mystery", "region": "RegionOne", "url": "https://x.example.com" }
                    ]
                }
            ]
        }
    }"#;

    #[test]
    fn test_parse_v2() {
        let session = parse_v2(V2_RESPONSE.as_bytes()).unwrap();

        assert_eq!(session.token, "v2-token");
        assert_eq!(
            session.issued_at.map(format_rfc3339).as_deref(),
            Some("2030-01-01T00:00:00Z")
        );
        assert_eq!(session.catalog.endpoints().len(), 4);
        assert_eq!(
            session.storage_url(Some("RegionOne"), "1").unwrap().to_string(),
            "https://swift.example.com/v1/AUTH_demo"
        );
    }

    #[test]
    fn test_parse_v3() {
        let session = parse_v3("v3-token", V3_RESPONSE.as_bytes()).unwrap();

        assert_eq!(session.token, "v3-token");
        assert_eq!(session.catalog.endpoints().len(), 2);

        let resolved = session.catalog.resolve_all(OBJECT_STORE, Some("1")).unwrap();
        assert_eq!(
            resolved["RegionOne"].to_string(),
            "http://10.0.0.1/v1/AUTH_p"
        );
        assert_eq!(
            resolved["RegionTwo"].to_string(),
            "https://two.example.com/v1/AUTH_p"
        );
    }

    #[test]
    fn test_parse_invalid() {
        let err = parse_v3("t", b"{}").unwrap_err();
        assert_eq!(err.kind(), cloudsign_core::ErrorKind::Unexpected);
    }

    #[test]
    fn test_request_body() {
        let provider = KeystoneCredentialProvider::new(
            Config::default()
                .with_auth_url("https://keystone.example.com/v3/")
                .with_user("demo", "secret")
                .with_project_name("proj"),
        );

        assert_eq!(
            provider.token_url(KeystoneVersion::V3).unwrap(),
            "https://keystone.example.com/v3/auth/tokens"
        );
        assert_eq!(
            provider.token_url(KeystoneVersion::V2).unwrap(),
            "https://keystone.example.com/v2.0/tokens"
        );

        let body = provider.request_body(KeystoneVersion::V3).unwrap();
        assert_eq!(
            body["auth"]["identity"]["password"]["user"]["domain"]["name"],
            "Default"
        );
        assert_eq!(body["auth"]["scope"]["project"]["name"], "proj");

        let body = provider.request_body(KeystoneVersion::V2).unwrap();
        assert_eq!(body["auth"]["tenantName"], "proj");
        assert_eq!(body["auth"]["passwordCredentials"]["username"], "demo");
    }
}
