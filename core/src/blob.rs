//! Signed blob requests.
//!
//! [`BlobSigner`] turns "sign operation X on blob R for duration T" into a
//! [`SignedRequest`]. It fixes the expiry, fetches the session credential and
//! hands both to the provider's [`SignBlobRequest`] implementation.

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use http::header::{
    HeaderName, CONTENT_LENGTH, CONTENT_TYPE, IF_MATCH, IF_MODIFIED_SINCE, IF_NONE_MATCH,
    IF_UNMODIFIED_SINCE, RANGE,
};
use http::{HeaderMap, HeaderValue, Method};

use crate::time::{add_duration, format_http_date, now, DateTime};
use crate::{
    Context, Error, ErrorKind, ProvideCredential, Result, SessionCache, SignedRequest,
    SigningCredential,
};

/// Lifetime of signed GET requests when the caller gives none.
pub const DEFAULT_TTL: Duration = Duration::from_secs(900);

/// Where a provider puts its signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStyle {
    /// In request headers, usually `Authorization`.
    Header,
    /// In query parameters of the URL.
    Query,
}

/// Blob operations a signed request can be built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobOperation {
    /// Download a blob.
    Get,
    /// Upload a blob.
    Put,
    /// Delete a blob.
    Remove,
}

impl BlobOperation {
    /// HTTP method of this operation.
    pub fn method(self) -> Method {
        match self {
            BlobOperation::Get => Method::GET,
            BlobOperation::Put => Method::PUT,
            BlobOperation::Remove => Method::DELETE,
        }
    }
}

/// Signing contracts a provider offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobCapabilities {
    /// PUT can be signed with an expiry.
    pub timeboxed_put: bool,
    /// DELETE can be signed at all.
    pub remove: bool,
    /// DELETE signatures carry the default expiry.
    pub expiring_remove: bool,
}

impl Default for BlobCapabilities {
    fn default() -> Self {
        Self {
            timeboxed_put: true,
            remove: true,
            expiring_remove: false,
        }
    }
}

/// Range and conditional headers of a GET.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetOptions {
    range: Option<(u64, Option<u64>)>,
    if_match: Option<String>,
    if_none_match: Option<String>,
    if_modified_since: Option<DateTime>,
    if_unmodified_since: Option<DateTime>,
}

impl GetOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read bytes `start..=end`, or from `start` to the end when `end` is None.
    pub fn with_range(mut self, start: u64, end: Option<u64>) -> Self {
        self.range = Some((start, end));
        self
    }

    /// Set If-Match.
    pub fn with_if_match(mut self, etag: impl Into<String>) -> Self {
        self.if_match = Some(etag.into());
        self
    }

    /// Set If-None-Match.
    pub fn with_if_none_match(mut self, etag: impl Into<String>) -> Self {
        self.if_none_match = Some(etag.into());
        self
    }

    /// Set If-Modified-Since.
    pub fn with_if_modified_since(mut self, t: DateTime) -> Self {
        self.if_modified_since = Some(t);
        self
    }

    /// Set If-Unmodified-Since.
    pub fn with_if_unmodified_since(mut self, t: DateTime) -> Self {
        self.if_unmodified_since = Some(t);
        self
    }

    /// Render these options as request headers.
    pub fn to_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some((start, end)) = self.range {
            if matches!(end, Some(end) if end < start) {
                return Err(Error::request_invalid(format!(
                    "invalid range: {start}-{}",
                    end.unwrap_or_default()
                )));
            }
            let value = match end {
                Some(end) => format!("bytes={start}-{end}"),
                None => format!("bytes={start}-"),
            };
            headers.insert(RANGE, HeaderValue::from_str(&value)?);
        }
        if let Some(v) = &self.if_match {
            headers.insert(IF_MATCH, HeaderValue::from_str(v)?);
        }
        if let Some(v) = &self.if_none_match {
            headers.insert(IF_NONE_MATCH, HeaderValue::from_str(v)?);
        }
        if let Some(t) = self.if_modified_since {
            headers.insert(IF_MODIFIED_SINCE, HeaderValue::from_str(&format_http_date(t))?);
        }
        if let Some(t) = self.if_unmodified_since {
            headers.insert(
                IF_UNMODIFIED_SINCE,
                HeaderValue::from_str(&format_http_date(t))?,
            );
        }
        Ok(headers)
    }
}

/// Description of the payload of an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobMetadata {
    /// Blob name inside its container.
    pub name: String,
    /// Payload length in bytes.
    pub content_length: Option<u64>,
    /// Payload media type.
    pub content_type: Option<String>,
    /// Base64 MD5 of the payload.
    pub content_md5: Option<String>,
    /// User metadata, keys without provider prefix.
    pub user_metadata: BTreeMap<String, String>,
}

impl BlobMetadata {
    /// Create metadata for blob `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set content length.
    pub fn with_content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }

    /// Set content type.
    pub fn with_content_type(mut self, v: impl Into<String>) -> Self {
        self.content_type = Some(v.into());
        self
    }

    /// Set content md5.
    pub fn with_content_md5(mut self, v: impl Into<String>) -> Self {
        self.content_md5 = Some(v.into());
        self
    }

    /// Add user metadata.
    pub fn with_user_metadata(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.user_metadata.insert(k.into(), v.into());
        self
    }

    /// Render the standard payload headers.
    ///
    /// User metadata is left to providers since every one prefixes it
    /// differently.
    pub fn to_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        if let Some(len) = self.content_length {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
        }
        if let Some(v) = &self.content_type {
            headers.insert(CONTENT_TYPE, HeaderValue::from_str(v)?);
        }
        if let Some(v) = &self.content_md5 {
            headers.insert(
                HeaderName::from_static("content-md5"),
                HeaderValue::from_str(v)?,
            );
        }
        Ok(headers)
    }
}

/// Everything a provider needs to sign one blob operation.
#[derive(Debug, Clone)]
pub struct BlobRequest {
    /// Operation to sign.
    pub operation: BlobOperation,
    /// Container (bucket) name.
    pub container: String,
    /// Blob name.
    pub name: String,
    /// Expiry to embed, `None` for non-expiring signatures.
    pub expires_at: Option<DateTime>,
    /// Headers the signed request must carry.
    pub headers: HeaderMap,
    /// Upload metadata, only set for PUT.
    pub metadata: Option<BlobMetadata>,
}

impl BlobRequest {
    /// HTTP method of the request.
    pub fn method(&self) -> Method {
        self.operation.method()
    }
}

/// SignBlobRequest is implemented by providers to sign blob operations.
#[async_trait::async_trait]
pub trait SignBlobRequest: Debug + Send + Sync + Unpin + 'static {
    /// Credential used by this builder.
    type Credential: Send + Sync + Unpin + 'static;

    /// Where this provider places its signature.
    fn style(&self) -> SigningStyle;

    /// Signing contracts this provider supports.
    fn capabilities(&self) -> BlobCapabilities {
        BlobCapabilities::default()
    }

    /// Build the signed request.
    ///
    /// `req.expires_at` is already fixed. Implementations embedding an expiry
    /// must use exactly that instant.
    async fn sign_blob_request(
        &self,
        ctx: &Context,
        credential: &Self::Credential,
        req: BlobRequest,
    ) -> Result<SignedRequest>;
}

/// BlobSigner assembles signed blob requests for one provider.
///
/// Every call produces an independent [`SignedRequest`]; the only shared
/// state is the session cache.
#[derive(Clone, Debug)]
pub struct BlobSigner<K: SigningCredential> {
    ctx: Context,
    session: SessionCache<K>,
    builder: Arc<dyn SignBlobRequest<Credential = K>>,
}

impl<K: SigningCredential> BlobSigner<K> {
    /// Create a new blob signer.
    pub fn new(
        ctx: Context,
        loader: impl ProvideCredential<Credential = K>,
        builder: impl SignBlobRequest<Credential = K>,
    ) -> Self {
        Self::with_session(ctx, SessionCache::new(loader), builder)
    }

    /// Create a blob signer over an existing session cache.
    pub fn with_session(
        ctx: Context,
        session: SessionCache<K>,
        builder: impl SignBlobRequest<Credential = K>,
    ) -> Self {
        Self {
            ctx,
            session,
            builder: Arc::new(builder),
        }
    }

    /// Where the provider places its signature.
    pub fn style(&self) -> SigningStyle {
        self.builder.style()
    }

    /// Signing contracts of the provider.
    pub fn capabilities(&self) -> BlobCapabilities {
        self.builder.capabilities()
    }

    /// Session cache backing this signer.
    pub fn session(&self) -> &SessionCache<K> {
        &self.session
    }

    /// Drop the cached session, e.g. after the provider answered 401.
    pub fn invalidate(&self) {
        self.session.invalidate()
    }

    /// Sign a GET valid for [`DEFAULT_TTL`].
    pub async fn sign_get_blob(&self, container: &str, name: &str) -> Result<SignedRequest> {
        self.sign_get_blob_with_ttl(container, name, DEFAULT_TTL)
            .await
    }

    /// Sign a GET valid for `ttl`.
    pub async fn sign_get_blob_with_ttl(
        &self,
        container: &str,
        name: &str,
        ttl: Duration,
    ) -> Result<SignedRequest> {
        self.assemble(
            BlobOperation::Get,
            container,
            name,
            HeaderMap::new(),
            None,
            Some(ttl),
        )
        .await
    }

    /// Sign a GET carrying range or conditional headers, without expiry.
    pub async fn sign_get_blob_with_options(
        &self,
        container: &str,
        name: &str,
        options: &GetOptions,
    ) -> Result<SignedRequest> {
        let headers = options.to_headers()?;
        self.assemble(BlobOperation::Get, container, name, headers, None, None)
            .await
    }

    /// Sign a PUT through the provider's regular authentication.
    pub async fn sign_put_blob(
        &self,
        container: &str,
        blob: &BlobMetadata,
    ) -> Result<SignedRequest> {
        let headers = blob.to_headers()?;
        self.assemble(
            BlobOperation::Put,
            container,
            &blob.name,
            headers,
            Some(blob.clone()),
            None,
        )
        .await
    }

    /// Sign a PUT valid for `ttl`.
    ///
    /// Fails with [`crate::ErrorKind::Unsupported`] on providers without
    /// time-boxed PUT signing.
    pub async fn sign_put_blob_with_ttl(
        &self,
        container: &str,
        blob: &BlobMetadata,
        ttl: Duration,
    ) -> Result<SignedRequest> {
        if !self.capabilities().timeboxed_put {
            return Err(
                Error::unsupported("time-boxed PUT signing is not supported by this provider")
                    .with_context("method", "PUT")
                    .with_context("resource", format!("{container}/{}", blob.name)),
            );
        }

        let headers = blob.to_headers()?;
        self.assemble(
            BlobOperation::Put,
            container,
            &blob.name,
            headers,
            Some(blob.clone()),
            Some(ttl),
        )
        .await
    }

    /// Sign a DELETE.
    pub async fn sign_remove_blob(&self, container: &str, name: &str) -> Result<SignedRequest> {
        let caps = self.capabilities();
        if !caps.remove {
            return Err(
                Error::unsupported("DELETE signing is not supported by this provider")
                    .with_context("method", "DELETE")
                    .with_context("resource", format!("{container}/{name}")),
            );
        }

        let ttl = caps.expiring_remove.then_some(DEFAULT_TTL);
        self.assemble(
            BlobOperation::Remove,
            container,
            name,
            HeaderMap::new(),
            None,
            ttl,
        )
        .await
    }

    async fn assemble(
        &self,
        operation: BlobOperation,
        container: &str,
        name: &str,
        headers: HeaderMap,
        metadata: Option<BlobMetadata>,
        ttl: Option<Duration>,
    ) -> Result<SignedRequest> {
        let method = operation.method();
        let resource = format!("{container}/{name}");
        if container.is_empty() || name.is_empty() {
            return Err(
                Error::config_invalid("container and blob name must not be empty")
                    .with_context("method", method.as_str())
                    .with_context("resource", resource),
            );
        }

        let expires_at = match ttl {
            Some(ttl) => Some(add_duration(now(), ttl)?),
            None => None,
        };
        log::debug!(
            "signing {method} {resource} with {:?} style, expires at {expires_at:?}",
            self.style()
        );
        let req = BlobRequest {
            operation,
            container: container.to_string(),
            name: name.to_string(),
            expires_at,
            headers,
            metadata,
        };

        // A credential rejected by the provider forces one re-authentication.
        // The caller sees the error if the fresh credential fails as well.
        let mut reauthenticated = false;
        loop {
            let cred = self.session.get(&self.ctx).await?;
            match self
                .builder
                .sign_blob_request(&self.ctx, &cred, req.clone())
                .await
            {
                Ok(signed) => return Ok(signed),
                Err(err)
                    if !reauthenticated
                        && matches!(
                            err.kind(),
                            ErrorKind::CredentialExpired | ErrorKind::CredentialDenied
                        ) =>
                {
                    log::debug!(
                        "credential rejected while signing {resource}, re-authenticating: {err}"
                    );
                    self.session.invalidate();
                    reauthenticated = true;
                }
                Err(err) => {
                    return Err(if err.context().iter().any(|(k, _)| *k == "resource") {
                        err
                    } else {
                        err.with_context("method", method.as_str())
                            .with_context("resource", resource)
                    })
                }
            }
        }
    }
}
