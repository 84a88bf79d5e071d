use std::fmt;
use std::mem;
use std::str::FromStr;

use http::header::HeaderName;
use http::uri::Authority;
use http::uri::PathAndQuery;
use http::uri::Scheme;
use http::HeaderMap;
use http::HeaderValue;
use http::Method;
use http::Uri;

use crate::time::DateTime;
use crate::{Error, Result};

/// Signing context for request.
#[derive(Debug)]
pub struct SigningRequest {
    /// HTTP method.
    pub method: Method,
    /// HTTP scheme.
    pub scheme: Scheme,
    /// HTTP authority.
    pub authority: Authority,
    /// HTTP path.
    pub path: String,
    /// HTTP query parameters.
    pub query: Vec<(String, String)>,
    /// HTTP headers.
    pub headers: HeaderMap,
}

impl SigningRequest {
    /// Build a signing context from http::request::Parts.
    pub fn build(parts: &mut http::request::Parts) -> Result<Self> {
        let uri = mem::take(&mut parts.uri).into_parts();
        let paq = uri
            .path_and_query
            .unwrap_or_else(|| PathAndQuery::from_static("/"));

        Ok(SigningRequest {
            method: parts.method.clone(),
            scheme: uri.scheme.unwrap_or(Scheme::HTTP),
            authority: uri.authority.ok_or_else(|| {
                Error::request_invalid("request without authority is invalid for signing")
            })?,
            path: paq.path().to_string(),
            query: paq
                .query()
                .map(|v| {
                    form_urlencoded::parse(v.as_bytes())
                        .map(|(k, v)| (k.into_owned(), v.into_owned()))
                        .collect()
                })
                .unwrap_or_default(),

            // Take the headers out of the request to avoid copy.
            // We will return it back when apply the context.
            headers: mem::take(&mut parts.headers),
        })
    }

    /// Start a signing context for `method` against `endpoint` joined with
    /// the already encoded `path`.
    ///
    /// The endpoint keeps its scheme and authority; its own path (if any)
    /// prefixes `path`.
    pub fn from_endpoint(method: Method, endpoint: &Uri, path: &str) -> Result<Self> {
        let authority = endpoint.authority().cloned().ok_or_else(|| {
            Error::config_invalid(format!("endpoint {endpoint} has no authority"))
        })?;
        let base = endpoint.path().trim_end_matches('/');
        let path = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        Ok(SigningRequest {
            method,
            scheme: endpoint.scheme().cloned().unwrap_or(Scheme::HTTPS),
            authority,
            path,
            query: Vec::new(),
            headers: HeaderMap::new(),
        })
    }

    /// Apply the signing context back to http::request::Parts.
    pub fn apply(mut self, parts: &mut http::request::Parts) -> Result<()> {
        mem::swap(&mut parts.headers, &mut self.headers);
        parts.method = self.method.clone();
        parts.uri = self.uri()?;
        Ok(())
    }

    /// Assemble the signed URI.
    pub fn uri(&self) -> Result<Uri> {
        let mut uri_parts = http::uri::Parts::default();
        uri_parts.scheme = Some(self.scheme.clone());
        uri_parts.authority = Some(self.authority.clone());
        uri_parts.path_and_query = {
            let query_size = self.query_size();
            let paq = if query_size == 0 {
                self.path.clone()
            } else {
                let mut s = self.path.clone();
                s.reserve(query_size + self.query.len() * 2);

                s.push('?');
                for (i, (k, v)) in self.query.iter().enumerate() {
                    if i > 0 {
                        s.push('&');
                    }

                    s.push_str(k);
                    if !v.is_empty() {
                        s.push('=');
                        s.push_str(v);
                    }
                }

                s
            };

            Some(PathAndQuery::from_str(&paq)?)
        };

        Ok(Uri::from_parts(uri_parts)?)
    }

    /// Consume the context into a finished descriptor.
    pub fn into_signed_request(self, expires_at: Option<DateTime>) -> Result<SignedRequest> {
        Ok(SignedRequest {
            uri: self.uri()?,
            method: self.method,
            headers: self.headers,
            expires_at,
        })
    }

    /// Get query size.
    #[inline]
    pub fn query_size(&self) -> usize {
        self.query
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum::<usize>()
    }

    /// Push a new query pair into query list.
    #[inline]
    pub fn query_push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query.push((key.into(), value.into()));
    }

    /// Push a raw query string into query list.
    #[inline]
    pub fn query_append(&mut self, query: &str) {
        self.query.push((query.to_string(), "".to_string()));
    }

    /// Insert a header, marking it sensitive when it carries a secret.
    pub fn header_insert(
        &mut self,
        key: impl Into<HeaderName>,
        value: &str,
        sensitive: bool,
    ) -> Result<()> {
        let mut value = HeaderValue::from_str(value)?;
        value.set_sensitive(sensitive);
        self.headers.insert(key.into(), value);
        Ok(())
    }
}

/// A finished, independent request descriptor ready for the http transport.
///
/// Built fresh per call and never persisted.
#[derive(Clone)]
pub struct SignedRequest {
    /// HTTP method.
    pub method: Method,
    /// Full URI including any signing query parameters.
    pub uri: Uri,
    /// Headers to send, including any signing headers.
    pub headers: HeaderMap,
    /// Instant after which the signature is rejected, if time-boxed.
    pub expires_at: Option<DateTime>,
}

impl SignedRequest {
    /// Embedded expiry as epoch seconds.
    pub fn expires(&self) -> Option<i64> {
        self.expires_at.map(|t| t.timestamp())
    }

    /// Look up a decoded query parameter of the signed URI.
    pub fn query_param(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    /// Turn the descriptor into an `http::Request` carrying `body`.
    pub fn into_request<B>(self, body: B) -> Result<http::Request<B>> {
        let mut req = http::Request::builder()
            .method(self.method)
            .uri(self.uri)
            .body(body)?;
        *req.headers_mut() = self.headers;
        Ok(req)
    }
}

impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Signatures ride in the query string, so only the path is shown.
        f.debug_struct("SignedRequest")
            .field("method", &self.method)
            .field("path", &self.uri.path())
            .field("headers", &self.headers)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
