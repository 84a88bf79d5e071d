//! Canonical string construction.
//!
//! Every provider recomputes the exact bytes a client signed, so field order
//! and delimiters are a per-provider table rather than one algorithm. A
//! [`CanonicalStringSpec`] is that table; [`CanonicalInput`] carries the
//! values. Building is a pure function: the expiry is an input, the builder
//! never reads the clock and never parses a full URI.

use http::header::HeaderName;
use http::{HeaderMap, Method};

use crate::time::DateTime;
use crate::{Error, Result};

/// One positional field of a canonical string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CanonicalField {
    /// HTTP method, e.g. `GET`.
    Method,
    /// Already canonicalized resource path.
    Path,
    /// Caller identity (uid, access key id, client email).
    Identity,
    /// Expiry as epoch seconds.
    Expires,
    /// `Content-MD5` header or empty.
    ContentMd5,
    /// `Content-Type` header or empty.
    ContentType,
    /// `Date` header or empty.
    Date,
    /// A single named header, rendered as its value or empty.
    Header(HeaderName),
    /// Every header starting with the prefix as sorted `name:value` lines.
    ///
    /// Absent headers are omitted, never rendered as placeholders.
    PrefixedHeaders(String),
}

/// Values a canonical string is built from.
#[derive(Debug, Clone)]
pub struct CanonicalInput<'a> {
    /// HTTP method.
    pub method: &'a Method,
    /// Canonical resource path, already normalized by the caller.
    pub path: &'a str,
    /// Identity, required when the spec contains [`CanonicalField::Identity`].
    pub identity: Option<&'a str>,
    /// Expiry, required when the spec contains [`CanonicalField::Expires`].
    pub expires: Option<DateTime>,
    /// Request headers.
    pub headers: &'a HeaderMap,
}

impl<'a> CanonicalInput<'a> {
    /// Create an input with no identity, expiry or headers.
    pub fn new(method: &'a Method, path: &'a str, headers: &'a HeaderMap) -> Self {
        Self {
            method,
            path,
            identity: None,
            expires: None,
            headers,
        }
    }

    /// Set identity.
    pub fn with_identity(mut self, identity: &'a str) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Set expiry.
    pub fn with_expires(mut self, expires: DateTime) -> Self {
        self.expires = Some(expires);
        self
    }
}

/// Ordered field list plus delimiter describing a provider's canonical string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalStringSpec {
    fields: Vec<CanonicalField>,
    delimiter: &'static str,
    terminated: bool,
}

impl CanonicalStringSpec {
    /// Create a spec joining `fields` with `delimiter`.
    pub fn new(fields: Vec<CanonicalField>, delimiter: &'static str) -> Self {
        Self {
            fields,
            delimiter,
            terminated: false,
        }
    }

    /// Terminate the last field with the delimiter as well.
    pub fn with_terminated(mut self, terminated: bool) -> Self {
        self.terminated = terminated;
        self
    }

    /// `METHOD\nPATH\nIDENTITY\nEXPIRES`, used by path/query signing.
    pub fn path_query() -> Self {
        Self::new(
            vec![
                CanonicalField::Method,
                CanonicalField::Path,
                CanonicalField::Identity,
                CanonicalField::Expires,
            ],
            "\n",
        )
    }

    /// `METHOD\nEXPIRES\nPATH`, used by temporary URL signing.
    pub fn temporary_url() -> Self {
        Self::new(
            vec![
                CanonicalField::Method,
                CanonicalField::Expires,
                CanonicalField::Path,
            ],
            "\n",
        )
    }

    /// `METHOD\nMD5\nTYPE\nEXPIRES\n[EXTENSION HEADERS\n]PATH`, used by
    /// expiring signed URLs.
    ///
    /// Headers starting with `extension_prefix` are signed as a block right
    /// before the path.
    pub fn signed_url(extension_prefix: &str) -> Self {
        Self::new(
            vec![
                CanonicalField::Method,
                CanonicalField::ContentMd5,
                CanonicalField::ContentType,
                CanonicalField::Expires,
                CanonicalField::PrefixedHeaders(extension_prefix.to_string()),
                CanonicalField::Path,
            ],
            "\n",
        )
    }

    /// Fields of this spec.
    pub fn fields(&self) -> &[CanonicalField] {
        &self.fields
    }

    /// Build the canonical string.
    pub fn build(&self, input: &CanonicalInput<'_>) -> Result<String> {
        let mut parts = Vec::with_capacity(self.fields.len());

        for field in &self.fields {
            let value = match field {
                CanonicalField::Method => input.method.as_str().to_string(),
                CanonicalField::Path => {
                    if input.path.is_empty() {
                        return Err(missing("path", input));
                    }
                    input.path.to_string()
                }
                CanonicalField::Identity => match input.identity {
                    Some(v) if !v.is_empty() => v.to_string(),
                    _ => return Err(missing("identity", input)),
                },
                CanonicalField::Expires => match input.expires {
                    Some(t) => t.timestamp().to_string(),
                    None => return Err(missing("expires", input)),
                },
                CanonicalField::ContentMd5 => header_or_empty(input.headers, "content-md5")?,
                CanonicalField::ContentType => {
                    header_or_empty(input.headers, http::header::CONTENT_TYPE.as_str())?
                }
                CanonicalField::Date => header_or_empty(input.headers, http::header::DATE.as_str())?,
                CanonicalField::Header(name) => header_or_empty(input.headers, name.as_str())?,
                CanonicalField::PrefixedHeaders(prefix) => {
                    let block = prefixed_headers(input.headers, prefix)?;
                    // An empty block contributes nothing, not even a delimiter.
                    if block.is_empty() {
                        continue;
                    }
                    block
                }
            };
            parts.push(value);
        }

        let mut s = parts.join(self.delimiter);
        if self.terminated && !s.is_empty() {
            s.push_str(self.delimiter);
        }
        log::trace!("canonical string for {} {}: {s:?}", input.method, input.path);
        Ok(s)
    }
}

fn missing(field: &str, input: &CanonicalInput<'_>) -> Error {
    Error::config_invalid(format!("canonical string requires {field}"))
        .with_context("method", input.method.as_str())
        .with_context("resource", input.path)
}

fn header_or_empty(headers: &HeaderMap, name: &str) -> Result<String> {
    match headers.get(name) {
        Some(v) => Ok(v.to_str()?.trim().to_string()),
        None => Ok(String::new()),
    }
}

fn prefixed_headers(headers: &HeaderMap, prefix: &str) -> Result<String> {
    let mut pairs = Vec::new();
    for name in headers.keys() {
        if !name.as_str().starts_with(prefix) {
            continue;
        }
        // Repeated headers fold into one comma separated value.
        let values = headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().map(|v| v.trim().to_string()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        pairs.push((name.as_str().to_string(), values.join(",")));
    }
    pairs.sort();

    Ok(pairs
        .into_iter()
        .map(|(k, v)| format!("{k}:{v}"))
        .collect::<Vec<_>>()
        .join("\n"))
}

/// How a provider lays out blob resource paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathLayout {
    /// `<prefix>/<container>/<name>`, the prefix may be empty.
    Prefixed(String),
    /// `<container>/<name>` without a leading slash.
    Relative,
}

/// Build the canonical resource path of a blob.
///
/// Neither `container` nor `name` is percent encoded here; providers encode
/// the request URI separately when they need to.
pub fn blob_path(layout: &PathLayout, container: &str, name: Option<&str>) -> Result<String> {
    if container.is_empty() {
        return Err(Error::config_invalid("container name must not be empty"));
    }

    let mut path = match layout {
        PathLayout::Prefixed(prefix) => {
            let prefix = prefix.trim_end_matches('/');
            format!("{prefix}/{container}")
        }
        PathLayout::Relative => container.to_string(),
    };
    if let Some(name) = name {
        path.push('/');
        path.push_str(name.trim_start_matches('/'));
    }

    Ok(path)
}
