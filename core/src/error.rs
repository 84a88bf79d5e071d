use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The error type for cloudsign operations
#[derive(Error, Debug)]
#[error("{message}{}", render_context(.context))]
pub struct Error {
    kind: ErrorKind,
    message: String,
    context: Vec<(&'static str, String)>,
    #[source]
    source: Option<anyhow::Error>,
}

/// The kind of error that occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Configuration error (missing fields, empty secrets, invalid values)
    ConfigInvalid,

    /// Credentials exist but are invalid/malformed
    CredentialInvalid,

    /// Credentials are expired
    CredentialExpired,

    /// Authentication or signing was rejected by the provider (401/403)
    CredentialDenied,

    /// Request cannot be signed (missing required fields, etc.)
    RequestInvalid,

    /// No catalog entry matches the requested service type or version
    EndpointNotFound,

    /// The requested element (usually a region) is absent from a resolved set
    NotFound,

    /// The provider defines no signing contract for this operation
    Unsupported,

    /// Waiting for a shared refresh took longer than allowed
    Timeout,

    /// An upload target kept failing after being re-minted
    UploadTargetExpired,

    /// Unexpected errors (network, I/O, service errors, etc.)
    Unexpected,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            context: Vec::new(),
            source: None,
        }
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach a key/value pair describing the failed operation.
    ///
    /// Never pass secrets or signatures here, the context is part of the
    /// rendered message.
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message without context.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the attached context pairs.
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Check if this is a credential error
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::CredentialInvalid
                | ErrorKind::CredentialExpired
                | ErrorKind::CredentialDenied
        )
    }

    /// Check if retrying the same operation later could succeed.
    ///
    /// Configuration, canonicalization and unsupported-operation errors are
    /// programmer errors and never temporary.
    pub fn is_temporary(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Timeout | ErrorKind::CredentialExpired | ErrorKind::Unexpected
        )
    }

    /// Build an owned copy of a shared error, keeping the original as source.
    ///
    /// Used to hand one failed refresh outcome to every waiter.
    pub fn from_shared(err: Arc<Error>) -> Self {
        let mut e = Self::new(err.kind, err.message.clone());
        e.context = err.context.clone();
        e.with_source(err)
    }
}

// Convenience constructors
impl Error {
    /// Create a config invalid error
    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, message)
    }

    /// Create a credential invalid error
    pub fn credential_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialInvalid, message)
    }

    /// Create a credential expired error
    pub fn credential_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialExpired, message)
    }

    /// Create a credential denied error
    pub fn credential_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CredentialDenied, message)
    }

    /// Create a request invalid error
    pub fn request_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RequestInvalid, message)
    }

    /// Create an endpoint not found error
    pub fn endpoint_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EndpointNotFound, message)
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    /// Create an upload target expired error
    pub fn upload_target_expired(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UploadTargetExpired, message)
    }

    /// Create an unexpected error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConfigInvalid => write!(f, "invalid configuration"),
            ErrorKind::CredentialInvalid => write!(f, "invalid credentials"),
            ErrorKind::CredentialExpired => write!(f, "expired credentials"),
            ErrorKind::CredentialDenied => write!(f, "credential access denied"),
            ErrorKind::RequestInvalid => write!(f, "invalid request"),
            ErrorKind::EndpointNotFound => write!(f, "endpoint not found"),
            ErrorKind::NotFound => write!(f, "not found"),
            ErrorKind::Unsupported => write!(f, "unsupported operation"),
            ErrorKind::Timeout => write!(f, "timed out"),
            ErrorKind::UploadTargetExpired => write!(f, "upload target expired"),
            ErrorKind::Unexpected => write!(f, "unexpected error"),
        }
    }
}

fn render_context(context: &[(&'static str, String)]) -> String {
    if context.is_empty() {
        return String::new();
    }

    let pairs = context
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" ({pairs})")
}

/// Convenience type alias for Results
pub type Result<T> = std::result::Result<T, Error>;

// Common From implementations
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(err)
    }
}

impl From<std::fmt::Error> for Error {
    fn from(err: std::fmt::Error) -> Self {
        Self::unexpected(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::Error> for Error {
    fn from(err: http::Error) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderValue> for Error {
    fn from(err: http::header::InvalidHeaderValue) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::InvalidHeaderName> for Error {
    fn from(err: http::header::InvalidHeaderName) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::header::ToStrError> for Error {
    fn from(err: http::header::ToStrError) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUri> for Error {
    fn from(err: http::uri::InvalidUri) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

impl From<http::uri::InvalidUriParts> for Error {
    fn from(err: http::uri::InvalidUriParts) -> Self {
        Self::request_invalid(err.to_string()).with_source(anyhow::Error::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_context() {
        let err = Error::unsupported("time-boxed PUT signing is not supported")
            .with_context("method", "PUT")
            .with_context("resource", "/container/name");

        assert_eq!(
            err.to_string(),
            "time-boxed PUT signing is not supported (method: PUT, resource: /container/name)"
        );
        assert_eq!(err.kind(), ErrorKind::Unsupported);
        assert!(!err.is_temporary());
    }

    #[test]
    fn test_from_shared_keeps_kind_and_context() {
        let shared = Arc::new(
            Error::credential_denied("authentication rejected").with_context("status", "401"),
        );
        let err = Error::from_shared(shared);

        assert_eq!(err.kind(), ErrorKind::CredentialDenied);
        assert!(err.is_credential_error());
        assert_eq!(err.to_string(), "authentication rejected (status: 401)");
        assert!(std::error::Error::source(&err).is_some());
    }
}
