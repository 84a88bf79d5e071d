//! Signature algorithms over canonical strings.

use std::borrow::Cow;

use crate::hash::{
    base64_decode, base64_hmac_sha1, base64_hmac_sha256, hex_hmac_sha1, hex_hmac_sha256,
    hex_sha256,
};
use crate::{Error, Result};

/// MAC or digest used to turn a canonical string into a signature token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// HMAC-SHA1, Base64 encoded.
    HmacSha1Base64,
    /// HMAC-SHA1, lowercase hex encoded.
    HmacSha1Hex,
    /// HMAC-SHA256, Base64 encoded.
    HmacSha256Base64,
    /// HMAC-SHA256, lowercase hex encoded.
    HmacSha256Hex,
    /// Hex SHA-256 of `canonical + ":" + secret`.
    Sha256Digest,
}

impl SignatureAlgorithm {
    /// Sign `canonical` with `secret`.
    ///
    /// Fails with [`crate::ErrorKind::ConfigInvalid`] when `secret` is empty.
    pub fn sign(self, secret: &[u8], canonical: &str) -> Result<String> {
        if secret.is_empty() {
            return Err(Error::config_invalid("signing secret must not be empty")
                .with_context("algorithm", format!("{self:?}")));
        }

        log::trace!("signing canonical string with {self:?}: {canonical:?}");

        let content = canonical.as_bytes();
        let token = match self {
            SignatureAlgorithm::HmacSha1Base64 => base64_hmac_sha1(secret, content),
            SignatureAlgorithm::HmacSha1Hex => hex_hmac_sha1(secret, content),
            SignatureAlgorithm::HmacSha256Base64 => base64_hmac_sha256(secret, content),
            SignatureAlgorithm::HmacSha256Hex => hex_hmac_sha256(secret, content),
            SignatureAlgorithm::Sha256Digest => {
                let mut buf = Vec::with_capacity(content.len() + 1 + secret.len());
                buf.extend_from_slice(content);
                buf.push(b':');
                buf.extend_from_slice(secret);
                hex_sha256(&buf)
            }
        };

        Ok(token)
    }
}

/// How a configured secret maps to MAC key bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecretEncoding {
    /// Use the secret's UTF-8 bytes.
    #[default]
    Raw,
    /// The secret is Base64, decode before use.
    Base64,
}

impl SecretEncoding {
    /// Turn `secret` into key bytes.
    pub fn decode<'a>(self, secret: &'a str) -> Result<Cow<'a, [u8]>> {
        match self {
            SecretEncoding::Raw => Ok(Cow::Borrowed(secret.as_bytes())),
            SecretEncoding::Base64 => Ok(Cow::Owned(base64_decode(secret)?)),
        }
    }
}
