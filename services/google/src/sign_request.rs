use std::time::Duration;

use async_trait::async_trait;
use cloudsign_core::canonical::{CanonicalInput, CanonicalStringSpec};
use cloudsign_core::hash::base64_encode;
use cloudsign_core::time::{add_duration, now, DateTime};
use cloudsign_core::{Context, Error, Result, SignRequest, SigningRequest};
use http::header::AUTHORIZATION;
use http::request::Parts;
use log::debug;
use percent_encoding::utf8_percent_encode;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{RandomizedSigner, SignatureEncoding};

use crate::constants::*;
use crate::credential::{Credential, ServiceAccount, Token};

/// RequestSigner for Google Cloud Storage requests.
///
/// Requests without expiry carry the access token as a bearer
/// `Authorization` header. Requests with expiry become V2 signed URLs.
#[derive(Debug, Clone, Default)]
pub struct RequestSigner {
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new signer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut Parts,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let Some(cred) = credential else {
            return Err(Error::credential_invalid("credential is required"));
        };
        let mut signing = SigningRequest::build(req)?;

        match expires_in {
            Some(d) => {
                let now = self.time.unwrap_or_else(now);
                sign_v2_url(&mut signing, &cred.service_account, now, add_duration(now, d)?)?;
            }
            None => sign_bearer(&mut signing, &cred.token)?,
        }

        signing.apply(req)
    }
}

/// Attach `Authorization: Bearer <token>`.
pub(crate) fn sign_bearer(ctx: &mut SigningRequest, token: &Token) -> Result<()> {
    ctx.header_insert(
        AUTHORIZATION,
        &format!("Bearer {}", token.access_token),
        true,
    )
}

/// Append `GoogleAccessId`, `Expires` and `Signature`.
///
/// The signature is the Base64 RSA-SHA256 of
/// `METHOD\nMD5\nTYPE\nEXPIRES\n[x-goog-* headers\n]PATH`.
pub(crate) fn sign_v2_url(
    ctx: &mut SigningRequest,
    sa: &ServiceAccount,
    now: DateTime,
    expires_at: DateTime,
) -> Result<()> {
    let lifetime = (expires_at - now).num_seconds();
    if lifetime > MAX_SIGNED_URL_SECS {
        return Err(Error::request_invalid(format!(
            "signed url lifetime {lifetime}s exceeds the 7 day limit"
        ))
        .with_context("method", ctx.method.as_str())
        .with_context("resource", ctx.path.as_str()));
    }

    let string_to_sign = CanonicalStringSpec::signed_url(X_GOOG_PREFIX).build(
        &CanonicalInput::new(&ctx.method, &ctx.path, &ctx.headers).with_expires(expires_at),
    )?;
    debug!(
        "signed url for {} {} expires at {expires_at}",
        ctx.method, ctx.path
    );
    let signature = rsa_sha256(&sa.private_key, &string_to_sign)?;

    ctx.query_push(
        GOOGLE_ACCESS_ID,
        utf8_percent_encode(&sa.client_email, &GOOG_QUERY_ENCODE_SET).to_string(),
    );
    ctx.query_push(EXPIRES, expires_at.timestamp().to_string());
    ctx.query_push(
        SIGNATURE,
        utf8_percent_encode(&signature, &GOOG_QUERY_ENCODE_SET).to_string(),
    );
    Ok(())
}

/// Base64 PKCS#1 v1.5 RSA-SHA256 signature of `content`.
fn rsa_sha256(private_key: &str, content: &str) -> Result<String> {
    let key = rsa::RsaPrivateKey::from_pkcs8_pem(private_key).map_err(|e| {
        Error::credential_invalid("failed to parse RSA private key").with_source(e)
    })?;
    let signing_key = SigningKey::<sha2::Sha256>::new(key);
    let signature = signing_key.sign_with_rng(&mut rand::thread_rng(), content.as_bytes());
    Ok(base64_encode(&signature.to_bytes()))
}
