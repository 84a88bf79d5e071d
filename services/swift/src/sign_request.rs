use std::time::Duration;

use async_trait::async_trait;
use cloudsign_core::canonical::{CanonicalInput, CanonicalStringSpec};
use cloudsign_core::signature::SignatureAlgorithm;
use cloudsign_core::time::{add_duration, now, DateTime};
use cloudsign_core::{Context, Error, Result, SessionCache, SignRequest, SigningRequest};
use http::request::Parts;
use http::HeaderMap;
use log::debug;
use percent_encoding::percent_decode_str;

use crate::constants::*;
use crate::{Session, TempUrlKey};

/// RequestSigner for Swift.
///
/// Requests without expiry carry the session's `X-Auth-Token`. Requests with
/// expiry become temporary urls signed with the account key.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    keys: SessionCache<TempUrlKey>,
    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a signer reading temporary URL keys from `keys`.
    pub fn new(keys: SessionCache<TempUrlKey>) -> Self {
        Self { keys, time: None }
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
    type Credential = Session;

    async fn sign_request(
        &self,
        ctx: &Context,
        req: &mut Parts,
        credential: Option<&Self::Credential>,
        expires_in: Option<Duration>,
    ) -> Result<()> {
        let mut signing = SigningRequest::build(req)?;

        match expires_in {
            Some(d) => {
                let expires_at = add_duration(self.time.unwrap_or_else(now), d)?;
                let key = self.keys.get(ctx).await?;
                sign_temp_url(&mut signing, &key, expires_at)?;
            }
            None => {
                let Some(session) = credential else {
                    return Err(Error::credential_invalid("credential is required"));
                };
                sign_token(&mut signing, session)?;
            }
        }

        signing.apply(req)
    }
}

/// Attach `X-Auth-Token`.
pub(crate) fn sign_token(ctx: &mut SigningRequest, session: &Session) -> Result<()> {
    ctx.header_insert(X_AUTH_TOKEN, &session.token, true)
}

/// Append `temp_url_sig` and `temp_url_expires`.
///
/// The signature is the hex HMAC-SHA1 of `METHOD\nEXPIRES\nPATH` with the
/// decoded request path.
pub(crate) fn sign_temp_url(
    ctx: &mut SigningRequest,
    key: &TempUrlKey,
    expires_at: DateTime,
) -> Result<()> {
    let path = percent_decode_str(&ctx.path).decode_utf8_lossy();
    let empty = HeaderMap::new();
    let string_to_sign = CanonicalStringSpec::temporary_url()
        .build(&CanonicalInput::new(&ctx.method, &path, &empty).with_expires(expires_at))?;
    debug!("temp url for {} {path} expires at {expires_at}", ctx.method);

    let signature = SignatureAlgorithm::HmacSha1Hex.sign(key.0.as_bytes(), &string_to_sign)?;
    ctx.query_push(TEMP_URL_SIG, signature);
    ctx.query_push(TEMP_URL_EXPIRES, expires_at.timestamp().to_string());
    Ok(())
}
