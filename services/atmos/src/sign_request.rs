use std::time::Duration;

use async_trait::async_trait;
use cloudsign_core::canonical::{CanonicalField, CanonicalInput, CanonicalStringSpec};
use cloudsign_core::signature::{SecretEncoding, SignatureAlgorithm};
use cloudsign_core::time::{add_duration, format_http_date, now, DateTime};
use cloudsign_core::utils::QUERY_ENCODE_SET;
use cloudsign_core::{Context, Error, Result, SignRequest, SigningRequest};
use http::header::{self, HeaderMap};
use http::request::Parts;
use log::trace;
use percent_encoding::utf8_percent_encode;

use crate::constants::*;
use crate::{Config, Credential};

/// RequestSigner for EMC Atmos.
///
/// Requests without expiry are signed with the `x-emc-signature` header.
/// Requests with expiry become shareable urls carrying `uid`, `expires`
/// and `signature` query parameters.
#[derive(Debug)]
pub struct RequestSigner {
    algorithm: SignatureAlgorithm,
    secret_encoding: SecretEncoding,
    time: Option<DateTime>,
}

impl Default for RequestSigner {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RequestSigner {
    /// Create a signer with the default url signing algorithm.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a signer using the url signing settings of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            algorithm: config.algorithm,
            secret_encoding: config.secret_encoding,
            time: None,
        }
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

        let mut ctx = SigningRequest::build(req)?;
        let now_time = self.time.unwrap_or_else(now);

        match expires_in {
            Some(d) => {
                let expires_at = add_duration(now_time, d)?;
                sign_query(
                    &mut ctx,
                    cred,
                    expires_at,
                    self.algorithm,
                    self.secret_encoding,
                )?
            }
            None => sign_header(&mut ctx, cred, now_time)?,
        }

        ctx.apply(req)
    }
}

/// Sign `ctx` with `x-emc-*` headers.
///
/// ```text
/// METHOD + "\n" +
/// Content-Type + "\n" +
/// Range + "\n" +
/// Date + "\n" +
/// lowercase(path) + "\n" +
/// sorted x-emc-* headers joined by "\n"
/// ```
///
/// The secret is Base64 decoded and the signature is HMAC-SHA1.
pub(crate) fn sign_header(ctx: &mut SigningRequest, cred: &Credential, now_time: DateTime) -> Result<()> {
    let date = format_http_date(now_time);
    ctx.header_insert(header::DATE, &date, false)?;
    ctx.header_insert(X_EMC_DATE, &date, false)?;
    ctx.header_insert(X_EMC_UID, &cred.uid, false)?;
    ctx.headers.remove(X_EMC_SIGNATURE);

    let spec = CanonicalStringSpec::new(
        vec![
            CanonicalField::Method,
            CanonicalField::ContentType,
            CanonicalField::Header(header::RANGE),
            CanonicalField::Date,
            CanonicalField::Path,
            CanonicalField::PrefixedHeaders(X_EMC_PREFIX.to_string()),
        ],
        "\n",
    );
    let path = ctx.path.to_lowercase();
    let string_to_sign = spec.build(&CanonicalInput::new(&ctx.method, &path, &ctx.headers))?;
    trace!("string to sign: {string_to_sign}");

    let key = SecretEncoding::Base64.decode(&cred.secret)?;
    let signature = SignatureAlgorithm::HmacSha1Base64.sign(&key, &string_to_sign)?;
    ctx.header_insert(X_EMC_SIGNATURE, &signature, true)
}

/// Append `uid`, `expires` and `signature` to `ctx`.
///
/// The signed string is `METHOD\nlowercase(path)\nuid\nexpires`.
pub(crate) fn sign_query(
    ctx: &mut SigningRequest,
    cred: &Credential,
    expires_at: DateTime,
    algorithm: SignatureAlgorithm,
    secret_encoding: SecretEncoding,
) -> Result<()> {
    let path = ctx.path.to_lowercase();
    let empty = HeaderMap::new();
    let string_to_sign = CanonicalStringSpec::path_query().build(
        &CanonicalInput::new(&ctx.method, &path, &empty)
            .with_identity(&cred.uid)
            .with_expires(expires_at),
    )?;
    trace!("string to sign: {string_to_sign}");

    let key = secret_encoding.decode(&cred.secret)?;
    let signature = algorithm.sign(&key, &string_to_sign)?;

    ctx.query_push(
        QUERY_UID,
        utf8_percent_encode(&cred.uid, QUERY_ENCODE_SET).to_string(),
    );
    ctx.query_push(QUERY_EXPIRES, expires_at.timestamp().to_string());
    ctx.query_push(
        QUERY_SIGNATURE,
        utf8_percent_encode(&signature, QUERY_ENCODE_SET).to_string(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsign_core::time::from_timestamp;
    use http::Request;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_sign_header() {
        let _ = env_logger::builder().is_test(true).try_init();

        let cred = Credential::new("tenant/user", "c2VjcmV0c2VjcmV0");
        let signer = RequestSigner::new().with_time(from_timestamp(1_700_000_000).unwrap());

        let req = Request::get("https://atmos.example.com/rest/namespace/Container/name")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        signer
            .sign_request(&Context::new(), &mut parts, Some(&cred), None)
            .await
            .unwrap();

        assert_eq!(parts.headers[X_EMC_UID], "tenant/user");
        assert_eq!(parts.headers[X_EMC_DATE], "Tue, 14 Nov 2023 22:13:20 GMT");
        assert_eq!(parts.headers[X_EMC_SIGNATURE], "QjI94r/V9lip4xIJL9p3JE8i9LM=");
        assert!(parts.headers[X_EMC_SIGNATURE].is_sensitive());
        assert_eq!(parts.uri.path(), "/rest/namespace/Container/name");
    }

    #[tokio::test]
    async fn test_sign_query() {
        let cred = Credential::new("identity", "secret");
        let signer = RequestSigner::new().with_time(from_timestamp(1_699_999_000).unwrap());

        let req = Request::get("https://atmos.example.com/rest/namespace/container/name")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        signer
            .sign_request(
                &Context::new(),
                &mut parts,
                Some(&cred),
                Some(Duration::from_secs(1000)),
            )
            .await
            .unwrap();

        assert_eq!(
            parts.uri.query(),
            Some(
                "uid=identity&expires=1700000000&signature=xTPa2CkJXbWoJ8Rf8mUdQQQAwBQXneYAw1fYoToyVkc%3D"
            )
        );
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let (mut parts, _) = Request::get("https://atmos.example.com/rest/namespace/c/n")
            .body(())
            .unwrap()
            .into_parts();
        let err = RequestSigner::new()
            .sign_request(&Context::new(), &mut parts, None, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), cloudsign_core::ErrorKind::CredentialInvalid);
    }
}
