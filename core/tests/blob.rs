use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cloudsign_core::canonical::{blob_path, CanonicalInput, CanonicalStringSpec, PathLayout};
use cloudsign_core::signature::SignatureAlgorithm;
use cloudsign_core::time::now;
use cloudsign_core::{
    BlobCapabilities, BlobMetadata, BlobRequest, BlobSigner, Context, Error, ErrorKind,
    GetOptions, ProvideCredential, Result, SignBlobRequest, SignedRequest, SigningCredential,
    SigningRequest, SigningStyle,
};
use http::Method;
use pretty_assertions::assert_eq;

#[derive(Clone, Debug)]
struct Key {
    identity: String,
    secret: String,
}

impl SigningCredential for Key {
    fn is_valid(&self) -> bool {
        !self.secret.is_empty()
    }
}

#[derive(Debug)]
struct StaticKey(Arc<AtomicUsize>);

#[async_trait::async_trait]
impl ProvideCredential for StaticKey {
    type Credential = Key;

    async fn provide_credential(&self, _: &Context) -> Result<Option<Key>> {
        self.0.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Key {
            identity: "identity".to_string(),
            secret: "secret".to_string(),
        }))
    }
}

/// Minimal query signer without time-boxed PUT.
#[derive(Debug)]
struct QuerySigner;

#[async_trait::async_trait]
impl SignBlobRequest for QuerySigner {
    type Credential = Key;

    fn style(&self) -> SigningStyle {
        SigningStyle::Query
    }

    fn capabilities(&self) -> BlobCapabilities {
        BlobCapabilities {
            timeboxed_put: false,
            remove: true,
            expiring_remove: true,
        }
    }

    async fn sign_blob_request(
        &self,
        _: &Context,
        cred: &Key,
        req: BlobRequest,
    ) -> Result<SignedRequest> {
        let method = req.method();
        let path = blob_path(
            &PathLayout::Prefixed("/rest/namespace".to_string()),
            &req.container,
            Some(&req.name),
        )?;
        let mut signing = SigningRequest::from_endpoint(
            method.clone(),
            &"https://storage.example.com".parse()?,
            &path,
        )?;
        signing.headers = req.headers;

        if let Some(expires_at) = req.expires_at {
            let canonical = CanonicalStringSpec::path_query().build(
                &CanonicalInput::new(&method, &path, &signing.headers)
                    .with_identity(&cred.identity)
                    .with_expires(expires_at),
            )?;
            let signature =
                SignatureAlgorithm::HmacSha256Hex.sign(cred.secret.as_bytes(), &canonical)?;
            signing.query_push("uid", cred.identity.clone());
            signing.query_push("expires", expires_at.timestamp().to_string());
            signing.query_push("signature", signature);
        }

        signing.into_signed_request(req.expires_at)
    }
}

fn signer(calls: Arc<AtomicUsize>) -> BlobSigner<Key> {
    BlobSigner::new(Context::new(), StaticKey(calls), QuerySigner)
}

#[tokio::test]
async fn test_get_embeds_expiry_and_valid_signature() {
    let signer = signer(Arc::new(AtomicUsize::new(0)));

    let before = now().timestamp();
    let signed = signer
        .sign_get_blob_with_ttl("container", "name", Duration::from_secs(900))
        .await
        .unwrap();
    let after = now().timestamp();

    let expires = signed.expires().unwrap();
    assert!(expires >= before + 900 && expires <= after + 900);
    assert_eq!(signed.query_param("expires"), Some(expires.to_string()));
    assert_eq!(signed.query_param("uid").as_deref(), Some("identity"));

    let canonical = format!("GET\n/rest/namespace/container/name\nidentity\n{expires}");
    let expected = SignatureAlgorithm::HmacSha256Hex
        .sign(b"secret", &canonical)
        .unwrap();
    assert_eq!(signed.query_param("signature"), Some(expected));
    assert_eq!(signed.uri.host(), Some("storage.example.com"));
    assert_eq!(signed.uri.path(), "/rest/namespace/container/name");
}

#[tokio::test]
async fn test_default_ttl_is_fifteen_minutes() {
    let signer = signer(Arc::new(AtomicUsize::new(0)));

    let before = now().timestamp();
    let signed = signer.sign_get_blob("c", "n").await.unwrap();
    let expires = signed.expires().unwrap();
    assert!(expires - before >= 900 && expires - before <= 901);
}

#[tokio::test]
async fn test_timeboxed_put_is_always_unsupported() {
    let calls = Arc::new(AtomicUsize::new(0));
    let signer = signer(calls.clone());
    let blob = BlobMetadata::new("name").with_content_length(3);

    for _ in 0..3 {
        let err = signer
            .sign_put_blob_with_ttl("container", &blob, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unsupported);
    }
    // Refused before any credential was loaded.
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let signed = signer.sign_put_blob("container", &blob).await.unwrap();
    assert_eq!(signed.method, Method::PUT);
    assert_eq!(signed.expires(), None);
    assert_eq!(signed.headers["content-length"], "3");
}

#[tokio::test]
async fn test_options_and_remove() {
    let calls = Arc::new(AtomicUsize::new(0));
    let signer = signer(calls.clone());

    let signed = signer
        .sign_get_blob_with_options("c", "n", &GetOptions::new().with_range(0, Some(9)))
        .await
        .unwrap();
    assert_eq!(signed.expires(), None);
    assert_eq!(signed.headers["range"], "bytes=0-9");
    assert_eq!(signed.query_param("signature"), None);

    let removed = signer.sign_remove_blob("c", "n").await.unwrap();
    assert_eq!(removed.method, Method::DELETE);
    assert!(removed.expires().is_some());

    // Both calls shared one session.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(signer.style(), SigningStyle::Query);
}

#[tokio::test]
async fn test_empty_names_are_rejected() {
    let signer = signer(Arc::new(AtomicUsize::new(0)));

    let err = signer.sign_get_blob("", "n").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    assert!(err.to_string().contains("method: GET"));
}

/// Rejects the first `n` signing attempts as if the service refused the
/// credential, then signs like [`QuerySigner`].
#[derive(Debug)]
struct RejectFirst {
    remaining: AtomicUsize,
    kind: ErrorKind,
}

#[async_trait::async_trait]
impl SignBlobRequest for RejectFirst {
    type Credential = Key;

    fn style(&self) -> SigningStyle {
        SigningStyle::Query
    }

    fn capabilities(&self) -> BlobCapabilities {
        QuerySigner.capabilities()
    }

    async fn sign_blob_request(
        &self,
        ctx: &Context,
        cred: &Key,
        req: BlobRequest,
    ) -> Result<SignedRequest> {
        let rejected = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(match self.kind {
                ErrorKind::CredentialDenied => Error::credential_denied("token rejected"),
                _ => Error::credential_expired("token expired"),
            });
        }
        QuerySigner.sign_blob_request(ctx, cred, req).await
    }
}

fn rejecting_signer(
    calls: Arc<AtomicUsize>,
    rejections: usize,
    kind: ErrorKind,
) -> BlobSigner<Key> {
    BlobSigner::new(
        Context::new(),
        StaticKey(calls),
        RejectFirst {
            remaining: AtomicUsize::new(rejections),
            kind,
        },
    )
}

#[tokio::test]
async fn test_rejected_credential_is_refreshed_once() {
    for kind in [ErrorKind::CredentialExpired, ErrorKind::CredentialDenied] {
        let calls = Arc::new(AtomicUsize::new(0));
        let signer = rejecting_signer(calls.clone(), 1, kind);

        let signed = signer.sign_get_blob("c", "n").await.unwrap();
        assert!(signed.query_param("signature").is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(signer.session().refresh_count(), 2);
    }
}

#[tokio::test]
async fn test_repeated_rejection_is_reported_after_one_refresh() {
    let calls = Arc::new(AtomicUsize::new(0));
    let signer = rejecting_signer(calls.clone(), 5, ErrorKind::CredentialExpired);

    let err = signer.sign_get_blob("c", "n").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialExpired);
    assert!(err.to_string().contains("resource: c/n"));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
