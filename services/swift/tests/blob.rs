// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use cloudsign_core::signature::SignatureAlgorithm;
use cloudsign_core::{BlobMetadata, BlobSigner, Context, ErrorKind, HttpSend, Result, SessionCache};
use cloudsign_swift::{BlobRequestSigner, Config, KeystoneCredentialProvider, Session};
use http::{Method, StatusCode};
use pretty_assertions::assert_eq;

const CATALOG: &str = r#"{
    "token": {
        "issued_at": "2030-01-01T00:00:00.000000Z",
        "expires_at": "2099-01-01T00:00:00.000000Z",
        "catalog": [
            {
                "type": "object-store",
                "endpoints": [
                    { "interface": "public", "region": "RegionOne", "url": "https://one.example.com/v1/AUTH_demo" },
                    { "interface": "public", "region": "RegionTwo", "url": "https://two.example.com/v1/AUTH_demo" }
                ]
            }
        ]
    }
}"#;

#[derive(Debug, Default)]
struct MockSwift {
    auths: AtomicUsize,
    heads: AtomicUsize,
    /// Number of account HEADs answered with 401.
    rejected_heads: AtomicUsize,
    deny: bool,
}

#[async_trait]
impl HttpSend for MockSwift {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        let (method, path) = (req.method(), req.uri().path());

        if method == Method::POST && path == "/v3/auth/tokens" {
            let n = self.auths.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::task::yield_now().await;
            if self.deny {
                return Ok(http::Response::builder()
                    .status(StatusCode::UNAUTHORIZED)
                    .body(Bytes::new())?);
            }
            let body: serde_json::Value = serde_json::from_slice(req.body()).unwrap();
            assert_eq!(
                body["auth"]["identity"]["password"]["user"]["name"],
                "demo"
            );
            return Ok(http::Response::builder()
                .header("x-subject-token", format!("session-token-{n}"))
                .body(Bytes::from_static(CATALOG.as_bytes()))?);
        }

        if method == Method::HEAD && path == "/v1/AUTH_demo" {
            self.heads.fetch_add(1, Ordering::SeqCst);
            assert_eq!(req.uri().host(), Some("two.example.com"));
            let token = req.headers()["x-auth-token"].to_str().unwrap();
            assert!(token.starts_with("session-token-"));
            let rejected = self
                .rejected_heads
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if rejected {
                return Ok(http::Response::builder()
                    .status(StatusCode::UNAUTHORIZED)
                    .body(Bytes::new())?);
            }
            return Ok(http::Response::builder()
                .header("x-account-meta-temp-url-key", "mykey")
                .body(Bytes::new())?);
        }

        panic!("unexpected request {method} {path}")
    }
}

fn config() -> Config {
    Config::default()
        .with_auth_url("https://keystone.example.com/v3")
        .with_user("demo", "secret")
        .with_project_name("demo")
        .with_region("RegionTwo")
}

fn signer(mock: Arc<MockSwift>) -> (BlobSigner<Session>, SessionCache<Session>) {
    let ctx = Context::new().with_http_send(SharedMock(mock));
    let config = config();
    let sessions = SessionCache::new(KeystoneCredentialProvider::new(config.clone()));
    let signer = BlobSigner::with_session(
        ctx,
        sessions.clone(),
        BlobRequestSigner::new(config, sessions.clone()),
    );
    (signer, sessions)
}

#[derive(Debug)]
struct SharedMock(Arc<MockSwift>);

#[async_trait]
impl HttpSend for SharedMock {
    async fn http_send(&self, req: http::Request<Bytes>) -> Result<http::Response<Bytes>> {
        self.0.http_send(req).await
    }
}

#[tokio::test]
async fn test_get_blob_is_temp_url() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mock = Arc::new(MockSwift::default());
    let (signer, _) = signer(mock.clone());

    let signed = signer.sign_get_blob("container", "dir/name").await.unwrap();
    assert_eq!(signed.uri.host(), Some("two.example.com"));
    assert_eq!(signed.uri.path(), "/v1/AUTH_demo/container/dir/name");

    let expires = signed.expires().unwrap();
    assert_eq!(
        signed.query_param("temp_url_expires"),
        Some(expires.to_string())
    );
    let expected = SignatureAlgorithm::HmacSha1Hex
        .sign(
            b"mykey",
            &format!("GET\n{expires}\n/v1/AUTH_demo/container/dir/name"),
        )
        .unwrap();
    assert_eq!(signed.query_param("temp_url_sig"), Some(expected));
    assert!(!signed.headers.contains_key("x-auth-token"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_signing_authenticates_once() {
    let mock = Arc::new(MockSwift::default());
    let (signer, sessions) = signer(mock.clone());

    let tasks = (0..16)
        .map(|i| {
            let signer = signer.clone();
            tokio::spawn(async move { signer.sign_get_blob("c", &format!("o{i}")).await })
        })
        .collect::<Vec<_>>();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(mock.auths.load(Ordering::SeqCst), 1);
    assert_eq!(mock.heads.load(Ordering::SeqCst), 1);
    assert_eq!(sessions.refresh_count(), 1);
}

#[tokio::test]
async fn test_put_and_remove() {
    let mock = Arc::new(MockSwift::default());
    let (signer, _) = signer(mock.clone());

    let blob = BlobMetadata::new("name").with_user_metadata("Color", "blue");
    let signed = signer.sign_put_blob("container", &blob).await.unwrap();
    assert_eq!(signed.method, Method::PUT);
    assert_eq!(signed.headers["x-auth-token"], "session-token-1");
    assert_eq!(signed.headers["x-object-meta-color"], "blue");
    assert_eq!(signed.uri.query(), None);

    let signed = signer
        .sign_put_blob_with_ttl("container", &blob, std::time::Duration::from_secs(60))
        .await
        .unwrap();
    assert!(signed.query_param("temp_url_sig").is_some());

    let removed = signer.sign_remove_blob("container", "name").await.unwrap();
    assert_eq!(removed.method, Method::DELETE);
    assert!(removed.expires().is_some());
    assert!(removed.query_param("temp_url_sig").is_some());
}

#[tokio::test]
async fn test_rejected_session_reauthenticates() {
    let mock = Arc::new(MockSwift {
        rejected_heads: AtomicUsize::new(1),
        ..Default::default()
    });
    let (signer, sessions) = signer(mock.clone());

    let signed = signer.sign_get_blob("c", "o").await.unwrap();
    assert!(signed.query_param("temp_url_sig").is_some());
    assert_eq!(mock.auths.load(Ordering::SeqCst), 2);
    assert_eq!(mock.heads.load(Ordering::SeqCst), 2);
    assert_eq!(sessions.cached().unwrap().token, "session-token-2");

    // The fetched key and the new session are reused.
    signer.sign_get_blob("c", "p").await.unwrap();
    assert_eq!(mock.auths.load(Ordering::SeqCst), 2);
    assert_eq!(mock.heads.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_rejected_session_is_not_reused() {
    let mock = Arc::new(MockSwift {
        rejected_heads: AtomicUsize::new(2),
        ..Default::default()
    });
    let (signer, sessions) = signer(mock.clone());

    let err = signer.sign_get_blob("c", "o").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialExpired);
    assert_eq!(mock.auths.load(Ordering::SeqCst), 2);
    assert!(sessions.cached().is_none());

    // The next call authenticates against keystone again.
    signer.sign_get_blob("c", "o").await.unwrap();
    assert_eq!(mock.auths.load(Ordering::SeqCst), 3);
    assert_eq!(sessions.cached().unwrap().token, "session-token-3");
}

#[tokio::test]
async fn test_denied_credentials() {
    let mock = Arc::new(MockSwift {
        deny: true,
        ..Default::default()
    });
    let (signer, _) = signer(mock.clone());

    let err = signer.sign_get_blob("c", "o").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialDenied);

    // Failures are not cached.
    let _ = signer.sign_get_blob("c", "o").await.unwrap_err();
    assert_eq!(mock.auths.load(Ordering::SeqCst), 2);
}
