//! B2 native API calls made while signing.

use bytes::Bytes;
use cloudsign_core::{Context, Error, Result, EXPIRED_AUTH_TOKEN};
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method, Response, StatusCode};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::constants::*;
use crate::Session;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuthorizeAccountResponse {
    pub account_id: String,
    pub authorization_token: String,
    pub api_url: String,
    pub download_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListBucketsResponse {
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Bucket {
    pub bucket_id: String,
    pub bucket_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DownloadAuthorizationResponse {
    pub authorization_token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct UploadUrlResponse {
    pub upload_url: String,
    pub authorization_token: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// POST `body` to API operation `op` with the session token.
pub(crate) async fn call<T: DeserializeOwned>(
    ctx: &Context,
    session: &Session,
    op: &str,
    body: serde_json::Value,
) -> Result<T> {
    let url = format!(
        "{}{API_PREFIX}/{op}",
        session.api_url.to_string().trim_end_matches('/')
    );
    let mut token = HeaderValue::from_str(&session.authorization_token)?;
    token.set_sensitive(true);

    debug!("calling b2 {op}");
    let req = http::Request::builder()
        .method(Method::POST)
        .uri(&url)
        .header(AUTHORIZATION, token)
        .header(CONTENT_TYPE, "application/json")
        .body(Bytes::from(body.to_string()))?;
    let resp = ctx.http_send(req).await?;

    parse(op, resp)
}

/// Decode a successful response, or map the B2 error body.
pub(crate) fn parse<T: DeserializeOwned>(op: &str, resp: Response<Bytes>) -> Result<T> {
    let status = resp.status();
    if status.is_success() {
        return serde_json::from_slice(resp.body()).map_err(|e| {
            Error::unexpected(format!("failed to parse {op} response")).with_source(e)
        });
    }

    let err: ErrorResponse = serde_json::from_slice(resp.body()).unwrap_or_default();
    let message = format!("{op} failed: {} {}", err.code, err.message);
    let err = match status {
        StatusCode::UNAUTHORIZED if err.code == EXPIRED_AUTH_TOKEN => {
            Error::credential_expired(message)
        }
        StatusCode::UNAUTHORIZED => Error::credential_denied(message),
        _ => Error::unexpected(message),
    };
    Err(err.with_context("status", status.as_str()))
}
