//! Core components for signing blob storage API requests.
//!
//! This crate provides the foundational types and traits shared by every
//! cloudsign provider crate:
//!
//! - [`Context`] carries the [`HttpSend`] and [`Env`] implementations used
//!   while authenticating.
//! - [`ProvideCredential`] loads or mints credentials, [`SessionCache`]
//!   caches them with single-flight refresh.
//! - [`SignRequest`] signs arbitrary requests through [`Signer`].
//! - [`SignBlobRequest`] signs blob operations through [`BlobSigner`].
//! - [`ServiceCatalog`] resolves endpoints returned by authentication.
//! - [`UploadRetryFilter`] rotates per-upload targets on node failures.
//!
//! ## Example
//!
//! ```no_run
//! use cloudsign_core::{Context, ProvideCredential, Result, SignRequest, Signer, SigningCredential};
//! use async_trait::async_trait;
//! use http::request::Parts;
//! use std::time::Duration;
//!
//! #[derive(Clone, Debug)]
//! struct MyCredential {
//!     key: String,
//!     secret: String,
//! }
//!
//! impl SigningCredential for MyCredential {
//!     fn is_valid(&self) -> bool {
//!         !self.key.is_empty() && !self.secret.is_empty()
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyLoader;
//!
//! #[async_trait]
//! impl ProvideCredential for MyLoader {
//!     type Credential = MyCredential;
//!
//!     async fn provide_credential(&self, _: &Context) -> Result<Option<Self::Credential>> {
//!         Ok(Some(MyCredential {
//!             key: "my-access-key".to_string(),
//!             secret: "my-secret-key".to_string(),
//!         }))
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct MyBuilder;
//!
//! #[async_trait]
//! impl SignRequest for MyBuilder {
//!     type Credential = MyCredential;
//!
//!     async fn sign_request(
//!         &self,
//!         _ctx: &Context,
//!         req: &mut Parts,
//!         credential: Option<&Self::Credential>,
//!         _expires_in: Option<Duration>,
//!     ) -> Result<()> {
//!         if let Some(cred) = credential {
//!             req.headers.insert("x-key", cred.key.parse()?);
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<()> {
//! let signer = Signer::new(Context::new(), MyLoader, MyBuilder);
//!
//! let mut parts = http::Request::get("https://example.com")
//!     .body(())?
//!     .into_parts()
//!     .0;
//! signer.sign(&mut parts, None).await?;
//! # Ok(())
//! # }
//! ```

// Make sure all our public APIs have docs.
#![warn(missing_docs)]

pub mod canonical;
pub mod hash;
pub mod signature;
pub mod time;
pub mod utils;

mod error;
pub use error::{Error, ErrorKind, Result};
mod context;
pub use context::{Context, Env, HttpSend, NoopEnv, NoopHttpSend, OsEnv, StaticEnv};
mod api;
pub use api::{ProvideCredential, ProvideCredentialChain, SignRequest, SigningCredential};
mod request;
pub use request::{SignedRequest, SigningRequest};
mod session;
pub use session::{is_fresh, SessionCache, EXPIRY_GRACE};
mod signer;
pub use signer::Signer;
mod catalog;
pub use catalog::{normalize_version, InterfaceKind, ServiceCatalog, ServiceEndpoint};
mod blob;
pub use blob::{
    BlobCapabilities, BlobMetadata, BlobOperation, BlobRequest, BlobSigner, GetOptions,
    SignBlobRequest, SigningStyle, DEFAULT_TTL,
};
mod upload;
pub use upload::{
    MintUploadTarget, RetryDecision, UploadKind, UploadRetryFilter, UploadTarget,
    EXPIRED_AUTH_TOKEN,
};
