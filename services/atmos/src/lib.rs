//! EMC Atmos signer
//!
//! This crate signs requests against Atmos namespace objects:
//!
//! - Shareable urls with `uid`, `expires` and `signature` query parameters
//!   for GET and DELETE.
//! - `x-emc-*` header signatures for everything else, including PUT.
//!
//! ## Example
//!
//! ```no_run
//! use cloudsign_atmos::{BlobRequestSigner, Config, DefaultCredentialProvider};
//! use cloudsign_core::{BlobSigner, Context, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new();
//!     let config = Config::default().from_env(&ctx);
//!
//!     let signer = BlobSigner::new(
//!         ctx,
//!         DefaultCredentialProvider::new(&config),
//!         BlobRequestSigner::from_config(&config)?,
//!     );
//!
//!     let signed = signer.sign_get_blob("container", "object").await?;
//!     println!("{}", signed.uri);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Credential;

mod provide_credential;
pub use provide_credential::*;

mod sign_request;
pub use sign_request::RequestSigner;

mod sign_blob;
pub use sign_blob::BlobRequestSigner;
