//! Backblaze B2 signer
//!
//! B2 has no stateless request signatures. Everything goes through an
//! account session from `b2_authorize_account`:
//!
//! - GET is authorized with a download token scoped to one file.
//! - PUT becomes a `POST` to a freshly minted upload url.
//! - [`B2UploadTargets`] re-mints upload urls when a pod fails.
//!
//! ## Example
//!
//! ```no_run
//! use cloudsign_b2::{AuthorizeAccountProvider, BlobRequestSigner, Config};
//! use cloudsign_core::{BlobSigner, Context, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new();
//!     let config = Config::default().from_env(&ctx);
//!
//!     let signer = BlobSigner::new(
//!         ctx,
//!         AuthorizeAccountProvider::new(config),
//!         BlobRequestSigner::new(),
//!     );
//!
//!     let signed = signer.sign_get_blob("bucket", "object").await?;
//!     println!("{}", signed.uri);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

mod api;
mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::Session;

mod provide_credential;
pub use provide_credential::*;

mod sign_blob;
pub use sign_blob::BlobRequestSigner;

mod upload;
pub use upload::B2UploadTargets;
