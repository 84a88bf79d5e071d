//! Google Cloud Storage signer
//!
//! - OAuth2 access tokens minted from a service account JWT assertion
//! - V2 signed URLs for time-boxed blob requests
//!
//! # Example
//!
//! ```rust,no_run
//! use cloudsign_core::{BlobSigner, Context, OsEnv, Result};
//! use cloudsign_google::{BlobRequestSigner, Config, ServiceAccountCredentialProvider};
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let config = Config::default().from_env(&ctx);
//!
//! let signer = BlobSigner::new(
//!     ctx,
//!     ServiceAccountCredentialProvider::new(config.clone()),
//!     BlobRequestSigner::from_config(&config)?,
//! );
//!
//! let signed = signer.sign_get_blob("bucket", "object").await?;
//! println!("{}", signed.uri);
//! # Ok(())
//! # }
//! ```

mod constants;

mod config;
pub use config::Config;

mod credential;
pub use credential::{Credential, ServiceAccount, Token};

mod provide_credential;
pub use provide_credential::*;

mod sign_request;
pub use sign_request::RequestSigner;

mod sign_blob;
pub use sign_blob::BlobRequestSigner;
