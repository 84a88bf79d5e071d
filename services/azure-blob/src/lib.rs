//! Azure Blob Storage signer
//!
//! This crate provides signing capabilities for Azure Blob Storage:
//!
//! - Shared Key authentication for regular requests
//! - Service SAS for time-boxed blob URLs
//! - Pre-issued SAS token authentication
//!
//! # Example
//!
//! ```rust,no_run
//! use cloudsign_azure_blob::{BlobRequestSigner, Config, DefaultCredentialProvider};
//! use cloudsign_core::{BlobSigner, Context, OsEnv, Result};
//!
//! # async fn example() -> Result<()> {
//! let ctx = Context::new().with_env(OsEnv);
//! let config = Config::default().from_env(&ctx);
//!
//! let signer = BlobSigner::new(
//!     ctx,
//!     DefaultCredentialProvider::new(&config),
//!     BlobRequestSigner::from_config(&config)?,
//! );
//!
//! let signed = signer.sign_get_blob("container", "blob").await?;
//! println!("{}", signed.uri);
//! # Ok(())
//! # }
//! ```

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
