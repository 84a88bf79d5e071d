//! OpenStack Swift signer
//!
//! Authenticates against Keystone v2 or v3, resolves the object store from
//! the returned catalog and signs object requests:
//!
//! - Time-boxed requests become temporary urls (`temp_url_sig`,
//!   `temp_url_expires`) signed with the account's temporary URL key.
//! - Other requests carry `X-Auth-Token`.
//!
//! ## Example
//!
//! ```no_run
//! use cloudsign_core::{BlobSigner, Context, Result, SessionCache};
//! use cloudsign_swift::{BlobRequestSigner, Config, KeystoneCredentialProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let ctx = Context::new();
//!     let config = Config::default().from_env(&ctx);
//!
//!     let sessions = SessionCache::new(KeystoneCredentialProvider::new(config.clone()));
//!     let signer = BlobSigner::with_session(
//!         ctx,
//!         sessions.clone(),
//!         BlobRequestSigner::new(config, sessions),
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
pub use config::{Config, KeystoneVersion};

mod credential;
pub use credential::{Session, TempUrlKey};

mod provide_credential;
pub use provide_credential::*;

mod sign_request;
pub use sign_request::RequestSigner;

mod sign_blob;
pub use sign_blob::BlobRequestSigner;
