#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub use cloudsign_core::*;

#[cfg(feature = "default-context")]
mod context;
#[cfg(feature = "default-context")]
pub use context::default_context;

#[cfg(feature = "atmos")]
pub mod atmos {
    pub use cloudsign_atmos::*;
}

#[cfg(feature = "azure")]
pub mod azure {
    pub use cloudsign_azure_blob::*;
}

#[cfg(feature = "b2")]
pub mod b2 {
    pub use cloudsign_b2::*;
}

#[cfg(feature = "google")]
pub mod google {
    pub use cloudsign_google::*;
}

#[cfg(feature = "swift")]
pub mod swift {
    pub use cloudsign_swift::*;
}

#[cfg(any(
    feature = "atmos",
    feature = "azure",
    feature = "b2",
    feature = "google",
    feature = "swift"
))]
mod provider;
#[cfg(any(
    feature = "atmos",
    feature = "azure",
    feature = "b2",
    feature = "google",
    feature = "swift"
))]
pub use provider::{ProviderKind, ProviderSigner};
