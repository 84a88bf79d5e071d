mod keystone;
pub use keystone::KeystoneCredentialProvider;

mod temp_url_key;
pub use temp_url_key::TempUrlKeyProvider;
