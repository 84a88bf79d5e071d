mod authorize_account;
pub use authorize_account::AuthorizeAccountProvider;
