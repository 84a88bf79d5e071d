use async_trait::async_trait;
use cloudsign_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

use crate::provide_credential::{EnvCredentialProvider, StaticCredentialProvider};
use crate::{Config, Credential};

/// DefaultCredentialProvider tries the configured values first and the
/// environment second.
#[derive(Debug)]
pub struct DefaultCredentialProvider {
    chain: ProvideCredentialChain<Credential>,
}

impl Default for DefaultCredentialProvider {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

impl DefaultCredentialProvider {
    /// Create a provider over `config`.
    pub fn new(config: &Config) -> Self {
        let mut chain = ProvideCredentialChain::new();
        match (&config.account_name, &config.account_key, &config.sas_token) {
            (Some(name), Some(key), _) => {
                chain = chain.push(StaticCredentialProvider::new_shared_key(name, key));
            }
            (_, _, Some(token)) => {
                chain = chain.push(StaticCredentialProvider::new_sas_token(token));
            }
            _ => {}
        }

        Self {
            chain: chain.push(EnvCredentialProvider::new()),
        }
    }
}

#[async_trait]
impl ProvideCredential for DefaultCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        self.chain.provide_credential(ctx).await
    }
}
