use async_trait::async_trait;
use cloudsign_core::{Context, ProvideCredential, ProvideCredentialChain, Result};

use crate::provide_credential::{EnvCredentialProvider, StaticCredentialProvider};
use crate::{Config, Credential};

/// DefaultCredentialProvider tries the configured uid and secret first,
/// then falls back to env.
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
        if let (Some(uid), Some(secret)) = (&config.uid, &config.secret) {
            chain = chain.push(StaticCredentialProvider::new(uid, secret));
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
