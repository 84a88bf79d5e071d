// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::constants::*;
use crate::Credential;
use async_trait::async_trait;
use cloudsign_core::{Context, ProvideCredential, Result};

/// Load credential from environment variables.
///
/// Shared key variables win over [`AZURE_STORAGE_SAS_TOKEN`].
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider;

impl EnvCredentialProvider {
    /// Create a new EnvCredentialProvider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProvideCredential for EnvCredentialProvider {
    type Credential = Credential;

    async fn provide_credential(&self, ctx: &Context) -> Result<Option<Self::Credential>> {
        let envs = ctx.env_vars();

        let account_name = envs
            .get(AZBLOB_ACCOUNT_NAME)
            .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_NAME));
        let account_key = envs
            .get(AZBLOB_ACCOUNT_KEY)
            .or_else(|| envs.get(AZURE_STORAGE_ACCOUNT_KEY));
        if let (Some(account_name), Some(account_key)) = (account_name, account_key) {
            return Ok(Some(Credential::with_shared_key(account_name, account_key)));
        }

        if let Some(sas_token) = envs.get(AZURE_STORAGE_SAS_TOKEN) {
            return Ok(Some(Credential::with_sas_token(sas_token)));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsign_core::StaticEnv;

    #[tokio::test]
    async fn test_env_credential_provider_account_key() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (AZBLOB_ACCOUNT_NAME, "myaccount"),
            (AZBLOB_ACCOUNT_KEY, "mykey"),
            (AZURE_STORAGE_SAS_TOKEN, "mysastoken"),
        ]));

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap();

        match cred {
            Some(Credential::SharedKey {
                account_name,
                account_key,
            }) => {
                assert_eq!(account_name, "myaccount");
                assert_eq!(account_key, "mykey");
            }
            _ => panic!("Expected SharedKey credential"),
        }
    }

    #[tokio::test]
    async fn test_env_credential_provider_sas_token() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (AZBLOB_ACCOUNT_NAME, "myaccount"),
            (AZURE_STORAGE_SAS_TOKEN, "mysastoken"),
        ]));

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap();

        match cred {
            Some(Credential::SasToken { token }) => assert_eq!(token, "mysastoken"),
            _ => panic!("Expected SasToken credential"),
        }
    }

    #[tokio::test]
    async fn test_env_credential_provider_none() {
        let cred = EnvCredentialProvider::new()
            .provide_credential(&Context::new())
            .await
            .unwrap();

        assert!(cred.is_none());
    }
}
