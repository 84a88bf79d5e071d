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

/// EnvCredentialProvider loads credential from [`ATMOS_UID`] and [`ATMOS_SECRET`].
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
        match (ctx.env_var(ATMOS_UID), ctx.env_var(ATMOS_SECRET)) {
            (Some(uid), Some(secret)) => Ok(Some(Credential::new(uid, secret))),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsign_core::StaticEnv;

    #[tokio::test]
    async fn test_env_credential_provider() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([
            (ATMOS_UID, "tenant/user"),
            (ATMOS_SECRET, "c2VjcmV0"),
        ]));

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cred.uid, "tenant/user");
        assert_eq!(cred.secret, "c2VjcmV0");
    }

    #[tokio::test]
    async fn test_env_credential_provider_partial() {
        let ctx = Context::new().with_env(StaticEnv::from_pairs([(ATMOS_UID, "tenant/user")]));

        let cred = EnvCredentialProvider::new()
            .provide_credential(&ctx)
            .await
            .unwrap();
        assert!(cred.is_none());
    }
}
