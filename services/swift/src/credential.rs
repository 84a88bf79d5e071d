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

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use cloudsign_core::time::DateTime;
use cloudsign_core::utils::Redact;
use cloudsign_core::{is_fresh, Result, ServiceCatalog, SigningCredential};
use http::Uri;

use crate::constants::*;

/// An authenticated Keystone session.
#[derive(Clone)]
pub struct Session {
    /// Token sent as `X-Auth-Token`.
    pub token: String,
    /// When keystone issued the token.
    pub issued_at: Option<DateTime>,
    /// When the token stops being accepted.
    pub expires_at: Option<DateTime>,
    /// Endpoints returned with the token.
    pub catalog: Arc<ServiceCatalog>,
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &Redact::from(&self.token))
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .field("catalog", &self.catalog)
            .finish()
    }
}

impl SigningCredential for Session {
    fn is_valid(&self) -> bool {
        !self.token.is_empty() && is_fresh(self.expires_at)
    }
}

impl Session {
    /// Resolve the account url of the object store.
    pub fn storage_url(&self, region: Option<&str>, api_version: &str) -> Result<Uri> {
        self.catalog
            .resolve(OBJECT_STORE, Some(api_version), region)
            .map_err(|err| match region {
                Some(region) => err.with_context("region", region),
                None => err,
            })
    }
}

/// Account key of temporary urls.
#[derive(Clone, Default)]
pub struct TempUrlKey(pub String);

impl Debug for TempUrlKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TempUrlKey").field(&Redact::from(&self.0)).finish()
    }
}

impl SigningCredential for TempUrlKey {
    fn is_valid(&self) -> bool {
        !self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudsign_core::time::{add_duration, now};
    use std::time::Duration;
    use cloudsign_core::{InterfaceKind, ServiceEndpoint};

    #[test]
    fn test_session_validity() {
        let catalog = Arc::new(ServiceCatalog::new(PROVIDER_ID, vec![]));
        let mut session = Session {
            token: "token".to_string(),
            issued_at: None,
            expires_at: Some(add_duration(now(), Duration::from_secs(600)).unwrap()),
            catalog,
        };
        assert!(session.is_valid());

        session.expires_at = Some(add_duration(now(), Duration::from_secs(5)).unwrap());
        assert!(!session.is_valid());

        session.expires_at = None;
        session.token.clear();
        assert!(!session.is_valid());
    }

    #[test]
    fn test_storage_url() {
        let catalog = ServiceCatalog::new(
            PROVIDER_ID,
            vec![ServiceEndpoint::new(
                OBJECT_STORE,
                InterfaceKind::Public,
                "https://swift.example.com/v1/AUTH_demo".parse().unwrap(),
            )
            .with_region("RegionOne")],
        );
        let session = Session {
            token: "token".to_string(),
            issued_at: None,
            expires_at: None,
            catalog: Arc::new(catalog),
        };

        assert_eq!(
            session.storage_url(None, "1").unwrap().to_string(),
            "https://swift.example.com/v1/AUTH_demo"
        );
        let err = session.storage_url(Some("RegionTwo"), "1").unwrap_err();
        assert_eq!(err.kind(), cloudsign_core::ErrorKind::NotFound);
        assert!(format!("{:?}", session).contains("***"));
    }
}
