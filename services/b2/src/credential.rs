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

use cloudsign_core::time::DateTime;
use cloudsign_core::utils::Redact;
use cloudsign_core::{is_fresh, SigningCredential};
use http::Uri;

/// An authorized B2 account session.
#[derive(Clone)]
pub struct Session {
    /// Account the key belongs to.
    pub account_id: String,
    /// Token sent as `Authorization` to API calls.
    pub authorization_token: String,
    /// Base url of API calls.
    pub api_url: Uri,
    /// Base url of downloads.
    pub download_url: Uri,
    /// When the token stops being accepted.
    pub expires_at: Option<DateTime>,
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("account_id", &self.account_id)
            .field("authorization_token", &Redact::from(&self.authorization_token))
            .field("api_url", &self.api_url)
            .field("download_url", &self.download_url)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl SigningCredential for Session {
    fn is_valid(&self) -> bool {
        !self.authorization_token.is_empty() && is_fresh(self.expires_at)
    }
}
