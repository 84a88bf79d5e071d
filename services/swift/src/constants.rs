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

use http::header::HeaderName;

// Headers used in swift services.
pub const X_AUTH_TOKEN: HeaderName = HeaderName::from_static("x-auth-token");
pub const X_SUBJECT_TOKEN: HeaderName = HeaderName::from_static("x-subject-token");
pub const X_ACCOUNT_META_TEMP_URL_KEY: HeaderName =
    HeaderName::from_static("x-account-meta-temp-url-key");

// Query parameters of temporary urls.
pub const TEMP_URL_SIG: &str = "temp_url_sig";
pub const TEMP_URL_EXPIRES: &str = "temp_url_expires";

/// Catalog type of the object storage service.
pub const OBJECT_STORE: &str = "object-store";
/// Region name of catalog entries without one.
pub const PROVIDER_ID: &str = "swift";
/// Object storage API version requested by default.
pub const DEFAULT_API_VERSION: &str = "1";
/// Domain used when none is configured.
pub const DEFAULT_DOMAIN: &str = "Default";

// Env values used in swift services.
pub const OS_AUTH_URL: &str = "OS_AUTH_URL";
pub const OS_IDENTITY_API_VERSION: &str = "OS_IDENTITY_API_VERSION";
pub const OS_USERNAME: &str = "OS_USERNAME";
pub const OS_PASSWORD: &str = "OS_PASSWORD";
pub const OS_PROJECT_NAME: &str = "OS_PROJECT_NAME";
pub const OS_TENANT_NAME: &str = "OS_TENANT_NAME";
pub const OS_USER_DOMAIN_NAME: &str = "OS_USER_DOMAIN_NAME";
pub const OS_PROJECT_DOMAIN_NAME: &str = "OS_PROJECT_DOMAIN_NAME";
pub const OS_REGION_NAME: &str = "OS_REGION_NAME";
pub const SWIFT_TEMP_URL_KEY: &str = "SWIFT_TEMP_URL_KEY";
