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

use std::time::Duration;

use http::header::HeaderName;

// Headers used in b2 services.
pub const X_BZ_FILE_NAME: HeaderName = HeaderName::from_static("x-bz-file-name");
pub const X_BZ_CONTENT_SHA1: HeaderName = HeaderName::from_static("x-bz-content-sha1");
pub const X_BZ_INFO_PREFIX: &str = "x-bz-info-";

/// Content type asking B2 to guess from the file name.
pub const AUTO_CONTENT_TYPE: &str = "b2/x-auto";
/// Checksum placeholder for uploads whose SHA1 isn't known upfront.
pub const DO_NOT_VERIFY: &str = "do_not_verify";

pub const DEFAULT_API_URL: &str = "https://api.backblazeb2.com";
pub const API_PREFIX: &str = "/b2api/v2";

// API operations.
pub const B2_AUTHORIZE_ACCOUNT: &str = "b2_authorize_account";
pub const B2_LIST_BUCKETS: &str = "b2_list_buckets";
pub const B2_GET_DOWNLOAD_AUTHORIZATION: &str = "b2_get_download_authorization";
pub const B2_GET_UPLOAD_URL: &str = "b2_get_upload_url";
pub const B2_GET_UPLOAD_PART_URL: &str = "b2_get_upload_part_url";
pub const B2_UPLOAD_FILE: &str = "b2_upload_file";
pub const B2_UPLOAD_PART: &str = "b2_upload_part";

/// Account authorization tokens are valid for 24 hours.
pub const SESSION_LIFETIME: Duration = Duration::from_secs(24 * 60 * 60);
/// Longest validity B2 accepts for download authorizations.
pub const MAX_DOWNLOAD_AUTHORIZATION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

// Env values used in b2 services.
pub const B2_APPLICATION_KEY_ID: &str = "B2_APPLICATION_KEY_ID";
pub const B2_APPLICATION_KEY: &str = "B2_APPLICATION_KEY";
pub const B2_API_URL: &str = "B2_API_URL";
