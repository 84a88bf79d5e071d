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

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

// Env values
pub const GOOGLE_CREDENTIAL: &str = "GOOGLE_CREDENTIAL";
pub const GOOGLE_SCOPE: &str = "GOOGLE_SCOPE";
pub const GOOGLE_STORAGE_ENDPOINT: &str = "GOOGLE_STORAGE_ENDPOINT";

// Default values
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.read_write";
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
pub const DEFAULT_ENDPOINT: &str = "https://storage.googleapis.com";
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Lifetime requested for the JWT assertion itself.
pub const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Google refuses V2 signed URLs valid for longer than seven days.
pub const MAX_SIGNED_URL_SECS: i64 = 7 * 24 * 3600;

// Header and query names
pub const X_GOOG_PREFIX: &str = "x-goog-";
pub const X_GOOG_META_PREFIX: &str = "x-goog-meta-";
pub const GOOGLE_ACCESS_ID: &str = "GoogleAccessId";
pub const EXPIRES: &str = "Expires";
pub const SIGNATURE: &str = "Signature";

/// AsciiSet for object names in GCS paths.
///
/// Everything except unreserved characters and `/` is encoded.
pub static GOOG_URI_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// AsciiSet for signed URL query values.
pub static GOOG_QUERY_ENCODE_SET: AsciiSet = NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');
