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

// Headers used in atmos services.
pub const X_EMC_DATE: HeaderName = HeaderName::from_static("x-emc-date");
pub const X_EMC_UID: HeaderName = HeaderName::from_static("x-emc-uid");
pub const X_EMC_SIGNATURE: HeaderName = HeaderName::from_static("x-emc-signature");
pub const X_EMC_META: HeaderName = HeaderName::from_static("x-emc-meta");
pub const X_EMC_PREFIX: &str = "x-emc-";

// Query parameters of signed urls.
pub const QUERY_UID: &str = "uid";
pub const QUERY_EXPIRES: &str = "expires";
pub const QUERY_SIGNATURE: &str = "signature";

/// Prefix of namespace addressed objects.
pub const NAMESPACE_PREFIX: &str = "/rest/namespace";

// Env values used in atmos services.
pub const ATMOS_ENDPOINT: &str = "ATMOS_ENDPOINT";
pub const ATMOS_UID: &str = "ATMOS_UID";
pub const ATMOS_SECRET: &str = "ATMOS_SECRET";
