//! Endpoint catalog resolution.
//!
//! A [`ServiceCatalog`] is the list of endpoints an authentication step
//! returned. Resolution narrows it down to one URL per region for a given
//! service type and API version:
//!
//! 1. Keep entries of the requested service type.
//! 2. When a version is requested and some entry declares one, keep the
//!    entries matching it. Version-agnostic entries survive only when nothing
//!    matches.
//! 3. Group by region, falling back to the catalog's provider id.
//! 4. Pick one URL per region by interface preference. `Admin` is never
//!    picked unless asked for.
//!
//! Resolved maps are memoized on the catalog, so they are dropped together
//! with the session that produced it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::RwLock;

use http::Uri;

use crate::{Error, Result};

/// Visibility of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterfaceKind {
    /// Reachable from anywhere.
    Public,
    /// Reachable from inside the provider network.
    Internal,
    /// Administrative endpoint.
    Admin,
}

impl InterfaceKind {
    /// Interfaces picked by default, in order of preference.
    pub const DEFAULT_PREFERENCE: &'static [InterfaceKind] =
        &[InterfaceKind::Public, InterfaceKind::Internal];
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterfaceKind::Public => f.write_str("public"),
            InterfaceKind::Internal => f.write_str("internal"),
            InterfaceKind::Admin => f.write_str("admin"),
        }
    }
}

impl FromStr for InterfaceKind {
    type Err = Error;

    /// Accepts `public`, `internal`, `admin` and the `publicURL` style keys
    /// of v2 catalogs, case-insensitively.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.to_ascii_lowercase();
        match s.strip_suffix("url").unwrap_or(&s) {
            "public" => Ok(InterfaceKind::Public),
            "internal" => Ok(InterfaceKind::Internal),
            "admin" => Ok(InterfaceKind::Admin),
            _ => Err(Error::config_invalid(format!("unknown endpoint interface: {s}"))),
        }
    }
}

/// One endpoint of a service catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Service type, e.g. `object-store`.
    pub service_type: String,
    /// API version this endpoint serves, if declared.
    pub api_version: Option<String>,
    /// Region id, if declared.
    pub region: Option<String>,
    /// Interface visibility.
    pub interface: InterfaceKind,
    /// Base URL.
    pub url: Uri,
}

impl ServiceEndpoint {
    /// Create a version-agnostic endpoint without region.
    pub fn new(service_type: impl Into<String>, interface: InterfaceKind, url: Uri) -> Self {
        Self {
            service_type: service_type.into(),
            api_version: None,
            region: None,
            interface,
            url,
        }
    }

    /// Set api version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = Some(version.into());
        self
    }

    /// Set region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }
}

type CacheKey = (String, Option<String>, Vec<InterfaceKind>);

/// Endpoints returned by one authentication session.
pub struct ServiceCatalog {
    provider_id: String,
    endpoints: Vec<ServiceEndpoint>,
    resolved: RwLock<HashMap<CacheKey, BTreeMap<String, Uri>>>,
}

impl Clone for ServiceCatalog {
    /// The clone starts with an empty memo.
    fn clone(&self) -> Self {
        Self::new(self.provider_id.clone(), self.endpoints.clone())
    }
}

impl fmt::Debug for ServiceCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCatalog")
            .field("provider_id", &self.provider_id)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl ServiceCatalog {
    /// Create a catalog. `provider_id` names regionless endpoints.
    pub fn new(provider_id: impl Into<String>, endpoints: Vec<ServiceEndpoint>) -> Self {
        Self {
            provider_id: provider_id.into(),
            endpoints,
            resolved: RwLock::new(HashMap::new()),
        }
    }

    /// Provider id used as the region of regionless endpoints.
    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    /// All endpoints in catalog order.
    pub fn endpoints(&self) -> &[ServiceEndpoint] {
        &self.endpoints
    }

    /// Resolve one URL per region using the default interface preference.
    pub fn resolve_all(
        &self,
        service_type: &str,
        api_version: Option<&str>,
    ) -> Result<BTreeMap<String, Uri>> {
        self.resolve_all_with(service_type, api_version, InterfaceKind::DEFAULT_PREFERENCE)
    }

    /// Resolve one URL per region picking interfaces in `preference` order.
    ///
    /// Regions offering none of the preferred interfaces are left out.
    pub fn resolve_all_with(
        &self,
        service_type: &str,
        api_version: Option<&str>,
        preference: &[InterfaceKind],
    ) -> Result<BTreeMap<String, Uri>> {
        let key = (
            service_type.to_string(),
            api_version.map(normalize_version),
            preference.to_vec(),
        );

        if let Some(resolved) = self
            .resolved
            .read()
            .expect("lock poisoned")
            .get(&key)
            .cloned()
        {
            return Ok(resolved);
        }

        let resolved = self.compute(service_type, api_version, preference)?;
        self.resolved
            .write()
            .expect("lock poisoned")
            .insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Resolve the URL of a single region.
    ///
    /// Without `region` the catalog must offer exactly one region.
    pub fn resolve(
        &self,
        service_type: &str,
        api_version: Option<&str>,
        region: Option<&str>,
    ) -> Result<Uri> {
        let mut resolved = self.resolve_all(service_type, api_version)?;

        let chosen = match region {
            Some(region) => resolved.remove(region),
            None if resolved.len() == 1 => resolved.pop_first().map(|(_, url)| url),
            None => None,
        };

        match chosen {
            Some(url) => {
                log::debug!(
                    "resolved {service_type} endpoint for region {}: {url}",
                    region.unwrap_or("<only>")
                );
                Ok(url)
            }
            None => {
                let available = resolved.keys().cloned().collect::<Vec<_>>().join(", ");
                let message = match region {
                    Some(region) => format!("region {region} not found, available: [{available}]"),
                    None => format!("region is required to choose among [{available}]"),
                };
                Err(Error::not_found(message)
                    .with_context("service_type", service_type)
                    .with_context("api_version", api_version.unwrap_or("-")))
            }
        }
    }

    fn compute(
        &self,
        service_type: &str,
        api_version: Option<&str>,
        preference: &[InterfaceKind],
    ) -> Result<BTreeMap<String, Uri>> {
        let mut candidates: Vec<&ServiceEndpoint> = self
            .endpoints
            .iter()
            .filter(|e| e.service_type == service_type)
            .collect();
        if candidates.is_empty() {
            let found = self
                .endpoints
                .iter()
                .map(|e| e.service_type.as_str())
                .collect::<BTreeSet<_>>();
            return Err(Error::endpoint_not_found(format!(
                "service type {service_type} not found in catalog, found types: [{}]",
                found.into_iter().collect::<Vec<_>>().join(", ")
            ))
            .with_context("provider", &self.provider_id));
        }

        if let Some(requested) = api_version {
            if candidates.iter().any(|e| e.api_version.is_some()) {
                let wanted = normalize_version(requested);
                let matching: Vec<&ServiceEndpoint> = candidates
                    .iter()
                    .copied()
                    .filter(|e| e.api_version.as_deref().map(normalize_version) == Some(wanted.clone()))
                    .collect();

                let filtered = if matching.is_empty() {
                    candidates
                        .iter()
                        .copied()
                        .filter(|e| e.api_version.is_none())
                        .collect()
                } else {
                    matching
                };

                if filtered.is_empty() {
                    let versions = candidates
                        .iter()
                        .filter_map(|e| e.api_version.as_deref())
                        .collect::<BTreeSet<_>>();
                    return Err(Error::endpoint_not_found(format!(
                        "version {requested} of {service_type} not found in catalog, available versions: [{}]",
                        versions.into_iter().collect::<Vec<_>>().join(", ")
                    ))
                    .with_context("provider", &self.provider_id));
                }
                candidates = filtered;
            }
        }

        let mut by_region: BTreeMap<&str, Vec<&ServiceEndpoint>> = BTreeMap::new();
        for endpoint in candidates {
            let region = endpoint.region.as_deref().unwrap_or(&self.provider_id);
            by_region.entry(region).or_default().push(endpoint);
        }

        let mut resolved = BTreeMap::new();
        for (region, endpoints) in by_region {
            let picked = preference
                .iter()
                .find_map(|kind| endpoints.iter().find(|e| e.interface == *kind));
            match picked {
                Some(endpoint) => {
                    resolved.insert(region.to_string(), endpoint.url.clone());
                }
                None => log::debug!(
                    "dropping region {region} of {service_type}: no endpoint with interface in {preference:?}"
                ),
            }
        }

        if resolved.is_empty() {
            return Err(Error::endpoint_not_found(format!(
                "no {service_type} endpoint with interface in {preference:?}"
            ))
            .with_context("provider", &self.provider_id));
        }

        Ok(resolved)
    }
}

/// Normalize an API version so `v1`, `1` and `1.0` compare equal.
pub fn normalize_version(version: &str) -> String {
    let mut v = version.trim();
    v = v
        .strip_prefix('v')
        .or_else(|| v.strip_prefix('V'))
        .unwrap_or(v);
    while let Some(stripped) = v.strip_suffix(".0") {
        v = stripped;
    }
    v.to_string()
}
