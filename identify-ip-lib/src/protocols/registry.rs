//! RDAP endpoint discovery for IP addresses.
//!
//! This module provides the built-in list of Regional Internet Registry
//! RDAP services and the IANA bootstrap lookup (RFC 7484) that maps an
//! address block to the RDAP server responsible for it.

use crate::error::IdentifyError;
use crate::types::{EndpointSource, IpVersion, LookupConfig};
use ipnetwork::IpNetwork;
use std::collections::HashMap;
use std::net::IpAddr;

/// Where IANA publishes `ipv4.json` and `ipv6.json`.
pub const IANA_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/";

/// Used when nothing better is known. ARIN redirects queries for space it
/// does not manage to the RIR that does.
pub const FALLBACK_ENDPOINT: &str = "https://rdap.arin.net/registry/ip/";

/// Get the built-in RDAP registry mappings.
///
/// Maps registry names to the base URL of their IP network query path.
pub fn get_rdap_registry_map() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("arin", "https://rdap.arin.net/registry/ip/"),
        ("ripe", "https://rdap.db.ripe.net/ip/"),
        ("apnic", "https://rdap.apnic.net/ip/"),
        ("lacnic", "https://rdap.lacnic.net/rdap/ip/"),
        ("afrinic", "https://rdap.afrinic.net/rdap/ip/"),
    ])
}

/// Names of the built-in registries, sorted.
pub fn get_known_registries() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = get_rdap_registry_map().into_keys().collect();
    names.sort();
    names
}

/// Whether `name` is one of the built-in registries (case-insensitive).
pub fn is_known_registry(name: &str) -> bool {
    get_rdap_registry_map().contains_key(name.to_lowercase().as_str())
}

/// Address to look up in the registries. IPv4-mapped IPv6 addresses are
/// registered as their embedded IPv4 address.
pub fn rdap_query_address(address: IpAddr) -> IpAddr {
    match address {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(address),
        IpAddr::V4(_) => address,
    }
}

/// An RDAP base URL together with how it was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    /// Base URL ending in `/`; the address is appended to it
    pub base_url: String,
    pub source: EndpointSource,
}

impl ResolvedEndpoint {
    fn new(base_url: &str, source: EndpointSource) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            source,
        }
    }

    /// Full query URL for `address`.
    pub fn query_url(&self, address: &IpAddr) -> String {
        format!("{}{}", self.base_url, address)
    }
}

/// Parsed IANA bootstrap file for one address family.
#[derive(Debug, Clone, Default)]
pub struct BootstrapRegistry {
    entries: Vec<(IpNetwork, String)>,
}

impl BootstrapRegistry {
    /// Build the registry from the bootstrap JSON document.
    ///
    /// Each service is `[[cidr, ...], [url, ...]]`. The first `https` URL of
    /// a service is preferred, otherwise its first URL. Unparseable CIDRs
    /// and services without URLs are skipped.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, IdentifyError> {
        let services = json
            .get("services")
            .and_then(|s| s.as_array())
            .ok_or_else(|| {
                IdentifyError::bootstrap("Invalid bootstrap JSON: missing or invalid 'services' array")
            })?;

        let mut entries = Vec::new();

        for service in services {
            let Some(service_array) = service.as_array() else {
                continue;
            };
            if service_array.len() < 2 {
                continue;
            }

            let urls: Vec<&str> = service_array[1]
                .as_array()
                .map(|urls| urls.iter().filter_map(|u| u.as_str()).collect())
                .unwrap_or_default();

            let url = urls
                .iter()
                .find(|u| u.starts_with("https://"))
                .or_else(|| urls.first());

            let Some(url) = url else {
                continue;
            };
            let endpoint = format!("{}ip/", normalize_base_url(url));

            if let Some(prefixes) = service_array[0].as_array() {
                for prefix in prefixes.iter().filter_map(|p| p.as_str()) {
                    match prefix.parse::<IpNetwork>() {
                        Ok(network) => entries.push((network, endpoint.clone())),
                        Err(e) => {
                            tracing::debug!(prefix, error = %e, "Skipping unparseable bootstrap prefix");
                        }
                    }
                }
            }
        }

        Ok(Self { entries })
    }

    /// Endpoint of the most specific block containing `address`.
    pub fn lookup(&self, address: IpAddr) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(network, _)| network.contains(address))
            .max_by_key(|(network, _)| network.prefix())
            .map(|(_, endpoint)| endpoint.as_str())
    }

    /// Number of address blocks in the registry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Download and parse the bootstrap file for `version`.
pub async fn fetch_bootstrap(
    client: &reqwest::Client,
    bootstrap_url: &str,
    version: IpVersion,
) -> Result<BootstrapRegistry, IdentifyError> {
    let url = format!(
        "{}ipv{}.json",
        normalize_base_url(bootstrap_url),
        version.number()
    );
    tracing::debug!(%url, "Fetching RDAP bootstrap registry");

    let response = client.get(&url).send().await.map_err(|e| {
        IdentifyError::bootstrap(format!("Failed to fetch bootstrap registry: {}", e))
    })?;

    if !response.status().is_success() {
        return Err(IdentifyError::bootstrap(format!(
            "Bootstrap registry returned HTTP {}",
            response.status()
        )));
    }

    let json: serde_json::Value = response.json().await.map_err(|e| {
        IdentifyError::bootstrap(format!("Failed to parse bootstrap JSON: {}", e))
    })?;

    BootstrapRegistry::from_json(&json)
}

/// Pick the RDAP base URL for `address`.
///
/// Lookup flow:
/// 1. Explicit base URL from the configuration
/// 2. Named built-in registry
/// 3. IANA bootstrap, longest matching prefix (when enabled)
/// 4. ARIN fallback
///
/// Bootstrap trouble is logged and falls through to step 4; only an
/// unknown registry name is an error.
pub async fn resolve_endpoint(
    client: &reqwest::Client,
    address: IpAddr,
    config: &LookupConfig,
) -> Result<ResolvedEndpoint, IdentifyError> {
    if let Some(base_url) = &config.base_url {
        return Ok(ResolvedEndpoint::new(base_url, EndpointSource::Explicit));
    }

    if let Some(name) = &config.registry {
        let registry = get_rdap_registry_map();
        return registry
            .get(name.to_lowercase().as_str())
            .map(|url| ResolvedEndpoint::new(url, EndpointSource::Registry))
            .ok_or_else(|| {
                IdentifyError::config(format!(
                    "Unknown registry '{}'. Known registries: {}",
                    name,
                    get_known_registries().join(", ")
                ))
            });
    }

    if config.enable_bootstrap {
        let address = rdap_query_address(address);
        match fetch_bootstrap(client, &config.bootstrap_url, IpVersion::from(&address)).await {
            Ok(bootstrap) => {
                if let Some(endpoint) = bootstrap.lookup(address) {
                    return Ok(ResolvedEndpoint::new(endpoint, EndpointSource::Bootstrap));
                }
                tracing::warn!(%address, "Address not covered by the bootstrap registry, using fallback");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Bootstrap lookup failed, using fallback");
            }
        }
    }

    Ok(ResolvedEndpoint::new(
        FALLBACK_ENDPOINT,
        EndpointSource::Fallback,
    ))
}

/// Ensure a base URL ends with exactly one `/`.
pub fn normalize_base_url(url: &str) -> String {
    format!("{}/", url.trim().trim_end_matches('/'))
}
