//! Core data types for IP identification.
//!
//! This module defines the result of an identification, the address
//! classification types, and the lookup configuration.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Result of identifying a single IP address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpInfo {
    /// The string that was given to the identifier, untouched
    pub input: String,

    /// Parsed address
    pub address: IpAddr,

    /// Protocol version (4 or 6)
    pub version: IpVersion,

    /// Address type/scope classification
    pub scope: AddressScope,

    /// Registrant organization or person, if the RDAP record names one
    pub registrant: Option<String>,

    /// Details of the RDAP IP network object
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkInfo>,

    /// URL that answered the RDAP query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// IP protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// The version number as printed on the command line.
    pub fn number(self) -> u8 {
        match self {
            IpVersion::V4 => 4,
            IpVersion::V6 => 6,
        }
    }
}

impl From<IpVersion> for u8 {
    fn from(version: IpVersion) -> Self {
        version.number()
    }
}

impl TryFrom<u8> for IpVersion {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(IpVersion::V4),
            6 => Ok(IpVersion::V6),
            other => Err(format!("unknown IP version {}", other)),
        }
    }
}

impl From<&IpAddr> for IpVersion {
    fn from(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

impl std::fmt::Display for IpVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Type/scope of an address according to the special-purpose registries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressScope {
    Unspecified,
    Loopback,
    Multicast,
    LinkLocal,
    Private,
    /// Carrier-grade NAT space
    Shared,
    Documentation,
    Benchmarking,
    Broadcast,
    Reserved,
    Global,
}

impl AddressScope {
    /// Name used for display and JSON output.
    pub fn as_str(self) -> &'static str {
        match self {
            AddressScope::Unspecified => "unspecified",
            AddressScope::Loopback => "loopback",
            AddressScope::Multicast => "multicast",
            AddressScope::LinkLocal => "link-local",
            AddressScope::Private => "private",
            AddressScope::Shared => "shared",
            AddressScope::Documentation => "documentation",
            AddressScope::Benchmarking => "benchmarking",
            AddressScope::Broadcast => "broadcast",
            AddressScope::Reserved => "reserved",
            AddressScope::Global => "global",
        }
    }

    /// Whether the address is publicly routable.
    pub fn is_global(self) -> bool {
        self == AddressScope::Global
    }
}

impl std::fmt::Display for AddressScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Offline half of an identification: parse + classify, no network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub address: IpAddr,
    pub version: IpVersion,
    pub scope: AddressScope,
}

/// Details of an RDAP `ip network` object (RFC 7483 section 5.4).
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NetworkInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_address: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_address: Option<String>,

    /// "v4" or "v6" as reported by the server
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<String>,

    /// RIR allocation type, e.g. "DIRECT ALLOCATION"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_handle: Option<String>,

    pub status: Vec<String>,

    /// CIDR blocks from the cidr0 extension, as "prefix/length"
    pub cidrs: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_changed_date: Option<String>,
}

/// How the RDAP base URL for a lookup was chosen.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EndpointSource {
    /// Explicit server URL from configuration
    Explicit,
    /// Named entry of the built-in RIR list
    Registry,
    /// Longest-prefix match in the IANA bootstrap file
    Bootstrap,
    /// ARIN, relying on its redirect to the authoritative RIR
    Fallback,
}

impl std::fmt::Display for EndpointSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndpointSource::Explicit => write!(f, "explicit"),
            EndpointSource::Registry => write!(f, "registry"),
            EndpointSource::Bootstrap => write!(f, "bootstrap"),
            EndpointSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Options controlling the RDAP lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Timeout for the RDAP request
    /// Default: 15 seconds
    #[serde(skip)]
    pub timeout: Duration,

    /// Whether to consult the IANA bootstrap registry
    /// Default: true
    pub enable_bootstrap: bool,

    /// Name of a built-in registry to query directly ("arin", "ripe", ...)
    pub registry: Option<String>,

    /// Explicit RDAP base URL, takes precedence over everything else
    pub base_url: Option<String>,

    /// Directory holding the bootstrap files (`ipv4.json`, `ipv6.json`)
    pub bootstrap_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            enable_bootstrap: cfg!(feature = "bootstrap"),
            registry: None,
            base_url: None,
            bootstrap_url: crate::protocols::registry::IANA_BOOTSTRAP_URL.to_string(),
            user_agent: format!("identify-ip/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl LookupConfig {
    /// Set custom timeout for the RDAP request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable IANA bootstrap discovery.
    pub fn with_bootstrap(mut self, enabled: bool) -> Self {
        self.enable_bootstrap = enabled;
        self
    }

    /// Query a named built-in registry.
    pub fn with_registry<S: Into<String>>(mut self, registry: S) -> Self {
        self.registry = Some(registry.into());
        self
    }

    /// Query an explicit RDAP base URL.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Read the bootstrap files from somewhere other than IANA.
    pub fn with_bootstrap_url<S: Into<String>>(mut self, bootstrap_url: S) -> Self {
        self.bootstrap_url = bootstrap_url.into();
        self
    }
}
