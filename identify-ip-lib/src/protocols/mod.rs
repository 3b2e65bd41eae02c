//! Protocol implementations for IP lookups.
//!
//! This module contains the RDAP client and the endpoint discovery that
//! decides which RDAP server is asked.

/// RDAP (Registration Data Access Protocol) implementation
pub mod rdap;

/// Built-in registries and IANA bootstrap discovery
pub mod registry;

pub use rdap::{extract_network_info, extract_registrant, RdapClient, RdapResponse};
pub use registry::{get_rdap_registry_map, resolve_endpoint, BootstrapRegistry, ResolvedEndpoint};
