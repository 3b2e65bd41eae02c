//! Address parsing and scope classification.
//!
//! Parsing is delegated to `std::net`. Classification uses the stable
//! predicates on `Ipv4Addr`/`Ipv6Addr` and falls back to small prefix
//! tables for the special-purpose blocks std does not expose yet.

use crate::error::IdentifyError;
use crate::types::{AddressScope, Classification, IpVersion};
use ipnetwork::{Ipv4Network, Ipv6Network};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// 100.64.0.0/10, RFC 6598
const V4_SHARED: &[(Ipv4Addr, u8)] = &[(Ipv4Addr::new(100, 64, 0, 0), 10)];

/// 198.18.0.0/15, RFC 2544
const V4_BENCHMARKING: &[(Ipv4Addr, u8)] = &[(Ipv4Addr::new(198, 18, 0, 0), 15)];

/// "This network" and the former class E space
const V4_RESERVED: &[(Ipv4Addr, u8)] = &[
    (Ipv4Addr::new(0, 0, 0, 0), 8),
    (Ipv4Addr::new(240, 0, 0, 0), 4),
];

const V6_LINK_LOCAL: &[(Ipv6Addr, u8)] = &[(Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 0), 10)];

const V6_UNIQUE_LOCAL: &[(Ipv6Addr, u8)] = &[(Ipv6Addr::new(0xfc00, 0, 0, 0, 0, 0, 0, 0), 7)];

const V6_DOCUMENTATION: &[(Ipv6Addr, u8)] =
    &[(Ipv6Addr::new(0x2001, 0x0db8, 0, 0, 0, 0, 0, 0), 32)];

const V6_BENCHMARKING: &[(Ipv6Addr, u8)] = &[(Ipv6Addr::new(0x2001, 0x0002, 0, 0, 0, 0, 0, 0), 48)];

/// Parse a string into an IP address.
///
/// Surrounding whitespace is ignored. Both IPv4 dotted-quad and every
/// IPv6 textual form accepted by `std::net::Ipv6Addr` are valid.
///
/// # Errors
///
/// Returns `IdentifyError::InvalidAddress` when the string is empty or
/// not an address.
pub fn parse_address(input: &str) -> Result<IpAddr, IdentifyError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(IdentifyError::invalid_address(
            input,
            "address cannot be empty",
        ));
    }

    trimmed
        .parse::<IpAddr>()
        .map_err(|e| IdentifyError::invalid_address(input, e.to_string()))
}

/// Classify an already parsed address.
pub fn classify(address: IpAddr) -> Classification {
    Classification {
        address,
        version: IpVersion::from(&address),
        scope: scope_of(address),
    }
}

/// Parse and classify in one step. Never touches the network.
pub fn classify_input(input: &str) -> Result<Classification, IdentifyError> {
    parse_address(input).map(classify)
}

/// Scope/type of an address. The first matching rule wins.
pub fn scope_of(address: IpAddr) -> AddressScope {
    match address {
        IpAddr::V4(v4) => scope_of_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(mapped) => scope_of_v4(mapped),
            None => scope_of_v6(v6),
        },
    }
}

fn scope_of_v4(addr: Ipv4Addr) -> AddressScope {
    if addr.is_unspecified() {
        AddressScope::Unspecified
    } else if addr.is_loopback() {
        AddressScope::Loopback
    } else if addr.is_multicast() {
        AddressScope::Multicast
    } else if addr.is_link_local() {
        AddressScope::LinkLocal
    } else if addr.is_private() {
        AddressScope::Private
    } else if in_v4_ranges(addr, V4_SHARED) {
        AddressScope::Shared
    } else if addr.is_documentation() {
        AddressScope::Documentation
    } else if in_v4_ranges(addr, V4_BENCHMARKING) {
        AddressScope::Benchmarking
    } else if addr.is_broadcast() {
        AddressScope::Broadcast
    } else if in_v4_ranges(addr, V4_RESERVED) {
        AddressScope::Reserved
    } else {
        AddressScope::Global
    }
}

fn scope_of_v6(addr: Ipv6Addr) -> AddressScope {
    if addr.is_unspecified() {
        AddressScope::Unspecified
    } else if addr.is_loopback() {
        AddressScope::Loopback
    } else if addr.is_multicast() {
        AddressScope::Multicast
    } else if in_v6_ranges(addr, V6_LINK_LOCAL) {
        AddressScope::LinkLocal
    } else if in_v6_ranges(addr, V6_UNIQUE_LOCAL) {
        AddressScope::Private
    } else if in_v6_ranges(addr, V6_DOCUMENTATION) {
        AddressScope::Documentation
    } else if in_v6_ranges(addr, V6_BENCHMARKING) {
        AddressScope::Benchmarking
    } else {
        AddressScope::Global
    }
}

fn in_v4_ranges(addr: Ipv4Addr, ranges: &[(Ipv4Addr, u8)]) -> bool {
    ranges.iter().any(|(network, prefix)| {
        Ipv4Network::new(*network, *prefix)
            .map(|net| net.contains(addr))
            .unwrap_or(false)
    })
}

fn in_v6_ranges(addr: Ipv6Addr, ranges: &[(Ipv6Addr, u8)]) -> bool {
    ranges.iter().any(|(network, prefix)| {
        Ipv6Network::new(*network, *prefix)
            .map(|net| net.contains(addr))
            .unwrap_or(false)
    })
}
