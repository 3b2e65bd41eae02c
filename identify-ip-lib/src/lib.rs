//! # Identify IP Library
//!
//! Classifies IP addresses and resolves their registrant through RDAP.
//!
//! Identification is two steps: the address is parsed and classified with
//! the standard address-range rules (no network involved), then one RDAP
//! query is sent to the registry responsible for the address and the
//! registrant is extracted from the entity records of the response.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use identify_ip_lib::IpIdentifier;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let identifier = IpIdentifier::new()?;
//!     let info = identifier.identify("8.8.8.8").await?;
//!
//!     println!("{} is IPv{} ({})", info.address, info.version, info.scope);
//!     println!("Registrant: {:?}", info.registrant);
//!     Ok(())
//! }
//! ```
//!
//! Classification alone never touches the network:
//!
//! ```rust
//! use identify_ip_lib::{classify_input, AddressScope, IpVersion};
//!
//! let c = classify_input("::1").unwrap();
//! assert_eq!(c.version, IpVersion::V6);
//! assert_eq!(c.scope, AddressScope::Loopback);
//! ```

pub use address::{classify, classify_input, parse_address, scope_of};
pub use config::{
    load_env_config, load_env_config_from, parse_timeout_string, validate_registry,
    validate_server_url, ConfigManager, EnvConfig, FileConfig, LookupFileConfig, OutputConfig,
};
pub use error::{ErrorKind, IdentifyError};
pub use identifier::IpIdentifier;
pub use protocols::rdap::{
    extract_network_info, extract_registrant, find_registrant, get_vcard_name, parse_vcard_array,
    RdapClient, RdapResponse,
};
pub use protocols::registry::{
    fetch_bootstrap, get_known_registries, get_rdap_registry_map, is_known_registry,
    normalize_base_url, rdap_query_address, resolve_endpoint, BootstrapRegistry, ResolvedEndpoint,
    FALLBACK_ENDPOINT, IANA_BOOTSTRAP_URL,
};
pub use types::{
    AddressScope, Classification, EndpointSource, IpInfo, IpVersion, LookupConfig, NetworkInfo,
};

mod address;
mod config;
mod error;
mod identifier;
mod protocols;
mod types;

/// Type alias for convenience
pub type Result<T> = std::result::Result<T, IdentifyError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");
