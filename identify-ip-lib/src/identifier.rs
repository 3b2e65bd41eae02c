//! Main IP identifier implementation.
//!
//! `IpIdentifier` ties the offline address classification to the RDAP
//! lookup and produces a single `IpInfo` per address.

use crate::address::classify_input;
use crate::error::IdentifyError;
use crate::protocols::rdap::{extract_network_info, extract_registrant};
use crate::protocols::RdapClient;
use crate::types::{Classification, IpInfo, LookupConfig};

/// Identifies IP addresses: version, scope and registrant.
///
/// # Example
///
/// ```rust,no_run
/// use identify_ip_lib::IpIdentifier;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let identifier = IpIdentifier::new()?;
///     let info = identifier.identify("8.8.8.8").await?;
///     println!("{} is IPv{} ({}), registered by {:?}", info.address, info.version, info.scope, info.registrant);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct IpIdentifier {
    rdap_client: RdapClient,
}

impl IpIdentifier {
    /// Create a new identifier with default configuration.
    ///
    /// Default settings:
    /// - Timeout: 15 seconds
    /// - Bootstrap: enabled
    /// - No fixed registry or server
    pub fn new() -> Result<Self, IdentifyError> {
        Self::with_config(LookupConfig::default())
    }

    /// Create a new identifier with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use identify_ip_lib::{IpIdentifier, LookupConfig};
    /// use std::time::Duration;
    ///
    /// let config = LookupConfig::default()
    ///     .with_timeout(Duration::from_secs(5))
    ///     .with_registry("ripe");
    ///
    /// let identifier = IpIdentifier::with_config(config).unwrap();
    /// ```
    pub fn with_config(config: LookupConfig) -> Result<Self, IdentifyError> {
        Ok(Self {
            rdap_client: RdapClient::with_config(config)?,
        })
    }

    /// Parse and classify `input` without any network traffic.
    pub fn classify(&self, input: &str) -> Result<Classification, IdentifyError> {
        classify_input(input)
    }

    /// Fully identify one address.
    ///
    /// The process:
    /// 1. Parses the input, failing before any request if it is invalid
    /// 2. Classifies the address
    /// 3. Fetches the RDAP record and extracts registrant and network details
    ///
    /// A record without a registrant is not an error here; `registrant`
    /// is simply `None`.
    ///
    /// # Errors
    ///
    /// Returns `IdentifyError` if:
    /// - The input is not an IP address
    /// - The RDAP request fails or returns a non-200 status
    /// - The response is not valid JSON
    pub async fn identify(&self, input: &str) -> Result<IpInfo, IdentifyError> {
        let classification = classify_input(input)?;

        let response = self.rdap_client.fetch_record(classification.address).await?;
        let registrant = extract_registrant(&response.json);

        if registrant.is_none() {
            tracing::debug!(address = %classification.address, "RDAP record has no registrant");
        }

        Ok(IpInfo {
            input: input.to_string(),
            address: classification.address,
            version: classification.version,
            scope: classification.scope,
            registrant,
            network: Some(extract_network_info(&response.json)),
            source: Some(response.url),
        })
    }

    /// Look up only the registrant of `input`.
    ///
    /// # Errors
    ///
    /// Same as [`IpIdentifier::identify`], plus
    /// `IdentifyError::MissingRegistrant` when the record names nobody.
    pub async fn lookup_registrant(&self, input: &str) -> Result<String, IdentifyError> {
        let address = classify_input(input)?.address;
        self.rdap_client.lookup_registrant(address).await
    }

    /// Offline `IpInfo` with only the classification filled in.
    pub fn classify_info(&self, input: &str) -> Result<IpInfo, IdentifyError> {
        let classification = classify_input(input)?;
        Ok(IpInfo {
            input: input.to_string(),
            address: classification.address,
            version: classification.version,
            scope: classification.scope,
            registrant: None,
            network: None,
            source: None,
        })
    }

    /// Get the lookup configuration of this identifier.
    pub fn config(&self) -> &LookupConfig {
        self.rdap_client.config()
    }
}
