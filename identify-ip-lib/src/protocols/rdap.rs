//! RDAP (Registration Data Access Protocol) implementation.
//!
//! This module queries the RDAP `ip` path for a single address and pulls
//! the registrant and network details out of the RFC 7483 JSON record.

use crate::error::IdentifyError;
use crate::protocols::registry::{rdap_query_address, resolve_endpoint};
use crate::types::{EndpointSource, LookupConfig, NetworkInfo};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Duration;

/// Media type registered for RDAP responses.
pub const RDAP_MEDIA_TYPE: &str = "application/rdap+json";

/// A fetched RDAP record and where it came from.
#[derive(Debug, Clone)]
pub struct RdapResponse {
    /// Final URL after redirects
    pub url: String,
    /// How the first URL in the chain was chosen
    pub endpoint_source: EndpointSource,
    pub json: Value,
}

/// RDAP client for IP network lookups.
#[derive(Clone)]
pub struct RdapClient {
    /// HTTP client for making RDAP requests
    http_client: reqwest::Client,
    /// Endpoint selection and timeout settings
    config: LookupConfig,
}

impl RdapClient {
    /// Create a new RDAP client with default settings.
    pub fn new() -> Result<Self, IdentifyError> {
        Self::with_config(LookupConfig::default())
    }

    /// Create a new RDAP client with custom settings.
    pub fn with_config(config: LookupConfig) -> Result<Self, IdentifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout.saturating_add(Duration::from_secs(2))) // Add buffer for HTTP timeout
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                IdentifyError::network_with_source(
                    "Failed to create RDAP HTTP client",
                    e.to_string(),
                )
            })?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Settings this client was built with.
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Fetch the RDAP record for `address`.
    ///
    /// # Errors
    ///
    /// Returns `IdentifyError` if:
    /// - The configured registry name is unknown
    /// - The request fails or times out
    /// - The server answers with anything but 200
    /// - The body is not JSON
    pub async fn fetch_record(&self, address: IpAddr) -> Result<RdapResponse, IdentifyError> {
        let endpoint = resolve_endpoint(&self.http_client, address, &self.config).await?;
        let rdap_url = endpoint.query_url(&rdap_query_address(address));

        tracing::debug!(url = %rdap_url, source = %endpoint.source, "Sending RDAP request");

        let result =
            tokio::time::timeout(self.config.timeout, self.make_rdap_request(&rdap_url, address))
                .await;

        match result {
            Ok(Ok((url, json))) => Ok(RdapResponse {
                url,
                endpoint_source: endpoint.source,
                json,
            }),
            Ok(Err(e)) => {
                tracing::debug!(%address, error = %e, "RDAP request failed");
                Err(e)
            }
            Err(_) => Err(IdentifyError::timeout("RDAP request", self.config.timeout)),
        }
    }

    /// Fetch the record for `address` and return its registrant name.
    ///
    /// # Errors
    ///
    /// Everything `fetch_record` can fail with, plus
    /// `IdentifyError::MissingRegistrant` when the record names nobody.
    pub async fn lookup_registrant(&self, address: IpAddr) -> Result<String, IdentifyError> {
        let response = self.fetch_record(address).await?;
        extract_registrant(&response.json)
            .ok_or_else(|| IdentifyError::missing_registrant(address.to_string()))
    }

    /// Make an RDAP request to the specified URL.
    async fn make_rdap_request(
        &self,
        rdap_url: &str,
        address: IpAddr,
    ) -> Result<(String, Value), IdentifyError> {
        let response = self
            .http_client
            .get(rdap_url)
            .header(ACCEPT, RDAP_MEDIA_TYPE)
            .send()
            .await?;

        let final_url = response.url().to_string();
        tracing::debug!(status = %response.status(), url = %final_url, "RDAP response");

        match response.status() {
            StatusCode::OK => {
                let json = response.json::<Value>().await.map_err(|e| {
                    IdentifyError::rdap(address.to_string(), format!("Failed to parse JSON: {}", e))
                })?;
                Ok((final_url, json))
            }
            code => Err(IdentifyError::rdap_with_status(
                address.to_string(),
                format!("RDAP server returned error: {}", code),
                code.as_u16(),
            )),
        }
    }
}

/// Convert an RDAP `vcardArray` (jCard, RFC 7095) into a property map.
///
/// Returns an empty map for anything that is not `["vcard", [...]]`.
/// Properties that are not `[name, params, type, value]` are skipped and
/// later duplicates replace earlier ones.
pub fn parse_vcard_array(vcard_array: &Value) -> HashMap<String, Value> {
    let mut result = HashMap::new();

    let Some([kind, properties]) = vcard_array.as_array().map(Vec::as_slice) else {
        return result;
    };
    if kind.as_str() != Some("vcard") {
        return result;
    }
    let Some(properties) = properties.as_array() else {
        return result;
    };

    for prop in properties {
        if let Some([name, _params, _value_type, value]) = prop.as_array().map(Vec::as_slice) {
            if let Some(name) = name.as_str() {
                result.insert(name.to_string(), value.clone());
            }
        }
    }

    result
}

/// Most likely registrant name in a parsed vCard.
///
/// Tries the formatted name first, then `org`, `name` and `handle`.
pub fn get_vcard_name(vcard: &HashMap<String, Value>) -> Option<String> {
    ["fn", "org", "name", "handle"]
        .iter()
        .find_map(|key| vcard.get(*key).and_then(property_text))
}

/// Text of a jCard property value. Structured values (like `org` with
/// units) use their first non-empty component.
fn property_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()).map(String::from),
        Value::Array(items) => items.iter().find_map(property_text),
        _ => None,
    }
}

/// Depth-first search for a registrant name in RDAP entities.
///
/// A registrant at the current level wins over anything nested below it.
pub fn find_registrant(entities: &[Value]) -> Option<String> {
    let registrant = entities.iter().find_map(|entity| {
        let is_registrant = entity
            .get("roles")
            .and_then(|r| r.as_array())
            .is_some_and(|roles| roles.iter().any(|role| role.as_str() == Some("registrant")));

        if !is_registrant {
            return None;
        }

        entity
            .get("vcardArray")
            .map(parse_vcard_array)
            .and_then(|vcard| get_vcard_name(&vcard))
    });

    if registrant.is_some() {
        return registrant;
    }

    entities.iter().find_map(|entity| {
        entity
            .get("entities")
            .and_then(|e| e.as_array())
            .filter(|nested| !nested.is_empty())
            .and_then(|nested| find_registrant(nested))
    })
}

/// Registrant name of an RDAP IP network record.
pub fn extract_registrant(json: &Value) -> Option<String> {
    json.get("entities")
        .and_then(|e| e.as_array())
        .and_then(|entities| find_registrant(entities))
}

/// Extract network information from an RDAP JSON response.
pub fn extract_network_info(json: &Value) -> NetworkInfo {
    let text = |key: &str| json.get(key).and_then(|v| v.as_str()).map(String::from);

    let mut info = NetworkInfo {
        handle: text("handle"),
        name: text("name"),
        start_address: text("startAddress"),
        end_address: text("endAddress"),
        ip_version: text("ipVersion"),
        network_type: text("type"),
        country: text("country"),
        parent_handle: text("parentHandle"),
        ..Default::default()
    };

    if let Some(statuses) = json.get("status").and_then(|s| s.as_array()) {
        info.status = statuses
            .iter()
            .filter_map(|s| s.as_str())
            .map(String::from)
            .collect();
    }

    // cidr0 extension: [{"v4prefix": "8.8.8.0", "length": 24}, ...]
    if let Some(cidrs) = json.get("cidr0_cidrs").and_then(|c| c.as_array()) {
        for cidr in cidrs {
            let prefix = cidr
                .get("v4prefix")
                .or_else(|| cidr.get("v6prefix"))
                .and_then(|p| p.as_str());
            let length = cidr.get("length").and_then(|l| l.as_u64());
            if let (Some(prefix), Some(length)) = (prefix, length) {
                info.cidrs.push(format!("{}/{}", prefix, length));
            }
        }
    }

    if let Some(events) = json.get("events").and_then(|e| e.as_array()) {
        for event in events {
            if let (Some(event_action), Some(event_date)) = (
                event.get("eventAction").and_then(|a| a.as_str()),
                event.get("eventDate").and_then(|d| d.as_str()),
            ) {
                match event_action {
                    "registration" => info.registration_date = Some(event_date.to_string()),
                    "last changed" => info.last_changed_date = Some(event_date.to_string()),
                    _ => {}
                }
            }
        }
    }

    info
}
