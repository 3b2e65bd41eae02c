// identify-ip-lib/tests/integration.rs

//! Integration tests for identify-ip-lib exports and RDAP round trips

use identify_ip_lib::{
    classify_input, get_known_registries, AddressScope, EndpointSource, IdentifyError,
    IpIdentifier, IpVersion, LookupConfig, RdapClient,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

// ============================================================
// Local RDAP server
// ============================================================

/// One canned response, matched on the exact request path.
#[derive(Clone)]
struct Route {
    path: String,
    status: u16,
    body: String,
    location: Option<String>,
}

impl Route {
    fn json(path: &str, body: serde_json::Value) -> Self {
        Self {
            path: path.to_string(),
            status: 200,
            body: body.to_string(),
            location: None,
        }
    }

    fn status(path: &str, status: u16, body: &str) -> Self {
        Self {
            path: path.to_string(),
            status,
            body: body.to_string(),
            location: None,
        }
    }

    fn redirect(path: &str, location: &str) -> Self {
        Self {
            path: path.to_string(),
            status: 302,
            body: String::new(),
            location: Some(location.to_string()),
        }
    }
}

/// Minimal HTTP/1.1 server answering from a fixed route table.
struct MockRdapServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockRdapServer {
    async fn start(routes: Vec<Route>) -> Self {
        Self::start_with(|_| routes).await
    }

    /// Start a server whose routes depend on its own address.
    async fn start_with<F>(build_routes: F) -> Self
    where
        F: FnOnce(SocketAddr) -> Vec<Route>,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let routes = build_routes(addr);
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = requests.clone();

        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                let seen = seen.clone();

                tokio::spawn(async move {
                    let mut buf = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buf.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let request = String::from_utf8_lossy(&buf).to_string();
                    let path = request
                        .split_whitespace()
                        .nth(1)
                        .unwrap_or_default()
                        .to_string();
                    seen.lock().unwrap().push(request);

                    let route = routes
                        .iter()
                        .find(|r| r.path == path)
                        .cloned()
                        .unwrap_or_else(|| Route::status(&path, 404, "{}"));

                    let reason = match route.status {
                        200 => "OK",
                        302 => "Found",
                        404 => "Not Found",
                        _ => "Error",
                    };
                    let mut response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/rdap+json\r\nContent-Length: {}\r\nConnection: close\r\n",
                        route.status,
                        reason,
                        route.body.len()
                    );
                    if let Some(location) = &route.location {
                        response.push_str(&format!("Location: {}\r\n", location));
                    }
                    response.push_str("\r\n");
                    response.push_str(&route.body);

                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, requests }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Trimmed-down version of what ARIN returns for 8.8.8.8.
fn google_record() -> serde_json::Value {
    serde_json::json!({
        "rdapConformance": ["nro_rdap_profile_0", "rdap_level_0", "cidr0"],
        "objectClassName": "ip network",
        "handle": "NET-8-8-8-0-2",
        "startAddress": "8.8.8.0",
        "endAddress": "8.8.8.255",
        "ipVersion": "v4",
        "name": "GOGL",
        "type": "DIRECT ALLOCATION",
        "parentHandle": "NET-8-0-0-0-0",
        "status": ["active"],
        "cidr0_cidrs": [{"v4prefix": "8.8.8.0", "length": 24}],
        "entities": [
            {
                "objectClassName": "entity",
                "handle": "GOGL",
                "roles": ["registrant"],
                "vcardArray": ["vcard", [
                    ["version", {}, "text", "4.0"],
                    ["fn", {}, "text", "Google LLC"],
                    ["kind", {}, "text", "org"]
                ]],
                "entities": [{
                    "objectClassName": "entity",
                    "handle": "ABUSE5250-ARIN",
                    "roles": ["abuse"],
                    "vcardArray": ["vcard", [["fn", {}, "text", "Abuse"]]]
                }]
            }
        ]
    })
}

fn offline_config(server: &MockRdapServer) -> LookupConfig {
    LookupConfig::default()
        .with_base_url(server.url("/ip/"))
        .with_timeout(Duration::from_secs(5))
}

// ============================================================
// Exports and classification
// ============================================================

#[test]
fn test_classification_examples() {
    let c = classify_input("8.8.8.8").unwrap();
    assert_eq!(c.version, IpVersion::V4);
    assert_eq!(c.scope, AddressScope::Global);
    assert_eq!(c.scope.to_string(), "global");

    let c = classify_input("::1").unwrap();
    assert_eq!(c.version, IpVersion::V6);
    assert_eq!(c.scope.to_string(), "loopback");

    let err = classify_input("not-an-ip").unwrap_err();
    assert!(matches!(err, IdentifyError::InvalidAddress { .. }));
}

#[test]
fn test_library_exports_work() {
    assert_eq!(get_known_registries().len(), 5);
    assert!(RdapClient::new().is_ok());
    assert!(IpIdentifier::new().is_ok());
    assert!(!identify_ip_lib::VERSION.is_empty());
}

// ============================================================
// RDAP round trips against the local server
// ============================================================

#[tokio::test]
async fn test_identify_extracts_registrant_and_network() {
    let server = MockRdapServer::start(vec![Route::json("/ip/8.8.8.8", google_record())]).await;
    let identifier = IpIdentifier::with_config(offline_config(&server)).unwrap();

    let info = identifier.identify("8.8.8.8").await.unwrap();
    assert_eq!(info.input, "8.8.8.8");
    assert_eq!(info.version, IpVersion::V4);
    assert_eq!(info.scope, AddressScope::Global);
    assert_eq!(info.registrant.as_deref(), Some("Google LLC"));
    assert_eq!(info.source, Some(server.url("/ip/8.8.8.8")));

    let network = info.network.unwrap();
    assert_eq!(network.handle.as_deref(), Some("NET-8-8-8-0-2"));
    assert_eq!(network.cidrs, vec!["8.8.8.0/24"]);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .to_lowercase()
        .contains("accept: application/rdap+json"));
}

#[tokio::test]
async fn test_lookup_registrant_ipv6_path() {
    let server = MockRdapServer::start(vec![Route::json(
        "/ip/2001:4860:4860::8888",
        google_record(),
    )])
    .await;
    let identifier = IpIdentifier::with_config(offline_config(&server)).unwrap();

    let registrant = identifier
        .lookup_registrant("2001:4860:4860::8888")
        .await
        .unwrap();
    assert_eq!(registrant, "Google LLC");
}

#[tokio::test]
async fn test_missing_registrant() {
    let record = serde_json::json!({
        "objectClassName": "ip network",
        "handle": "NET-10-0-0-0-1",
        "entities": [{"roles": ["abuse"], "vcardArray": ["vcard", [["fn", {}, "text", "Abuse"]]]}]
    });
    let server = MockRdapServer::start(vec![Route::json("/ip/10.0.0.1", record)]).await;
    let identifier = IpIdentifier::with_config(offline_config(&server)).unwrap();

    // Full identification tolerates the gap
    let info = identifier.identify("10.0.0.1").await.unwrap();
    assert_eq!(info.scope, AddressScope::Private);
    assert!(info.registrant.is_none());

    // The registrant lookup does not
    let err = identifier.lookup_registrant("10.0.0.1").await.unwrap_err();
    assert!(matches!(err, IdentifyError::MissingRegistrant { .. }));
    assert!(err.is_lookup_failure());
    assert_eq!(err.to_string(), "registrant not found for IP Address 10.0.0.1");
}

#[tokio::test]
async fn test_non_200_is_lookup_failure() {
    let server = MockRdapServer::start(vec![Route::status("/ip/1.2.3.4", 500, "oops")]).await;
    let identifier = IpIdentifier::with_config(offline_config(&server)).unwrap();

    let err = identifier.identify("1.2.3.4").await.unwrap_err();
    assert!(err.is_lookup_failure());
    assert_eq!(err.status_code(), Some(500));

    // Unknown paths answer 404
    let err = identifier.identify("4.3.2.1").await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn test_invalid_json_is_lookup_failure() {
    let server = MockRdapServer::start(vec![Route::status("/ip/1.2.3.4", 200, "<html>")]).await;
    let identifier = IpIdentifier::with_config(offline_config(&server)).unwrap();

    let err = identifier.identify("1.2.3.4").await.unwrap_err();
    assert!(matches!(err, IdentifyError::RdapError { .. }));
    assert!(err.is_lookup_failure());
}

#[tokio::test]
async fn test_redirect_is_followed() {
    let server = MockRdapServer::start(vec![
        Route::redirect("/arin/ip/1.1.1.1", "/apnic/ip/1.1.1.1"),
        Route::json("/apnic/ip/1.1.1.1", serde_json::json!({
            "entities": [{
                "roles": ["registrant"],
                "vcardArray": ["vcard", [["fn", {}, "text", "APNIC Research and Development"]]]
            }]
        })),
    ])
    .await;

    let config = LookupConfig::default().with_base_url(server.url("/arin/ip"));
    let identifier = IpIdentifier::with_config(config).unwrap();

    let info = identifier.identify("1.1.1.1").await.unwrap();
    assert_eq!(
        info.registrant.as_deref(),
        Some("APNIC Research and Development")
    );
    assert_eq!(info.source, Some(server.url("/apnic/ip/1.1.1.1")));
}

#[tokio::test]
async fn test_bootstrap_selects_endpoint() {
    // The bootstrap entry points back at the same server under /rdap/
    let server = MockRdapServer::start_with(|addr| {
        vec![
            Route::json(
                "/bootstrap/ipv4.json",
                serde_json::json!({
                    "version": "1.0",
                    "services": [
                        [["8.0.0.0/8"], [format!("http://{}/rdap/", addr)]]
                    ]
                }),
            ),
            Route::json("/rdap/ip/8.8.8.8", google_record()),
        ]
    })
    .await;

    let config = LookupConfig::default()
        .with_bootstrap_url(server.url("/bootstrap"))
        .with_timeout(Duration::from_secs(5));
    let client = RdapClient::with_config(config).unwrap();

    let response = client.fetch_record("8.8.8.8".parse().unwrap()).await.unwrap();
    assert_eq!(response.endpoint_source, EndpointSource::Bootstrap);
    assert_eq!(response.url, server.url("/rdap/ip/8.8.8.8"));

    let paths: Vec<String> = server
        .requests()
        .iter()
        .filter_map(|r| r.split_whitespace().nth(1).map(String::from))
        .collect();
    assert_eq!(paths, vec!["/bootstrap/ipv4.json", "/rdap/ip/8.8.8.8"]);
}

#[tokio::test]
async fn test_ipv4_mapped_address_uses_ipv4_registry() {
    let server = MockRdapServer::start_with(|addr| {
        vec![
            Route::json(
                "/bootstrap/ipv4.json",
                serde_json::json!({
                    "version": "1.0",
                    "services": [
                        [["8.0.0.0/8"], [format!("http://{}/rdap/", addr)]]
                    ]
                }),
            ),
            Route::json("/rdap/ip/8.8.8.8", google_record()),
        ]
    })
    .await;

    let config = LookupConfig::default()
        .with_bootstrap_url(server.url("/bootstrap"))
        .with_timeout(Duration::from_secs(5));
    let identifier = IpIdentifier::with_config(config).unwrap();

    let info = identifier.identify("::ffff:8.8.8.8").await.unwrap();
    assert_eq!(info.version, IpVersion::V6);
    assert_eq!(info.registrant.as_deref(), Some("Google LLC"));
    assert_eq!(info.source, Some(server.url("/rdap/ip/8.8.8.8")));

    let paths: Vec<String> = server
        .requests()
        .iter()
        .filter_map(|r| r.split_whitespace().nth(1).map(String::from))
        .collect();
    assert_eq!(paths, vec!["/bootstrap/ipv4.json", "/rdap/ip/8.8.8.8"]);
}

#[tokio::test]
async fn test_timeout() {
    // Accepts connections but never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    let config = LookupConfig::default()
        .with_base_url(format!("http://{}/ip/", addr))
        .with_timeout(Duration::from_millis(300));
    let identifier = IpIdentifier::with_config(config).unwrap();

    let err = identifier.identify("8.8.8.8").await.unwrap_err();
    assert!(matches!(err, IdentifyError::Timeout { .. }), "got {:?}", err);
}

// ============================================================
// Live network
// ============================================================

/// Smoke test against the real registries.
/// This hits the network so it's marked #[ignore] for CI unless explicitly run.
#[tokio::test]
#[ignore]
async fn test_live_registrant_for_public_address() {
    let identifier = IpIdentifier::new().unwrap();
    let registrant = identifier.lookup_registrant("8.8.8.8").await.unwrap();
    assert!(!registrant.trim().is_empty());
}

#[tokio::test]
#[ignore]
async fn test_live_identify_ipv6() {
    let identifier = IpIdentifier::new().unwrap();
    let info = identifier.identify("2001:4860:4860::8888").await.unwrap();
    assert_eq!(info.version, IpVersion::V6);
    assert!(info.registrant.is_some_and(|r| !r.is_empty()));
}
