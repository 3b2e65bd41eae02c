//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and
//! `IDIP_*` environment variables, and merging them with proper
//! precedence rules.

use crate::error::IdentifyError;
use crate::protocols::registry::{get_known_registries, is_known_registry};
use crate::types::LookupConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// RDAP lookup settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookup: Option<LookupFileConfig>,

    /// Output formatting preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,
}

/// `[lookup]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct LookupFileConfig {
    /// Request timeout (as string, e.g., "5s", "2m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Whether to use the IANA bootstrap registry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootstrap: Option<bool>,

    /// Built-in registry to query directly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<String>,

    /// Explicit RDAP base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

/// `[output]` section.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty: Option<bool>,
}

impl FileConfig {
    /// Apply the `[lookup]` section on top of `config`.
    ///
    /// Values were validated when the file was loaded.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(lookup) = &self.lookup {
            if let Some(secs) = lookup.timeout.as_deref().and_then(parse_timeout_string) {
                config.timeout = Duration::from_secs(secs);
            }
            if let Some(bootstrap) = lookup.bootstrap {
                config.enable_bootstrap = bootstrap;
            }
            if let Some(registry) = &lookup.registry {
                config.registry = Some(registry.clone());
            }
            if let Some(server) = &lookup.server {
                config.base_url = Some(server.clone());
            }
        }
        config
    }
}

/// Configuration discovery and loading functionality.
#[derive(Debug, Default)]
pub struct ConfigManager;

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new() -> Self {
        Self
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, not TOML, or
    /// contains invalid values.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, IdentifyError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(IdentifyError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            IdentifyError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            IdentifyError::config(format!("Failed to parse TOML configuration: {}", e))
        })?;

        self.validate_config(&config)?;

        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Files that fail to load are skipped with a warning.
    pub fn discover_and_load(&self) -> FileConfig {
        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        candidates
            .into_iter()
            .flatten()
            .fold(FileConfig::default(), |merged, path| {
                match self.load_file(&path) {
                    Ok(config) => self.merge_configs(merged, config),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Ignoring configuration file");
                        merged
                    }
                }
            })
    }

    /// Look for configuration files in the current directory.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        ["./identify-ip.toml", "./.identify-ip.toml"]
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Look for configuration files in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".identify-ip.toml", "identify-ip.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Follows the XDG Base Directory Specification.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("identify-ip").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations. Values from `higher` take precedence.
    pub fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            lookup: match (lower.lookup, higher.lookup) {
                (Some(lower_lookup), Some(higher_lookup)) => Some(LookupFileConfig {
                    timeout: higher_lookup.timeout.or(lower_lookup.timeout),
                    bootstrap: higher_lookup.bootstrap.or(lower_lookup.bootstrap),
                    registry: higher_lookup.registry.or(lower_lookup.registry),
                    server: higher_lookup.server.or(lower_lookup.server),
                }),
                (lower_lookup, higher_lookup) => higher_lookup.or(lower_lookup),
            },
            output: match (lower.output, higher.output) {
                (Some(lower_output), Some(higher_output)) => Some(OutputConfig {
                    json: higher_output.json.or(lower_output.json),
                    pretty: higher_output.pretty.or(lower_output.pretty),
                }),
                (lower_output, higher_output) => higher_output.or(lower_output),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), IdentifyError> {
        let Some(lookup) = &config.lookup else {
            return Ok(());
        };

        if let Some(timeout_str) = &lookup.timeout {
            match parse_timeout_string(timeout_str) {
                Some(secs) if secs > 0 => {}
                _ => {
                    return Err(IdentifyError::config(format!(
                        "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                        timeout_str
                    )));
                }
            }
        }

        if let Some(registry) = &lookup.registry {
            validate_registry(registry)?;
        }

        if let Some(server) = &lookup.server {
            validate_server_url(server)?;
        }

        Ok(())
    }
}

/// Reject registry names that are not in the built-in list.
pub fn validate_registry(name: &str) -> Result<(), IdentifyError> {
    if is_known_registry(name) {
        Ok(())
    } else {
        Err(IdentifyError::config(format!(
            "Unknown registry '{}'. Known registries: {}",
            name,
            get_known_registries().join(", ")
        )))
    }
}

/// Reject server URLs that are not http(s).
pub fn validate_server_url(url: &str) -> Result<(), IdentifyError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(IdentifyError::config(format!(
            "Invalid server URL '{}': must start with http:// or https://",
            url
        )))
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// This represents configuration values that can be set via IDIP_* environment variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvConfig {
    pub timeout: Option<Duration>,
    pub bootstrap: Option<bool>,
    pub registry: Option<String>,
    pub server: Option<String>,
    pub json: Option<bool>,
    pub config: Option<String>,
}

impl EnvConfig {
    /// Apply the lookup-related variables on top of `config`.
    pub fn apply_to(&self, mut config: LookupConfig) -> LookupConfig {
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(bootstrap) = self.bootstrap {
            config.enable_bootstrap = bootstrap;
        }
        if let Some(registry) = &self.registry {
            config.registry = Some(registry.clone());
        }
        if let Some(server) = &self.server {
            config.base_url = Some(server.clone());
        }
        config
    }
}

/// Load configuration from environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config() -> EnvConfig {
    load_env_config_from(|key| env::var(key).ok())
}

/// Same as [`load_env_config`], reading variables through `lookup`.
pub fn load_env_config_from<F>(lookup: F) -> EnvConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut env_config = EnvConfig::default();

    // IDIP_TIMEOUT - request timeout
    if let Some(val) = lookup("IDIP_TIMEOUT") {
        match parse_timeout_string(&val) {
            Some(secs) if secs > 0 => {
                env_config.timeout = Some(Duration::from_secs(secs));
                tracing::debug!("Using IDIP_TIMEOUT={}", val);
            }
            _ => tracing::warn!(
                "Invalid IDIP_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                val
            ),
        }
    }

    // IDIP_BOOTSTRAP - enable/disable IANA bootstrap
    if let Some(val) = lookup("IDIP_BOOTSTRAP") {
        env_config.bootstrap = parse_bool_var("IDIP_BOOTSTRAP", &val);
    }

    // IDIP_REGISTRY - built-in registry name
    if let Some(val) = lookup("IDIP_REGISTRY") {
        match validate_registry(val.trim()) {
            Ok(()) => {
                env_config.registry = Some(val.trim().to_lowercase());
                tracing::debug!("Using IDIP_REGISTRY={}", val);
            }
            Err(e) => tracing::warn!("Ignoring IDIP_REGISTRY: {}", e),
        }
    }

    // IDIP_SERVER - explicit RDAP base URL
    if let Some(val) = lookup("IDIP_SERVER") {
        match validate_server_url(val.trim()) {
            Ok(()) => {
                env_config.server = Some(val.trim().to_string());
                tracing::debug!("Using IDIP_SERVER={}", val);
            }
            Err(e) => tracing::warn!("Ignoring IDIP_SERVER: {}", e),
        }
    }

    // IDIP_JSON - enable JSON output
    if let Some(val) = lookup("IDIP_JSON") {
        env_config.json = parse_bool_var("IDIP_JSON", &val);
    }

    // IDIP_CONFIG - explicit config file
    if let Some(path) = lookup("IDIP_CONFIG") {
        if !path.trim().is_empty() {
            tracing::debug!("Using IDIP_CONFIG={}", path);
            env_config.config = Some(path);
        }
    }

    env_config
}

fn parse_bool_var(name: &str, val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => {
            tracing::debug!("Using {}=true", name);
            Some(true)
        }
        "false" | "0" | "no" | "off" => {
            tracing::debug!("Using {}=false", name);
            Some(false)
        }
        _ => {
            tracing::warn!("Invalid {}='{}', use true/false", name, val);
            None
        }
    }
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        timeout_str.parse::<u64>().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("5s"), Some(5));
        assert_eq!(parse_timeout_string("30S"), Some(30));
        assert_eq!(parse_timeout_string("2m"), Some(120));
        assert_eq!(parse_timeout_string("5"), Some(5));
        assert_eq!(parse_timeout_string("invalid"), None);
        assert_eq!(parse_timeout_string("-1s"), None);
    }

    #[test]
    fn test_parse_timeout_string_overflow() {
        assert_eq!(parse_timeout_string("307445734561825861m"), None);
        assert_eq!(
            parse_timeout_string("18446744073709551615"),
            Some(u64::MAX)
        );

        let env = load_env_config_from(|key| {
            (key == "IDIP_TIMEOUT").then(|| "307445734561825861m".to_string())
        });
        assert_eq!(env.timeout, None);
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[lookup]
timeout = "5s"
bootstrap = false
registry = "ripe"

[output]
json = true
"#,
        );

        let config = ConfigManager::new().load_file(temp_file.path()).unwrap();
        let lookup = config.lookup.clone().unwrap();
        assert_eq!(lookup.timeout.as_deref(), Some("5s"));
        assert_eq!(lookup.bootstrap, Some(false));
        assert_eq!(lookup.registry.as_deref(), Some("ripe"));
        assert_eq!(config.output.as_ref().unwrap().json, Some(true));

        let applied = config.apply_to(LookupConfig::default());
        assert_eq!(applied.timeout, Duration::from_secs(5));
        assert!(!applied.enable_bootstrap);
        assert_eq!(applied.registry.as_deref(), Some("ripe"));
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = ConfigManager::new().load_file("/definitely/not/here/identify-ip.toml");
        assert!(matches!(result, Err(IdentifyError::FileError { .. })));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for content in [
            "[lookup]\ntimeout = \"soon\"\n",
            "[lookup]\ntimeout = \"0s\"\n",
            "[lookup]\nregistry = \"iana\"\n",
            "[lookup]\nserver = \"ftp://rdap.example\"\n",
            "[lookup\n",
        ] {
            let temp_file = write_config(content);
            let result = ConfigManager::new().load_file(temp_file.path());
            assert!(
                matches!(result, Err(IdentifyError::ConfigError { .. })),
                "expected config error for {:?}, got {:?}",
                content,
                result
            );
        }
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new();

        let lower = FileConfig {
            lookup: Some(LookupFileConfig {
                timeout: Some("10s".to_string()),
                registry: Some("arin".to_string()),
                ..Default::default()
            }),
            output: Some(OutputConfig {
                json: Some(false),
                pretty: Some(true),
            }),
        };

        let higher = FileConfig {
            lookup: Some(LookupFileConfig {
                timeout: Some("3s".to_string()),
                bootstrap: Some(false),
                ..Default::default()
            }),
            output: None,
        };

        let merged = manager.merge_configs(lower, higher);
        let lookup = merged.lookup.unwrap();

        assert_eq!(lookup.timeout.as_deref(), Some("3s")); // Higher wins
        assert_eq!(lookup.registry.as_deref(), Some("arin")); // Lower preserved
        assert_eq!(lookup.bootstrap, Some(false));
        assert_eq!(merged.output.unwrap().pretty, Some(true));
    }

    #[test]
    fn test_env_config() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("IDIP_TIMEOUT", "2m"),
            ("IDIP_BOOTSTRAP", "off"),
            ("IDIP_REGISTRY", "LACNIC"),
            ("IDIP_SERVER", "not a url"),
            ("IDIP_JSON", "maybe"),
        ]);

        let env_config = load_env_config_from(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env_config.timeout, Some(Duration::from_secs(120)));
        assert_eq!(env_config.bootstrap, Some(false));
        assert_eq!(env_config.registry.as_deref(), Some("lacnic"));
        assert_eq!(env_config.server, None);
        assert_eq!(env_config.json, None);
        assert_eq!(env_config.config, None);

        let applied = env_config.apply_to(LookupConfig::default());
        assert_eq!(applied.timeout, Duration::from_secs(120));
        assert!(!applied.enable_bootstrap);
        assert_eq!(applied.registry.as_deref(), Some("lacnic"));
    }
}
