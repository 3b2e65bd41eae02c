//! Identify IP CLI Application
//!
//! Command-line front end to identify-ip-lib: prints the version, type and
//! registrant of a single IP address.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgGroup, Parser};
use identify_ip_lib::{
    classify_input, load_env_config, parse_timeout_string, validate_registry,
    validate_server_url, ConfigManager, EnvConfig, ErrorKind, FileConfig, IdentifyError,
    IpIdentifier, IpInfo, LookupConfig,
};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Exit code for an unparseable address or a configuration problem.
const EXIT_INVALID: i32 = 1;
/// Exit code for any failure of the RDAP lookup.
const EXIT_LOOKUP_FAILURE: i32 = 2;

/// CLI arguments for identify-ip
#[derive(Parser, Debug)]
#[command(name = "identify-ip")]
#[command(author = "Nathan Anderson")]
#[command(about = "Identify the version, type and registrant of an IP address")]
#[command(
    long_about = "Identify the version, type and registrant of an IP address.\n\nVersion and type are worked out locally. The registrant is looked up over RDAP, using the IANA bootstrap files to find the responsible registry."
)]
#[command(disable_version_flag = true)]
#[command(styles = STYLES)]
#[command(group(ArgGroup::new("filter").args(["registrant", "ip_version", "ip_type"])))]
pub struct Args {
    /// IPv4 or IPv6 address to identify
    #[arg(value_name = "IP_ADDRESS")]
    pub address: Option<String>,

    /// Print only the registrant of the address
    #[arg(short = 'r', long = "registrant", help_heading = "Filter")]
    pub registrant: bool,

    /// Print only the IP version (4 or 6)
    #[arg(short = 'v', long = "version", help_heading = "Filter")]
    pub ip_version: bool,

    /// Print only the address type (global, private, loopback, ...)
    #[arg(short = 't', long = "type", help_heading = "Filter")]
    pub ip_type: bool,

    /// Show network details from the RDAP record
    #[arg(short = 'i', long = "info", help_heading = "Output Format")]
    pub info: bool,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Colored, aligned output
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Query a specific registry (arin, ripe, apnic, lacnic, afrinic)
    #[arg(long = "registry", value_name = "NAME", help_heading = "Protocol")]
    pub registry: Option<String>,

    /// RDAP base URL to query, e.g. https://rdap.example.net/ip/
    #[arg(long = "server", value_name = "URL", help_heading = "Protocol")]
    pub server: Option<String>,

    /// Disable IANA bootstrap (query ARIN and follow its redirect)
    #[arg(long = "no-bootstrap", help_heading = "Protocol")]
    pub no_bootstrap: bool,

    /// Lookup timeout, e.g. 15s, 2m or plain seconds
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Protocol")]
    pub timeout: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show debug logging on stderr
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,

    /// Print the identify-ip version and exit
    #[arg(short = 'V', long = "tool-version", help_heading = "Configuration")]
    pub tool_version: bool,
}

/// Output options after config file, environment and CLI are merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct OutputSettings {
    json: bool,
    pretty: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if args.tool_version {
        println!("identify-ip {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let address = match validate_args(&args) {
        Ok(address) => address,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(EXIT_INVALID);
        }
    };

    init_logging(args.debug);

    if let Err(e) = run(&args, &address).await {
        tracing::debug!(error = ?e, "identify-ip failed");
        eprintln!("Error: {}", e);
        process::exit(exit_code(&e));
    }
}

/// Validate command line arguments, returning the address to identify.
fn validate_args(args: &Args) -> Result<String, String> {
    match args.address.as_deref().map(str::trim) {
        Some(address) if !address.is_empty() => Ok(address.to_string()),
        _ => Err("You must specify an IP address".to_string()),
    }
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` selects debug output.
fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_code(error: &IdentifyError) -> i32 {
    match error.kind() {
        ErrorKind::LookupFailure => EXIT_LOOKUP_FAILURE,
        ErrorKind::InvalidInput | ErrorKind::Configuration => EXIT_INVALID,
    }
}

async fn run(args: &Args, address: &str) -> Result<(), IdentifyError> {
    let env_config = load_env_config();
    let (config, output) = build_config(args, &env_config)?;

    // Version and type never need the network
    if args.ip_version || args.ip_type {
        let classification = classify_input(address)?;
        if output.json {
            let value = if args.ip_version {
                serde_json::json!({
                    "address": classification.address,
                    "version": classification.version,
                })
            } else {
                serde_json::json!({
                    "address": classification.address,
                    "scope": classification.scope,
                })
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else if args.ip_version {
            println!("{}", classification.version);
        } else {
            println!("{}", classification.scope);
        }
        return Ok(());
    }

    let identifier = IpIdentifier::with_config(config)?;

    if args.registrant {
        let registrant = identifier.lookup_registrant(address).await?;
        if output.json {
            let value = serde_json::json!({ "registrant": registrant });
            println!("{}", serde_json::to_string_pretty(&value)?);
        } else {
            println!("{}", registrant);
        }
        return Ok(());
    }

    let info = identifier.identify(address).await?;
    display_result(&info, args, output)
}

/// Build the lookup configuration with proper precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (IDIP_*)
/// 3. Config file (explicit `--config`/`IDIP_CONFIG`, or discovered files)
/// 4. Built-in defaults
fn build_config(
    args: &Args,
    env_config: &EnvConfig,
) -> Result<(LookupConfig, OutputSettings), IdentifyError> {
    let config_manager = ConfigManager::new();

    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => {
            tracing::debug!(path = %path, "Using explicit config file");
            config_manager.load_file(path)?
        }
        None => config_manager.discover_and_load(),
    };

    let mut config = file_config.apply_to(LookupConfig::default());
    config = env_config.apply_to(config);
    config = apply_cli_args_to_config(config, args)?;

    if let Some(registry) = &config.registry {
        validate_registry(registry)?;
    }
    if let Some(server) = &config.base_url {
        validate_server_url(server)?;
    }

    let output = resolve_output_settings(args, env_config, &file_config);
    Ok((config, output))
}

/// Apply CLI arguments to config (highest precedence).
///
/// Flags only ever switch behavior on; leaving one off keeps the value
/// from the environment or config file.
fn apply_cli_args_to_config(
    mut config: LookupConfig,
    args: &Args,
) -> Result<LookupConfig, IdentifyError> {
    if let Some(timeout) = &args.timeout {
        let secs = parse_timeout_string(timeout)
            .filter(|secs| *secs > 0)
            .ok_or_else(|| {
                IdentifyError::config(format!(
                    "Invalid timeout '{}': use a duration like 15s, 2m or 30",
                    timeout
                ))
            })?;
        config.timeout = Duration::from_secs(secs);
    }

    if args.no_bootstrap {
        config.enable_bootstrap = false;
    }
    if let Some(registry) = &args.registry {
        config.registry = Some(registry.trim().to_lowercase());
    }
    if let Some(server) = &args.server {
        config.base_url = Some(server.trim().to_string());
    }

    Ok(config)
}

fn resolve_output_settings(
    args: &Args,
    env_config: &EnvConfig,
    file_config: &FileConfig,
) -> OutputSettings {
    let file_output = file_config.output.as_ref();
    let file_json = file_output.and_then(|o| o.json).unwrap_or(false);
    let file_pretty = file_output.and_then(|o| o.pretty).unwrap_or(false);

    OutputSettings {
        json: args.json || env_config.json.unwrap_or(file_json),
        pretty: args.pretty || file_pretty,
    }
}

fn display_result(
    info: &IpInfo,
    args: &Args,
    output: OutputSettings,
) -> Result<(), IdentifyError> {
    if output.json {
        display_json_result(info)
    } else {
        if output.pretty {
            ui::print_result(info, args.info);
        } else {
            ui::print_result_default(info, args.info);
        }
        Ok(())
    }
}

/// Display the result in JSON format
fn display_json_result(info: &IpInfo) -> Result<(), IdentifyError> {
    let json = serde_json::to_string_pretty(info)?;
    println!("{}", json);
    Ok(())
}
