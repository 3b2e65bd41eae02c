//! Human-readable output for identify-ip.
//!
//! Plain mode prints one sentence per address so the output stays easy
//! to pipe. `--pretty` prints an aligned, colored block.

use console::{pad_str, style, Alignment};
use identify_ip_lib::{IpInfo, NetworkInfo};

/// Placeholder for a registrant the record did not name.
const UNKNOWN_REGISTRANT: &str = "unknown";

// ── Plain output ─────────────────────────────────────────────────────────────

/// The one-line description printed when no filter flag is given.
pub fn summary_line(info: &IpInfo) -> String {
    format!(
        "{} is an IPv{} IP Address Registered by '{}'.",
        info.address,
        info.version,
        info.registrant.as_deref().unwrap_or(UNKNOWN_REGISTRANT),
    )
}

/// Print the summary line, followed by network details when asked for.
pub fn print_result_default(info: &IpInfo, show_info: bool) {
    println!("{}", summary_line(info));

    if show_info {
        println!("  Type: {}", info.scope);
        if let Some(network) = &info.network {
            for (label, value) in network_fields(network) {
                println!("  {}: {}", label, value);
            }
        }
    }
}

// ── Pretty output ────────────────────────────────────────────────────────────

/// Print an aligned, colored block describing the address.
pub fn print_result(info: &IpInfo, show_info: bool) {
    let label_width = 12;
    let label = |text: &str| style(pad_str(text, label_width, Alignment::Left, None).into_owned()).dim();

    println!("{}", style(info.address).bold());
    println!("  {}{}", label("Version"), style(format!("IPv{}", info.version)).cyan());

    let scope = if info.scope.is_global() {
        style(info.scope.as_str()).green()
    } else {
        style(info.scope.as_str()).yellow()
    };
    println!("  {}{}", label("Type"), scope);

    match &info.registrant {
        Some(name) => println!("  {}{}", label("Registrant"), style(name).green().bold()),
        None => println!("  {}{}", label("Registrant"), style(UNKNOWN_REGISTRANT).red()),
    }

    if show_info {
        if let Some(network) = &info.network {
            for (name, value) in network_fields(network) {
                println!("  {}{}", label(name), value);
            }
        }
        if let Some(source) = &info.source {
            println!("  {}{}", label("Source"), style(source).dim());
        }
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Label/value pairs of the network details that are present.
pub fn network_fields(network: &NetworkInfo) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();

    if let Some(handle) = &network.handle {
        fields.push(("Handle", handle.clone()));
    }
    if let Some(name) = &network.name {
        fields.push(("Network", name.clone()));
    }
    match (&network.start_address, &network.end_address) {
        (Some(start), Some(end)) => fields.push(("Range", format!("{} - {}", start, end))),
        (Some(start), None) => fields.push(("Range", start.clone())),
        _ => {}
    }
    if !network.cidrs.is_empty() {
        fields.push(("CIDR", network.cidrs.join(", ")));
    }
    if let Some(network_type) = &network.network_type {
        fields.push(("Allocation", network_type.clone()));
    }
    if let Some(country) = &network.country {
        fields.push(("Country", country.clone()));
    }
    if let Some(date) = &network.registration_date {
        fields.push(("Registered", date.clone()));
    }

    fields
}
