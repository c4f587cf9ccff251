//! Tracing initialization
//!
//! Provides standardized tracing setup so every service logs the same way.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the default filter directive for a crate at a given verbosity
///
/// `verbose` follows the usual `-v` counting convention:
/// 0 = info, 1 = debug, 2+ = trace.
pub fn default_directive(crate_name: &str, verbose: u8) -> String {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    format!("{}={}", crate_name, level)
}

/// Initialize tracing/logging for a service
///
/// Sets up logging to stderr with:
/// - Formatted output without ANSI colors (for clean container logs)
/// - Environment-based filtering via RUST_LOG
/// - A default level for the specified crate, raised by `verbose`
///
/// Set `LOG_FORMAT=json` for structured JSON output (useful for production/log aggregation).
/// Default is human-readable text output.
///
/// # Arguments
///
/// * `crate_name` - The name of the service crate (e.g., "instrument")
/// * `verbose` - Number of `-v` flags passed on the command line
///
/// # Example
///
/// ```rust,ignore
/// service_common::init_tracing("instrument", 0)?;
/// ```
pub fn init_tracing(crate_name: &str, verbose: u8) -> anyhow::Result<()> {
    let directive = default_directive(crate_name, verbose);
    let filter = EnvFilter::from_default_env()
        .add_directive(directive.parse()?)
        .add_directive("tower_http=info".parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .try_init()?;
    }

    Ok(())
}
