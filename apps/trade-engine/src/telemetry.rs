//! Tracing setup.
//!
//! Console-structured logging with env-filter control.
//!
//! # Configuration
//!
//! - `RUST_LOG`: standard env-filter directives (default: `info`)
//! - `LOG_ANSI`: set to `false` to disable ANSI colors

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Safe to call once at startup; a second call is a no-op.
pub fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let ansi = std::env::var("LOG_ANSI").map(|v| v != "false").unwrap_or(true);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_ansi(ansi)
        .try_init();
}
