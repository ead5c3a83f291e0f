//! Tracing setup for processes embedding the resolver.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Resolution and manifest diagnostics at `info`, everything else at `warn`.
///
/// Matched requirements log at `debug` and self/system provisions at
/// `trace`, so `RUST_LOG=bundle_resolve=debug` shows provider choices.
pub const DEFAULT_DIRECTIVES: &str = "warn,bundle_resolve=info,bundle_manifest=info";

type InitError = Box<dyn std::error::Error + Send + Sync>;

/// Install a subscriber filtered by `RUST_LOG`, or [`DEFAULT_DIRECTIVES`]
/// when it is unset. Fails if a global subscriber is already installed.
pub fn init() -> Result<(), InitError> {
    init_with(DEFAULT_DIRECTIVES)
}

/// Like [`init`], with `directives` used when `RUST_LOG` is unset.
pub fn init_with(directives: &str) -> Result<(), InitError> {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_level(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter(directives)?)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn filter(directives: &str) -> Result<EnvFilter, InitError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(directives)?),
    }
}
