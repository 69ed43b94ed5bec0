//! Structured logging setup.
//!
//! Uses `tracing` + `tracing-subscriber` with environment-based filtering:
//! the configured `log_level` is the default, and `RUST_LOG` overrides it
//! for ad-hoc debugging without touching the config file.

use crate::config::ApplicationConfig;
use crate::error::{AppResult, BlinkError};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(config: &ApplicationConfig) -> AppResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .map_err(|err| BlinkError::Configuration(format!("tracing init failed: {err}")))
}
