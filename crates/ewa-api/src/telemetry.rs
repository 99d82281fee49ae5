//! Tracing subscriber setup
//!
//! Author: hephaex@gmail.com

use ewa_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

fn env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Initialize tracing for a long-running server
///
/// `RUST_LOG` wins over the configured level.
pub fn init_tracing(config: &LoggingConfig) {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config));

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Initialize tracing for the Lambda runtime
///
/// The log collector adds its own timestamp, so none is printed here.
pub fn init_lambda_tracing(config: &LoggingConfig) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_target(false)
        .without_time();

    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}
