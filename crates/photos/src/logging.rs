//! Tracing subscriber setup.

use photos_bot::LoggingConfig;
use photos_error::{ConfigError, PhotosResult};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive to use when `RUST_LOG` is not set.
///
/// `--verbose` wins over the configured level.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        config.level().trim().to_string()
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` overrides the configured level unless `verbose` is set.
pub fn init_logging(config: &LoggingConfig, verbose: bool) -> PhotosResult<()> {
    let directive = filter_directive(config, verbose);
    let env_filter = if verbose {
        EnvFilter::try_new(&directive)
    } else {
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&directive))
    }
    .map_err(|e| ConfigError::new(format!("Invalid log level '{}': {}", directive, e)))?;

    let fmt_layer = if *config.json() {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| ConfigError::new(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}
