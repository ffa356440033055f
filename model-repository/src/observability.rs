//! Log subscriber setup

use tracing_subscriber::EnvFilter;

use crate::{
    config::Config,
    error::{Error, Result},
};

/// Install a global `tracing` subscriber configured from `config.logging`
///
/// An unparsable level falls back to `info`. Installing a second subscriber
/// returns [`Error::Tracing`] instead of panicking.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = env_filter(&config.logging.level);

    let installed = if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    installed.map_err(|e| Error::Tracing(e.to_string()))?;

    tracing::info!(level = %config.logging.level, json = config.logging.json, "Tracing initialized");

    Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_directives() {
        assert_eq!(env_filter("debug").to_string(), "debug");
        assert_eq!(env_filter("model_repository=trace").to_string(), "model_repository=trace");
    }

    #[test]
    fn test_env_filter_falls_back_to_info() {
        assert_eq!(env_filter("model_repository=loudest").to_string(), "info");
    }
}
