//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `MODEL_REPOSITORY_`, nested keys split on `__`)
//! 2. A TOML file: `./model-repository.toml`, or the path given to [`Config::load_from`]
//! 3. Default values
//!
//! ```toml
//! [repository]
//! default_per_page = 25
//! count_applies_criteria = true
//!
//! [logging]
//! level = "model_repository=debug"
//! json = false
//! ```

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File consulted by [`Config::load`]
pub const DEFAULT_CONFIG_FILE: &str = "model-repository.toml";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "MODEL_REPOSITORY_";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Repository behaviour
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Repository behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Page size used when a caller asks for a page size of zero
    #[serde(default = "default_per_page")]
    pub default_per_page: u64,

    /// Upper bound on the page size a caller may request
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u64,

    /// Keep eager-load relations registered after a terminal call
    ///
    /// On by default: relations stay pending until replaced with `with`.
    /// Turn off to have each terminal call consume them with the criteria.
    #[serde(default = "default_true")]
    pub retain_eager_loads: bool,

    /// Apply accumulated filters and ordering in `count()`
    #[serde(default = "default_false")]
    pub count_applies_criteria: bool,
}

impl RepositoryConfig {
    /// Resolve the page size for a request
    ///
    /// Zero selects `default_per_page`; anything else is capped at
    /// `max_per_page`.
    ///
    /// ```rust
    /// use model_repository::config::RepositoryConfig;
    ///
    /// let config = RepositoryConfig::default();
    /// assert_eq!(config.effective_per_page(0), 10);
    /// assert_eq!(config.effective_per_page(15), 15);
    /// assert_eq!(config.effective_per_page(5_000), 100);
    /// ```
    #[must_use]
    pub fn effective_per_page(&self, requested: u64) -> u64 {
        let max = self.max_per_page.max(1);
        match requested {
            0 => self.default_per_page.clamp(1, max),
            n => n.min(max),
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
            retain_eager_loads: default_true(),
            count_applies_criteria: default_false(),
        }
    }
}

/// Log output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (trace, debug, info, warn, error, or an `EnvFilter` expression)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default = "default_true")]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_true(),
        }
    }
}

fn default_per_page() -> u64 {
    10
}

fn default_max_per_page() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_false() -> bool {
    false
}

impl Config {
    /// Load configuration from `./model-repository.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Load configuration from a specific file
    ///
    /// A missing file is not an error; defaults and environment overrides still apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
        }

        let config = Self::figment(path).extract()?;
        Ok(config)
    }

    fn figment(path: &Path) -> Figment {
        Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(Config::default()))
            // Load from config file (if exists)
            .merge(Toml::file(path))
            // Override with environment variables
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.repository.default_per_page, 10);
        assert_eq!(config.repository.max_per_page, 100);
        assert!(config.repository.retain_eager_loads);
        assert!(!config.repository.count_applies_criteria);
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.json);
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.repository, RepositoryConfig::default());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[repository]\ndefault_per_page = 25\ncount_applies_criteria = true\nretain_eager_loads = false\n\n[logging]\njson = false"
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.repository.default_per_page, 25);
        assert!(config.repository.count_applies_criteria);
        assert!(!config.repository.retain_eager_loads);
        // Untouched keys keep their defaults
        assert_eq!(config.repository.max_per_page, 100);
        assert!(!config.logging.json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_rejects_malformed_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[repository]\ndefault_per_page = \"lots\"").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, crate::error::Error::Config(_)));
    }

    #[test]
    fn test_effective_per_page() {
        let config = RepositoryConfig {
            default_per_page: 20,
            max_per_page: 50,
            ..RepositoryConfig::default()
        };
        assert_eq!(config.effective_per_page(0), 20);
        assert_eq!(config.effective_per_page(7), 7);
        assert_eq!(config.effective_per_page(51), 50);
    }
}
