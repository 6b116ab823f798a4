//! Application configuration using Figment
//!
//! Configuration is loaded from:
//! 1. `config/debug_modules.toml` (optional base configuration)
//! 2. Environment variables (prefixed with `DEBUG_MODULES_`)
//!
//! # Environment Variable Overrides
//!
//! Nested keys are separated by a double underscore:
//!
//! ```text
//! DEBUG_MODULES_MODULES__ROOT=/srv/debug_modules
//! DEBUG_MODULES_MODULES__MAX_OPERATIONS=500000
//! DEBUG_MODULES_LOGGING__LEVEL=debug
//! ```
//!
//! # Example
//!
//! ```no_run
//! use debug_modules::config::AppConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     println!("Modules root: {:?}", config.modules.root);
//!     Ok(())
//! }
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/debug_modules.toml";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DEBUG_MODULES_";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment could not read or extract the layered configuration.
    #[error("Configuration load error: {0}")]
    LoadError(#[from] Box<figment::Error>),
    /// Values parsed but are semantically invalid.
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Top-level application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Module discovery settings
    #[serde(default)]
    pub modules: ModulesConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Module discovery and handler execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModulesConfig {
    /// Directory whose immediate subdirectories are candidate modules
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Operation budget for a single script handler call
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            max_operations: default_max_operations(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ============================================================================
// Default value functions
// ============================================================================

fn default_root() -> PathBuf {
    PathBuf::from("debug_modules")
}

fn default_max_operations() -> u64 {
    100_000
}

fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// Configuration Loading and Validation
// ============================================================================

impl AppConfig {
    /// Load configuration from the default file and environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if extraction or validation fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path.
    ///
    /// Precedence (highest to lowest):
    /// 1. Environment variables (`DEBUG_MODULES_` prefix)
    /// 2. The TOML file at `path` (skipped if it does not exist)
    /// 3. Built-in defaults
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file is malformed or validation fails.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| ConfigError::LoadError(Box::new(e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Log level is valid (trace, debug, info, warn, error)
    /// - Operation budget is non-zero
    /// - Modules root is not empty
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` with a descriptive message for any validation failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid logging.level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        if self.modules.max_operations == 0 {
            return Err(ConfigError::ValidationError(
                "modules.max_operations must be > 0".to_string(),
            ));
        }

        if self.modules.root.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "modules.root cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_defaults_when_file_missing() {
        let config = AppConfig::load_from("/definitely/not/here.toml").unwrap();
        assert_eq!(config.modules.root, PathBuf::from("debug_modules"));
        assert_eq!(config.modules.max_operations, 100_000);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[modules]
root = "/srv/modules"
max_operations = 42

[logging]
level = "debug"
json = true
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.modules.root, PathBuf::from("/srv/modules"));
        assert_eq!(config.modules.max_operations, 42);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"warn\"").unwrap();

        std::env::set_var("DEBUG_MODULES_LOGGING__LEVEL", "trace");
        let config = AppConfig::load_from(file.path());
        std::env::remove_var("DEBUG_MODULES_LOGGING__LEVEL");

        assert_eq!(config.unwrap().logging.level, "trace");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let mut config = AppConfig::default();
        config.logging.level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("verbose"));
    }

    #[test]
    fn test_zero_operation_budget_rejected() {
        let mut config = AppConfig::default();
        config.modules.max_operations = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
