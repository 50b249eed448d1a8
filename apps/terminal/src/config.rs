//! # Register Configuration
//!
//! Loaded once at startup, read-only afterwards.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`KIOSK_*`, e.g. `KIOSK_STORE_NAME`)
//! 2. Config file (`kiosk.toml`, optional)
//! 3. Defaults (this file)

use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use kiosk_core::{QuantityInputPolicy, LOW_STOCK_THRESHOLD};

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "kiosk.toml";

/// Register configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalConfig {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,

    /// Shown in the banner and on the settlement summary.
    pub store_name: String,

    pub currency_symbol: String,

    /// Decimal places shown for amounts (0-2).
    pub currency_decimals: u8,

    /// How cart quantity edits treat non-numeric text.
    /// Scan confirmation is always strict.
    pub quantity_input: QuantityInputPolicy,

    /// Products below this stock are flagged in listings.
    pub low_stock_threshold: i64,

    /// Session identity recorded on each sale.
    pub user_id: String,
    pub display_name: String,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            database_path: None,
            store_name: "Kiosk".to_string(),
            currency_symbol: "$".to_string(),
            currency_decimals: 2,
            quantity_input: QuantityInputPolicy::CoerceToOne,
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            user_id: "register-1".to_string(),
            display_name: "Register 1".to_string(),
        }
    }
}

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Could not determine app data directory")]
    NoDataDir,

    #[error("Could not create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TerminalConfig {
    /// Loads defaults, then the config file, then `KIOSK_*` variables.
    ///
    /// An explicit `path` must exist; the default `kiosk.toml` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (file, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        let settings = Config::builder()
            .add_source(Config::try_from(&TerminalConfig::default())?)
            .add_source(File::new(&file.to_string_lossy(), FileFormat::Toml).required(required))
            .add_source(Environment::with_prefix("KIOSK"))
            .build()?;

        let config: TerminalConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML text over the defaults.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(Config::try_from(&TerminalConfig::default())?)
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?;

        let config: TerminalConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.currency_decimals > 2 {
            return Err(ConfigError::InvalidValue {
                field: "currency_decimals".to_string(),
                reason: "must be 0, 1 or 2".to_string(),
            });
        }
        if self.low_stock_threshold < 0 {
            return Err(ConfigError::InvalidValue {
                field: "low_stock_threshold".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(())
    }

    /// Resolves the database file, creating the data directory if needed.
    ///
    /// ## Platform-Specific Defaults
    /// - **macOS**: `~/Library/Application Support/com.kiosk.pos/kiosk.db`
    /// - **Windows**: `%APPDATA%\kiosk\pos\data\kiosk.db`
    /// - **Linux**: `~/.local/share/pos/kiosk.db`
    pub fn resolve_database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = ProjectDirs::from("com", "kiosk", "pos").ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();

        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;

        Ok(data_dir.join("kiosk.db"))
    }

    /// Formats a cent amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use kiosk_terminal::config::TerminalConfig;
    ///
    /// let config = TerminalConfig::default();
    /// assert_eq!(config.format_currency(1234), "$12.34");
    /// ```
    pub fn format_currency(&self, cents: i64) -> String {
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.abs();
        let whole = cents / 100;

        let amount = match self.currency_decimals {
            0 => whole.to_string(),
            1 => format!("{}.{}", whole, (cents % 100) / 10),
            _ => format!("{}.{:02}", whole, cents % 100),
        };

        format!("{}{}{}", sign, self.currency_symbol, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency_positive() {
        let config = TerminalConfig::default();
        assert_eq!(config.format_currency(1234), "$12.34");
        assert_eq!(config.format_currency(100), "$1.00");
        assert_eq!(config.format_currency(1), "$0.01");
        assert_eq!(config.format_currency(0), "$0.00");
    }

    #[test]
    fn test_format_currency_negative() {
        let config = TerminalConfig::default();
        assert_eq!(config.format_currency(-1234), "-$12.34");
    }

    #[test]
    fn test_format_currency_without_decimals() {
        let config = TerminalConfig {
            currency_symbol: "ARS ".to_string(),
            currency_decimals: 0,
            ..Default::default()
        };
        assert_eq!(config.format_currency(4000), "ARS 40");
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = TerminalConfig::from_toml(
            r#"
            store_name = "Kiosco Centro"
            quantity_input = "strict"
            low_stock_threshold = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.store_name, "Kiosco Centro");
        assert_eq!(config.quantity_input, QuantityInputPolicy::Strict);
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.database_path, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(TerminalConfig::from_toml("currency_decimals = 3").is_err());
        assert!(TerminalConfig::from_toml("quantity_input = \"sometimes\"").is_err());
    }

    #[test]
    fn test_explicit_database_path() {
        let config = TerminalConfig {
            database_path: Some(PathBuf::from("/tmp/kiosk-test.db")),
            ..Default::default()
        };
        assert_eq!(
            config.resolve_database_path().unwrap(),
            PathBuf::from("/tmp/kiosk-test.db")
        );
    }
}
