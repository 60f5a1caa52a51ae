//! Configuration management for AssetLedger

use crate::transaction::SignatureMode;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Leading zero hex digits a SHA-256 hash can have.
pub const MAX_DIFFICULTY: usize = 64;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    /// Honour the `basic-mode-signature` marker. Unauthenticated; off by default.
    #[serde(default)]
    pub basic_mode: bool,
}

impl LedgerConfig {
    pub fn signature_mode(&self) -> SignatureMode {
        if self.basic_mode {
            SignatureMode::AllowBasicMode
        } else {
            SignatureMode::Strict
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            basic_mode: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_difficulty() -> usize {
    2
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Loads `path`, falling back to defaults when the file is absent or empty.
pub fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.trim().is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)?
    };

    if config.ledger.difficulty > MAX_DIFFICULTY {
        return Err(format!(
            "ledger.difficulty must be at most {}, got {}",
            MAX_DIFFICULTY, config.ledger.difficulty
        )
        .into());
    }

    if config.logging.level.parse::<tracing::Level>().is_err() {
        return Err(format!("logging.level is not a valid level: {}", config.logging.level).into());
    }

    Ok(config)
}
