//! Configuration file parser for ~/.config/catalog-admin/config.toml.
//!
//! The config file is optional. A missing file yields `Config::default()`.
//! Unknown keys are accepted but logged as warnings.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the catalog admin backend.
    pub api_base_url: String,

    /// Base URL of the visit tracking endpoint host.
    pub visit_base_url: String,

    /// Per-request timeout for catalog calls, in seconds.
    pub request_timeout_secs: u64,

    /// Timeout for visit reports, in seconds.
    pub visit_timeout_secs: u64,

    /// Theme variant name ("dark" or "light").
    pub theme: String,

    /// Ask before Esc discards a modified sort order.
    pub confirm_discard_sort: bool,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/".to_string(),
            visit_base_url: "http://127.0.0.1:8000/".to_string(),
            request_timeout_secs: 30,
            visit_timeout_secs: 10,
            theme: "dark".to_string(),
            confirm_discard_sort: true,
            keybindings: HashMap::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "api_base_url",
        "visit_base_url",
        "request_timeout_secs",
        "visit_timeout_secs",
        "theme",
        "confirm_discard_sort",
        "keybindings",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(
            path = %path.display(),
            api_base_url = %config.api_base_url,
            theme = %config.theme,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Catalog request timeout; zero falls back to the default.
    pub fn request_timeout(&self) -> Duration {
        match self.request_timeout_secs {
            0 => Duration::from_secs(Self::default().request_timeout_secs),
            secs => Duration::from_secs(secs),
        }
    }

    /// Visit report timeout; zero falls back to the default.
    pub fn visit_timeout(&self) -> Duration {
        match self.visit_timeout_secs {
            0 => Duration::from_secs(Self::default().visit_timeout_secs),
            secs => Duration::from_secs(secs),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
