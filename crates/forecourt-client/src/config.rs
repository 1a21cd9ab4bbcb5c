//! # Client Configuration
//!
//! Where the backend lives and how the form behaves at this station.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     FORECOURT_BASE_URL=http://10.0.0.5:8080                            │
//! │     FORECOURT_STRATEGY=split                                           │
//! │     FORECOURT_SHORT_TOLERANCE=25                                       │
//! │     FORECOURT_TIMEOUT_SECS=10                                          │
//! │                                                                         │
//! │  2. TOML Config File (--config, else platform config dir)              │
//! │     ~/.config/forecourt/forecourt.toml (Linux)                         │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     http://localhost:8080, combined submission, tolerance 10           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [backend]
//! base_url = "http://localhost:8080"
//! timeout_secs = 30
//! strategy = "combined"   # combined | split
//!
//! [form]
//! guns = ["G1", "G2", "G3"]
//! short_collection_tolerance = 10.0
//! require_rows = true
//! require_complete_rows = true
//! default_metric = "Liters (Sale)"
//!
//! [ui]
//! result_display_secs = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use forecourt_core::{FormPolicy, Money, ValidationPolicy, DEFAULT_METRIC};

use crate::error::{ClientError, ClientResult};

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "forecourt.toml";

// =============================================================================
// Submission Strategy
// =============================================================================

/// How a validated entry is sent to the backend.
///
/// ```text
///  COMBINED (default)                  SPLIT
///  ──────────────────                  ─────
///  POST /entryData  (one request)      POST /sales        ┐
///  server applies all or nothing       POST /collections  ├─ concurrent,
///                                      POST /inventory ×n ┘  no rollback
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitStrategy {
    #[default]
    Combined,
    Split,
}

impl std::fmt::Display for SubmitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitStrategy::Combined => write!(f, "combined"),
            SubmitStrategy::Split => write!(f, "split"),
        }
    }
}

impl std::str::FromStr for SubmitStrategy {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "combined" | "entry" => Ok(SubmitStrategy::Combined),
            "split" | "separate" => Ok(SubmitStrategy::Split),
            other => Err(ClientError::InvalidConfig(format!(
                "Unknown submit strategy: '{}'. Valid options: combined, split",
                other
            ))),
        }
    }
}

// =============================================================================
// Backend Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Root URL of the dashboard backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (seconds).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub strategy: SubmitStrategy,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for BackendSettings {
    fn default() -> Self {
        BackendSettings {
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            strategy: SubmitStrategy::default(),
        }
    }
}

// =============================================================================
// Form Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSettings {
    /// Pump guns offered in the gun picker.
    #[serde(default = "default_guns")]
    pub guns: Vec<String>,

    /// How far collections may fall short of sales (currency units).
    #[serde(default = "default_tolerance")]
    pub short_collection_tolerance: f64,

    /// Reject a submission with no product rows.
    #[serde(default = "default_true")]
    pub require_rows: bool,

    /// Reject a submission while any row is missing product, gun or readings.
    #[serde(default = "default_true")]
    pub require_complete_rows: bool,

    /// Metric label used until a tank snapshot says otherwise.
    #[serde(default = "default_metric")]
    pub default_metric: String,
}

fn default_guns() -> Vec<String> {
    forecourt_core::form::DEFAULT_GUNS
        .iter()
        .map(|g| g.to_string())
        .collect()
}

fn default_tolerance() -> f64 {
    10.0
}

fn default_true() -> bool {
    true
}

fn default_metric() -> String {
    DEFAULT_METRIC.to_string()
}

impl Default for FormSettings {
    fn default() -> Self {
        FormSettings {
            guns: default_guns(),
            short_collection_tolerance: default_tolerance(),
            require_rows: true,
            require_complete_rows: true,
            default_metric: default_metric(),
        }
    }
}

// =============================================================================
// UI Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiSettings {
    /// How long a finished submission's result stays visible (seconds).
    #[serde(default = "default_display_secs")]
    pub result_display_secs: u64,
}

fn default_display_secs() -> u64 {
    3
}

impl Default for UiSettings {
    fn default() -> Self {
        UiSettings {
            result_display_secs: default_display_secs(),
        }
    }
}

// =============================================================================
// Main Client Configuration
// =============================================================================

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub form: FormSettings,

    #[serde(default)]
    pub ui: UiSettings,
}

impl ClientConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (forecourt.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ClientResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading client config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Saves configuration to file and returns where it went.
    pub fn save(&self, config_path: Option<PathBuf>) -> ClientResult<PathBuf> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ClientError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ClientError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Client config saved");
        Ok(path)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = url::Url::parse(&self.backend.base_url)?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ClientError::InvalidUrl(format!(
                "Backend URL must start with http:// or https://, got: {}",
                self.backend.base_url
            )));
        }

        if self.backend.timeout_secs == 0 {
            return Err(ClientError::InvalidConfig(
                "timeout_secs must be greater than 0".into(),
            ));
        }

        if self.form.guns.is_empty() || self.form.guns.iter().any(|g| g.trim().is_empty()) {
            return Err(ClientError::InvalidConfig(
                "guns must list at least one non-empty gun".into(),
            ));
        }

        let tolerance = self.form.short_collection_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(ClientError::InvalidConfig(format!(
                "short_collection_tolerance must be a non-negative number, got: {}",
                tolerance
            )));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup.
    ///
    /// Unparseable values are logged and skipped; their keys are returned.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Vec<&'static str>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut ignored = Vec::new();

        if let Some(url) = lookup("FORECOURT_BASE_URL") {
            debug!(url = %url, "Overriding backend URL from environment");
            self.backend.base_url = url;
        }

        if let Some(strategy) = lookup("FORECOURT_STRATEGY") {
            match strategy.parse() {
                Ok(parsed) => {
                    debug!(strategy = %strategy, "Overriding submit strategy from environment");
                    self.backend.strategy = parsed;
                }
                Err(_) => {
                    warn!(strategy = %strategy, "Unknown submit strategy in environment");
                    ignored.push("FORECOURT_STRATEGY");
                }
            }
        }

        if let Some(tolerance) = lookup("FORECOURT_SHORT_TOLERANCE") {
            match tolerance.trim().parse::<f64>() {
                Ok(t) => {
                    debug!(tolerance = t, "Overriding short-collection tolerance from environment");
                    self.form.short_collection_tolerance = t;
                }
                Err(_) => {
                    warn!(tolerance = %tolerance, "Malformed short-collection tolerance in environment");
                    ignored.push("FORECOURT_SHORT_TOLERANCE");
                }
            }
        }

        if let Some(timeout) = lookup("FORECOURT_TIMEOUT_SECS") {
            match timeout.trim().parse::<u64>() {
                Ok(t) => {
                    debug!(timeout_secs = t, "Overriding request timeout from environment");
                    self.backend.timeout_secs = t;
                }
                Err(_) => {
                    warn!(timeout = %timeout, "Malformed request timeout in environment");
                    ignored.push("FORECOURT_TIMEOUT_SECS");
                }
            }
        }

        ignored
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "forecourt", "forecourt")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    pub fn base_url(&self) -> &str {
        &self.backend.base_url
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn strategy(&self) -> SubmitStrategy {
        self.backend.strategy
    }

    pub fn result_display(&self) -> Duration {
        Duration::from_secs(self.ui.result_display_secs)
    }

    /// Form behaviour derived from the `[form]` section.
    pub fn form_policy(&self) -> FormPolicy {
        FormPolicy {
            guns: self.form.guns.clone(),
            default_metric: self.form.default_metric.clone(),
            validation: ValidationPolicy {
                short_collection_tolerance: Money::from_f64(self.form.short_collection_tolerance),
                require_rows: self.form.require_rows,
                require_complete_rows: self.form.require_complete_rows,
            },
        }
    }
}
