//! Configuration for hapbridge.
//!
//! A flat TOML file merged with `HAPBRIDGE_*` environment variables, and
//! translation to `hapbridge_core::ControllerConfig`. The file is optional:
//! every key has a default.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use hapbridge_core::{BRIDGE_CATEGORY, ControllerConfig};

/// Prefix of environment variables that override file values.
pub const ENV_PREFIX: &str = "HAPBRIDGE_";

/// Keys read from the environment as raw strings. Figment would parse
/// `HAPBRIDGE_PIN=03145154` as an integer and drop the leading zero.
const VERBATIM_KEYS: &[&str] = &["setup_id", "pin"];

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// On-disk configuration of a bridge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Accessory category encoded in the setup URI.
    #[serde(default = "default_category")]
    pub category: u8,

    /// Four characters `[0-9A-Z]`. Generated per run when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup_id: Option<String>,

    /// Eight decimal digits. Generated per run when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<String>,

    /// Quiet period before a restart, e.g. `"2s"` or `"500ms"`.
    #[serde(default = "default_debounce")]
    pub debounce: String,

    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            category: default_category(),
            setup_id: None,
            pin: None,
            debounce: default_debounce(),
            shutdown_grace: default_shutdown_grace(),
        }
    }
}

fn default_category() -> u8 {
    BRIDGE_CATEGORY
}
fn default_debounce() -> String {
    "0s".into()
}
fn default_shutdown_grace() -> String {
    "5s".into()
}

impl Config {
    /// Validate every field and build the controller configuration.
    pub fn to_controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        if let Some(ref id) = self.setup_id {
            validate_setup_id(id)?;
        }
        if let Some(ref pin) = self.pin {
            validate_pin(pin)?;
        }

        Ok(ControllerConfig {
            category: self.category,
            setup_id: self.setup_id.clone(),
            pin: self.pin.clone(),
            debounce: parse_duration("debounce", &self.debounce)?,
            shutdown_grace: parse_duration("shutdown_grace", &self.shutdown_grace)?,
        })
    }
}

/// A setup id is exactly four characters from `[0-9A-Z]`.
pub fn validate_setup_id(id: &str) -> Result<(), ConfigError> {
    if id.len() != 4 {
        return Err(ConfigError::invalid(
            "setup_id",
            format!("expected 4 characters, got {}", id.chars().count()),
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
    {
        return Err(ConfigError::invalid(
            "setup_id",
            format!("'{id}' may only contain 0-9 and A-Z"),
        ));
    }
    Ok(())
}

/// A PIN is exactly eight decimal digits.
pub fn validate_pin(pin: &str) -> Result<(), ConfigError> {
    if pin.len() != 8 || !pin.chars().all(|c| c.is_ascii_digit()) {
        return Err(ConfigError::invalid(
            "pin",
            format!("expected 8 digits, got '{pin}'"),
        ));
    }
    Ok(())
}

fn parse_duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim())
        .map_err(|err| ConfigError::invalid(field, format!("'{value}': {err}")))
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("dev", "hapbridge", "hapbridge").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("hapbridge");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from the canonical path plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` plus environment. A missing file is not an
/// error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).ignore(VERBATIM_KEYS))
        .merge(Serialized::defaults(verbatim_env()))
        .extract()?;
    Ok(config)
}

fn verbatim_env() -> BTreeMap<&'static str, String> {
    VERBATIM_KEYS
        .iter()
        .filter_map(|key| {
            let var = format!("{ENV_PREFIX}{}", key.to_ascii_uppercase());
            std::env::var(var).ok().map(|value| (*key, value))
        })
        .collect()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`, creating parent
/// directories.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_translate_to_controller_defaults() {
        let cfg = Config::default().to_controller_config().unwrap();
        assert_eq!(cfg, ControllerConfig::default());
        assert!(!cfg.debounce_enabled());
    }

    #[test]
    fn durations_are_humantime() {
        let cfg = Config {
            debounce: "1s 500ms".into(),
            shutdown_grace: "2m".into(),
            ..Config::default()
        }
        .to_controller_config()
        .unwrap();
        assert_eq!(cfg.debounce, Duration::from_millis(1500));
        assert_eq!(cfg.shutdown_grace, Duration::from_secs(120));
    }

    #[test]
    fn rejects_bad_duration() {
        let err = Config {
            debounce: "soon".into(),
            ..Config::default()
        }
        .to_controller_config()
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation { ref field, .. } if field == "debounce"),
            "got {err:?}"
        );
    }

    #[test]
    fn setup_id_rules() {
        assert!(validate_setup_id("ABCD").is_ok());
        assert!(validate_setup_id("1QJ8").is_ok());
        assert!(validate_setup_id("ABC").is_err());
        assert!(validate_setup_id("ABCDE").is_err());
        assert!(validate_setup_id("abcd").is_err());
        assert!(validate_setup_id("AB-D").is_err());
    }

    #[test]
    fn pin_rules() {
        assert!(validate_pin("03145154").is_ok());
        assert!(validate_pin("1234567").is_err());
        assert!(validate_pin("123456789").is_err());
        assert!(validate_pin("031-45-15").is_err());
    }

    #[test]
    fn invalid_pin_fails_translation() {
        let err = Config {
            pin: Some("1234".into()),
            ..Config::default()
        }
        .to_controller_config()
        .unwrap_err();
        assert_eq!(err.to_string(), "invalid pin: expected 8 digits, got '1234'");
    }

    #[test]
    fn unset_identity_is_not_serialized() {
        let toml_str = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(!toml_str.contains("setup_id"));
        assert!(!toml_str.contains("pin"));
        assert!(toml_str.contains("debounce = \"0s\""));
    }
}
