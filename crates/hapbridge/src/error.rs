//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use hapbridge_config::ConfigError;
use hapbridge_core::{BoxError, CoreError};

/// Process exit codes.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const SERVICE: i32 = 4;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(
        code(hapbridge::validation),
        help("Setup ids are 4 characters [0-9A-Z], PINs are 8 digits, durations look like \"2s\".")
    )]
    Validation { field: String, reason: String },

    #[error("Unknown config key '{key}'")]
    #[diagnostic(
        code(hapbridge::unknown_key),
        help("Valid keys: category, setup_id, pin, debounce, shutdown_grace")
    )]
    UnknownKey { key: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(hapbridge::config_exists),
        help("Use --force to overwrite it, or edit it with: hapbridge config set")
    )]
    ConfigExists { path: String },

    #[error("Could not load configuration")]
    #[diagnostic(
        code(hapbridge::config),
        help("Check the file at `hapbridge config path` and any HAPBRIDGE_* variables.")
    )]
    Config {
        #[source]
        source: ConfigError,
    },

    // ── Controller ───────────────────────────────────────────────────

    #[error("Accessory server could not be built")]
    #[diagnostic(code(hapbridge::service_build))]
    ServiceBuild {
        #[source]
        source: BoxError,
    },

    #[error("Restart controller failed: {message}")]
    #[diagnostic(code(hapbridge::controller))]
    Controller { message: String },

    // ── IO ───────────────────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } | Self::UnknownKey { .. } => exit_code::USAGE,
            Self::ConfigExists { .. } | Self::Config { .. } => exit_code::CONFIG,
            Self::ServiceBuild { .. } => exit_code::SERVICE,
            Self::Controller { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::Io(err) => Self::Io(err),
            other => Self::Config { source: other },
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ServiceBuild { source } => Self::ServiceBuild { source },
            other @ (CoreError::UpdateQueueFull { .. } | CoreError::ControllerStopped) => {
                Self::Controller {
                    message: other.to_string(),
                }
            }
        }
    }
}
