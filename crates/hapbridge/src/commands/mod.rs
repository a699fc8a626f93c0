//! Command handlers and the config helpers they share.

pub mod config_cmd;
pub mod dry_run;
pub mod setup_uri;

use std::path::PathBuf;

use hapbridge_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file selected by `--config`, or the platform default.
pub fn config_file(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(hapbridge_config::config_path)
}

/// Load the config file (if any) merged with `HAPBRIDGE_*` variables.
pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let path = config_file(global);
    tracing::debug!(path = %path.display(), "loading config");
    Ok(hapbridge_config::load_config_from(&path)?)
}

/// Parse a humantime duration given on the command line.
pub fn parse_duration(field: &str, value: &str) -> Result<std::time::Duration, CliError> {
    humantime::parse_duration(value.trim()).map_err(|err| CliError::Validation {
        field: field.into(),
        reason: format!("'{value}': {err}"),
    })
}
