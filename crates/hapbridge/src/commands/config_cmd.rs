//! Config subcommand handlers.

use hapbridge_config::{Config, save_config_to};
use hapbridge_core::SetupIdentity;
use hapbridge_core::identity::default_rng;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::commands::{config_file, load_config};
use crate::error::CliError;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: pin a generated identity to disk ─────────────────
        ConfigCommand::Init { force } => {
            let path = config_file(global);
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }

            let defaults = Config::default();
            let identity = SetupIdentity::generate(defaults.category, &mut default_rng());
            let uri = identity.setup_uri();
            let cfg = Config {
                setup_id: Some(identity.setup_id),
                pin: Some(identity.pin),
                ..defaults
            };
            save_config_to(&cfg, &path)?;

            eprintln!("Configuration written to {}", path.display());
            eprintln!("  Setup URI: {uri}");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = load_config(global)?;
            let toml_str = toml::to_string_pretty(&cfg).map_err(|e| CliError::Validation {
                field: "config".into(),
                reason: format!("failed to serialize config: {e}"),
            })?;
            print!("{toml_str}");
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config_file(global).display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let path = config_file(global);
            let mut cfg = load_config(global)?;

            match key.as_str() {
                "category" => {
                    cfg.category = value.parse().map_err(|_| CliError::Validation {
                        field: "category".into(),
                        reason: format!("'{value}' is not a number between 0 and 255"),
                    })?;
                }
                "setup_id" | "setup-id" => cfg.setup_id = Some(value),
                "pin" => cfg.pin = Some(value),
                "debounce" => cfg.debounce = value,
                "shutdown_grace" | "shutdown-grace" => cfg.shutdown_grace = value,
                other => return Err(CliError::UnknownKey { key: other.into() }),
            }

            // Refuse to write anything the controller would reject.
            cfg.to_controller_config()?;
            save_config_to(&cfg, &path)?;
            eprintln!("Updated {key} in {}", path.display());
            Ok(())
        }
    }
}
