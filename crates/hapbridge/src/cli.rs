//! Clap derive structures for the `hapbridge` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use hapbridge_core::TransportFlags;

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hapbridge -- accessory bridge with debounced server restarts
#[derive(Debug, Parser)]
#[command(
    name = "hapbridge",
    version,
    about = "Publish accessories behind a bridge that restarts on change",
    long_about = "Publish accessories behind a bridge that restarts on change.\n\n\
        Accessory sets are coalesced: a burst of changes costs a single\n\
        server restart once updates have been quiet for the debounce period.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "HAPBRIDGE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the X-HM:// setup URI used for pairing
    #[command(alias = "uri")]
    SetupUri(SetupUriArgs),

    /// Inspect and edit the configuration file
    Config(ConfigArgs),

    /// Run the restart controller against a logging server.
    ///
    /// Each stdin line is one comma-separated accessory set. An empty line
    /// publishes the bridge alone; lines starting with '#' are skipped.
    DryRun(DryRunArgs),
}

#[derive(Debug, Args)]
pub struct SetupUriArgs {
    /// Accessory category (2 = bridge)
    #[arg(long)]
    pub category: Option<u8>,

    /// Four-character setup id
    #[arg(long)]
    pub setup_id: Option<String>,

    /// Eight-digit pairing PIN
    #[arg(long)]
    pub pin: Option<String>,

    /// Advertised transport
    #[arg(long, default_value = "ip")]
    pub transport: Transport,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Transport {
    /// IP network (default)
    Ip,
    /// Bluetooth LE
    Ble,
    /// IP with wireless accessory configuration
    IpWac,
}

impl From<Transport> for TransportFlags {
    fn from(transport: Transport) -> Self {
        match transport {
            Transport::Ip => Self::IP,
            Transport::Ble => Self::BLE,
            Transport::IpWac => Self::IP_WAC,
        }
    }
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a config file with a freshly generated setup id and PIN
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the resolved configuration (file + environment)
    Show,

    /// Print the config file path
    Path,

    /// Set a configuration value
    Set {
        /// One of: category, setup_id, pin, debounce, shutdown_grace
        key: String,

        /// Value to set
        value: String,
    },
}

#[derive(Debug, Args)]
pub struct DryRunArgs {
    /// Override the configured debounce (e.g. "2s", "0s" to disable)
    #[arg(long)]
    pub debounce: Option<String>,

    /// Stop the server and exit once stdin is exhausted
    #[arg(long)]
    pub exit_on_eof: bool,
}
