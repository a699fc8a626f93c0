//! `dry-run`: drive the restart controller with stdin instead of a real
//! accessory source, against a server that only reports what it would
//! publish.

use std::future::Future;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use hapbridge_core::{
    AccessoryService, BoxError, CancellationToken, Controller, ControllerHandle, ControllerState,
    ServiceFactory,
};

use crate::cli::{DryRunArgs, GlobalOpts};
use crate::commands::{load_config, parse_duration};
use crate::error::CliError;

// ── Logging server ──────────────────────────────────────────────────

#[derive(Debug, Default)]
struct LogFactory {
    built: u64,
}

struct LogService {
    instance: u64,
    accessories: Vec<String>,
    setup_id: String,
    pin: String,
}

impl ServiceFactory for LogFactory {
    type Accessory = String;
    type Service = LogService;

    fn build(&mut self, accessories: &[String]) -> Result<LogService, BoxError> {
        self.built += 1;
        Ok(LogService {
            instance: self.built,
            accessories: accessories.to_vec(),
            setup_id: String::new(),
            pin: String::new(),
        })
    }
}

impl AccessoryService for LogService {
    fn set_setup_id(&mut self, setup_id: &str) {
        self.setup_id = setup_id.to_owned();
    }

    fn set_pin(&mut self, pin: &str) {
        self.pin = pin.to_owned();
    }

    fn serve(self, cancel: CancellationToken) -> impl Future<Output = ()> + Send + 'static {
        async move {
            info!(
                instance = self.instance,
                setup_id = %self.setup_id,
                "serving {} accessories",
                self.accessories.len()
            );
            println!(
                "serving #{} [{}]",
                self.instance,
                self.accessories.join(", ")
            );
            cancel.cancelled().await;
            println!("stopped #{}", self.instance);
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: DryRunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut config = load_config(global)?.to_controller_config()?;
    if let Some(ref debounce) = args.debounce {
        config.debounce = parse_duration("debounce", debounce)?;
    }

    let controller = Controller::new(config, LogFactory::default());
    println!("{}", controller.setup_uri());

    let cancel = CancellationToken::new();
    let feeder = tokio::spawn(feed_stdin(
        controller.handle(),
        args.exit_on_eof.then(|| cancel.clone()),
    ));

    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted; stopping");
            on_signal.cancel();
        }
    });

    let result = controller.run(cancel).await;
    feeder.abort();
    Ok(result?)
}

/// Submit one accessory set per stdin line. With `stop_on_eof`, cancels
/// the controller once every line has been applied.
async fn feed_stdin(handle: ControllerHandle<String>, stop_on_eof: Option<CancellationToken>) {
    let mut state = handle.state();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "failed to read stdin");
                break;
            }
        };
        let Some(accessories) = parse_line(&line) else {
            continue;
        };

        state.mark_unchanged();
        if handle.submit(&accessories).await.is_err() {
            return;
        }
        // Every update the controller takes publishes a state change.
        if state.changed().await.is_err() {
            return;
        }
    }

    debug!("stdin closed");
    if let Some(cancel) = stop_on_eof {
        let _ = state
            .wait_for(|s| *s != ControllerState::RestartPending)
            .await;
        cancel.cancel();
    }
}

/// One accessory set per line: comma-separated names, blanks dropped.
/// Lines starting with `#` are comments.
fn parse_line(line: &str) -> Option<Vec<String>> {
    let line = line.trim();
    if line.starts_with('#') {
        return None;
    }
    Some(
        line.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(String::from)
            .collect(),
    )
}
