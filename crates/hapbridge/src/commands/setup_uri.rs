//! `setup-uri`: print the pairing URI.
//!
//! Flags win over the config file; anything still missing is generated.

use hapbridge_config::{validate_pin, validate_setup_id};
use hapbridge_core::identity::default_rng;
use hapbridge_core::{SetupIdentity, encode_setup_uri_with_flags};

use crate::cli::{GlobalOpts, SetupUriArgs};
use crate::commands::load_config;
use crate::error::CliError;

pub fn handle(args: SetupUriArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = load_config(global)?;

    let category = args.category.unwrap_or(cfg.category);
    let setup_id = args.setup_id.or(cfg.setup_id);
    let pin = args.pin.or(cfg.pin);
    if let Some(ref id) = setup_id {
        validate_setup_id(id)?;
    }
    if let Some(ref pin) = pin {
        validate_pin(pin)?;
    }

    let identity = SetupIdentity::resolve(category, setup_id, pin, &mut default_rng());
    let uri = encode_setup_uri_with_flags(
        identity.category,
        args.transport.into(),
        &identity.setup_id,
        &identity.pin,
    );

    println!("{uri}");
    eprintln!(
        "setup id {}, PIN {}",
        identity.setup_id,
        format_pin(&identity.pin)
    );
    Ok(())
}

/// Group an 8-digit PIN the way pairing dialogs show it: `XXX-XX-XXX`.
fn format_pin(pin: &str) -> String {
    match (pin.get(..3), pin.get(3..5), pin.get(5..)) {
        (Some(a), Some(b), Some(c)) if pin.len() == 8 => format!("{a}-{b}-{c}"),
        _ => pin.to_owned(),
    }
}
