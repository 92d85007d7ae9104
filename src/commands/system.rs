//! System commands: version, address, restart, board LEDs

use defmt::info;

use crate::board::Leds;
use crate::commands::{CommandResult, Reply};
use crate::core::protocol::CommandLine;
use crate::enrf::Enrf;
use crate::system;

/// vers
pub fn handle_vers() -> CommandResult {
    Ok(Reply::text(format_args!("{} {}", system::VERSION, system::BUILD_TAG)))
}

/// mac
pub fn handle_mac(enrf: &Enrf) -> CommandResult {
    Ok(Reply::text(format_args!("{}", enrf.device_address())))
}

/// restart;1|0, the unit resets without a response
pub async fn handle_restart(enrf: &Enrf, line: &CommandLine<'_>) -> CommandResult {
    enrf.restart(line.bool_param(0)).await
}

/// led;index;1|0
///
/// Always acknowledged; indexes the board does not have are ignored.
pub fn handle_led(leds: Option<&mut Leds>, line: &CommandLine<'_>) -> CommandResult {
    let index = line.dec_param(0, 0) as usize;
    let on = line.bool_param(1);
    match leds {
        Some(leds) if index < leds.len() => leds.set(index, on),
        _ => info!("No led {}", index),
    }
    Ok(Reply::empty())
}
