//! UUID registration
//!
//! `add_uuid;<uuid>` registers a 128-bit vendor base given big endian, e.g.
//! `6E400001-B5A3-F393-E0A9-E50E24DCCA9E`. A non-zero 16-bit part (`0001`
//! above) also makes the service part of discovery after `connect`.

use defmt::debug;

use crate::commands::{CommandError, CommandResult, Reply};
use crate::core::protocol::CommandLine;
use crate::enrf::Enrf;
use crate::error::EnrfError;

/// add_uuid;uuid
pub fn handle_add_uuid(enrf: &Enrf, line: &CommandLine<'_>) -> CommandResult {
    let text = line.param(0).unwrap_or("");
    match enrf.add_uuid(text) {
        Ok(()) => Ok(Reply::empty()),
        Err(EnrfError::InvalidParam) => {
            debug!("Rejected UUID text");
            Err(CommandError::InvalidUuid)
        }
        Err(e) => Err(CommandError::Nrf(e)),
    }
}
