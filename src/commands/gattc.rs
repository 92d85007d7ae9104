//! GATT client commands on the current link

use heapless::Vec;

use crate::ble::client::WriteOp;
use crate::commands::{validate, CommandError, CommandResult};
use crate::config::MAX_GATT_DATA;
use crate::core::hex;
use crate::core::protocol::CommandLine;
use crate::enrf::Enrf;

/// Handle and value of `write;handle;value_in_hex`
///
/// The handle must be non-zero and the value at least one byte.
pub fn parse_write(line: &CommandLine<'_>) -> Option<(u16, Vec<u8, MAX_GATT_DATA>)> {
    let handle = line.hex_param(0) as u16;
    if handle == 0 {
        return None;
    }
    let mut data = [0u8; MAX_GATT_DATA];
    let len = hex::hex_to_bytes(line.param(1)?, &mut data);
    if len == 0 {
        return None;
    }
    Vec::from_slice(&data[..len]).ok().map(|data| (handle, data))
}

/// notify;cccd_handle
pub async fn handle_notify(enrf: &Enrf, line: &CommandLine<'_>) -> CommandResult {
    validate(enrf.enable_char_notif(line.hex_param(0) as u16, true).await)
}

/// write;handle;hex and write_cmd;handle;hex
pub async fn handle_write(enrf: &Enrf, line: &CommandLine<'_>, op: WriteOp) -> CommandResult {
    let (handle, data) = parse_write(line).ok_or(CommandError::Syntax)?;
    validate(enrf.write_char(op, handle, &data).await)
}

/// read;handle
pub async fn handle_read(enrf: &Enrf, line: &CommandLine<'_>) -> CommandResult {
    validate(enrf.read_char(line.hex_param(0) as u16).await)
}

/// nusc;text
pub async fn handle_nusc(enrf: &Enrf, line: &CommandLine<'_>) -> CommandResult {
    validate(enrf.nus_c_string_send(line.param(0).unwrap_or("")).await)
}
