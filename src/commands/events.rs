//! Asynchronous `#` lines for stack events

use crate::ble::events::BleEvent;
use crate::ble::nus;
use crate::core::hex::HexStr;
use crate::core::protocol::{async_response, Response};

/// Line for `event`; events the tool does not show give `None`
pub fn event_response(event: &BleEvent) -> Option<Response> {
    let response = match event {
        BleEvent::Connected { .. } => async_response(format_args!("CONNECTED")),
        BleEvent::Disconnected { reason, .. } => async_response(format_args!("DISCONNECTED 0x{:x}", reason)),
        BleEvent::WriteResponse { handle, data } => {
            async_response(format_args!("WRITE_RESP:{:X},{}", handle, HexStr(data)))
        }
        BleEvent::ReadResponse { handle, data } => {
            async_response(format_args!("READ_RESP:{:X},{}", handle, HexStr(data)))
        }
        BleEvent::Notification { handle, data } => async_response(format_args!("NOTIF:{:X},{}", handle, HexStr(data))),
        BleEvent::ScanTimeout => async_response(format_args!("SCAN:Time out")),
        BleEvent::ConnectTimeout => async_response(format_args!("CONNECT:Time out")),
        BleEvent::AdvertiseTimeout => async_response(format_args!("ADVERTISE:Time out")),
        BleEvent::Discovered {
            service,
            characteristic,
            value_handle,
            cccd_handle,
        } => async_response(format_args!(
            "DISC_HANDLE:{:X},{:X},{:X},{:X}",
            service, characteristic, value_handle, cccd_handle
        )),
        BleEvent::DiscoveryDone { .. } => async_response(format_args!("DISC_DONE")),
        BleEvent::NusDetected => async_response(format_args!("NUS_DETECTED")),
        BleEvent::NusClientRx(data) => async_response(format_args!("NUSC:{}", nus::data_text(data))),
        BleEvent::NusClientDisconnected => return None,
    };
    Some(response)
}
