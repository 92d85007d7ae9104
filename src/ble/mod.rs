//! BLE roles on top of the SoftDevice
//!
//! Each role runs in its own task and is driven through a signal. Starting a
//! role waits for the stack to accept it (`report`); everything after that is
//! published as an event:
//! - `advertiser`: peripheral advertising, NUS server link
//! - `scanner`: observer scanning with a report hook
//! - `central`: outgoing links, discovery and GATT client operations

pub mod advertiser;
pub mod central;
pub mod client;
pub mod connection;
pub mod events;
pub mod gap_state;
pub mod nus;
pub mod report;
pub mod scanner;

use nrf_softdevice::{raw, Softdevice};

use crate::core::addr::{addr_to_str, AddrString};

/// Own address as `AA:BB:CC:DD:EE:FF`, `?` if the stack cannot report it
pub fn device_address(_sd: &Softdevice) -> AddrString {
    let mut addr: raw::ble_gap_addr_t = unsafe { core::mem::zeroed() };
    if unsafe { raw::sd_ble_gap_addr_get(&mut addr) } == raw::NRF_SUCCESS {
        addr_to_str(&addr.addr)
    } else {
        let mut unknown = AddrString::new();
        let _ = unknown.push('?');
        unknown
    }
}
