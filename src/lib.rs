#![no_std]

//! easy-nrf52: a small convenience layer over the Nordic SoftDevice
//!
//! Organized in layers:
//!
//! - `core`: text and byte codecs (hex, addresses, advertising data, command lines)
//! - `ble`: role tasks on top of nrf-softdevice and the event surface
//! - `enrf`: the facade applications talk to
//! - `serial`, `board`, `system`: console, pin tables, reset handling
//! - `commands`: the interpreter behind the serial BLE tool

pub mod ble;
pub mod board;
pub mod commands;
pub mod config;
pub mod core;
pub mod enrf;
pub mod error;
pub mod serial;
pub mod system;

pub use enrf::Enrf;
pub use error::EnrfError;
