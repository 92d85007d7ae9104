//! GAP settings shared by the role tasks
//!
//! PHY selection, tx power, scan window and central connection parameters.
//! Setters only record values; they take effect the next time a role starts.

use core::cell::RefCell;

use defmt::Format;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use nrf_softdevice::ble::TxPower;
use nrf_softdevice::raw;

use crate::config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct ScanParams {
    /// 0.625 ms units
    pub interval: u16,
    /// 0.625 ms units
    pub window: u16,
    /// 10 ms units, 0 for none
    pub timeout: u16,
}

#[derive(Clone, Copy)]
pub struct GapState {
    pub long_range: bool,
    /// Clamped request in dBm
    pub tx_power_dbm: i8,
    pub scan: ScanParams,
    pub conn_params: raw::ble_gap_conn_params_t,
}

impl GapState {
    const fn new() -> Self {
        Self {
            long_range: false,
            tx_power_dbm: 0,
            scan: ScanParams {
                interval: config::DEFAULT_SCAN_INTERVAL,
                window: config::DEFAULT_SCAN_WINDOW,
                timeout: 0,
            },
            conn_params: raw::ble_gap_conn_params_t {
                min_conn_interval: 16,
                max_conn_interval: 60,
                slave_latency: config::DEFAULT_SLAVE_LATENCY,
                conn_sup_timeout: 400,
            },
        }
    }

    pub fn tx_power(&self) -> TxPower {
        tx_power_level(self.tx_power_dbm)
    }
}

static GAP_STATE: Mutex<CriticalSectionRawMutex, RefCell<GapState>> = Mutex::new(RefCell::new(GapState::new()));

/// Snapshot of the current settings
pub fn get() -> GapState {
    GAP_STATE.lock(|state| *state.borrow())
}

pub fn update<R>(f: impl FnOnce(&mut GapState) -> R) -> R {
    GAP_STATE.lock(|state| f(&mut state.borrow_mut()))
}

/// Highest supported level not above `dbm`; requests below the lowest level
/// get the lowest level
pub fn tx_power_level(dbm: i8) -> TxPower {
    match dbm {
        i8::MIN..=-21 => TxPower::Minus40dBm,
        -20..=-17 => TxPower::Minus20dBm,
        -16..=-13 => TxPower::Minus16dBm,
        -12..=-9 => TxPower::Minus12dBm,
        -8..=-5 => TxPower::Minus8dBm,
        -4..=-1 => TxPower::Minus4dBm,
        #[cfg(feature = "s140")]
        0..=1 => TxPower::ZerodBm,
        #[cfg(feature = "s140")]
        2 => TxPower::Plus2dBm,
        #[cfg(not(feature = "s140"))]
        0..=2 => TxPower::ZerodBm,
        3 => TxPower::Plus3dBm,
        #[cfg(feature = "s140")]
        4 => TxPower::Plus4dBm,
        #[cfg(feature = "s140")]
        5 => TxPower::Plus5dBm,
        #[cfg(feature = "s140")]
        6 => TxPower::Plus6dBm,
        #[cfg(feature = "s140")]
        7 => TxPower::Plus7dBm,
        #[cfg(feature = "s140")]
        _ => TxPower::Plus8dBm,
        #[cfg(not(feature = "s140"))]
        _ => TxPower::Plus4dBm,
    }
}
