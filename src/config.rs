//! Compile-time configuration
//!
//! Defaults for the radio roles, unit conversions and the SoftDevice enable
//! configuration. Chip, SoftDevice variant and board are selected with Cargo
//! features; everything else lives here.

use nrf_softdevice::{raw, Config as SdConfig};

/// Maximum device name length stored in the stack
pub const MAX_DEVICE_NAME_LEN: usize = 32;

/// Default advertising interval in milliseconds
pub const DEFAULT_ADV_INTERVAL_MS: u32 = 100;

/// Default scan interval (0.625 ms units)
pub const DEFAULT_SCAN_INTERVAL: u16 = 0x00A0;

/// Default scan window (0.625 ms units)
pub const DEFAULT_SCAN_WINDOW: u16 = 0x0050;

/// Default connection interval range and supervision timeout, milliseconds
pub const DEFAULT_MIN_CONN_INTERVAL_MS: f32 = 20.0;
pub const DEFAULT_MAX_CONN_INTERVAL_MS: f32 = 75.0;
pub const DEFAULT_SLAVE_LATENCY: u16 = 0;
pub const DEFAULT_SUP_TIMEOUT_MS: f32 = 4000.0;

/// Tx power limits accepted by the radio, dBm
pub const MIN_TX_POWER_DBM: i32 = -40;
pub const MAX_TX_POWER_DBM: i32 = 8;

/// ATT MTU configured for every link
pub const ATT_MTU: u16 = 247;

/// NUS payload per notification when the MTU was not raised
pub const NUS_CHUNK_LEN: usize = 20;

/// Largest payload carried by one NUS write or GATT event
pub const MAX_GATT_DATA: usize = 128;

/// Number of vendor specific UUID bases the stack reserves room for
pub const VS_UUID_COUNT: u8 = 10;

/// Serial line input capacity
pub const SERIAL_LINE_MAX: usize = 100;

/// UART baud rate for the serial console
pub const SERIAL_BAUD: u32 = 115_200;

/// Unit sizes used by the stack, in microseconds
pub const UNIT_0_625_MS: u32 = 625;
pub const UNIT_1_25_MS: u32 = 1250;
pub const UNIT_10_MS: u32 = 10_000;

/// Convert milliseconds into stack units (`unit_us` microseconds each)
pub fn ms_to_units(ms: f32, unit_us: u32) -> u16 {
    let units = (ms * 1000.0) / unit_us as f32;
    if units <= 0.0 {
        0
    } else if units >= u16::MAX as f32 {
        u16::MAX
    } else {
        units as u16
    }
}

/// Advertising interval in 0.625 ms units
pub fn adv_interval_units(interval_ms: u32) -> u32 {
    interval_ms.saturating_mul(1000) / UNIT_0_625_MS
}

/// Seconds into 10 ms units, 0 meaning "no timeout"
pub fn timeout_s_to_10ms(timeout_s: u32) -> u16 {
    timeout_s.saturating_mul(100).min(u16::MAX as u32) as u16
}

/// Clamp a requested tx power into the radio range
pub fn clamp_tx_power(dbm: i32) -> i8 {
    dbm.clamp(MIN_TX_POWER_DBM, MAX_TX_POWER_DBM) as i8
}

/// Default central connection parameters in stack units
pub fn default_conn_params() -> raw::ble_gap_conn_params_t {
    conn_params_from_ms(
        DEFAULT_MIN_CONN_INTERVAL_MS,
        DEFAULT_MAX_CONN_INTERVAL_MS,
        DEFAULT_SLAVE_LATENCY,
        DEFAULT_SUP_TIMEOUT_MS,
    )
}

/// Build connection parameters from millisecond values
pub fn conn_params_from_ms(
    min_con_int_ms: f32,
    max_con_int_ms: f32,
    slave_latency: u16,
    sup_timeout_ms: f32,
) -> raw::ble_gap_conn_params_t {
    raw::ble_gap_conn_params_t {
        min_conn_interval: ms_to_units(min_con_int_ms, UNIT_1_25_MS),
        max_conn_interval: ms_to_units(max_con_int_ms, UNIT_1_25_MS),
        slave_latency,
        conn_sup_timeout: ms_to_units(sup_timeout_ms, UNIT_10_MS),
    }
}

/// SoftDevice enable configuration
///
/// One peripheral and one central link, large MTU, and the device name kept
/// in stack memory so it can be changed at runtime.
pub fn softdevice_config(device_name: &'static str) -> SdConfig {
    let name_len = device_name.len().min(MAX_DEVICE_NAME_LEN) as u16;

    SdConfig {
        clock: Some(raw::nrf_clock_lf_cfg_t {
            source: raw::NRF_CLOCK_LF_SRC_RC as u8,
            rc_ctiv: 16,
            rc_temp_ctiv: 2,
            accuracy: raw::NRF_CLOCK_LF_ACCURACY_500_PPM as u8,
        }),
        conn_gap: Some(raw::ble_gap_conn_cfg_t {
            conn_count: 2,
            event_length: 24,
        }),
        conn_gatt: Some(raw::ble_gatt_conn_cfg_t { att_mtu: ATT_MTU }),
        gatts_attr_tab_size: Some(raw::ble_gatts_cfg_attr_tab_size_t {
            attr_tab_size: raw::BLE_GATTS_ATTR_TAB_SIZE_DEFAULT,
        }),
        gap_role_count: Some(raw::ble_gap_cfg_role_count_t {
            adv_set_count: 1,
            periph_role_count: 1,
            central_role_count: 1,
            central_sec_count: 0,
            _bitfield_1: raw::ble_gap_cfg_role_count_t::new_bitfield_1(0),
        }),
        gap_device_name: Some(raw::ble_gap_cfg_device_name_t {
            p_value: device_name.as_ptr() as _,
            current_len: name_len,
            max_len: MAX_DEVICE_NAME_LEN as u16,
            write_perm: unsafe { core::mem::zeroed() },
            _bitfield_1: raw::ble_gap_cfg_device_name_t::new_bitfield_1(raw::BLE_GATTS_VLOC_STACK as u8),
        }),
        common_vs_uuid: Some(raw::ble_common_cfg_vs_uuid_t {
            vs_uuid_count: VS_UUID_COUNT,
        }),
        ..Default::default()
    }
}
