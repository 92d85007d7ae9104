//! Application facade
//!
//! [`Enrf::init`] brings up the SoftDevice, registers the NUS server and
//! spawns the stack and role tasks. Every other operation marshals its
//! arguments into the shared GAP settings or a role request. Starting a role
//! waits until the stack accepted it; what happens afterwards arrives through
//! [`next_event`].

use defmt::{debug, info};
use embassy_executor::Spawner;
use embassy_nrf::interrupt::Priority;
use nrf_softdevice::ble::Address;
use nrf_softdevice::{raw, Softdevice};
use static_cell::StaticCell;

use crate::ble::advertiser::{self, AdvertiseParams};
use crate::ble::central::{self, ConnectRequest};
use crate::ble::client::{self, WriteOp};
use crate::ble::nus::{self, NusHandler, NusServer};
use crate::ble::scanner::{self, ScanHandler};
use crate::ble::{connection, gap_state};
use crate::config;
use crate::core::addr::AddrString;
use crate::error::EnrfError;
use crate::system;

pub use crate::ble::events::{next_event, try_next_event, BleEvent};
pub use crate::system::delay_ms;

static NUS_SERVER: StaticCell<NusServer> = StaticCell::new();

/// HAL configuration that keeps clear of the SoftDevice interrupt levels
pub fn hal_config() -> embassy_nrf::config::Config {
    let mut config = embassy_nrf::config::Config::default();
    config.gpiote_interrupt_priority = Priority::P2;
    config.time_interrupt_priority = Priority::P2;
    config
}

#[embassy_executor::task]
async fn softdevice_task(sd: &'static Softdevice) -> ! {
    sd.run().await
}

/// Handle to the running stack
#[derive(Clone, Copy)]
pub struct Enrf {
    sd: &'static Softdevice,
}

impl Enrf {
    /// Enable the stack under `name` and start the role tasks
    ///
    /// Call once, after `embassy_nrf::init(hal_config())`.
    pub fn init(spawner: Spawner, name: &'static str) -> Result<Self, EnrfError> {
        let sd = Softdevice::enable(&config::softdevice_config(name));
        let server = NUS_SERVER.init(NusServer::new(sd)?);
        let sd: &'static Softdevice = sd;

        spawner.spawn(softdevice_task(sd))?;

        advertiser::set_device_name(name)?;
        let ppcp = config::default_conn_params();
        EnrfError::check(unsafe { raw::sd_ble_gap_ppcp_set(&ppcp) })?;
        gap_state::update(|gap| gap.conn_params = ppcp);

        spawner.spawn(nus::nus_task(sd))?;
        spawner.spawn(advertiser::advertiser_task(sd, server))?;
        spawner.spawn(scanner::scanner_task(sd))?;
        spawner.spawn(central::central_task(sd))?;
        spawner.spawn(system::restart_task())?;

        info!("enrf up: {}, {}", name, system::version_string().as_str());
        Ok(Self { sd })
    }

    pub fn softdevice(&self) -> &'static Softdevice {
        self.sd
    }

    /// Use the coded PHY for the next advertising, scan or connection
    pub fn set_phy(&self, long_range: bool) {
        gap_state::update(|gap| gap.long_range = long_range);
    }

    /// Clamped into the radio range; applies from the next role start
    pub fn set_tx_power(&self, dbm: i32) {
        let dbm = config::clamp_tx_power(dbm);
        debug!("Tx power {} dBm", dbm);
        gap_state::update(|gap| gap.tx_power_dbm = dbm);
    }

    /// Replace any running advertising
    pub async fn start_advertise(&self, params: &AdvertiseParams<'_>) -> Result<(), EnrfError> {
        advertiser::start(params).await
    }

    /// Fails with `InvalidState` when not advertising
    pub fn stop_advertise(&self) -> Result<(), EnrfError> {
        advertiser::stop()
    }

    /// Hook for data received by the NUS server; `None` leaves only the
    /// standard requests
    pub fn set_nus_handler(&self, handler: Option<NusHandler>) {
        nus::set_handler(handler);
    }

    pub fn set_device_name(&self, name: &str) -> Result<(), EnrfError> {
        advertiser::set_device_name(name)
    }

    pub fn is_connected(&self) -> bool {
        connection::is_connected()
    }

    pub fn disconnect(&self) -> Result<(), EnrfError> {
        connection::disconnect()
    }

    pub async fn nus_data_send(&self, data: &[u8]) -> Result<(), EnrfError> {
        nus::data_send(data).await
    }

    pub async fn nus_string_send(&self, text: &str) -> Result<(), EnrfError> {
        nus::string_send(text).await
    }

    /// Interval and window in 0.625 ms units
    pub fn set_scan_params(&self, interval: u16, window: u16) {
        gap_state::update(|gap| {
            gap.scan.interval = interval;
            gap.scan.window = window;
        });
    }

    /// Replace any running scan; `timeout_s` 0 scans until stopped
    pub async fn start_scan(&self, handler: ScanHandler, timeout_s: u32, active: bool) -> Result<(), EnrfError> {
        scanner::start(handler, timeout_s, active).await
    }

    /// Fails with `InvalidState` when not scanning
    pub fn stop_scan(&self) -> Result<(), EnrfError> {
        scanner::stop()
    }

    /// Parameters requested for the next central connection
    pub fn set_connection_params(&self, min_interval_ms: f32, max_interval_ms: f32, slave_latency: u16, sup_timeout_ms: f32) {
        let params = config::conn_params_from_ms(min_interval_ms, max_interval_ms, slave_latency, sup_timeout_ms);
        gap_state::update(|gap| gap.conn_params = params);
    }

    /// Connect to `address`, then report registered services and, with
    /// `nus_client`, look for a NUS on the peer
    ///
    /// `None` connects to nothing; the NUS client is set up per link.
    pub async fn connect_to(&self, address: Option<Address>, discovery: bool, nus_client: bool) -> Result<(), EnrfError> {
        let Some(address) = address else {
            debug!("No peer given, nothing to connect");
            return Ok(());
        };
        central::connect_to(ConnectRequest {
            address,
            discovery,
            nus_client,
        })
        .await
    }

    pub fn cancel_connect(&self) -> Result<(), EnrfError> {
        central::cancel_connect()
    }

    /// GATT client operations run on the central link
    pub async fn enable_char_notif(&self, cccd_handle: u16, enable: bool) -> Result<(), EnrfError> {
        client::enable_char_notif(cccd_handle, enable).await
    }

    pub async fn write_char(&self, op: WriteOp, handle: u16, data: &[u8]) -> Result<(), EnrfError> {
        client::write_char(op, handle, data).await
    }

    pub async fn read_char(&self, handle: u16) -> Result<(), EnrfError> {
        client::read_char(handle).await
    }

    pub async fn nus_c_data_send(&self, data: &[u8]) -> Result<(), EnrfError> {
        client::nus_c_data_send(data).await
    }

    pub async fn nus_c_string_send(&self, text: &str) -> Result<(), EnrfError> {
        client::nus_c_string_send(text).await
    }

    /// Register a 128-bit UUID base from big endian text
    pub fn add_uuid(&self, uuid: &str) -> Result<(), EnrfError> {
        client::add_uuid(uuid)
    }

    pub fn device_address(&self) -> AddrString {
        crate::ble::device_address(self.sd)
    }

    /// Disconnect, wait and reset; never returns
    pub async fn restart(&self, enter_dfu: bool) -> ! {
        system::restart(enter_dfu).await
    }
}
