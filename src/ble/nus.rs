//! Nordic UART Service server
//!
//! Data written to the RX characteristic is offered to the application hook
//! first. Data the hook does not take is matched against the standard
//! requests (`version?`, `mac?`, `restart`, `dfu`) and answered over TX
//! notifications.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use defmt::{debug, info, warn, Format};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use heapless::Vec;
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{Attribute, Metadata, Properties};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, Uuid};
use nrf_softdevice::Softdevice;

use crate::ble::connection;
use crate::ble::events::Role;
use crate::config::{ATT_MTU, NUS_CHUNK_LEN};
use crate::error::{EnrfError, NRF_ERROR_RESOURCES};
use crate::system;

/// NUS base UUID `6E400000-B5A3-F393-E0A9-E50E24DCCA9E`, stack byte order
pub const NUS_BASE_UUID: [u8; 16] = [
    0x9E, 0xCA, 0xDC, 0x24, 0x0E, 0xE5, 0xA9, 0xE0, 0x93, 0xF3, 0xA3, 0xB5, 0x00, 0x00, 0x40, 0x6E,
];

pub const NUS_SERVICE: u16 = 0x0001;
pub const NUS_RX_CHAR: u16 = 0x0002;
pub const NUS_TX_CHAR: u16 = 0x0003;

/// Largest NUS payload with the configured MTU
pub const NUS_MAX_DATA: usize = ATT_MTU as usize - 3;

pub type NusData = Vec<u8, NUS_MAX_DATA>;

/// 128-bit UUID on the NUS base
pub fn nus_uuid(short: u16) -> Uuid {
    let mut bytes = NUS_BASE_UUID;
    bytes[12..14].copy_from_slice(&short.to_le_bytes());
    Uuid::new_128(&bytes)
}

/// Application hook for received NUS data; returning `true` consumes it
pub type NusHandler = fn(&[u8]) -> bool;

static HANDLER: Mutex<CriticalSectionRawMutex, Cell<Option<NusHandler>>> = Mutex::new(Cell::new(None));

pub fn set_handler(handler: Option<NusHandler>) {
    HANDLER.lock(|h| h.set(handler));
}

fn handler() -> Option<NusHandler> {
    HANDLER.lock(|h| h.get())
}

static RX_CHANNEL: Channel<CriticalSectionRawMutex, NusData, 4> = Channel::new();
static TX_HANDLE: AtomicU16 = AtomicU16::new(0);
static NOTIFY_ENABLED: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Format)]
pub enum NusEvent {
    Rx,
    TxCccdWrite { notifications: bool },
}

/// NUS attribute table
pub struct NusServer {
    rx_handle: u16,
    tx_handle: u16,
    tx_cccd_handle: u16,
}

impl NusServer {
    /// Register the service; must run before the stack is shared
    pub fn new(sd: &mut Softdevice) -> Result<Self, RegisterError> {
        let mut sb = ServiceBuilder::new(sd, nus_uuid(NUS_SERVICE))?;

        let rx = sb
            .add_characteristic(
                nus_uuid(NUS_RX_CHAR),
                Attribute::new(&[0u8; 1][..]).variable_len(NUS_MAX_DATA as u16),
                Metadata::new(Properties::new().write().write_without_response()),
            )?
            .build();

        let tx = sb
            .add_characteristic(
                nus_uuid(NUS_TX_CHAR),
                Attribute::new(&[0u8; 1][..]).variable_len(NUS_MAX_DATA as u16),
                Metadata::new(Properties::new().notify()),
            )?
            .build();

        let _service = sb.build();

        info!(
            "NUS registered: rx {}, tx {}, cccd {}",
            rx.value_handle, tx.value_handle, tx.cccd_handle
        );
        TX_HANDLE.store(tx.value_handle, Ordering::Relaxed);

        Ok(Self {
            rx_handle: rx.value_handle,
            tx_handle: tx.value_handle,
            tx_cccd_handle: tx.cccd_handle,
        })
    }

    pub fn tx_handle(&self) -> u16 {
        self.tx_handle
    }
}

impl gatt_server::Server for NusServer {
    type Event = NusEvent;

    fn on_write(&self, _conn: &Connection, handle: u16, _op: WriteOp, _offset: usize, data: &[u8]) -> Option<NusEvent> {
        if handle == self.rx_handle {
            let len = data.len().min(NUS_MAX_DATA);
            let Ok(rx) = NusData::from_slice(&data[..len]) else {
                return None;
            };
            if RX_CHANNEL.try_send(rx).is_err() {
                warn!("NUS rx queue full, dropping {} bytes", len);
            }
            Some(NusEvent::Rx)
        } else if handle == self.tx_cccd_handle {
            let notifications = data.first().is_some_and(|v| v & 0x01 != 0);
            NOTIFY_ENABLED.store(notifications, Ordering::Relaxed);
            Some(NusEvent::TxCccdWrite { notifications })
        } else {
            None
        }
    }
}

/// Whether the peer enabled TX notifications
pub fn notifications_enabled() -> bool {
    NOTIFY_ENABLED.load(Ordering::Relaxed)
}

pub(crate) fn on_disconnect() {
    NOTIFY_ENABLED.store(false, Ordering::Relaxed);
}

/// Send `data` over TX notifications in [`NUS_CHUNK_LEN`] pieces, waiting
/// while the stack has no free buffers
pub async fn data_send(data: &[u8]) -> Result<(), EnrfError> {
    let conn = connection::get(Role::Peripheral).ok_or(EnrfError::NotConnected)?;
    let handle = TX_HANDLE.load(Ordering::Relaxed);

    for chunk in data.chunks(NUS_CHUNK_LEN) {
        loop {
            match gatt_server::notify_value(&conn, handle, chunk).map_err(EnrfError::from) {
                Ok(()) => break,
                Err(EnrfError::Raw(NRF_ERROR_RESOURCES)) => Timer::after(Duration::from_millis(5)).await,
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}

/// Send a string followed by a NUL terminator
pub async fn string_send(text: &str) -> Result<(), EnrfError> {
    let mut buf: Vec<u8, NUS_MAX_DATA> = Vec::new();
    let len = text.len().min(NUS_MAX_DATA - 1);
    buf.extend_from_slice(&text.as_bytes()[..len])
        .map_err(|_| EnrfError::DataTooLarge)?;
    buf.push(0).map_err(|_| EnrfError::DataTooLarge)?;
    data_send(&buf).await
}

/// Requests every NUS peripheral answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum StandardRequest {
    Version,
    Mac,
    Restart,
    Dfu,
    Unknown,
}

/// Text up to the first NUL or invalid UTF-8 byte
pub fn data_text(data: &[u8]) -> &str {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    match core::str::from_utf8(&data[..end]) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&data[..e.valid_up_to()]).unwrap_or(""),
    }
}

/// [`data_text`] with one trailing newline removed
pub fn request_text(data: &[u8]) -> &str {
    let text = data_text(data);
    text.strip_suffix('\n').unwrap_or(text)
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    text.len() >= prefix.len() && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Classify received data by case-insensitive prefix
pub fn standard_request(data: &[u8]) -> StandardRequest {
    let text = request_text(data);
    if starts_with_ignore_case(text, "version?") {
        StandardRequest::Version
    } else if starts_with_ignore_case(text, "mac?") {
        StandardRequest::Mac
    } else if starts_with_ignore_case(text, "restart") {
        StandardRequest::Restart
    } else if starts_with_ignore_case(text, "dfu") {
        StandardRequest::Dfu
    } else {
        StandardRequest::Unknown
    }
}

async fn answer(sd: &Softdevice, request: StandardRequest) -> Result<(), EnrfError> {
    match request {
        StandardRequest::Version => string_send(&system::version_string()).await,
        StandardRequest::Mac => string_send(&crate::ble::device_address(sd)).await,
        StandardRequest::Restart => {
            string_send("Restarting").await?;
            system::request_restart(false);
            Ok(())
        }
        StandardRequest::Dfu => {
            string_send("Entering DFU").await?;
            system::request_restart(true);
            Ok(())
        }
        StandardRequest::Unknown => string_send("* Unrecognized nus data").await,
    }
}

/// Processes received NUS data outside the stack event context
#[embassy_executor::task]
pub async fn nus_task(sd: &'static Softdevice) {
    info!("NUS task started");
    loop {
        let data = RX_CHANNEL.receive().await;
        debug!("NUS rx {=[u8]:x}", &data[..]);

        if let Some(hook) = handler() {
            if hook(&data) {
                continue;
            }
        }

        let request = standard_request(&data);
        debug!("NUS request {}", request);
        if let Err(e) = answer(sd, request).await {
            warn!("NUS reply failed: {}", e);
        }
    }
}
