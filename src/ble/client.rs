//! GATT client operations on the central link
//!
//! The central task owns the link and waits for notifications on it, and the
//! stack lets only one procedure wait per link. Reads and writes are therefore
//! queued as [`GattRequest`]s and run by the central task between two waits;
//! the caller gets the outcome back. Results the stack reports asynchronously
//! (read values, write confirmations) are published as [`BleEvent`]s.

use core::cell::{Cell, RefCell};

use defmt::{debug, info, warn, Format};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex as AsyncMutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration, Timer};
use heapless::Vec;
use nrf_softdevice::ble::gatt_client::{self, Characteristic, Descriptor, DiscoverError, HvxType};
use nrf_softdevice::ble::{Connection, Uuid};
use nrf_softdevice::raw;

use crate::ble::connection;
use crate::ble::events::{self, event_data, BleEvent, EventData, Role};
use crate::config::{ATT_MTU, NUS_CHUNK_LEN, VS_UUID_COUNT};
use crate::core::hex;
use crate::error::{EnrfError, NRF_ERROR_RESOURCES};

/// Client Characteristic Configuration descriptor
pub const CCCD_UUID: u16 = 0x2902;

/// CCCD value enabling notifications
pub const CCCD_NOTIFY: [u8; 2] = [0x01, 0x00];
pub const CCCD_OFF: [u8; 2] = [0x00, 0x00];

/// Pause before retrying a write the stack had no buffer for
const RETRY_DELAY: Duration = Duration::from_millis(5);

/// Longest a caller waits for its queued operation
pub const GATT_TIMEOUT: Duration = Duration::from_secs(30);

/// One outstanding GATT client procedure at a time
static GATT_OP: AsyncMutex<CriticalSectionRawMutex, ()> = AsyncMutex::new(());

static REQUESTS: Channel<CriticalSectionRawMutex, GattRequest, 1> = Channel::new();
static OUTCOME: Signal<CriticalSectionRawMutex, Result<(), EnrfError>> = Signal::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum WriteOp {
    /// Write request, confirmed by the peer
    Request,
    /// Write command, no confirmation
    Command,
}

/// Operation queued for the central task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GattRequest {
    /// Read a value, reported as `ReadResponse`
    Read { handle: u16 },
    /// Write a value; a confirmed write is reported as `WriteResponse`
    Write { op: WriteOp, handle: u16, data: EventData },
    /// Turn notifications on or off through a CCCD
    Subscribe { cccd_handle: u16, enable: bool },
}

impl GattRequest {
    pub fn write(op: WriteOp, handle: u16, data: &[u8]) -> Result<Self, EnrfError> {
        let data = EventData::from_slice(data).map_err(|_| EnrfError::DataTooLarge)?;
        Ok(GattRequest::Write { op, handle, data })
    }
}

/// 16-bit part of a UUID, as shown in discovery reports
pub fn uuid16(uuid: &Uuid) -> u16 {
    unsafe { (*uuid.as_raw_ptr()).uuid }
}

/// Queue `request` for the central link and wait for its outcome
pub async fn submit(request: GattRequest) -> Result<(), EnrfError> {
    let _op = GATT_OP.lock().await;
    if connection::get(Role::Central).is_none() {
        return Err(EnrfError::NotConnected);
    }

    OUTCOME.reset();
    REQUESTS.send(request).await;
    match with_timeout(GATT_TIMEOUT, OUTCOME.wait()).await {
        Ok(result) => result,
        Err(_) => {
            // Not picked up, take it back
            let _ = REQUESTS.try_receive();
            Err(EnrfError::Timeout)
        }
    }
}

/// Next operation queued for the central link
pub(crate) async fn next_request() -> GattRequest {
    REQUESTS.receive().await
}

/// Run `request` on `conn` and hand the outcome to the waiting caller
pub(crate) async fn serve(conn: &Connection, request: GattRequest) {
    let result = execute(conn, request).await;
    if let Err(e) = result {
        debug!("GATT operation failed: {}", e);
    }
    OUTCOME.signal(result);
}

/// Fail whatever is still queued once the link is gone
pub(crate) fn fail_pending() {
    while REQUESTS.try_receive().is_ok() {
        OUTCOME.signal(Err(EnrfError::NotConnected));
    }
}

async fn execute(conn: &Connection, request: GattRequest) -> Result<(), EnrfError> {
    match request {
        GattRequest::Read { handle } => {
            let mut buf = [0u8; ATT_MTU as usize];
            let len = gatt_client::read(conn, handle, &mut buf).await?;
            debug!("Read {=u16:#x}: {} bytes", handle, len);
            events::publish(BleEvent::ReadResponse {
                handle,
                data: event_data(&buf[..len]),
            });
        }
        GattRequest::Write { op, handle, data } => {
            write_value(conn, op, handle, &data).await?;
            if op == WriteOp::Request {
                events::publish(BleEvent::WriteResponse { handle, data });
            }
        }
        GattRequest::Subscribe { cccd_handle, enable } => {
            let value = if enable { CCCD_NOTIFY } else { CCCD_OFF };
            write_value(conn, WriteOp::Request, cccd_handle, &value).await?;
            info!("Notifications {} on cccd {=u16:#x}", enable, cccd_handle);
        }
    }
    Ok(())
}

pub(crate) async fn write_value(conn: &Connection, op: WriteOp, handle: u16, data: &[u8]) -> Result<(), EnrfError> {
    loop {
        let result = match op {
            WriteOp::Request => gatt_client::write(conn, handle, data).await,
            WriteOp::Command => gatt_client::write_without_response(conn, handle, data).await,
        };
        match result.map_err(EnrfError::from) {
            Err(EnrfError::Raw(NRF_ERROR_RESOURCES)) => Timer::after(RETRY_DELAY).await,
            other => return other,
        }
    }
}

/// Read a characteristic value, reported as `ReadResponse`
pub async fn read_char(handle: u16) -> Result<(), EnrfError> {
    submit(GattRequest::Read { handle }).await
}

/// Write a characteristic value; a confirmed write is reported as
/// `WriteResponse` carrying the written data
pub async fn write_char(op: WriteOp, handle: u16, data: &[u8]) -> Result<(), EnrfError> {
    submit(GattRequest::write(op, handle, data)?).await
}

/// Write a CCCD to turn notifications on or off
pub async fn enable_char_notif(cccd_handle: u16, enable: bool) -> Result<(), EnrfError> {
    submit(GattRequest::Subscribe { cccd_handle, enable }).await
}

// ---------------------------------------------------------------------------
// Service registry and discovery

/// Services whose characteristics are reported after connecting
static REGISTERED: Mutex<CriticalSectionRawMutex, RefCell<Vec<Uuid, { VS_UUID_COUNT as usize }>>> =
    Mutex::new(RefCell::new(Vec::new()));

pub fn registered_services() -> Vec<Uuid, { VS_UUID_COUNT as usize }> {
    REGISTERED.lock(|services| services.borrow().clone())
}

fn register_service(uuid: Uuid) -> Result<(), EnrfError> {
    REGISTERED.lock(|services| {
        let mut services = services.borrow_mut();
        if services.iter().any(|s| *s == uuid) {
            return Ok(());
        }
        services.push(uuid).map_err(|_| EnrfError::Raw(crate::error::NRF_ERROR_NO_MEM))
    })
}

/// Parse a 128-bit UUID written big endian, `-` separators allowed and
/// anything after a `,` ignored; returns the bytes in stack (little endian)
/// order
pub fn parse_uuid128(text: &str) -> Option<[u8; 16]> {
    let text = text.split(',').next().unwrap_or("");
    let mut digits: Vec<u8, 32> = Vec::new();
    for c in text.bytes().filter(|&c| c != b'-') {
        digits.push(c).ok()?;
    }
    if digits.len() != 32 {
        return None;
    }

    let mut be = [0u8; 16];
    if hex::hex_to_bytes(core::str::from_utf8(&digits).ok()?, &mut be) != 16 {
        return None;
    }
    be.reverse();
    Some(be)
}

/// Register a vendor UUID base; a non-zero 16-bit part also registers the
/// service for discovery
pub fn add_uuid(text: &str) -> Result<(), EnrfError> {
    let bytes = parse_uuid128(text).ok_or(EnrfError::InvalidParam)?;

    let base = raw::ble_uuid128_t { uuid128: bytes };
    let mut uuid_type: u8 = 0;
    EnrfError::check(unsafe { raw::sd_ble_uuid_vs_add(&base, &mut uuid_type) })?;

    let short = u16::from_le_bytes([bytes[12], bytes[13]]);
    info!("UUID base added, type {}, service {=u16:#x}", uuid_type, short);
    if short != 0 {
        let uuid = Uuid::from_raw(raw::ble_uuid_t {
            uuid: short,
            type_: uuid_type,
        })
        .ok_or(EnrfError::InvalidParam)?;
        register_service(uuid)?;
    }
    Ok(())
}

/// Characteristic found while discovering one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct DiscoveredChar {
    pub uuid: u16,
    pub value_handle: u16,
    /// 0 when the characteristic has no CCCD
    pub cccd_handle: u16,
}

pub const MAX_DISCOVERED_CHARS: usize = 8;

static DISCOVERY_TARGET: Mutex<CriticalSectionRawMutex, Cell<Option<Uuid>>> = Mutex::new(Cell::new(None));

/// Collects the characteristics of [`DISCOVERY_TARGET`]
pub(crate) struct DiscoveryClient {
    pub chars: Vec<DiscoveredChar, MAX_DISCOVERED_CHARS>,
}

impl gatt_client::Client for DiscoveryClient {
    type Event = ();

    fn on_hvx(&self, _conn: &Connection, _type_: HvxType, _handle: u16, _data: &[u8]) -> Option<()> {
        None
    }

    fn uuid() -> Uuid {
        DISCOVERY_TARGET
            .lock(|target| target.get())
            .unwrap_or(Uuid::new_16(0))
    }

    fn new_undiscovered(_conn: Connection) -> Self {
        Self { chars: Vec::new() }
    }

    fn discovered_characteristic(&mut self, characteristic: &Characteristic, descriptors: &[Descriptor]) {
        let cccd = Uuid::new_16(CCCD_UUID);
        let cccd_handle = descriptors
            .iter()
            .find(|d| d.uuid == Some(cccd))
            .map(|d| d.handle)
            .unwrap_or(0);
        let found = DiscoveredChar {
            uuid: characteristic.uuid.as_ref().map(uuid16).unwrap_or(0),
            value_handle: characteristic.handle_value,
            cccd_handle,
        };
        if self.chars.push(found).is_err() {
            warn!("Discovery list full, skipping {=u16:#x}", found.uuid);
        }
    }

    fn discovery_complete(&mut self) -> Result<(), DiscoverError> {
        Ok(())
    }
}

/// Discover one service; with `report` its characteristics are published
/// followed by `DiscoveryDone`
///
/// Runs in the central task, before it waits for notifications.
pub(crate) async fn discover_service(
    conn: &Connection,
    service: Uuid,
    report: bool,
) -> Result<Vec<DiscoveredChar, MAX_DISCOVERED_CHARS>, EnrfError> {
    DISCOVERY_TARGET.lock(|target| target.set(Some(service)));
    let client: DiscoveryClient = gatt_client::discover(conn).await?;

    if report {
        let service = uuid16(&service);
        for c in client.chars.iter() {
            events::publish(BleEvent::Discovered {
                service,
                characteristic: c.uuid,
                value_handle: c.value_handle,
                cccd_handle: c.cccd_handle,
            });
        }
        events::publish(BleEvent::DiscoveryDone { service });
    }
    Ok(client.chars)
}

// ---------------------------------------------------------------------------
// NUS client

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub struct NusClientHandles {
    /// Peer RX, we write here
    pub rx: u16,
    /// Peer TX, notifications arrive here
    pub tx: u16,
    pub tx_cccd: u16,
}

static NUS_CLIENT: Mutex<CriticalSectionRawMutex, Cell<Option<NusClientHandles>>> = Mutex::new(Cell::new(None));

pub fn nus_client() -> Option<NusClientHandles> {
    NUS_CLIENT.lock(|c| c.get())
}

pub(crate) fn set_nus_client(handles: Option<NusClientHandles>) {
    NUS_CLIENT.lock(|c| c.set(handles));
}

/// Send data to the peer NUS RX characteristic without response
pub async fn nus_c_data_send(data: &[u8]) -> Result<(), EnrfError> {
    let handles = nus_client().ok_or(EnrfError::NotConnected)?;
    for chunk in data.chunks(NUS_CHUNK_LEN) {
        submit(GattRequest::write(WriteOp::Command, handles.rx, chunk)?).await?;
    }
    Ok(())
}

/// Send a string to the peer NUS, no terminator added
pub async fn nus_c_string_send(text: &str) -> Result<(), EnrfError> {
    nus_c_data_send(text.as_bytes()).await
}

/// Routes notifications of the central link
pub(crate) struct PeerClient;

impl gatt_client::Client for PeerClient {
    type Event = BleEvent;

    fn on_hvx(&self, _conn: &Connection, _type_: HvxType, handle: u16, data: &[u8]) -> Option<BleEvent> {
        match nus_client() {
            Some(nus) if nus.tx == handle => Some(BleEvent::NusClientRx(event_data(data))),
            _ => Some(BleEvent::Notification {
                handle,
                data: event_data(data),
            }),
        }
    }

    fn uuid() -> Uuid {
        Uuid::new_16(0)
    }

    fn new_undiscovered(_conn: Connection) -> Self {
        PeerClient
    }

    fn discovered_characteristic(&mut self, _characteristic: &Characteristic, _descriptors: &[Descriptor]) {}

    fn discovery_complete(&mut self) -> Result<(), DiscoverError> {
        Ok(())
    }
}
