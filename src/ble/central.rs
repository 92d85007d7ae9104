//! Central role: outgoing connection, service discovery, NUS client and the
//! notification loop of the link
//!
//! While the link is up the task alternates between waiting for
//! notifications and running the GATT client operations queued by
//! [`client::submit`].

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::central::{self, ConnectConfig};
use nrf_softdevice::ble::{gatt_client, Address, Connection};
use nrf_softdevice::Softdevice;

use crate::ble::client::{self, NusClientHandles, PeerClient, CCCD_NOTIFY};
use crate::ble::events::{self, BleEvent, Role};
use crate::ble::nus::{self, NUS_RX_CHAR, NUS_SERVICE, NUS_TX_CHAR};
use crate::ble::report::StartReport;
use crate::ble::scanner;
use crate::ble::{connection, gap_state};
use crate::error::EnrfError;

#[derive(Clone, Copy)]
pub struct ConnectRequest {
    pub address: Address,
    /// Report the characteristics of registered services
    pub discovery: bool,
    /// Look for a NUS on the peer and subscribe to its TX
    pub nus_client: bool,
}

static CONNECT_SIGNAL: Signal<CriticalSectionRawMutex, ConnectRequest> = Signal::new();
static CANCEL_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();
static CONNECTING: AtomicBool = AtomicBool::new(false);
static CONNECT_STARTED: StartReport = StartReport::new();

/// Start connecting; returns once the stack accepted the attempt, the
/// outcome is published as `Connected` or `ConnectTimeout`
pub async fn connect_to(request: ConnectRequest) -> Result<(), EnrfError> {
    if connection::get(Role::Central).is_some() || CONNECTING.swap(true, Ordering::Relaxed) {
        return Err(EnrfError::Busy);
    }
    CANCEL_SIGNAL.reset();
    CONNECT_STARTED.reset();
    CONNECT_SIGNAL.signal(request);
    let result = CONNECT_STARTED.wait().await;
    if result.is_err() {
        CONNECTING.store(false, Ordering::Relaxed);
    }
    result
}

/// Abandon a pending connection attempt; fails with `InvalidState` when
/// none is running
pub fn cancel_connect() -> Result<(), EnrfError> {
    if !CONNECTING.load(Ordering::Relaxed) {
        return Err(EnrfError::InvalidState);
    }
    CANCEL_SIGNAL.signal(());
    Ok(())
}

pub fn is_connecting() -> bool {
    CONNECTING.load(Ordering::Relaxed)
}

async fn connect(sd: &Softdevice, address: &Address) -> Result<Connection, EnrfError> {
    let gap = gap_state::get();
    let whitelist = [address];

    let mut cfg = ConnectConfig::default();
    cfg.scan_config = scanner::scan_config(&gap, false);
    cfg.scan_config.whitelist = Some(&whitelist);
    cfg.conn_params = gap.conn_params;

    info!("Connecting, scan timeout {} x10 ms", cfg.scan_config.timeout);
    Ok(central::connect(sd, &cfg).await?)
}

/// Look up the peer NUS and turn on its TX notifications
async fn start_nus_client(conn: &Connection, report: bool) -> Result<NusClientHandles, EnrfError> {
    let chars = client::discover_service(conn, nus::nus_uuid(NUS_SERVICE), report).await?;
    let rx = chars.iter().find(|c| c.uuid == NUS_RX_CHAR).ok_or(EnrfError::NotFound)?;
    let tx = chars.iter().find(|c| c.uuid == NUS_TX_CHAR).ok_or(EnrfError::NotFound)?;
    if tx.cccd_handle == 0 {
        return Err(EnrfError::NotFound);
    }

    let handles = NusClientHandles {
        rx: rx.value_handle,
        tx: tx.value_handle,
        tx_cccd: tx.cccd_handle,
    };
    gatt_client::write(conn, handles.tx_cccd, &CCCD_NOTIFY).await?;
    Ok(handles)
}

async fn setup_link(conn: &Connection, request: &ConnectRequest) {
    if request.discovery {
        for service in client::registered_services() {
            match client::discover_service(conn, service, true).await {
                Ok(chars) => debug!("Service {=u16:#x}: {} characteristics", client::uuid16(&service), chars.len()),
                Err(e) => debug!("Service {=u16:#x} not discovered: {}", client::uuid16(&service), e),
            }
        }
    }

    if request.nus_client {
        match start_nus_client(conn, request.discovery).await {
            Ok(handles) => {
                info!("NUS client ready: {}", handles);
                client::set_nus_client(Some(handles));
                events::publish(BleEvent::NusDetected);
            }
            Err(e) => info!("Peer has no usable NUS: {}", e),
        }
    }
}

#[embassy_executor::task]
pub async fn central_task(sd: &'static Softdevice) {
    info!("Central task started");
    loop {
        let request = CONNECT_SIGNAL.wait().await;

        let attempt = select(CONNECT_STARTED.track(connect(sd, &request.address)), CANCEL_SIGNAL.wait()).await;
        CONNECTING.store(false, Ordering::Relaxed);
        let conn = match attempt {
            Either::First(Ok(conn)) => conn,
            Either::First(Err(EnrfError::Timeout)) => {
                info!("Connect timed out");
                events::publish(BleEvent::ConnectTimeout);
                continue;
            }
            Either::First(Err(e)) => {
                warn!("Connect failed: {}", e);
                continue;
            }
            Either::Second(()) => {
                info!("Connect cancelled");
                continue;
            }
        };

        if connection::set_connected(Role::Central, &conn).is_err() {
            continue;
        }
        setup_link(&conn, &request).await;

        loop {
            match select(gatt_client::run(&conn, &PeerClient, events::publish), client::next_request()).await {
                Either::First(err) => {
                    debug!("Central link ended: {:?}", defmt::Debug2Format(&err));
                    break;
                }
                Either::Second(op) => client::serve(&conn, op).await,
            }
        }

        if client::nus_client().is_some() {
            client::set_nus_client(None);
            events::publish(BleEvent::NusClientDisconnected);
        }
        connection::set_disconnected(Role::Central);
        client::fail_pending();
    }
}
