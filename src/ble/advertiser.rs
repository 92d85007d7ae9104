//! Advertising controller
//!
//! Starting advertising replaces whatever set is running and waits until the
//! stack accepted the new set. A connectable set that gets a link hands it to
//! the NUS server and, once the link drops, advertises again with the same
//! setup unless advertising was stopped or replaced in the meantime.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, info, warn, Format};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use heapless::{String, Vec};
use nrf_softdevice::ble::gatt_server;
use nrf_softdevice::ble::peripheral::{self, ConnectableAdvertisement, NonconnectableAdvertisement};
use nrf_softdevice::ble::{Phy, TxPower};
use nrf_softdevice::{raw, Softdevice};

use crate::ble::events::{self, BleEvent, Role};
use crate::ble::nus::{self, NusServer};
use crate::ble::report::StartReport;
use crate::ble::{connection, gap_state};
use crate::config::{self, MAX_DEVICE_NAME_LEN};
use crate::core::adv::{self, NameType, EXTENDED_ADV_MAX, LEGACY_ADV_MAX};
use crate::error::EnrfError;

/// What to advertise
#[derive(Debug, Clone, Format)]
pub struct AdvertiseParams<'a> {
    pub connectable: bool,
    pub name_type: NameType,
    /// Company id and the bytes that follow it
    pub manufacturer: Option<(u16, &'a [u8])>,
    pub interval_ms: u32,
    /// 0 advertises until stopped
    pub timeout_s: u32,
}

impl Default for AdvertiseParams<'_> {
    fn default() -> Self {
        Self {
            connectable: true,
            name_type: NameType::FullName,
            manufacturer: None,
            interval_ms: config::DEFAULT_ADV_INTERVAL_MS,
            timeout_s: 0,
        }
    }
}

/// Encoded advertising set handed to the task
#[derive(Clone)]
pub struct AdvSetup {
    connectable: bool,
    long_range: bool,
    data: Vec<u8, EXTENDED_ADV_MAX>,
    /// 0.625 ms units
    interval: u32,
    /// 10 ms units, 0 for none
    timeout: u16,
    tx_power: TxPower,
}

impl AdvSetup {
    /// Encode `params` with the current device name and GAP settings
    pub fn new(params: &AdvertiseParams<'_>) -> Result<Self, EnrfError> {
        let gap = gap_state::get();
        let long_range = gap.long_range && cfg!(feature = "s140");
        let name = device_name();

        let data: Vec<u8, EXTENDED_ADV_MAX> = if long_range {
            let payload = adv::build_payload::<EXTENDED_ADV_MAX>(
                params.connectable,
                params.name_type,
                &name,
                params.manufacturer,
            )?;
            Vec::from_slice(payload.as_bytes()).map_err(|_| EnrfError::DataTooLarge)?
        } else {
            let payload = adv::build_payload::<LEGACY_ADV_MAX>(
                params.connectable,
                params.name_type,
                &name,
                params.manufacturer,
            )?;
            Vec::from_slice(payload.as_bytes()).map_err(|_| EnrfError::DataTooLarge)?
        };

        Ok(Self {
            connectable: params.connectable,
            long_range,
            data,
            interval: config::adv_interval_units(params.interval_ms),
            timeout: config::timeout_s_to_10ms(params.timeout_s),
            tx_power: gap.tx_power(),
        })
    }

    fn config(&self) -> peripheral::Config {
        let mut cfg = peripheral::Config::default();
        cfg.interval = self.interval;
        cfg.timeout = (self.timeout != 0).then_some(self.timeout);
        cfg.tx_power = self.tx_power;
        cfg.primary_phy = self.phy();
        cfg.secondary_phy = self.phy();
        cfg
    }

    #[cfg(feature = "s140")]
    fn phy(&self) -> Phy {
        if self.long_range {
            Phy::Coded
        } else {
            Phy::M1
        }
    }

    #[cfg(not(feature = "s140"))]
    fn phy(&self) -> Phy {
        Phy::M1
    }

    #[cfg(feature = "s140")]
    fn connectable_adv(&self) -> ConnectableAdvertisement<'_> {
        if self.long_range {
            ConnectableAdvertisement::ExtendedNonscannableUndirected {
                set_id: 0,
                adv_data: &self.data,
            }
        } else {
            ConnectableAdvertisement::ScannableUndirected {
                adv_data: &self.data,
                scan_data: &[],
            }
        }
    }

    #[cfg(not(feature = "s140"))]
    fn connectable_adv(&self) -> ConnectableAdvertisement<'_> {
        ConnectableAdvertisement::ScannableUndirected {
            adv_data: &self.data,
            scan_data: &[],
        }
    }

    #[cfg(feature = "s140")]
    fn nonconnectable_adv(&self) -> NonconnectableAdvertisement<'_> {
        if self.long_range {
            NonconnectableAdvertisement::ExtendedNonscannableUndirected {
                set_id: 0,
                anonymous: false,
                adv_data: &self.data,
            }
        } else {
            NonconnectableAdvertisement::ScannableUndirected {
                adv_data: &self.data,
                scan_data: &[],
            }
        }
    }

    #[cfg(not(feature = "s140"))]
    fn nonconnectable_adv(&self) -> NonconnectableAdvertisement<'_> {
        NonconnectableAdvertisement::ScannableUndirected {
            adv_data: &self.data,
            scan_data: &[],
        }
    }
}

pub enum AdvCommand {
    Start(AdvSetup),
    Stop,
}

static ADV_SIGNAL: Signal<CriticalSectionRawMutex, AdvCommand> = Signal::new();
static ADVERTISING: AtomicBool = AtomicBool::new(false);
static ADV_STARTED: StartReport = StartReport::new();

static DEVICE_NAME: Mutex<CriticalSectionRawMutex, RefCell<String<MAX_DEVICE_NAME_LEN>>> =
    Mutex::new(RefCell::new(String::new()));

/// Name used in advertising payloads
pub fn device_name() -> String<MAX_DEVICE_NAME_LEN> {
    DEVICE_NAME.lock(|name| name.borrow().clone())
}

/// Set the GAP device name, readable by any peer
pub fn set_device_name(name: &str) -> Result<(), EnrfError> {
    let len = name.len().min(MAX_DEVICE_NAME_LEN);
    let name = name.get(..len).ok_or(EnrfError::InvalidParam)?;

    let mut perm: raw::ble_gap_conn_sec_mode_t = unsafe { core::mem::zeroed() };
    perm.set_sm(1);
    perm.set_lv(1);
    let ret = unsafe { raw::sd_ble_gap_device_name_set(&perm, name.as_ptr(), len as u16) };
    EnrfError::check(ret)?;

    DEVICE_NAME.lock(|stored| {
        let mut stored = stored.borrow_mut();
        stored.clear();
        let _ = stored.push_str(name);
    });
    Ok(())
}

/// Replace the running advertising set
///
/// While the peripheral link is up a connectable set has no free link and
/// fails with `NoFreeConnection`; a non-connectable set is kept and started
/// once the link is down.
pub async fn start(params: &AdvertiseParams<'_>) -> Result<(), EnrfError> {
    let setup = AdvSetup::new(params)?;
    debug!("Advertise request: {} bytes, lr {}", setup.data.len(), setup.long_range);

    if connection::get(Role::Peripheral).is_some() {
        if setup.connectable {
            return Err(EnrfError::NoFreeConnection);
        }
        ADVERTISING.store(true, Ordering::Relaxed);
        ADV_SIGNAL.signal(AdvCommand::Start(setup));
        return Ok(());
    }

    ADVERTISING.store(true, Ordering::Relaxed);
    ADV_STARTED.reset();
    ADV_SIGNAL.signal(AdvCommand::Start(setup));
    let result = ADV_STARTED.wait().await;
    if result.is_err() {
        ADVERTISING.store(false, Ordering::Relaxed);
    }
    result
}

/// Stop advertising and the restart after a disconnect
pub fn stop() -> Result<(), EnrfError> {
    if !ADVERTISING.swap(false, Ordering::Relaxed) {
        return Err(EnrfError::InvalidState);
    }
    ADV_SIGNAL.signal(AdvCommand::Stop);
    Ok(())
}

pub fn is_advertising() -> bool {
    ADVERTISING.load(Ordering::Relaxed)
}

#[embassy_executor::task]
pub async fn advertiser_task(sd: &'static Softdevice, server: &'static NusServer) {
    info!("Advertiser task started");
    let mut pending: Option<AdvCommand> = None;

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => ADV_SIGNAL.wait().await,
        };
        let setup = match command {
            AdvCommand::Start(setup) => setup,
            AdvCommand::Stop => {
                debug!("Advertising stopped");
                continue;
            }
        };

        let cfg = setup.config();
        info!(
            "Advertising: connectable {}, lr {}, interval {}",
            setup.connectable, setup.long_range, cfg.interval
        );

        if setup.connectable {
            let result = select(
                ADV_STARTED.track(peripheral::advertise_connectable(sd, setup.connectable_adv(), &cfg)),
                ADV_SIGNAL.wait(),
            )
            .await;
            match result {
                Either::First(Ok(conn)) => {
                    if connection::set_connected(Role::Peripheral, &conn).is_ok() {
                        let err = gatt_server::run(&conn, server, |event| debug!("NUS event: {}", event)).await;
                        debug!("NUS server ended: {:?}", defmt::Debug2Format(&err));
                        nus::on_disconnect();
                        connection::set_disconnected(Role::Peripheral);
                    }

                    pending = ADV_SIGNAL.try_take();
                    if pending.is_none() && is_advertising() {
                        info!("Restarting advertising after disconnect");
                        pending = Some(AdvCommand::Start(setup));
                    }
                }
                Either::First(Err(e)) => finish(EnrfError::from(e)),
                Either::Second(next) => pending = Some(next),
            }
        } else {
            let result = select(
                ADV_STARTED.track(peripheral::advertise(sd, setup.nonconnectable_adv(), &cfg)),
                ADV_SIGNAL.wait(),
            )
            .await;
            match result {
                Either::First(Ok(())) => {
                    ADVERTISING.store(false, Ordering::Relaxed);
                    info!("Advertising ended");
                }
                Either::First(Err(e)) => finish(EnrfError::from(e)),
                Either::Second(next) => pending = Some(next),
            }
        }
    }
}

/// Advertising ended on its own
fn finish(reason: EnrfError) {
    ADVERTISING.store(false, Ordering::Relaxed);
    match reason {
        EnrfError::Timeout => {
            info!("Advertising timed out");
            events::publish(BleEvent::AdvertiseTimeout);
        }
        e => warn!("Advertising failed: {}", e),
    }
}
