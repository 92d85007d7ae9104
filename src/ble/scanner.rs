//! Observer scanning
//!
//! Each report is offered to the application hook; the hook returning `true`
//! ends the scan. Starting a scan replaces the running one and waits until the
//! stack accepted it.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::central::{self, ScanConfig};
use nrf_softdevice::ble::PhySet;
use nrf_softdevice::Softdevice;

use crate::ble::events::{self, BleEvent};
use crate::ble::gap_state::{self, GapState};
use crate::ble::report::StartReport;
use crate::config;
use crate::core::adv::AdvReport;
use crate::error::EnrfError;

/// Report hook; returning `true` stops scanning
pub type ScanHandler = fn(&AdvReport<'_>) -> bool;

#[derive(Clone, Copy)]
pub struct ScanRequest {
    handler: ScanHandler,
    timeout_s: u32,
    active: bool,
}

enum ScanCommand {
    Start(ScanRequest),
    Stop,
}

static SCAN_SIGNAL: Signal<CriticalSectionRawMutex, ScanCommand> = Signal::new();
static SCANNING: AtomicBool = AtomicBool::new(false);
static SCAN_STARTED: StartReport = StartReport::new();

/// Start scanning, replacing any running scan
pub async fn start(handler: ScanHandler, timeout_s: u32, active: bool) -> Result<(), EnrfError> {
    gap_state::update(|gap| gap.scan.timeout = config::timeout_s_to_10ms(timeout_s));
    SCANNING.store(true, Ordering::Relaxed);
    SCAN_STARTED.reset();
    SCAN_SIGNAL.signal(ScanCommand::Start(ScanRequest {
        handler,
        timeout_s,
        active,
    }));
    let result = SCAN_STARTED.wait().await;
    if result.is_err() {
        SCANNING.store(false, Ordering::Relaxed);
    }
    result
}

/// Fails with `InvalidState` when no scan is running
pub fn stop() -> Result<(), EnrfError> {
    if !SCANNING.swap(false, Ordering::Relaxed) {
        return Err(EnrfError::InvalidState);
    }
    SCAN_SIGNAL.signal(ScanCommand::Stop);
    Ok(())
}

pub fn is_scanning() -> bool {
    SCANNING.load(Ordering::Relaxed)
}

/// Scan configuration from the GAP settings
pub(crate) fn scan_config(gap: &GapState, active: bool) -> ScanConfig<'static> {
    let mut cfg = ScanConfig::default();
    cfg.active = active;
    cfg.interval = gap.scan.interval as u32;
    cfg.window = gap.scan.window as u32;
    cfg.timeout = gap.scan.timeout;
    cfg.tx_power = gap.tx_power();
    set_phys(&mut cfg, gap.long_range);
    cfg
}

#[cfg(feature = "s140")]
fn set_phys(cfg: &mut ScanConfig<'_>, long_range: bool) {
    cfg.extended = long_range;
    cfg.phys = if long_range { PhySet::Coded } else { PhySet::M1 };
}

#[cfg(not(feature = "s140"))]
fn set_phys(cfg: &mut ScanConfig<'_>, long_range: bool) {
    if long_range {
        warn!("Long range scanning needs S140, using 1M");
    }
    cfg.phys = PhySet::M1;
}

async fn run_scan(sd: &Softdevice, request: ScanRequest) -> Result<(), EnrfError> {
    let cfg = scan_config(&gap_state::get(), request.active);
    info!(
        "Scanning: active {}, timeout {} s, interval {}, window {}",
        request.active, request.timeout_s, cfg.interval, cfg.window
    );

    central::scan(sd, &cfg, |report| {
        let data = unsafe { core::slice::from_raw_parts(report.data.p_data, report.data.len as usize) };
        let report = AdvReport::new(report.peer_addr.addr, report.peer_addr.addr_type(), report.rssi, data);
        if (request.handler)(&report) {
            Some(())
        } else {
            None
        }
    })
    .await?;
    Ok(())
}

#[embassy_executor::task]
pub async fn scanner_task(sd: &'static Softdevice) {
    info!("Scanner task started");
    let mut pending: Option<ScanCommand> = None;

    loop {
        let command = match pending.take() {
            Some(command) => command,
            None => SCAN_SIGNAL.wait().await,
        };
        let request = match command {
            ScanCommand::Start(request) => request,
            ScanCommand::Stop => {
                debug!("Scan stopped");
                continue;
            }
        };

        match select(SCAN_STARTED.track(run_scan(sd, request)), SCAN_SIGNAL.wait()).await {
            Either::First(result) => {
                SCANNING.store(false, Ordering::Relaxed);
                match result {
                    Ok(()) => debug!("Scan ended by report handler"),
                    Err(EnrfError::Timeout) => {
                        info!("Scan timed out");
                        events::publish(BleEvent::ScanTimeout);
                    }
                    Err(e) => warn!("Scan failed: {}", e),
                }
            }
            Either::Second(next) => pending = Some(next),
        }
    }
}
