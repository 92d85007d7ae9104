#![no_std]
#![no_main]

//! Press a button to look for a device named `Advertiser`, connect to it
//! and ask its NUS server for the version. Button 1 scans and connects on the
//! coded PHY.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::Address;
use panic_probe as _;

use easy_nrf52::ble::nus;
use easy_nrf52::board;
use easy_nrf52::core::addr::{addr_to_str, peer_address};
use easy_nrf52::core::adv::AdvReport;
use easy_nrf52::core::protocol::SCAN_NAME_MAX;
use easy_nrf52::enrf::{self, BleEvent, Enrf};

const PEER_NAME: &str = "Advertiser";
const SCAN_TIMEOUT_S: u32 = 10;

static FOUND: Signal<CriticalSectionRawMutex, Address> = Signal::new();

fn report(report: &AdvReport<'_>) -> bool {
    let mut name_buf = [0u8; SCAN_NAME_MAX];
    if report.name(&mut name_buf) != PEER_NAME {
        return false;
    }
    info!("Found {} at {}", PEER_NAME, addr_to_str(&report.addr).as_str());
    FOUND.signal(peer_address(report.addr_type, report.addr));
    true
}

async fn on_event(enrf: &Enrf, event: BleEvent) {
    match event {
        BleEvent::ScanTimeout => info!("{} not found", PEER_NAME),
        BleEvent::ConnectTimeout => info!("Connect timed out"),
        BleEvent::NusDetected => {
            if let Err(e) = enrf.nus_c_string_send("Version?").await {
                warn!("Request failed: {}", e);
            }
        }
        BleEvent::NusClientRx(data) => {
            info!("Response: {}", nus::data_text(&data));
            if let Err(e) = enrf.disconnect() {
                warn!("Disconnect failed: {}", e);
            }
        }
        other => debug!("{}", other),
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let _p = embassy_nrf::init(enrf::hal_config());
    let mut board = unwrap!(board::init());
    let enrf = unwrap!(Enrf::init(spawner, "connect"));

    loop {
        match select3(board.buttons.wait_any(), FOUND.wait(), enrf::next_event()).await {
            Either3::First(key) => {
                board.leds.all_off();
                let long_range = board::is_long_range_key(key);
                enrf.set_phy(long_range);
                info!("Looking for {}, long range: {}", PEER_NAME, long_range);
                match enrf.start_scan(report, SCAN_TIMEOUT_S, false).await {
                    Ok(()) => board.leds.set(board::role_led(key), true),
                    Err(e) => error!("Scan failed: {}", e),
                }
            }
            Either3::Second(address) => {
                if let Err(e) = enrf.stop_scan() {
                    debug!("Scan already ended: {}", e);
                }
                if let Err(e) = enrf.connect_to(Some(address), false, true).await {
                    error!("Connect failed: {}", e);
                }
            }
            Either3::Third(event) => on_event(&enrf, event).await,
        }
    }
}
