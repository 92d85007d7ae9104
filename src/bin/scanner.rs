#![no_std]
#![no_main]

//! Button 1 toggles a normal scan, button 2 a long range scan. Named
//! devices are logged as `address;name;rssi`.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use panic_probe as _;

use easy_nrf52::ble::scanner;
use easy_nrf52::board;
use easy_nrf52::core::addr::addr_to_str;
use easy_nrf52::core::adv::AdvReport;
use easy_nrf52::core::protocol::SCAN_NAME_MAX;
use easy_nrf52::enrf::{self, Enrf};

fn report(report: &AdvReport<'_>) -> bool {
    let mut name_buf = [0u8; SCAN_NAME_MAX];
    let name = report.name(&mut name_buf);
    if !name.is_empty() {
        info!("{};{};{}", addr_to_str(&report.addr).as_str(), name, report.rssi);
    }
    false
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let _p = embassy_nrf::init(enrf::hal_config());
    let mut board = unwrap!(board::init());
    let enrf = unwrap!(Enrf::init(spawner, "scanner"));

    loop {
        let key = board.buttons.wait_any().await;
        board.leds.all_off();

        if scanner::is_scanning() {
            info!("Scan stopped");
            if let Err(e) = enrf.stop_scan() {
                warn!("Stop failed: {}", e);
            }
            continue;
        }

        let long_range = board::is_long_range_key(key);
        enrf.set_phy(long_range);
        match enrf.start_scan(report, 0, true).await {
            Ok(()) => {
                info!("Scanning, long range: {}", long_range);
                board.leds.set(board::role_led(key), true);
            }
            Err(e) => error!("Scan failed: {}", e),
        }
    }
}
