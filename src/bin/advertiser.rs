#![no_std]
#![no_main]

//! Button 1 toggles normal advertising, button 2 long range; the matching
//! LED shows which one is running.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use panic_probe as _;

use easy_nrf52::ble::advertiser::{self, AdvertiseParams};
use easy_nrf52::board;
use easy_nrf52::enrf::{self, Enrf};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let _p = embassy_nrf::init(enrf::hal_config());
    let mut board = unwrap!(board::init());
    let enrf = unwrap!(Enrf::init(spawner, "Advertiser"));

    let params = AdvertiseParams {
        interval_ms: 100,
        ..Default::default()
    };

    loop {
        let key = board.buttons.wait_any().await;
        board.leds.all_off();

        if advertiser::is_advertising() {
            info!("Advertising stopped");
            if let Err(e) = enrf.stop_advertise() {
                warn!("Stop failed: {}", e);
            }
            continue;
        }

        let long_range = board::is_long_range_key(key);
        enrf.set_phy(long_range);
        match enrf.start_advertise(&params).await {
            Ok(()) => {
                info!("Advertising, long range: {}", long_range);
                board.leds.set(board::role_led(key), true);
            }
            Err(e) => error!("Advertise failed: {}", e),
        }
    }
}
