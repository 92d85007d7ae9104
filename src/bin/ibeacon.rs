#![no_std]
#![no_main]

//! Non-connectable iBeacon advertising

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use panic_probe as _;

use easy_nrf52::ble::advertiser::AdvertiseParams;
use easy_nrf52::core::adv::NameType;
use easy_nrf52::enrf::{self, Enrf};

const APPLE_COMPANY_ID: u16 = 0x004C;

/// Type, length, proximity UUID, major, minor, measured power
const IBEACON_DATA: [u8; 23] = [
    0x02, 0x15, // iBeacon, 21 bytes follow
    0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E, 0x0F, 0x10,
    0x00, 0x01, // major
    0x00, 0x02, // minor
    0xC3, // -61 dBm at 1 m
];

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let _p = embassy_nrf::init(enrf::hal_config());
    let enrf = unwrap!(Enrf::init(spawner, "ibeacon"));

    let params = AdvertiseParams {
        connectable: false,
        name_type: NameType::None,
        manufacturer: Some((APPLE_COMPANY_ID, &IBEACON_DATA[..])),
        interval_ms: 1000,
        timeout_s: 0,
    };
    unwrap!(enrf.start_advertise(&params).await);
    info!("iBeacon advertising");

    loop {
        let event = enrf::next_event().await;
        debug!("{}", event);
    }
}
