#![no_std]
#![no_main]

//! Toggle the first LED every 500 ms with the stack running

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use panic_probe as _;

use easy_nrf52::board;
use easy_nrf52::enrf::{self, Enrf};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let _p = embassy_nrf::init(enrf::hal_config());
    let mut board = unwrap!(board::init());
    let _enrf = unwrap!(Enrf::init(spawner, "blink"));

    loop {
        board.leds.toggle(0);
        enrf::delay_ms(500).await;
    }
}
