#![no_std]
#![no_main]

//! ble_tool: drive the BLE stack from a serial terminal
//!
//! Commands arrive one per line (`scan;1`, `connect;AA:BB:CC:DD:EE:FF`, ...)
//! and stack events are printed as `#` lines as they happen.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use panic_probe as _;

use easy_nrf52::commands::{respond, BleTool};
use easy_nrf52::core::protocol::async_response;
use easy_nrf52::enrf::{self, Enrf};
use easy_nrf52::{board, serial, system};

fn line_text(line: &[u8]) -> &str {
    match core::str::from_utf8(line) {
        Ok(text) => text,
        Err(e) => core::str::from_utf8(&line[..e.valid_up_to()]).unwrap_or(""),
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting ble_tool");

    let p = embassy_nrf::init(enrf::hal_config());
    let board = unwrap!(board::init());

    let enrf = unwrap!(Enrf::init(spawner, "ble_tool"));
    let uart = serial::SerialPeripherals {
        uarte: p.UARTE0,
        timer: p.TIMER1,
        ppi_ch1: p.PPI_CH0,
        ppi_ch2: p.PPI_CH1,
        ppi_group: p.PPI_GROUP0,
    };
    unwrap!(serial::enable(spawner, uart, board.uart));

    let reason = system::take_reset_reason();
    respond(&async_response(format_args!("STARTUP:{:X}", reason))).await;

    let mut tool = BleTool::new(enrf, Some(board.leds));
    info!("ble_tool ready");

    loop {
        match select(serial::read_line(), enrf::next_event()).await {
            Either::First(line) => tool.handle_line(line_text(&line)).await,
            Either::Second(event) => tool.handle_event(&event).await,
        }
    }
}
