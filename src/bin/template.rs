#![no_std]
#![no_main]

//! Starting point for a NUS peripheral application
//!
//! Answers `hello`, toggles LED 1 on `led` and streams 256 bytes on `data`;
//! everything else falls through to the standard requests.

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use panic_probe as _;

use easy_nrf52::ble::advertiser::AdvertiseParams;
use easy_nrf52::ble::nus;
use easy_nrf52::board::{self, Leds};
use easy_nrf52::enrf::{self, Enrf};
use easy_nrf52::EnrfError;

#[derive(Clone, Copy, Format)]
enum Request {
    Hello,
    Led,
    Data,
}

static REQUEST: Signal<CriticalSectionRawMutex, Request> = Signal::new();

fn contains_ignore_case(text: &str, word: &str) -> bool {
    text.as_bytes()
        .windows(word.len())
        .any(|w| w.eq_ignore_ascii_case(word.as_bytes()))
}

/// NUS hook; requests taken here are answered from the main loop
fn nus_request(data: &[u8]) -> bool {
    let text = nus::request_text(data);
    let request = if contains_ignore_case(text, "hello") {
        Request::Hello
    } else if contains_ignore_case(text, "led") {
        Request::Led
    } else if contains_ignore_case(text, "data") {
        Request::Data
    } else {
        return false;
    };
    REQUEST.signal(request);
    true
}

async fn answer(enrf: &Enrf, leds: &mut Leds, request: Request) -> Result<(), EnrfError> {
    match request {
        Request::Hello => enrf.nus_string_send("Hello from enrf template").await,
        Request::Led => {
            leds.toggle(0);
            let state = if leds.is_on(0) { "LED is on" } else { "LED is off" };
            enrf.nus_string_send(state).await
        }
        Request::Data => {
            let mut data = [0u8; 256];
            for (i, b) in data.iter_mut().enumerate() {
                *b = i as u8;
            }
            enrf.nus_data_send(&data).await
        }
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let _p = embassy_nrf::init(enrf::hal_config());
    let mut board = unwrap!(board::init());
    let enrf = unwrap!(Enrf::init(spawner, "enrf template"));

    enrf.set_nus_handler(Some(nus_request));
    let params = AdvertiseParams {
        interval_ms: 100,
        ..Default::default()
    };
    unwrap!(enrf.start_advertise(&params).await);
    info!("Template advertising");

    loop {
        match select(REQUEST.wait(), enrf::next_event()).await {
            Either::First(request) => {
                info!("Request {}", request);
                if let Err(e) = answer(&enrf, &mut board.leds, request).await {
                    warn!("Answer failed: {}", e);
                }
            }
            Either::Second(event) => debug!("{}", event),
        }
    }
}
