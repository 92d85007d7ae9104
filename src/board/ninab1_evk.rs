//! u-blox NINA-B1 EVK (nRF52832)

use super::BoardPins;

pub const PINS: BoardPins = BoardPins {
    name: "ninab1_evk",
    leds: &[8, 18],
    led_active_high: false,
    buttons: &[16, 30],
    tx: 6,
    rx: 5,
    rts: None,
    cts: None,
};
