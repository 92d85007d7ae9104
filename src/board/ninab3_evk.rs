//! u-blox NINA-B3 EVK (nRF52840)

use super::{pin, BoardPins};

pub const PINS: BoardPins = BoardPins {
    name: "ninab3_evk",
    leds: &[pin(0, 25), pin(0, 13), pin(1, 0)],
    led_active_high: false,
    buttons: &[pin(0, 2)],
    tx: pin(1, 13),
    rx: pin(0, 29),
    rts: None,
    cts: None,
};
