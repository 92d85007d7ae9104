//! u-blox NINA-B3 module (nRF52840)

use super::{pin, BoardPins};

pub const PINS: BoardPins = BoardPins {
    name: "ninab3",
    leds: &[pin(0, 28), pin(0, 2)],
    led_active_high: false,
    buttons: &[pin(0, 30), pin(0, 4)],
    tx: pin(0, 13),
    rx: pin(0, 15),
    rts: None,
    cts: None,
};
