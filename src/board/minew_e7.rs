//! Minew E7 (nRF52832)

use super::{pin, BoardPins};

pub const PINS: BoardPins = BoardPins {
    name: "minew_e7",
    leds: &[pin(0, 18), pin(0, 17)],
    led_active_high: true,
    buttons: &[pin(0, 13)],
    // TX is only on a test point
    tx: pin(0, 21),
    rx: pin(0, 22),
    rts: None,
    cts: None,
};
