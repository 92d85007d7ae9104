//! nRF52840 connectivity chip of an LTE board

use super::{pin, BoardPins};

pub const PINS: BoardPins = BoardPins {
    name: "connectivity_nrf52_lte",
    leds: &[pin(0, 27)],
    led_active_high: true,
    buttons: &[pin(1, 3)],
    tx: pin(0, 17),
    rx: pin(0, 15),
    rts: Some(pin(0, 19)),
    cts: Some(pin(0, 13)),
};
