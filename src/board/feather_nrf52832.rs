//! Adafruit Feather nRF52832

use super::BoardPins;

pub const PINS: BoardPins = BoardPins {
    name: "feather_nrf52832",
    leds: &[17, 19],
    led_active_high: true,
    buttons: &[3],
    tx: 4,
    rx: 6,
    rts: None,
    cts: None,
};
