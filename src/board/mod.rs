//! Board pin tables
//!
//! One table per supported board, chosen with a `board-*` Cargo feature
//! (`board-ninab3` when none is given). Pins are numbered `port * 32 + pin`.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::info;
use embassy_nrf::gpio::{AnyPin, Input, Level, Output, OutputDrive, Pull};
use embassy_nrf::Peri;
use heapless::Vec;

pub mod connectivity_nrf52_lte;
pub mod feather_nrf52832;
pub mod minew_e7;
pub mod ninab1_evk;
pub mod ninab3;
pub mod ninab3_evk;

/// Most LEDs / buttons on any supported board
pub const MAX_LEDS: usize = 4;
pub const MAX_BUTTONS: usize = 4;

/// Demo button that starts a role on the coded PHY; the others use 1M
pub const LONG_RANGE_KEY: usize = 1;

pub fn is_long_range_key(key: usize) -> bool {
    key == LONG_RANGE_KEY
}

/// LED lit for a role started with `key`: 0 for 1M, 1 for the coded PHY
pub fn role_led(key: usize) -> usize {
    usize::from(is_long_range_key(key))
}

/// GPIO number of `P<port>.<pin>`
pub const fn pin(port: u8, pin: u8) -> u8 {
    port * 32 + pin
}

#[derive(Debug, Clone, Copy)]
pub struct BoardPins {
    pub name: &'static str,
    pub leds: &'static [u8],
    /// LEDs light when driven high
    pub led_active_high: bool,
    /// Buttons pull up and read low when pressed
    pub buttons: &'static [u8],
    pub tx: u8,
    pub rx: u8,
    pub rts: Option<u8>,
    pub cts: Option<u8>,
}

/// Pin table of the selected board
pub const BOARD: BoardPins = if cfg!(feature = "board-ninab1-evk") {
    ninab1_evk::PINS
} else if cfg!(feature = "board-ninab3-evk") {
    ninab3_evk::PINS
} else if cfg!(feature = "board-minew-e7") {
    minew_e7::PINS
} else if cfg!(feature = "board-feather-nrf52832") {
    feather_nrf52832::PINS
} else if cfg!(feature = "board-connectivity-nrf52-lte") {
    connectivity_nrf52_lte::PINS
} else {
    ninab3::PINS
};

pub struct Leds {
    outputs: Vec<Output<'static>, MAX_LEDS>,
    active_high: bool,
}

impl Leds {
    fn level(&self, on: bool) -> Level {
        if on == self.active_high {
            Level::High
        } else {
            Level::Low
        }
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Out of range indexes are ignored
    pub fn set(&mut self, index: usize, on: bool) {
        let level = self.level(on);
        if let Some(led) = self.outputs.get_mut(index) {
            led.set_level(level);
        }
    }

    pub fn is_on(&self, index: usize) -> bool {
        self.outputs
            .get(index)
            .is_some_and(|led| led.is_set_high() == self.active_high)
    }

    pub fn toggle(&mut self, index: usize) {
        if let Some(led) = self.outputs.get_mut(index) {
            led.toggle();
        }
    }

    pub fn all_off(&mut self) {
        for index in 0..self.outputs.len() {
            self.set(index, false);
        }
    }
}

pub struct Buttons {
    inputs: Vec<Input<'static>, MAX_BUTTONS>,
}

impl Buttons {
    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn is_pressed(&self, index: usize) -> bool {
        self.inputs.get(index).is_some_and(|b| b.is_low())
    }

    /// Wait for a press of button `index`; never returns for a missing button
    pub async fn wait_pressed(&mut self, index: usize) {
        match self.inputs.get_mut(index) {
            Some(button) => {
                button.wait_for_high().await;
                button.wait_for_falling_edge().await;
            }
            None => core::future::pending().await,
        }
    }

    /// Wait for any button; returns its index
    pub async fn wait_any(&mut self) -> usize {
        use embassy_futures::select::{select4, Either4};

        async fn falling_edge(button: Option<&mut Input<'static>>) {
            match button {
                Some(button) => button.wait_for_falling_edge().await,
                None => core::future::pending().await,
            }
        }

        let mut inputs = self.inputs.iter_mut();
        let waits = select4(
            falling_edge(inputs.next()),
            falling_edge(inputs.next()),
            falling_edge(inputs.next()),
            falling_edge(inputs.next()),
        );
        match waits.await {
            Either4::First(()) => 0,
            Either4::Second(()) => 1,
            Either4::Third(()) => 2,
            Either4::Fourth(()) => 3,
        }
    }
}

/// UART pins of the board
pub struct UartPins {
    pub tx: Peri<'static, AnyPin>,
    pub rx: Peri<'static, AnyPin>,
    pub rts: Option<Peri<'static, AnyPin>>,
    pub cts: Option<Peri<'static, AnyPin>>,
}

pub struct Board {
    pub pins: BoardPins,
    pub leds: Leds,
    pub buttons: Buttons,
    pub uart: UartPins,
}

static TAKEN: AtomicBool = AtomicBool::new(false);

fn take_pin(psel: u8) -> Peri<'static, AnyPin> {
    // Each table pin is taken once, guarded by TAKEN
    unsafe { AnyPin::steal(psel) }
}

/// Claim the board pins: LEDs off, buttons with pull-ups; `None` on a second
/// call
pub fn init() -> Option<Board> {
    if TAKEN.swap(true, Ordering::AcqRel) {
        return None;
    }
    let pins = BOARD;
    info!("Board {}: {} leds, {} buttons", pins.name, pins.leds.len(), pins.buttons.len());

    let off = if pins.led_active_high { Level::Low } else { Level::High };
    let outputs = pins
        .leds
        .iter()
        .take(MAX_LEDS)
        .map(|&psel| Output::new(take_pin(psel), off, OutputDrive::Standard))
        .collect();
    let inputs = pins
        .buttons
        .iter()
        .take(MAX_BUTTONS)
        .map(|&psel| Input::new(take_pin(psel), Pull::Up))
        .collect();

    Some(Board {
        pins,
        leds: Leds {
            outputs,
            active_high: pins.led_active_high,
        },
        buttons: Buttons { inputs },
        uart: UartPins {
            tx: take_pin(pins.tx),
            rx: take_pin(pins.rx),
            rts: pins.rts.map(take_pin),
            cts: pins.cts.map(take_pin),
        },
    })
}
