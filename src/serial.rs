//! Serial console over UARTE0
//!
//! One task owns the UART. Reception runs through a buffered UARTE, so bytes
//! keep landing in the ring buffer while the application is busy; they are
//! assembled into lines by [`LineBuffer`] and queued for [`read_line`].
//! Outgoing text is queued in chunks and written in order.

use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, info, warn};
use embassy_executor::Spawner;
use embassy_futures::join::join;
use embassy_nrf::buffered_uarte::{self, BufferedUarte};
use embassy_nrf::interrupt::{self, InterruptExt};
use embassy_nrf::peripherals::{PPI_CH0, PPI_CH1, PPI_GROUP0, TIMER1, UARTE0};
use embassy_nrf::uarte;
use embassy_nrf::{bind_interrupts, Peri};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, TrySendError};
use heapless::Vec;
use static_cell::StaticCell;

use crate::board::UartPins;
use crate::config::{SERIAL_BAUD, SERIAL_LINE_MAX};
use crate::core::line::LineBuffer;
use crate::error::EnrfError;

bind_interrupts!(struct Irqs {
    UARTE0 => buffered_uarte::InterruptHandler<UARTE0>;
});

/// Bytes per queued write
pub const TX_CHUNK: usize = 64;
const TX_QUEUE_LEN: usize = 8;
/// Complete lines waiting for the application
pub const LINE_QUEUE_LEN: usize = 4;
/// Receive ring; must be even
const RX_RING: usize = 256;
const TX_RING: usize = 256;

pub type Line = Vec<u8, SERIAL_LINE_MAX>;
type Chunk = Vec<u8, TX_CHUNK>;

static LINE_CHANNEL: Channel<CriticalSectionRawMutex, Line, LINE_QUEUE_LEN> = Channel::new();
static TX_CHANNEL: Channel<CriticalSectionRawMutex, Chunk, TX_QUEUE_LEN> = Channel::new();
static ENABLED: AtomicBool = AtomicBool::new(false);

static RX_BUF: StaticCell<[u8; RX_RING]> = StaticCell::new();
static TX_BUF: StaticCell<[u8; TX_RING]> = StaticCell::new();

/// Peripherals the buffered UARTE needs besides the UARTE itself
///
/// TIMER0 and the upper PPI channels belong to the SoftDevice.
pub struct SerialPeripherals {
    pub uarte: Peri<'static, UARTE0>,
    pub timer: Peri<'static, TIMER1>,
    pub ppi_ch1: Peri<'static, PPI_CH0>,
    pub ppi_ch2: Peri<'static, PPI_CH1>,
    pub ppi_group: Peri<'static, PPI_GROUP0>,
}

fn baudrate(baud: u32) -> uarte::Baudrate {
    match baud {
        9_600 => uarte::Baudrate::BAUD9600,
        19_200 => uarte::Baudrate::BAUD19200,
        38_400 => uarte::Baudrate::BAUD38400,
        57_600 => uarte::Baudrate::BAUD57600,
        230_400 => uarte::Baudrate::BAUD230400,
        460_800 => uarte::Baudrate::BAUD460800,
        921_600 => uarte::Baudrate::BAUD921600,
        1_000_000 => uarte::Baudrate::BAUD1M,
        _ => uarte::Baudrate::BAUD115200,
    }
}

/// Start the console on the board UART pins
pub fn enable(spawner: Spawner, periph: SerialPeripherals, pins: UartPins) -> Result<(), EnrfError> {
    // Levels 0, 1 and 4 belong to the SoftDevice
    interrupt::UARTE0.set_priority(interrupt::Priority::P3);
    spawner.spawn(serial_task(periph, pins))?;
    ENABLED.store(true, Ordering::Relaxed);
    Ok(())
}

pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Queue a completed line; drops it when the application is that far behind
fn queue_line(line: &[u8]) {
    let Ok(line) = Line::from_slice(line) else {
        return;
    };
    if let Err(TrySendError::Full(_)) = LINE_CHANNEL.try_send(line) {
        warn!("Line queue full, input line dropped");
    }
}

#[embassy_executor::task]
async fn serial_task(periph: SerialPeripherals, pins: UartPins) {
    let mut config = uarte::Config::default();
    config.parity = uarte::Parity::EXCLUDED;
    config.baudrate = baudrate(SERIAL_BAUD);

    let rx_buf = RX_BUF.init([0u8; RX_RING]);
    let tx_buf = TX_BUF.init([0u8; TX_RING]);
    let SerialPeripherals {
        uarte,
        timer,
        ppi_ch1,
        ppi_ch2,
        ppi_group,
    } = periph;

    let mut uart = match (pins.cts, pins.rts) {
        (Some(cts), Some(rts)) => BufferedUarte::new_with_rtscts(
            uarte, timer, ppi_ch1, ppi_ch2, ppi_group, pins.rx, pins.tx, cts, rts, Irqs, config, rx_buf, tx_buf,
        ),
        _ => BufferedUarte::new(
            uarte, timer, ppi_ch1, ppi_ch2, ppi_group, pins.rx, pins.tx, Irqs, config, rx_buf, tx_buf,
        ),
    };
    let (rx, tx) = uart.split_by_ref();
    info!("Serial console at {} baud", SERIAL_BAUD);

    let rx_loop = async {
        let mut line = LineBuffer::new();
        let mut chunk = [0u8; 32];
        loop {
            match rx.read(&mut chunk).await {
                Ok(len) => {
                    line.feed(&chunk[..len], queue_line);
                }
                Err(e) => warn!("Serial rx error: {:?}", defmt::Debug2Format(&e)),
            }
        }
    };

    let tx_loop = async {
        loop {
            let chunk = TX_CHANNEL.receive().await;
            let mut rest = &chunk[..];
            while !rest.is_empty() {
                match tx.write(rest).await {
                    Ok(written) => rest = &rest[written..],
                    Err(e) => {
                        warn!("Serial tx error: {:?}", defmt::Debug2Format(&e));
                        break;
                    }
                }
            }
        }
    };

    join(rx_loop, tx_loop).await;
}

/// Queue `text` for output, waiting for room in the queue
pub async fn write(text: &str) -> Result<(), EnrfError> {
    if !is_enabled() {
        return Err(EnrfError::NotEnabled);
    }
    for piece in text.as_bytes().chunks(TX_CHUNK) {
        let chunk = Chunk::from_slice(piece).map_err(|_| EnrfError::DataTooLarge)?;
        TX_CHANNEL.send(chunk).await;
    }
    Ok(())
}

/// Queue `text` without waiting; fails with `Busy` when the queue cannot take
/// all of it
pub fn try_write(text: &str) -> Result<(), EnrfError> {
    if !is_enabled() {
        return Err(EnrfError::NotEnabled);
    }
    let needed = text.len().div_ceil(TX_CHUNK);
    if TX_QUEUE_LEN - TX_CHANNEL.len() < needed {
        return Err(EnrfError::Busy);
    }
    for piece in text.as_bytes().chunks(TX_CHUNK) {
        let chunk = Chunk::from_slice(piece).map_err(|_| EnrfError::DataTooLarge)?;
        if let Err(TrySendError::Full(_)) = TX_CHANNEL.try_send(chunk) {
            return Err(EnrfError::Busy);
        }
    }
    Ok(())
}

/// Wait for the next complete input line, without its terminator
pub async fn read_line() -> Line {
    let line = LINE_CHANNEL.receive().await;
    debug!("Serial line: {} bytes", line.len());
    line
}

/// Pending input line, if one is complete
pub fn try_read_line() -> Option<Line> {
    LINE_CHANNEL.try_receive().ok()
}
