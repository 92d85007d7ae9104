//! Reset handling and build information

use core::fmt::Write;

use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Timer};
use heapless::String;
use nrf_softdevice::raw;

use crate::ble::connection;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Git hash and build profile, set by the build script
pub const BUILD_TAG: &str = env!("ENRF_BUILD_TAG");

/// GPREGRET value the bootloader checks to stay in DFU mode
pub const GPREGRET_DFU: u32 = 0xB1;

/// Delay between the disconnect and the reset
pub const RESTART_DELAY: Duration = Duration::from_millis(1000);

/// `"<version> <build>"`
pub fn version_string() -> String<64> {
    let mut s = String::new();
    let _ = write!(s, "{} {}", VERSION, BUILD_TAG);
    s
}

/// Read and clear the RESETREAS bits
pub fn take_reset_reason() -> u32 {
    let mut reason: u32 = 0;
    unsafe {
        if raw::sd_power_reset_reason_get(&mut reason) != raw::NRF_SUCCESS {
            warn!("Reset reason unavailable");
        }
        raw::sd_power_reset_reason_clr(0xFFFF_FFFF);
    }
    reason
}

/// Disconnect, wait, then reset; with `enter_dfu` the bootloader stays in
/// DFU mode after the reset
pub async fn restart(enter_dfu: bool) -> ! {
    info!("Restarting, dfu: {}", enter_dfu);
    if enter_dfu {
        unsafe {
            raw::sd_power_gpregret_clr(0, 0xFFFF_FFFF);
            raw::sd_power_gpregret_set(0, GPREGRET_DFU);
        }
    }
    connection::disconnect_all();
    Timer::after(RESTART_DELAY).await;
    cortex_m::peripheral::SCB::sys_reset()
}

static RESTART_REQUEST: Signal<CriticalSectionRawMutex, bool> = Signal::new();

/// Ask the restart task to reset the chip from a context that cannot wait
pub fn request_restart(enter_dfu: bool) {
    RESTART_REQUEST.signal(enter_dfu);
}

#[embassy_executor::task]
pub async fn restart_task() {
    let enter_dfu = RESTART_REQUEST.wait().await;
    restart(enter_dfu).await
}

/// Wait `ms` milliseconds with the CPU idle
pub async fn delay_ms(ms: u64) {
    Timer::after(Duration::from_millis(ms)).await
}
