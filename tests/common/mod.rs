//! Shared setup for the on-target test binaries
//!
//! Brings in the logger, panic handler and the SoftDevice critical section,
//! and a small heap for proptest.

pub use defmt_rtt as _;
pub use embassy_executor as _;
pub use nrf_softdevice as _;
pub use panic_probe as _;
pub use {embassy_nrf as _, embassy_sync as _, embassy_time as _};

use core::sync::atomic::{AtomicBool, Ordering};

pub use embedded_alloc::LlffHeap as Heap;

#[global_allocator]
pub static HEAP: Heap = Heap::empty();

pub static mut HEAP_MEM: [u8; 8192] = [0; 8192];

static HEAP_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize the heap once per test binary
pub fn ensure_heap_initialized() {
    if !HEAP_INITIALIZED.swap(true, Ordering::Relaxed) {
        unsafe {
            let mem = &raw mut HEAP_MEM;
            HEAP.init((*mem).as_mut_ptr() as usize, (*mem).len());
        }
    }
}

/// `size` bytes counting up from `start`
#[allow(unused)]
pub fn counting_bytes<const N: usize>(size: usize, start: u8) -> heapless::Vec<u8, N> {
    (0..size.min(N)).map(|i| start.wrapping_add(i as u8)).collect()
}

/// Text of a fixed size buffer up to its first NUL
#[allow(unused)]
pub fn buf_str(buf: &[u8]) -> &str {
    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    core::str::from_utf8(&buf[..end]).unwrap_or("")
}
