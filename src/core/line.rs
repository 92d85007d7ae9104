//! Serial line assembly

use heapless::Vec;

use crate::config::SERIAL_LINE_MAX;

/// Assembles bytes into one command line at a time
///
/// `\r` is ignored and `\n` completes the line. A byte arriving while the
/// buffer is full also completes the line and is dropped. Once a line is
/// complete, input is discarded until the line is taken.
pub struct LineBuffer {
    buf: Vec<u8, SERIAL_LINE_MAX>,
    available: bool,
}

impl LineBuffer {
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            available: false,
        }
    }

    /// Feed one received byte; returns true when a line became available
    pub fn push(&mut self, byte: u8) -> bool {
        if self.available || byte == b'\r' {
            return false;
        }
        if byte == b'\n' || self.buf.is_full() {
            self.available = true;
            return true;
        }
        // Not full, checked above
        let _ = self.buf.push(byte);
        false
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    /// Pending line, if one is complete
    pub fn line(&self) -> Option<&[u8]> {
        self.available.then_some(&self.buf[..])
    }

    /// Copy the pending line into `dest` (at most `dest.len() - 1` bytes,
    /// leaving room for a terminator) and reset for the next line
    pub fn take_into(&mut self, dest: &mut [u8]) -> usize {
        if !self.available || dest.is_empty() {
            return 0;
        }
        let len = self.buf.len().min(dest.len() - 1);
        dest[..len].copy_from_slice(&self.buf[..len]);
        self.clear();
        len
    }

    /// Feed a received chunk, handing each line to `on_line` as soon as it
    /// completes so the bytes after it start the next line
    ///
    /// Returns the number of lines handed over.
    pub fn feed(&mut self, bytes: &[u8], mut on_line: impl FnMut(&[u8])) -> usize {
        let mut lines = 0;
        for &byte in bytes {
            if self.push(byte) {
                on_line(&self.buf);
                self.clear();
                lines += 1;
            }
        }
        lines
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.available = false;
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
