//! Hex text conversion

use core::fmt;

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode hex text into `dest`
///
/// Converts `min(text.len() / 2, dest.len())` byte pairs and returns how many
/// bytes were written. Any invalid digit in the converted range yields 0.
/// A trailing odd digit is ignored.
pub fn hex_to_bytes(text: &str, dest: &mut [u8]) -> usize {
    let src = text.as_bytes();
    let count = (src.len() / 2).min(dest.len());

    for i in 0..count {
        match (nibble(src[2 * i]), nibble(src[2 * i + 1])) {
            (Some(hi), Some(lo)) => dest[i] = (hi << 4) | lo,
            _ => return 0,
        }
    }
    count
}

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode `bytes` as uppercase hex into `out`, returning the text written
///
/// Stops at the last whole byte that fits.
pub fn bytes_to_hex<'a>(bytes: &[u8], out: &'a mut [u8]) -> &'a str {
    let count = bytes.len().min(out.len() / 2);
    for (i, b) in bytes[..count].iter().enumerate() {
        out[2 * i] = DIGITS[(b >> 4) as usize];
        out[2 * i + 1] = DIGITS[(b & 0x0F) as usize];
    }
    // Only ASCII digits were written
    core::str::from_utf8(&out[..2 * count]).unwrap_or("")
}

/// Uppercase hex display of a byte slice, for `write!` into bounded strings
pub struct HexStr<'a>(pub &'a [u8]);

impl fmt::Display for HexStr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0 {
            write!(f, "{:02X}", b)?;
        }
        Ok(())
    }
}
