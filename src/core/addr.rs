//! MAC address text form
//!
//! The stack stores address bytes least significant first; the text form
//! prints the most significant byte first, `AA:BB:CC:DD:EE:FF`.

use core::fmt::Write;

use heapless::String;
use nrf_softdevice::ble::{Address, AddressType};

/// Length of `AA:BB:CC:DD:EE:FF`
pub const ADDR_STR_LEN: usize = 17;

pub type AddrString = String<ADDR_STR_LEN>;

/// Format stack-order address bytes
pub fn addr_to_str(addr: &[u8; 6]) -> AddrString {
    let mut out = AddrString::new();
    for (i, b) in addr.iter().rev().enumerate() {
        let sep = if i == 0 { "" } else { ":" };
        // 17 chars always fit
        let _ = write!(out, "{}{:02X}", sep, b);
    }
    out
}

/// Parse six colon separated hex groups into stack-order bytes
///
/// Each group is one or two hex digits. Anything other than exactly six
/// groups fails.
pub fn str_to_addr(text: &str) -> Option<[u8; 6]> {
    let mut addr = [0u8; 6];
    let mut groups = text.trim().split(':');

    for i in 0..6 {
        let group = groups.next()?;
        if group.is_empty() || group.len() > 2 {
            return None;
        }
        addr[5 - i] = u8::from_str_radix(group, 16).ok()?;
    }

    if groups.next().is_some() {
        return None;
    }
    Some(addr)
}

/// Parse a command line address: a leading `P` selects a public address,
/// anything else is random static
pub fn parse_peer_address(text: &str) -> Option<Address> {
    let (kind, rest) = match text.strip_prefix(&['P', 'p'][..]) {
        Some(rest) => (AddressType::Public, rest),
        None => (AddressType::RandomStatic, text),
    };
    str_to_addr(rest).map(|bytes| Address::new(kind, bytes))
}

/// Address of a scan report; unknown types are taken as random static
pub fn peer_address(addr_type: u8, addr: [u8; 6]) -> Address {
    let kind = match addr_type {
        0 => AddressType::Public,
        2 => AddressType::RandomPrivateResolvable,
        3 => AddressType::RandomPrivateNonResolvable,
        _ => AddressType::RandomStatic,
    };
    Address::new(kind, addr)
}
