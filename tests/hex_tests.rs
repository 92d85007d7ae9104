#![no_std]
#![no_main]

extern crate alloc;

mod common;

use core::fmt::Write;

use easy_nrf52::core::hex::{bytes_to_hex, hex_to_bytes, HexStr};
use heapless::String;
use proptest::prelude::*;

#[defmt_test::tests]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use defmt::{assert, assert_eq};

    use super::*;
    use crate::common::*;

    #[init]
    fn init() {
        ensure_heap_initialized();
    }

    #[test]
    fn test_decode_mixed_case() {
        let mut buf = [0u8; 4];
        assert_eq!(hex_to_bytes("0aFf10", &mut buf), 3);
        assert_eq!(&buf[..3], &[0x0A, 0xFF, 0x10]);
    }

    #[test]
    fn test_decode_invalid_digit_gives_zero() {
        let mut buf = [0u8; 4];
        assert_eq!(hex_to_bytes("01zz", &mut buf), 0);
        assert_eq!(hex_to_bytes("g0", &mut buf), 0);
    }

    #[test]
    fn test_decode_odd_digit_ignored() {
        let mut buf = [0u8; 4];
        assert_eq!(hex_to_bytes("ABC", &mut buf), 1);
        assert_eq!(buf[0], 0xAB);
        assert_eq!(hex_to_bytes("A", &mut buf), 0);
    }

    #[test]
    fn test_decode_limited_by_destination() {
        let mut buf = [0u8; 2];
        assert_eq!(hex_to_bytes("01020304", &mut buf), 2);
        assert_eq!(buf, [0x01, 0x02]);
    }

    #[test]
    fn test_decode_only_checks_converted_range() {
        // The bad pair lies past what the destination can hold
        let mut buf = [0u8; 1];
        assert_eq!(hex_to_bytes("12xx", &mut buf), 1);
        assert_eq!(buf[0], 0x12);
    }

    #[test]
    fn test_encode_uppercase() {
        let mut out = [0u8; 8];
        assert_eq!(bytes_to_hex(&[0xDE, 0xad, 0x01], &mut out), "DEAD01");
    }

    #[test]
    fn test_encode_stops_at_whole_byte() {
        let mut out = [0u8; 5];
        assert_eq!(bytes_to_hex(&[0x11, 0x22, 0x33], &mut out), "1122");
        assert_eq!(bytes_to_hex(&[], &mut out), "");
    }

    #[test]
    fn test_hex_display() {
        let mut s: String<16> = String::new();
        write!(s, "{}", HexStr(&[0x00, 0x7F, 0xA5])).unwrap();
        assert_eq!(s.as_str(), "007FA5");
    }

    proptest! {
        #[test]
        fn test_encoded_text_decodes_to_input(data in prop::collection::vec(any::<u8>(), 0..32)) {
            let mut text = [0u8; 64];
            let hex = bytes_to_hex(&data, &mut text);
            prop_assert_eq!(hex.len(), data.len() * 2);
            prop_assert!(hex.bytes().all(|c| c.is_ascii_digit() || (b'A'..=b'F').contains(&c)));

            let mut back = [0u8; 32];
            let len = hex_to_bytes(hex, &mut back);
            prop_assert_eq!(&back[..len], &data[..]);
        }
    }

    proptest! {
        #[test]
        fn test_decode_never_exceeds_destination(data in prop::collection::vec(any::<u8>(), 0..20), cap in 0usize..12) {
            let mut text = [0u8; 40];
            let hex = bytes_to_hex(&data, &mut text);
            let mut buf: Vec<u8> = vec![0u8; cap];
            let len = hex_to_bytes(hex, &mut buf);
            prop_assert!(len <= cap);
            prop_assert_eq!(len, data.len().min(cap));
        }
    }
}
