#![no_std]
#![no_main]

mod common;

use easy_nrf52::ble::client::parse_uuid128;
use easy_nrf52::commands::gap::parse_manufacturer;
use easy_nrf52::commands::gattc::parse_write;
use easy_nrf52::commands::Command;
use easy_nrf52::core::protocol::{parse_dec, parse_hex, parse_int, CommandLine, ScanFilter, MAX_PARAMS};
use proptest::prelude::*;

#[defmt_test::tests]
mod tests {
    use defmt::{assert, assert_eq};

    use super::*;
    use crate::common::*;

    #[init]
    fn init() {
        ensure_heap_initialized();
    }

    #[test]
    fn test_line_split() {
        let line = CommandLine::parse("scan;dev|beacon;1;0");
        assert_eq!(line.command(), "SCAN");
        assert!(line.is("scan"));
        assert_eq!(line.param_count(), 3);
        assert_eq!(line.param(0), Some("dev|beacon"));
        assert!(line.bool_param(1));
        assert!(!line.bool_param(2));
        assert!(!line.bool_param(5));
        assert_eq!(line.param(3), None);
    }

    #[test]
    fn test_last_param_keeps_separators() {
        let line = CommandLine::parse("nusc;a;b;c;d;e;f;g");
        assert_eq!(line.param_count(), MAX_PARAMS);
        assert_eq!(line.param(MAX_PARAMS - 1), Some("f;g"));
    }

    #[test]
    fn test_empty_params_are_present() {
        let line = CommandLine::parse("advertise;;1");
        assert_eq!(line.param_count(), 2);
        assert_eq!(line.param(0), Some(""));
    }

    #[test]
    fn test_numeric_params() {
        let line = CommandLine::parse("x;42;-8;0x1A;ff;junk");
        assert_eq!(line.dec_param(0, 7), 42);
        assert_eq!(line.int_param(1, 0), -8);
        assert_eq!(line.hex_param(2), 0x1A);
        assert_eq!(line.hex_param(3), 0xFF);
        assert_eq!(line.dec_param(4, 7), 0);
        assert_eq!(line.dec_param(9, 7), 7);
        assert_eq!(line.hex_param(9), 0);
    }

    #[test]
    fn test_number_prefixes() {
        assert_eq!(parse_dec("123abc"), 123);
        assert_eq!(parse_dec(" 5"), 5);
        assert_eq!(parse_int("+3"), 3);
        assert_eq!(parse_int("-0"), 0);
        assert_eq!(parse_hex("0XbeefZ"), 0xBEEF);
        assert_eq!(parse_hex("z"), 0);
    }

    #[test]
    fn test_command_words() {
        assert_eq!(Command::parse(&CommandLine::parse("vers")), Some(Command::Vers));
        assert_eq!(Command::parse(&CommandLine::parse("Help")), Some(Command::Help));
        assert_eq!(Command::parse(&CommandLine::parse("WRITE_CMD;1;00")), Some(Command::WriteCmd));
        assert_eq!(Command::parse(&CommandLine::parse("cancel_connect")), Some(Command::CancelConnect));
        assert_eq!(Command::parse(&CommandLine::parse("bogus")), None);
        assert_eq!(Command::parse(&CommandLine::parse("")), None);
    }

    #[test]
    fn test_missing_params_not_recognized() {
        assert_eq!(Command::parse(&CommandLine::parse("connect")), None);
        assert_eq!(Command::parse(&CommandLine::parse("write;12")), None);
        assert_eq!(Command::parse(&CommandLine::parse("led;1")), Some(Command::Led));
        assert_eq!(Command::parse(&CommandLine::parse("scan")), Some(Command::Scan));
        assert_eq!(Command::Write.min_params(), 2);
        assert_eq!(Command::Read.min_params(), 1);
        assert_eq!(Command::Advertise.min_params(), 0);
    }

    #[test]
    fn test_scan_filter() {
        let mut filter = ScanFilter::new();
        assert!(filter.matches("anything"));

        filter.set("beacon|Dev");
        assert!(filter.matches("11:22:33:44:55:66;Dev;"));
        assert!(filter.matches("x;my beacon;"));
        assert!(!filter.matches("x;other;"));

        filter.set("|");
        assert!(filter.matches("x"));
    }

    #[test]
    fn test_scan_filter_stops_at_empty_pattern() {
        let mut filter = ScanFilter::new();

        filter.set("abc|");
        assert!(filter.matches("x;abc;"));
        assert!(!filter.matches("x;other;"));

        filter.set("abc||Dev");
        assert!(filter.matches("x;abc;"));
        assert!(!filter.matches("x;Dev;"));

        filter.set("|abc");
        assert!(filter.matches("x;other;"));
    }

    #[test]
    fn test_uuid128_big_endian_text() {
        let bytes = parse_uuid128("6E400001-B5A3-F393-E0A9-E50E24DCCA9E").unwrap();
        assert_eq!(bytes[0], 0x9E);
        assert_eq!(bytes[15], 0x6E);
        assert_eq!(&bytes[12..14], &[0x01, 0x00]);
    }

    #[test]
    fn test_uuid128_suffix_and_errors() {
        assert_eq!(
            parse_uuid128("6E400001B5A3F393E0A9E50E24DCCA9E,service"),
            parse_uuid128("6E400001-B5A3-F393-E0A9-E50E24DCCA9E")
        );
        assert!(parse_uuid128("6E400001-B5A3").is_none());
        assert!(parse_uuid128("6E400001-B5A3-F393-E0A9-E50E24DCCA9E00").is_none());
        assert!(parse_uuid128("XX400001-B5A3-F393-E0A9-E50E24DCCA9E").is_none());
    }

    #[test]
    fn test_manufacturer_param() {
        let (company, data) = parse_manufacturer("#4C000215").unwrap();
        assert_eq!(company, 0x004C);
        assert_eq!(&data[..], &[0x02, 0x15]);

        let (company, data) = parse_manufacturer("#5900").unwrap();
        assert_eq!(company, 0x0059);
        assert!(data.is_empty());

        assert!(parse_manufacturer("4C000215").is_none());
        assert!(parse_manufacturer("#4C").is_none());
        assert!(parse_manufacturer("#zz00").is_none());
    }

    #[test]
    fn test_write_params() {
        let (handle, data) = parse_write(&CommandLine::parse("write;1A;0102ff")).unwrap();
        assert_eq!(handle, 0x1A);
        assert_eq!(&data[..], &[0x01, 0x02, 0xFF]);

        assert!(parse_write(&CommandLine::parse("write;0;01")).is_none());
        assert!(parse_write(&CommandLine::parse("write;1A;")).is_none());
        assert!(parse_write(&CommandLine::parse("write;1A;0")).is_none());
        assert!(parse_write(&CommandLine::parse("write;1A")).is_none());
    }

    proptest! {
        #[test]
        fn test_dec_param_parses_number(n in any::<u32>()) {
            let mut text: heapless::String<32> = heapless::String::new();
            core::fmt::Write::write_fmt(&mut text, format_args!("cmd;{}", n)).unwrap();
            let line = CommandLine::parse(&text);
            prop_assert_eq!(line.dec_param(0, 0), n);
        }
    }
}
