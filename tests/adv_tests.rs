#![no_std]
#![no_main]

mod common;

use easy_nrf52::core::adv::{
    adv_parse, build_payload, AdvPayload, AdvReport, NameType, AD_TYPE_COMPLETE_LOCAL_NAME, AD_TYPE_FLAGS,
    AD_TYPE_MANUFACTURER_SPECIFIC_DATA, AD_TYPE_SHORT_LOCAL_NAME, EXTENDED_ADV_MAX, LEGACY_ADV_MAX,
};
use easy_nrf52::EnrfError;
use proptest::prelude::*;

/// Flags, complete name "Dev", manufacturer 0x0059 with [0xAA, 0xBB]
const SAMPLE: [u8; 15] = [
    0x02, 0x01, 0x06, // flags
    0x04, 0x09, b'D', b'e', b'v', // name
    0x05, 0xFF, 0x59, 0x00, 0xAA, 0xBB, // manufacturer
    0x00,
];

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
    fn test_parse_finds_field_in_range() {
        let mut dest = [0u8; 16];
        let len = adv_parse(&SAMPLE, AD_TYPE_SHORT_LOCAL_NAME, AD_TYPE_COMPLETE_LOCAL_NAME, &mut dest);
        assert_eq!(&dest[..len], b"Dev");

        let len = adv_parse(&SAMPLE, AD_TYPE_FLAGS, AD_TYPE_FLAGS, &mut dest);
        assert_eq!(&dest[..len], &[0x06]);
    }

    #[test]
    fn test_parse_missing_field() {
        let mut dest = [0u8; 16];
        assert_eq!(adv_parse(&SAMPLE, 0x16, 0x16, &mut dest), 0);
        assert_eq!(adv_parse(&[], AD_TYPE_FLAGS, AD_TYPE_FLAGS, &mut dest), 0);
    }

    #[test]
    fn test_parse_field_running_past_end() {
        let data = [0x02, 0x01, 0x06, 0x09, 0x09, b'a', b'b'];
        let mut dest = [0u8; 16];
        assert_eq!(adv_parse(&data, AD_TYPE_SHORT_LOCAL_NAME, AD_TYPE_COMPLETE_LOCAL_NAME, &mut dest), 0);
    }

    #[test]
    fn test_parse_zero_length_ends_data() {
        let data = [0x02, 0x01, 0x06, 0x00, 0x04, 0x09, b'a', b'b', b'c'];
        let mut dest = [0u8; 16];
        assert_eq!(adv_parse(&data, AD_TYPE_COMPLETE_LOCAL_NAME, AD_TYPE_COMPLETE_LOCAL_NAME, &mut dest), 0);
    }

    #[test]
    fn test_parse_destination_too_small() {
        let mut dest = [0u8; 2];
        assert_eq!(adv_parse(&SAMPLE, AD_TYPE_COMPLETE_LOCAL_NAME, AD_TYPE_COMPLETE_LOCAL_NAME, &mut dest), 0);
    }

    #[test]
    fn test_payload_flags_by_connectability() {
        let payload = AdvPayload::<LEGACY_ADV_MAX>::new().flags(true).unwrap();
        assert_eq!(payload.as_bytes(), &[0x02, 0x01, 0x06]);
        let payload = AdvPayload::<LEGACY_ADV_MAX>::new().flags(false).unwrap();
        assert_eq!(payload.as_bytes(), &[0x02, 0x01, 0x04]);
    }

    #[test]
    fn test_payload_manufacturer_company_little_endian() {
        let payload = AdvPayload::<LEGACY_ADV_MAX>::new()
            .manufacturer_data(0x004C, &[0x02, 0x15])
            .unwrap();
        assert_eq!(payload.as_bytes(), &[0x05, 0xFF, 0x4C, 0x00, 0x02, 0x15]);
    }

    #[test]
    fn test_payload_rejects_overflow() {
        let long_name = "a name that is far too long for legacy";
        let result = AdvPayload::<LEGACY_ADV_MAX>::new().flags(true).unwrap().full_name(long_name);
        assert!(matches!(result, Err(EnrfError::DataTooLarge)));

        let payload = AdvPayload::<EXTENDED_ADV_MAX>::new().flags(true).unwrap().full_name(long_name).unwrap();
        assert_eq!(payload.len(), 3 + 2 + long_name.len());
    }

    #[test]
    fn test_build_payload_order() {
        let payload = build_payload::<LEGACY_ADV_MAX>(true, NameType::FullName, "Dev", Some((0x0059, &[0xAA, 0xBB][..]))).unwrap();
        assert_eq!(payload.as_bytes(), &SAMPLE[..14]);
    }

    #[test]
    fn test_build_payload_without_name() {
        let payload = build_payload::<LEGACY_ADV_MAX>(false, NameType::None, "Dev", None).unwrap();
        assert_eq!(payload.as_bytes(), &[0x02, 0x01, 0x04]);
    }

    #[test]
    fn test_report_name_and_manufacturer() {
        let report = AdvReport::new([1, 2, 3, 4, 5, 6], 1, -40, &SAMPLE);
        let mut name_buf = [0u8; 32];
        assert_eq!(report.name(&mut name_buf), "Dev");
        let mut manuf_buf = [0u8; 32];
        assert_eq!(report.manufacturer_data(&mut manuf_buf), &[0x59, 0x00, 0xAA, 0xBB]);
    }

    #[test]
    fn test_report_without_name() {
        let data = [0x02, 0x01, 0x06];
        let report = AdvReport::new([0; 6], 0, -90, &data);
        let mut name_buf = [0u8; 32];
        assert_eq!(report.name(&mut name_buf), "");
        assert_eq!(
            report.field(AD_TYPE_MANUFACTURER_SPECIFIC_DATA, AD_TYPE_MANUFACTURER_SPECIFIC_DATA, &mut name_buf),
            0
        );
    }

    proptest! {
        #[test]
        fn test_parse_never_panics(data in prop::collection::vec(any::<u8>(), 0..40), tag in any::<u8>()) {
            let mut dest = [0u8; 8];
            let len = adv_parse(&data, tag, tag, &mut dest);
            prop_assert!(len <= dest.len());
            prop_assert!(len <= data.len());
        }
    }

    proptest! {
        #[test]
        fn test_pushed_field_is_found(payload in prop::collection::vec(any::<u8>(), 1..20)) {
            let mut adv = AdvPayload::<LEGACY_ADV_MAX>::new().flags(true).unwrap();
            adv.push_field(0x16, &payload).unwrap();
            let mut dest = [0u8; 32];
            let len = adv_parse(adv.as_bytes(), 0x16, 0x16, &mut dest);
            prop_assert_eq!(&dest[..len], &payload[..]);
        }
    }
}
