#![no_std]
#![no_main]

mod common;

use easy_nrf52::ble::events::{event_data, BleEvent, Role};
use easy_nrf52::ble::nus::{data_text, request_text, standard_request, StandardRequest};
use easy_nrf52::commands::events::event_response;
use easy_nrf52::commands::{invalid_command, render, CommandError, Reply, Rendered, HELP};
use easy_nrf52::core::protocol::{
    async_response, error_response, format_response, nrf_error_response, ok_response, scan_report_text,
    RESPONSE_MAX,
};
use easy_nrf52::core::adv::AdvReport;
use easy_nrf52::EnrfError;

fn rendered_line(rendered: Rendered) -> Option<easy_nrf52::core::protocol::Response> {
    match rendered {
        Rendered::Line(line) => Some(line),
        _ => None,
    }
}

fn event_line(event: BleEvent) -> easy_nrf52::core::protocol::Response {
    event_response(&event).unwrap_or_default()
}

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
    fn test_response_prefixes() {
        assert_eq!(ok_response("VERS", format_args!("1.0")).as_str(), "=VERS 1.0\n");
        assert_eq!(error_response("CONNECT", "Invalid mac address").as_str(), "*CONNECT Invalid mac address\n");
        assert_eq!(nrf_error_response("SCAN", 0x11).as_str(), "*SCAN nrf error: 11\n");
        assert_eq!(async_response(format_args!("STARTUP:{:X}", 4)).as_str(), "#STARTUP:4\n");
    }

    #[test]
    fn test_long_response_keeps_newline() {
        let long = [b'x'; 400];
        let text = core::str::from_utf8(&long).unwrap();
        let line = format_response('#', format_args!("{}", text));
        assert_eq!(line.len(), RESPONSE_MAX);
        assert!(line.ends_with('\n'));
        assert!(line.starts_with("#xxx"));
    }

    #[test]
    fn test_render_outcomes() {
        let line = rendered_line(render("MAC", &Ok(Reply::text(format_args!("11:22:33:44:55:66"))))).unwrap();
        assert_eq!(line.as_str(), "=MAC 11:22:33:44:55:66\n");

        let line = rendered_line(render("SCAN", &Ok(Reply::empty()))).unwrap();
        assert_eq!(line.as_str(), "=SCAN \n");

        let line = rendered_line(render("WRITE", &Err(CommandError::Syntax))).unwrap();
        assert_eq!(line.as_str(), "*WRITE Syntax error\n");

        let line = rendered_line(render("ADD_UUID", &Err(CommandError::InvalidUuid))).unwrap();
        assert_eq!(line.as_str(), "*ADD_UUID Invalid UUID\n");

        let line = rendered_line(render("READ", &Err(CommandError::Nrf(EnrfError::NotConnected)))).unwrap();
        assert_eq!(line.as_str(), "*READ nrf error: 8\n");

        let line = rendered_line(render("CONNECT", &Err(EnrfError::Busy.into()))).unwrap();
        assert_eq!(line.as_str(), "*CONNECT nrf error: 11\n");
    }

    #[test]
    fn test_render_raw_and_silent() {
        assert!(matches!(render("HELP", &Ok(Reply::Raw(HELP))), Rendered::Raw(_)));
        assert!(matches!(render("RESTART", &Ok(Reply::Silent)), Rendered::Nothing));
        assert!(HELP.contains("add_uuid"));
    }

    #[test]
    fn test_invalid_command() {
        assert_eq!(
            invalid_command("FOO").as_str(),
            "*Invalid command: \"FOO\" Type help for listing\n"
        );
    }

    #[test]
    fn test_link_event_lines() {
        assert_eq!(event_line(BleEvent::Connected { role: Role::Central }).as_str(), "#CONNECTED\n");
        assert_eq!(
            event_line(BleEvent::Disconnected {
                role: Role::Peripheral,
                reason: 0x13
            })
            .as_str(),
            "#DISCONNECTED 0x13\n"
        );
        assert_eq!(event_line(BleEvent::ScanTimeout).as_str(), "#SCAN:Time out\n");
        assert_eq!(event_line(BleEvent::ConnectTimeout).as_str(), "#CONNECT:Time out\n");
        assert_eq!(event_line(BleEvent::AdvertiseTimeout).as_str(), "#ADVERTISE:Time out\n");
        assert!(event_response(&BleEvent::NusClientDisconnected).is_none());
    }

    #[test]
    fn test_gatt_event_lines() {
        let data = event_data(&[0x01, 0xAB]);
        assert_eq!(
            event_line(BleEvent::ReadResponse {
                handle: 0x1A,
                data: data.clone()
            })
            .as_str(),
            "#READ_RESP:1A,01AB\n"
        );
        assert_eq!(
            event_line(BleEvent::WriteResponse {
                handle: 0x0E,
                data: data.clone()
            })
            .as_str(),
            "#WRITE_RESP:E,01AB\n"
        );
        assert_eq!(
            event_line(BleEvent::Notification { handle: 0x10, data }).as_str(),
            "#NOTIF:10,01AB\n"
        );
    }

    #[test]
    fn test_discovery_event_lines() {
        assert_eq!(
            event_line(BleEvent::Discovered {
                service: 0x0001,
                characteristic: 0x0003,
                value_handle: 0x0D,
                cccd_handle: 0x0E
            })
            .as_str(),
            "#DISC_HANDLE:1,3,D,E\n"
        );
        assert_eq!(event_line(BleEvent::DiscoveryDone { service: 1 }).as_str(), "#DISC_DONE\n");
        assert_eq!(event_line(BleEvent::NusDetected).as_str(), "#NUS_DETECTED\n");
        assert_eq!(
            event_line(BleEvent::NusClientRx(event_data(b"1.0 abc\n\0"))).as_str(),
            "#NUSC:1.0 abc\n\n"
        );
    }

    #[test]
    fn test_nus_text() {
        assert_eq!(data_text(b"hello\0junk"), "hello");
        assert_eq!(data_text(b"ok\xFFrest"), "ok");
        assert_eq!(request_text(b"version?\n"), "version?");
        assert_eq!(request_text(b"two\n\n"), "two\n");
        assert_eq!(request_text(b""), "");
    }

    #[test]
    fn test_standard_requests() {
        assert_eq!(standard_request(b"Version?"), StandardRequest::Version);
        assert_eq!(standard_request(b"MAC?\n"), StandardRequest::Mac);
        assert_eq!(standard_request(b"restart now"), StandardRequest::Restart);
        assert_eq!(standard_request(b"DFU\0"), StandardRequest::Dfu);
        assert_eq!(standard_request(b"mac"), StandardRequest::Unknown);
        assert_eq!(standard_request(b"hello"), StandardRequest::Unknown);
    }

    #[test]
    fn test_scan_report_text() {
        let data = [0x04, 0x09, b'D', b'e', b'v', 0x05, 0xFF, 0x59, 0x00, 0xAA, 0xBB];
        let report = AdvReport::new([0x66, 0x55, 0x44, 0x33, 0x22, 0x11], 1, -50, &data);
        assert_eq!(scan_report_text(&report).as_str(), "11:22:33:44:55:66;Dev;5900AABB");

        let report = AdvReport::new([0; 6], 0, -50, &[]);
        assert_eq!(scan_report_text(&report).as_str(), "00:00:00:00:00:00;;");
    }
}
