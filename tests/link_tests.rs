#![no_std]
#![no_main]

mod common;

use easy_nrf52::ble::client::{self, GattRequest, WriteOp};
use easy_nrf52::ble::connection::{
    disconnect_reason, LinkTable, HCI_LOCAL_HOST_TERMINATED, HCI_REMOTE_USER_TERMINATED,
};
use easy_nrf52::ble::events::Role;
use easy_nrf52::ble::report::StartReport;
use easy_nrf52::ble::{advertiser, central, scanner};
use easy_nrf52::commands::system::handle_led;
use easy_nrf52::commands::{render, Rendered, Reply};
use easy_nrf52::config::MAX_GATT_DATA;
use easy_nrf52::core::protocol::CommandLine;
use easy_nrf52::EnrfError;
use embassy_futures::{block_on, yield_now};

fn rendered_text(rendered: Rendered) -> Option<easy_nrf52::core::protocol::Response> {
    match rendered {
        Rendered::Line(line) => Some(line),
        _ => None,
    }
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
    fn test_disconnect_reason() {
        assert_eq!(disconnect_reason(true), HCI_LOCAL_HOST_TERMINATED);
        assert_eq!(disconnect_reason(false), HCI_REMOTE_USER_TERMINATED);
        assert_eq!(HCI_LOCAL_HOST_TERMINATED, 0x16);
        assert_eq!(HCI_REMOTE_USER_TERMINATED, 0x13);
    }

    #[test]
    fn test_link_slots() {
        let mut links: LinkTable<u16> = LinkTable::new();
        assert_eq!(links.count(), 0);
        assert!(links.current().is_none());

        links.connect(Role::Peripheral, 1).unwrap();
        assert_eq!(links.current(), Some((Role::Peripheral, 1)));

        links.connect(Role::Central, 2).unwrap();
        assert_eq!(links.count(), 2);
        assert_eq!(links.current(), Some((Role::Central, 2)));
        assert_eq!(links.get(Role::Peripheral), Some(1));

        assert_eq!(links.release(Role::Central), Some(HCI_REMOTE_USER_TERMINATED));
        assert_eq!(links.current(), Some((Role::Peripheral, 1)));
        assert!(links.get(Role::Central).is_none());

        assert_eq!(links.release(Role::Peripheral), Some(HCI_REMOTE_USER_TERMINATED));
        assert_eq!(links.count(), 0);
        assert!(links.current().is_none());
    }

    #[test]
    fn test_one_link_per_role() {
        let mut links: LinkTable<u16> = LinkTable::new();
        links.connect(Role::Central, 7).unwrap();
        assert_eq!(links.connect(Role::Central, 8), Err(EnrfError::NoFreeConnection));
        assert_eq!(links.get(Role::Central), Some(7));
        assert_eq!(links.count(), 1);

        assert_eq!(links.release(Role::Central), Some(HCI_REMOTE_USER_TERMINATED));
        links.connect(Role::Central, 8).unwrap();
        assert_eq!(links.get(Role::Central), Some(8));
    }

    #[test]
    fn test_release_empty_slot() {
        let mut links: LinkTable<u16> = LinkTable::new();
        assert!(links.release(Role::Peripheral).is_none());
        links.connect(Role::Central, 3).unwrap();
        assert!(links.release(Role::Peripheral).is_none());
        assert_eq!(links.current(), Some((Role::Central, 3)));
    }

    #[test]
    fn test_local_disconnect_reason_is_per_link() {
        let mut links: LinkTable<u16> = LinkTable::new();
        links.connect(Role::Peripheral, 1).unwrap();
        links.connect(Role::Central, 2).unwrap();

        links.mark_local(Role::Central, true);
        assert_eq!(links.release(Role::Central), Some(HCI_LOCAL_HOST_TERMINATED));
        assert_eq!(links.release(Role::Peripheral), Some(HCI_REMOTE_USER_TERMINATED));

        // A failed local disconnect leaves the flag cleared
        links.connect(Role::Peripheral, 4).unwrap();
        links.mark_local(Role::Peripheral, true);
        links.mark_local(Role::Peripheral, false);
        assert_eq!(links.release(Role::Peripheral), Some(HCI_REMOTE_USER_TERMINATED));

        // A new link starts without the flag of the previous one
        links.connect(Role::Central, 5).unwrap();
        links.mark_local(Role::Central, true);
        assert_eq!(links.release(Role::Central), Some(HCI_LOCAL_HOST_TERMINATED));
        links.connect(Role::Central, 6).unwrap();
        assert_eq!(links.release(Role::Central), Some(HCI_REMOTE_USER_TERMINATED));
    }

    #[test]
    fn test_gatt_ops_need_central_link() {
        assert_eq!(block_on(client::read_char(0x000E)), Err(EnrfError::NotConnected));
        assert_eq!(
            block_on(client::write_char(WriteOp::Request, 0x0010, &[1, 2])),
            Err(EnrfError::NotConnected)
        );
        assert_eq!(block_on(client::enable_char_notif(0x0011, true)), Err(EnrfError::NotConnected));
        assert_eq!(block_on(client::nus_c_string_send("Version?")), Err(EnrfError::NotConnected));
    }

    #[test]
    fn test_gatt_write_size_checked_before_queueing() {
        let data: heapless::Vec<u8, 300> = counting_bytes(MAX_GATT_DATA + 1, 0);
        assert!(matches!(
            GattRequest::write(WriteOp::Command, 0x0010, &data),
            Err(EnrfError::DataTooLarge)
        ));
        assert_eq!(
            block_on(client::write_char(WriteOp::Command, 0x0010, &data)),
            Err(EnrfError::DataTooLarge)
        );

        match GattRequest::write(WriteOp::Request, 0x0010, &data[..MAX_GATT_DATA]) {
            Ok(GattRequest::Write { op, handle, data }) => {
                assert_eq!(op, WriteOp::Request);
                assert_eq!(handle, 0x0010);
                assert_eq!(data.len(), MAX_GATT_DATA);
            }
            _ => assert!(false, "expected a write request"),
        }
    }

    #[test]
    fn test_start_error_reported() {
        let report = StartReport::new();
        let result = block_on(report.track(async { Err::<(), EnrfError>(EnrfError::Raw(7)) }));
        assert_eq!(result, Err(EnrfError::Raw(7)));
        assert_eq!(report.try_result(), Some(Err(EnrfError::Raw(7))));
        assert!(report.try_result().is_none());
    }

    #[test]
    fn test_pending_start_reported_once() {
        let report = StartReport::new();
        let result = block_on(report.track(async {
            yield_now().await;
            Err::<u8, EnrfError>(EnrfError::Timeout)
        }));
        // Later failures belong to the role task
        assert_eq!(result, Err(EnrfError::Timeout));
        assert_eq!(report.try_result(), Some(Ok(())));
        assert!(report.try_result().is_none());
    }

    #[test]
    fn test_start_report_reset() {
        let report = StartReport::new();
        report.report(Ok(()));
        report.reset();
        assert!(report.try_result().is_none());
    }

    #[test]
    fn test_stop_without_role_running() {
        assert_eq!(scanner::stop(), Err(EnrfError::InvalidState));
        assert_eq!(advertiser::stop(), Err(EnrfError::InvalidState));
        assert_eq!(central::cancel_connect(), Err(EnrfError::InvalidState));
        assert!(!scanner::is_scanning());
        assert!(!advertiser::is_advertising());
        assert!(!central::is_connecting());

        let line = rendered_text(render("SCAN", &Err(EnrfError::InvalidState.into()))).unwrap();
        assert_eq!(line.as_str(), "*SCAN nrf error: 8\n");
    }

    #[test]
    fn test_led_command() {
        let line = CommandLine::parse("led;3;1");
        let result = handle_led(None, &line);
        assert!(result == Ok(Reply::empty()));
        let line = rendered_text(render("LED", &result)).unwrap();
        assert_eq!(line.as_str(), "=LED \n");

        // Out of range indexes are acknowledged too
        let result = handle_led(None, &CommandLine::parse("led;99;0"));
        assert!(result == Ok(Reply::empty()));
    }
}
