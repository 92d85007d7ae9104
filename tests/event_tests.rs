#![no_std]
#![no_main]

mod common;

use easy_nrf52::ble::events::{self, event_data, BleEvent, Role, EVENT_QUEUE_LEN};
use easy_nrf52::config::MAX_GATT_DATA;
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

    #[before_each]
    fn before_each() {
        events::clear();
    }

    #[test]
    fn test_event_data_truncates() {
        let data: heapless::Vec<u8, 200> = counting_bytes(200, 0);
        let cut = event_data(&data);
        assert_eq!(cut.len(), MAX_GATT_DATA);
        assert_eq!(&cut[..], &data[..MAX_GATT_DATA]);
        assert!(event_data(&[]).is_empty());
    }

    #[test]
    fn test_events_in_order() {
        events::publish(BleEvent::Connected { role: Role::Peripheral });
        events::publish(BleEvent::ScanTimeout);
        assert_eq!(
            events::try_next_event(),
            Some(BleEvent::Connected { role: Role::Peripheral })
        );
        assert_eq!(events::try_next_event(), Some(BleEvent::ScanTimeout));
        assert!(events::try_next_event().is_none());
    }

    #[test]
    fn test_full_queue_drops_newest() {
        for handle in 0..EVENT_QUEUE_LEN as u16 {
            events::publish(BleEvent::Notification {
                handle,
                data: event_data(&[]),
            });
        }
        events::publish(BleEvent::NusDetected);

        let mut count = 0;
        while let Some(event) = events::try_next_event() {
            assert!(event != BleEvent::NusDetected);
            count += 1;
        }
        assert_eq!(count, EVENT_QUEUE_LEN);
    }

    #[test]
    fn test_clear_drops_queued() {
        events::publish(BleEvent::AdvertiseTimeout);
        events::clear();
        assert!(events::try_next_event().is_none());
    }

    proptest! {
        #[test]
        fn test_event_data_is_prefix(data in prop::collection::vec(any::<u8>(), 0..300)) {
            let cut = event_data(&data);
            prop_assert_eq!(cut.len(), data.len().min(MAX_GATT_DATA));
            prop_assert_eq!(&cut[..], &data[..cut.len()]);
        }
    }
}
