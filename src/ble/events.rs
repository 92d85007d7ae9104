//! BLE event surface
//!
//! Role tasks and stack callbacks publish [`BleEvent`]s into one bounded
//! channel; the application drains it with [`next_event`]. Publishing never
//! blocks: when the channel is full the event is dropped with a warning.

use defmt::{debug, warn, Format};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

use crate::config::MAX_GATT_DATA;

/// Attribute payload carried by an event
pub type EventData = Vec<u8, MAX_GATT_DATA>;

/// Which side of the link we are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Role {
    Peripheral,
    Central,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BleEvent {
    Connected {
        role: Role,
    },
    Disconnected {
        role: Role,
        /// HCI reason code
        reason: u8,
    },
    WriteResponse {
        handle: u16,
        data: EventData,
    },
    ReadResponse {
        handle: u16,
        data: EventData,
    },
    Notification {
        handle: u16,
        data: EventData,
    },
    ScanTimeout,
    ConnectTimeout,
    AdvertiseTimeout,
    /// One characteristic of a discovered service
    Discovered {
        service: u16,
        characteristic: u16,
        value_handle: u16,
        cccd_handle: u16,
    },
    DiscoveryDone {
        service: u16,
    },
    /// Peer exposes NUS and its TX notifications are enabled
    NusDetected,
    NusClientRx(EventData),
    NusClientDisconnected,
}

impl Format for BleEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            BleEvent::Connected { role } => defmt::write!(f, "Connected({})", role),
            BleEvent::Disconnected { role, reason } => {
                defmt::write!(f, "Disconnected({}, {=u8:#x})", role, reason)
            }
            BleEvent::WriteResponse { handle, data } => {
                defmt::write!(f, "WriteResponse({=u16:#x}, {=[u8]:x})", handle, &data[..])
            }
            BleEvent::ReadResponse { handle, data } => {
                defmt::write!(f, "ReadResponse({=u16:#x}, {=[u8]:x})", handle, &data[..])
            }
            BleEvent::Notification { handle, data } => {
                defmt::write!(f, "Notification({=u16:#x}, {=[u8]:x})", handle, &data[..])
            }
            BleEvent::ScanTimeout => defmt::write!(f, "ScanTimeout"),
            BleEvent::ConnectTimeout => defmt::write!(f, "ConnectTimeout"),
            BleEvent::AdvertiseTimeout => defmt::write!(f, "AdvertiseTimeout"),
            BleEvent::Discovered {
                service,
                characteristic,
                value_handle,
                cccd_handle,
            } => defmt::write!(
                f,
                "Discovered({=u16:#x}, {=u16:#x}, {=u16:#x}, {=u16:#x})",
                service,
                characteristic,
                value_handle,
                cccd_handle
            ),
            BleEvent::DiscoveryDone { service } => defmt::write!(f, "DiscoveryDone({=u16:#x})", service),
            BleEvent::NusDetected => defmt::write!(f, "NusDetected"),
            BleEvent::NusClientRx(data) => defmt::write!(f, "NusClientRx({=[u8]:x})", &data[..]),
            BleEvent::NusClientDisconnected => defmt::write!(f, "NusClientDisconnected"),
        }
    }
}

/// Copy attribute data into an event payload, cutting what does not fit
pub fn event_data(data: &[u8]) -> EventData {
    let len = data.len().min(MAX_GATT_DATA);
    // Length bounded above
    Vec::from_slice(&data[..len]).unwrap_or_default()
}

/// Event queue depth
pub const EVENT_QUEUE_LEN: usize = 8;

static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, BleEvent, EVENT_QUEUE_LEN> = Channel::new();

/// Publish an event without blocking
pub fn publish(event: BleEvent) {
    debug!("BLE event: {}", event);
    if let Err(embassy_sync::channel::TrySendError::Full(event)) = EVENT_CHANNEL.try_send(event) {
        warn!("Event queue full, dropping {}", event);
    }
}

/// Wait for the next BLE event
pub async fn next_event() -> BleEvent {
    EVENT_CHANNEL.receive().await
}

/// Next event if one is queued
pub fn try_next_event() -> Option<BleEvent> {
    EVENT_CHANNEL.try_receive().ok()
}

/// Drop every queued event
pub fn clear() {
    EVENT_CHANNEL.clear();
}
