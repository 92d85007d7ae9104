//! Error types shared by the facade, the role tasks and the applications

use defmt::Format;
use embassy_executor::SpawnError;
use nrf_softdevice::ble::central::{ConnectError, ScanError};
use nrf_softdevice::ble::gatt_client::{DiscoverError, ReadError, WriteError};
use nrf_softdevice::ble::gatt_server::{NotifyValueError, RegisterError};
use nrf_softdevice::ble::peripheral::AdvertiseError;
use nrf_softdevice::ble::DisconnectedError;

/// nRF SDK error codes used in responses
pub const NRF_SUCCESS: u32 = 0;
pub const NRF_ERROR_INTERNAL: u32 = 3;
pub const NRF_ERROR_NO_MEM: u32 = 4;
pub const NRF_ERROR_NOT_FOUND: u32 = 5;
pub const NRF_ERROR_INVALID_PARAM: u32 = 7;
pub const NRF_ERROR_INVALID_STATE: u32 = 8;
pub const NRF_ERROR_INVALID_LENGTH: u32 = 9;
pub const NRF_ERROR_DATA_SIZE: u32 = 12;
pub const NRF_ERROR_TIMEOUT: u32 = 13;
pub const NRF_ERROR_BUSY: u32 = 17;
pub const NRF_ERROR_CONN_COUNT: u32 = 18;
pub const NRF_ERROR_RESOURCES: u32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum EnrfError {
    /// No link to operate on
    NotConnected,
    /// Another operation of the same kind is in flight or queued
    Busy,
    InvalidParam,
    Timeout,
    /// Payload does not fit the advertising or attribute buffer
    DataTooLarge,
    NoFreeConnection,
    /// Discovery finished without the requested service
    NotFound,
    /// Serial console was never enabled
    NotEnabled,
    /// Nothing running to stop or cancel
    InvalidState,
    /// Error code returned by the stack
    Raw(u32),
}

impl EnrfError {
    /// Numeric code in the `NRF_ERROR_*` space
    pub fn code(&self) -> u32 {
        match self {
            EnrfError::NotConnected => NRF_ERROR_INVALID_STATE,
            EnrfError::Busy => NRF_ERROR_BUSY,
            EnrfError::InvalidParam => NRF_ERROR_INVALID_PARAM,
            EnrfError::Timeout => NRF_ERROR_TIMEOUT,
            EnrfError::DataTooLarge => NRF_ERROR_DATA_SIZE,
            EnrfError::NoFreeConnection => NRF_ERROR_CONN_COUNT,
            EnrfError::NotFound => NRF_ERROR_NOT_FOUND,
            EnrfError::NotEnabled => NRF_ERROR_INVALID_STATE,
            EnrfError::InvalidState => NRF_ERROR_INVALID_STATE,
            EnrfError::Raw(code) => *code,
        }
    }

    /// Map a raw `sd_*` return value
    pub fn check(ret: u32) -> Result<(), EnrfError> {
        if ret == NRF_SUCCESS {
            Ok(())
        } else {
            Err(EnrfError::Raw(ret))
        }
    }
}

impl From<SpawnError> for EnrfError {
    fn from(_: SpawnError) -> Self {
        EnrfError::Raw(NRF_ERROR_NO_MEM)
    }
}

impl From<DisconnectedError> for EnrfError {
    fn from(_: DisconnectedError) -> Self {
        EnrfError::NotConnected
    }
}

impl From<AdvertiseError> for EnrfError {
    fn from(err: AdvertiseError) -> Self {
        match err {
            AdvertiseError::Timeout => EnrfError::Timeout,
            AdvertiseError::NoFreeConn => EnrfError::NoFreeConnection,
            AdvertiseError::Raw(raw) => EnrfError::Raw(raw as u32),
            #[allow(unreachable_patterns)]
            _ => EnrfError::Raw(NRF_ERROR_INTERNAL),
        }
    }
}

impl From<ScanError> for EnrfError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Timeout => EnrfError::Timeout,
            ScanError::Raw(raw) => EnrfError::Raw(raw as u32),
            #[allow(unreachable_patterns)]
            _ => EnrfError::Raw(NRF_ERROR_INTERNAL),
        }
    }
}

impl From<ConnectError> for EnrfError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Timeout => EnrfError::Timeout,
            ConnectError::NoFreeConn => EnrfError::NoFreeConnection,
            ConnectError::Raw(raw) => EnrfError::Raw(raw as u32),
            _ => EnrfError::InvalidParam,
        }
    }
}

impl From<DiscoverError> for EnrfError {
    fn from(err: DiscoverError) -> Self {
        match err {
            DiscoverError::Disconnected => EnrfError::NotConnected,
            DiscoverError::ServiceNotFound => EnrfError::NotFound,
            DiscoverError::Raw(raw) => EnrfError::Raw(raw as u32),
            _ => EnrfError::Raw(NRF_ERROR_INTERNAL),
        }
    }
}

impl From<ReadError> for EnrfError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Disconnected => EnrfError::NotConnected,
            ReadError::Truncated => EnrfError::DataTooLarge,
            ReadError::Raw(raw) => EnrfError::Raw(raw as u32),
            _ => EnrfError::Raw(NRF_ERROR_INTERNAL),
        }
    }
}

impl From<WriteError> for EnrfError {
    fn from(err: WriteError) -> Self {
        match err {
            WriteError::Disconnected => EnrfError::NotConnected,
            WriteError::Timeout => EnrfError::Timeout,
            WriteError::Raw(raw) => EnrfError::Raw(raw as u32),
            _ => EnrfError::Raw(NRF_ERROR_INTERNAL),
        }
    }
}

impl From<NotifyValueError> for EnrfError {
    fn from(err: NotifyValueError) -> Self {
        match err {
            NotifyValueError::Disconnected => EnrfError::NotConnected,
            NotifyValueError::Raw(raw) => EnrfError::Raw(raw as u32),
            #[allow(unreachable_patterns)]
            _ => EnrfError::Raw(NRF_ERROR_INTERNAL),
        }
    }
}

impl From<RegisterError> for EnrfError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Raw(raw) => EnrfError::Raw(raw as u32),
            #[allow(unreachable_patterns)]
            _ => EnrfError::Raw(NRF_ERROR_INTERNAL),
        }
    }
}
