//! Advertisement data (AD structure) encoding and field lookup
//!
//! An advertising payload is a sequence of `[len][type][payload...]`
//! structures where `len` counts the type byte plus the payload.

use heapless::Vec;

use crate::error::EnrfError;

/// Legacy advertising payload limit
pub const LEGACY_ADV_MAX: usize = 31;
/// Extended advertising payload limit used for long range
pub const EXTENDED_ADV_MAX: usize = 255;

pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_SHORT_LOCAL_NAME: u8 = 0x08;
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;
pub const AD_TYPE_MANUFACTURER_SPECIFIC_DATA: u8 = 0xFF;

/// LE general discoverable, BR/EDR not supported
pub const FLAGS_LE_ONLY_GENERAL_DISC: u8 = 0x06;
/// BR/EDR not supported
pub const FLAGS_BR_EDR_NOT_SUPPORTED: u8 = 0x04;

/// Copy the payload of the first field whose type lies in
/// `[start_tag, end_tag]` into `dest`, returning its length
///
/// Returns 0 when nothing matches, when a field runs past the end of `data`,
/// or when the payload is longer than `dest`. A zero length byte ends the
/// significant part of the data.
pub fn adv_parse(data: &[u8], start_tag: u8, end_tag: u8, dest: &mut [u8]) -> usize {
    let mut offset = 0;

    while offset < data.len() {
        let field_len = data[offset] as usize;
        if field_len == 0 {
            return 0;
        }
        if offset + 1 + field_len > data.len() {
            return 0;
        }

        let field_type = data[offset + 1];
        if (start_tag..=end_tag).contains(&field_type) {
            let payload = &data[offset + 2..offset + 1 + field_len];
            if payload.len() > dest.len() {
                return 0;
            }
            dest[..payload.len()].copy_from_slice(payload);
            return payload.len();
        }
        offset += field_len + 1;
    }
    0
}

/// Whether the local name goes into the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum NameType {
    None,
    FullName,
}

/// Encoded advertising payload
///
/// `N` is the payload limit, [`LEGACY_ADV_MAX`] or [`EXTENDED_ADV_MAX`].
#[derive(Debug, Clone, Default)]
pub struct AdvPayload<const N: usize> {
    buf: Vec<u8, N>,
}

impl<const N: usize> AdvPayload<N> {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Flags field, `0x06` when connectable and `0x04` otherwise
    pub fn flags(mut self, connectable: bool) -> Result<Self, EnrfError> {
        let flags = if connectable {
            FLAGS_LE_ONLY_GENERAL_DISC
        } else {
            FLAGS_BR_EDR_NOT_SUPPORTED
        };
        self.push_field(AD_TYPE_FLAGS, &[flags])?;
        Ok(self)
    }

    pub fn full_name(mut self, name: &str) -> Result<Self, EnrfError> {
        self.push_field(AD_TYPE_COMPLETE_LOCAL_NAME, name.as_bytes())?;
        Ok(self)
    }

    /// Manufacturer specific data, company id little endian ahead of `data`
    pub fn manufacturer_data(mut self, company_id: u16, data: &[u8]) -> Result<Self, EnrfError> {
        let len = 1 + 2 + data.len();
        if len > u8::MAX as usize || self.buf.len() + 1 + len > N {
            return Err(EnrfError::DataTooLarge);
        }
        self.push(&[len as u8, AD_TYPE_MANUFACTURER_SPECIFIC_DATA])?;
        self.push(&company_id.to_le_bytes())?;
        self.push(data)?;
        Ok(self)
    }

    /// Append a raw AD structure
    pub fn push_field(&mut self, ad_type: u8, payload: &[u8]) -> Result<(), EnrfError> {
        let len = 1 + payload.len();
        if len > u8::MAX as usize || self.buf.len() + 1 + len > N {
            return Err(EnrfError::DataTooLarge);
        }
        self.push(&[len as u8, ad_type])?;
        self.push(payload)
    }

    fn push(&mut self, bytes: &[u8]) -> Result<(), EnrfError> {
        self.buf
            .extend_from_slice(bytes)
            .map_err(|_| EnrfError::DataTooLarge)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Build the advertising payload the facade uses
///
/// Flags first, then the device name when requested, then manufacturer data.
pub fn build_payload<const N: usize>(
    connectable: bool,
    name_type: NameType,
    device_name: &str,
    manufacturer: Option<(u16, &[u8])>,
) -> Result<AdvPayload<N>, EnrfError> {
    let mut payload = AdvPayload::<N>::new().flags(connectable)?;
    if name_type == NameType::FullName {
        payload = payload.full_name(device_name)?;
    }
    if let Some((company_id, data)) = manufacturer {
        payload = payload.manufacturer_data(company_id, data)?;
    }
    Ok(payload)
}

/// One scan report, borrowed from the stack event
#[derive(Debug, Clone, Copy)]
pub struct AdvReport<'a> {
    /// Peer address, stack byte order
    pub addr: [u8; 6],
    /// Raw GAP address type, 0 for public
    pub addr_type: u8,
    pub rssi: i8,
    pub data: &'a [u8],
}

impl<'a> AdvReport<'a> {
    pub fn new(addr: [u8; 6], addr_type: u8, rssi: i8, data: &'a [u8]) -> Self {
        Self {
            addr,
            addr_type,
            rssi,
            data,
        }
    }

    /// Payload of the first field in the tag range, see [`adv_parse`]
    pub fn field(&self, start_tag: u8, end_tag: u8, dest: &mut [u8]) -> usize {
        adv_parse(self.data, start_tag, end_tag, dest)
    }

    /// Short or complete local name
    pub fn name<'b>(&self, dest: &'b mut [u8]) -> &'b str {
        let len = self.field(AD_TYPE_SHORT_LOCAL_NAME, AD_TYPE_COMPLETE_LOCAL_NAME, dest);
        core::str::from_utf8(&dest[..len]).unwrap_or("")
    }

    /// Manufacturer specific data including the company id
    pub fn manufacturer_data<'b>(&self, dest: &'b mut [u8]) -> &'b [u8] {
        let len = self.field(
            AD_TYPE_MANUFACTURER_SPECIFIC_DATA,
            AD_TYPE_MANUFACTURER_SPECIFIC_DATA,
            dest,
        );
        &dest[..len]
    }
}
