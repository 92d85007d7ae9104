//! GAP commands: tx power, scan, advertise, connect

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use defmt::{debug, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

use crate::ble::advertiser::AdvertiseParams;
use crate::ble::nus;
use crate::commands::{respond_now, validate, CommandError, CommandResult, Reply};
use crate::config::DEFAULT_ADV_INTERVAL_MS;
use crate::core::adv::{AdvReport, NameType};
use crate::core::protocol::{async_response, scan_report_text, CommandLine, ScanFilter};
use crate::core::{addr, hex};
use crate::enrf::Enrf;

/// Manufacturer data accepted on the command line, company id included
pub const MANUF_PARAM_MAX: usize = 32;

static SCAN_FILTER: Mutex<CriticalSectionRawMutex, RefCell<ScanFilter>> = Mutex::new(RefCell::new(ScanFilter::new()));
static SCAN_ONCE: AtomicBool = AtomicBool::new(false);

/// Shows matching reports as `#SCAN:<addr>;<name>;<manuf>;<rssi>`
fn scan_report(report: &AdvReport<'_>) -> bool {
    let text = scan_report_text(report);
    let show = SCAN_FILTER.lock(|filter| filter.borrow().matches(&text));
    if show {
        respond_now(&async_response(format_args!("SCAN:{};{}", text, report.rssi)));
    }
    show && SCAN_ONCE.load(Ordering::Relaxed)
}

/// Shows NUS data as `#NUS:<text>` and leaves it to the standard requests
fn nus_data_received(data: &[u8]) -> bool {
    respond_now(&async_response(format_args!("NUS:{}", nus::request_text(data))));
    false
}

/// tx_pow;dbm
pub fn handle_tx_pow(enrf: &Enrf, line: &CommandLine<'_>) -> CommandResult {
    enrf.set_tx_power(line.int_param(0, 0));
    Ok(Reply::empty())
}

/// scan;match;only_once;long_range;active;timeout
pub async fn handle_scan(enrf: &Enrf, line: &CommandLine<'_>) -> CommandResult {
    let Some(patterns) = line.param(0) else {
        return validate(enrf.stop_scan());
    };
    SCAN_FILTER.lock(|filter| filter.borrow_mut().set(patterns));
    SCAN_ONCE.store(line.bool_param(1), Ordering::Relaxed);
    enrf.set_phy(line.bool_param(2));
    validate(enrf.start_scan(scan_report, line.dec_param(4, 0), line.bool_param(3)).await)
}

/// Company id and data of a `#<hex>` advertise parameter
pub fn parse_manufacturer(param: &str) -> Option<(u16, Vec<u8, MANUF_PARAM_MAX>)> {
    let hex_text = param.strip_prefix('#')?;
    let mut bytes = [0u8; MANUF_PARAM_MAX];
    let len = hex::hex_to_bytes(hex_text, &mut bytes);
    if len < 2 {
        return None;
    }
    let company = u16::from_le_bytes([bytes[0], bytes[1]]);
    let data = Vec::from_slice(&bytes[2..len]).ok()?;
    Some((company, data))
}

/// advertise;name|#manuf_hex;connectable;long_range;timeout_s;interval_ms
pub async fn handle_advertise(enrf: &Enrf, line: &CommandLine<'_>) -> CommandResult {
    let Some(first) = line.param(0) else {
        return validate(enrf.stop_advertise());
    };

    enrf.set_phy(line.bool_param(2));
    enrf.set_nus_handler(Some(nus_data_received));
    let mut params = AdvertiseParams {
        connectable: line.bool_param(1),
        timeout_s: line.dec_param(3, 0),
        interval_ms: line.dec_param(4, DEFAULT_ADV_INTERVAL_MS),
        ..AdvertiseParams::default()
    };

    if first.starts_with('#') {
        let (company, data) = parse_manufacturer(first).ok_or(CommandError::Syntax)?;
        debug!("Advertise manufacturer {=u16:#x}, {} bytes", company, data.len());
        params.name_type = NameType::None;
        params.manufacturer = Some((company, &data[..]));
        validate(enrf.start_advertise(&params).await)
    } else {
        if let Err(e) = enrf.set_device_name(first) {
            warn!("Device name not set: {}", e);
        }
        params.name_type = NameType::FullName;
        validate(enrf.start_advertise(&params).await)
    }
}

/// connect;[P]mac;long_range
pub async fn handle_connect(enrf: &Enrf, line: &CommandLine<'_>) -> CommandResult {
    let text = line.param(0).unwrap_or("");
    let address = addr::parse_peer_address(text).ok_or(CommandError::InvalidMac)?;
    enrf.set_phy(line.bool_param(1));
    validate(enrf.connect_to(Some(address), true, true).await)
}
