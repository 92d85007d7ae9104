//! Text line protocol of the command interpreter
//!
//! Requests are `command[;param]*` lines. Responses are single lines with a
//! one character prefix:
//! - `=` command succeeded, followed by the command word
//! - `*` command failed
//! - `#` asynchronous notification

use core::fmt::{self, Write};

use heapless::{String, Vec};

use crate::config::SERIAL_LINE_MAX;
use crate::core::adv::AdvReport;
use crate::core::{addr, hex};

/// Maximum number of `;` separated parameters after the command word
pub const MAX_PARAMS: usize = 6;

/// Longest response line including the trailing newline
pub const RESPONSE_MAX: usize = 255;

/// Capacity of the scan match list
pub const SCAN_MATCH_MAX: usize = 100;

pub const PREFIX_OK: char = '=';
pub const PREFIX_ERROR: char = '*';
pub const PREFIX_ASYNC: char = '#';

pub type Response = String<RESPONSE_MAX>;

/// A split command line
///
/// The command word is uppercased; parameters are borrowed from the line.
/// The last parameter keeps any further `;` characters.
#[derive(Debug)]
pub struct CommandLine<'a> {
    command: String<SERIAL_LINE_MAX>,
    params: Vec<&'a str, MAX_PARAMS>,
}

impl<'a> CommandLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        let mut parts = line.splitn(MAX_PARAMS + 1, ';');

        let mut command = String::new();
        for c in parts.next().unwrap_or("").chars() {
            if command.push(c.to_ascii_uppercase()).is_err() {
                break;
            }
        }

        let mut params = Vec::new();
        for part in parts {
            // splitn bounds the count
            let _ = params.push(part);
        }

        Self { command, params }
    }

    /// Uppercased command word
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is(&self, name: &str) -> bool {
        self.command.eq_ignore_ascii_case(name)
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn param(&self, pos: usize) -> Option<&'a str> {
        self.params.get(pos).copied()
    }

    /// `true` when the parameter starts with `1`
    pub fn bool_param(&self, pos: usize) -> bool {
        self.param(pos).is_some_and(|p| p.starts_with('1'))
    }

    /// Decimal parameter, `default` when absent
    pub fn dec_param(&self, pos: usize, default: u32) -> u32 {
        self.param(pos).map_or(default, parse_dec)
    }

    /// Signed decimal parameter, `default` when absent
    pub fn int_param(&self, pos: usize, default: i32) -> i32 {
        self.param(pos).map_or(default, parse_int)
    }

    /// Hex parameter, 0 when absent or not a number
    pub fn hex_param(&self, pos: usize) -> u32 {
        self.param(pos).map_or(0, parse_hex)
    }
}

/// Leading decimal digits of `text`, 0 when there are none
pub fn parse_dec(text: &str) -> u32 {
    text.trim_start()
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0u32, |acc, d| acc.wrapping_mul(10).wrapping_add((d - b'0') as u32))
}

/// Optionally signed leading decimal digits of `text`
pub fn parse_int(text: &str) -> i32 {
    let text = text.trim_start();
    match text.strip_prefix('-') {
        Some(rest) => (parse_dec(rest) as i32).wrapping_neg(),
        None => parse_dec(text.strip_prefix('+').unwrap_or(text)) as i32,
    }
}

/// Leading hex digits of `text`, with an optional `0x` prefix
pub fn parse_hex(text: &str) -> u32 {
    let text = text.trim_start();
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    text.chars()
        .map_while(|c| c.to_digit(16))
        .fold(0u32, |acc, d| acc.wrapping_shl(4) | d)
}

/// Format one response line ending in `\n`
///
/// Text that does not fit is cut so the newline always remains.
pub fn format_response(prefix: char, args: fmt::Arguments<'_>) -> Response {
    let mut line = Response::new();
    let _ = line.push(prefix);
    let _ = Truncating(&mut line).write_fmt(args);
    let _ = line.push('\n');
    line
}

/// Writes what fits, leaving one byte for the newline
struct Truncating<'a>(&'a mut Response);

impl fmt::Write for Truncating<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.len() + c.len_utf8() >= RESPONSE_MAX {
                return Err(fmt::Error);
            }
            let _ = self.0.push(c);
        }
        Ok(())
    }
}

/// `=<CMD> <text>`
pub fn ok_response(command: &str, args: fmt::Arguments<'_>) -> Response {
    format_response(PREFIX_OK, format_args!("{} {}", command, args))
}

/// `*<CMD> <message>`
pub fn error_response(command: &str, message: &str) -> Response {
    format_response(PREFIX_ERROR, format_args!("{} {}", command, message))
}

/// `*<CMD> nrf error: <code hex>`
pub fn nrf_error_response(command: &str, code: u32) -> Response {
    format_response(PREFIX_ERROR, format_args!("{} nrf error: {:X}", command, code))
}

pub fn async_response(args: fmt::Arguments<'_>) -> Response {
    format_response(PREFIX_ASYNC, args)
}

/// Match list for scan reports, `|` separated
///
/// An empty list shows every report.
#[derive(Debug, Default, Clone)]
pub struct ScanFilter {
    patterns: String<SCAN_MATCH_MAX>,
}

impl ScanFilter {
    pub const fn new() -> Self {
        Self { patterns: String::new() }
    }

    pub fn set(&mut self, patterns: &str) {
        self.patterns.clear();
        for c in patterns.chars() {
            if self.patterns.len() + c.len_utf8() > SCAN_MATCH_MAX - 3 || self.patterns.push(c).is_err() {
                break;
            }
        }
    }

    /// Whether any pattern is a substring of `text`
    ///
    /// The list ends at the first empty pattern; an empty first pattern
    /// matches everything.
    pub fn matches(&self, text: &str) -> bool {
        let mut patterns = self.patterns.split('|').take_while(|p| !p.is_empty()).peekable();
        if patterns.peek().is_none() {
            return true;
        }
        patterns.any(|p| text.contains(p))
    }
}

/// Capacity of the `<addr>;<name>;<manufacturer hex>` report text
pub const SCAN_TEXT_MAX: usize = 160;

/// Name and manufacturer data limits taken from one report
pub const SCAN_NAME_MAX: usize = 32;
pub const SCAN_MANUF_MAX: usize = 32;

/// Text used both for matching and for the `#SCAN:` line
pub fn scan_report_text(report: &AdvReport<'_>) -> String<SCAN_TEXT_MAX> {
    let mut name_buf = [0u8; SCAN_NAME_MAX];
    let mut manuf_buf = [0u8; SCAN_MANUF_MAX];
    let name = report.name(&mut name_buf);
    let manuf = report.manufacturer_data(&mut manuf_buf);

    let mut text = String::new();
    let _ = write!(
        text,
        "{};{};{}",
        addr::addr_to_str(&report.addr),
        name,
        hex::HexStr(manuf)
    );
    text
}
