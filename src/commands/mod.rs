//! Command interpreter of the serial BLE tool
//!
//! Each input line is split by [`CommandLine`], matched to a [`Command`] and
//! routed to its handler. Handlers return a [`Reply`] or a [`CommandError`];
//! [`render`] turns either into the response line. Stack events are rendered
//! by [`events::event_response`].

use core::fmt::Write;

use defmt::{debug, warn, Format};
use heapless::String;

use crate::board::Leds;
use crate::core::protocol::{
    error_response, format_response, nrf_error_response, ok_response, CommandLine, Response, PREFIX_ERROR,
    RESPONSE_MAX,
};
use crate::enrf::{BleEvent, Enrf};
use crate::error::EnrfError;
use crate::serial;

pub mod events;
pub mod gap;
pub mod gattc;
pub mod system;
pub mod uuid;

/// Command words understood by the tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum Command {
    Vers,
    Help,
    TxPow,
    Scan,
    Advertise,
    Connect,
    CancelConnect,
    Disconnect,
    AddUuid,
    Notify,
    WriteCmd,
    Write,
    Read,
    Nusc,
    Restart,
    Mac,
    Led,
}

impl Command {
    /// Match an uppercased command word
    pub fn from_word(word: &str) -> Option<Self> {
        let command = match word {
            "VERS" => Command::Vers,
            "HELP" => Command::Help,
            "TX_POW" => Command::TxPow,
            "SCAN" => Command::Scan,
            "ADVERTISE" => Command::Advertise,
            "CONNECT" => Command::Connect,
            "CANCEL_CONNECT" => Command::CancelConnect,
            "DISCONNECT" => Command::Disconnect,
            "ADD_UUID" => Command::AddUuid,
            "NOTIFY" => Command::Notify,
            "WRITE_CMD" => Command::WriteCmd,
            "WRITE" => Command::Write,
            "READ" => Command::Read,
            "NUSC" => Command::Nusc,
            "RESTART" => Command::Restart,
            "MAC" => Command::Mac,
            "LED" => Command::Led,
            _ => return None,
        };
        Some(command)
    }

    /// Parameters needed for the word to be recognized at all
    pub fn min_params(&self) -> usize {
        match self {
            Command::TxPow
            | Command::Connect
            | Command::AddUuid
            | Command::Notify
            | Command::Read
            | Command::Led => 1,
            Command::WriteCmd | Command::Write => 2,
            _ => 0,
        }
    }

    /// Command for a split line, `None` for unknown words and missing
    /// parameters
    pub fn parse(line: &CommandLine<'_>) -> Option<Self> {
        Command::from_word(line.command()).filter(|c| line.param_count() >= c.min_params())
    }
}

/// Command failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Format)]
pub enum CommandError {
    Syntax,
    InvalidMac,
    InvalidUuid,
    /// Error reported by the stack layer
    Nrf(EnrfError),
}

impl From<EnrfError> for CommandError {
    fn from(err: EnrfError) -> Self {
        CommandError::Nrf(err)
    }
}

pub type ReplyText = String<RESPONSE_MAX>;

/// Successful outcome of a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `=<CMD> <text>`
    Ok(ReplyText),
    /// Text written as is
    Raw(&'static str),
    /// Nothing is written
    Silent,
}

impl Reply {
    pub fn empty() -> Self {
        Reply::Ok(ReplyText::new())
    }

    pub fn text(args: core::fmt::Arguments<'_>) -> Self {
        let mut text = ReplyText::new();
        let _ = text.write_fmt(args);
        Reply::Ok(text)
    }
}

pub type CommandResult = Result<Reply, CommandError>;

/// Success for `Ok`, the stack error code otherwise
pub fn validate(result: Result<(), EnrfError>) -> CommandResult {
    result.map(|()| Reply::empty()).map_err(CommandError::from)
}

pub enum Rendered {
    Line(Response),
    Raw(&'static str),
    Nothing,
}

/// Response for the outcome of `command`
pub fn render(command: &str, result: &CommandResult) -> Rendered {
    match result {
        Ok(Reply::Ok(text)) => Rendered::Line(ok_response(command, format_args!("{}", text))),
        Ok(Reply::Raw(text)) => Rendered::Raw(text),
        Ok(Reply::Silent) => Rendered::Nothing,
        Err(CommandError::Syntax) => Rendered::Line(error_response(command, "Syntax error")),
        Err(CommandError::InvalidMac) => Rendered::Line(error_response(command, "Invalid mac address")),
        Err(CommandError::InvalidUuid) => Rendered::Line(error_response(command, "Invalid UUID")),
        Err(CommandError::Nrf(e)) => Rendered::Line(nrf_error_response(command, e.code())),
    }
}

/// `*Invalid command: "<CMD>" Type help for listing`
pub fn invalid_command(command: &str) -> Response {
    format_response(
        PREFIX_ERROR,
        format_args!("Invalid command: \"{}\" Type help for listing", command),
    )
}

/// Write a line to the console
pub async fn respond(text: &str) {
    if let Err(e) = serial::write(text).await {
        warn!("Response dropped: {}", e);
    }
}

/// Write a line from a context that cannot wait
pub fn respond_now(text: &str) {
    if let Err(e) = serial::try_write(text) {
        warn!("Response dropped: {}", e);
    }
}

pub const HELP: &str = "\n=== ble_tool ===\n\
Syntax: command[;param]+\n\
Available commands:\n  \
vers                      Show version\n  \
tx_pow                    Set tx power\n    \
param pow_dbm\n  \
scan                      Start or stop scan\n    \
params: match_string;only_once;long_range;active;timeout\n    \
Empty params stops scan\n  \
advertise                 Start advertisement\n    \
params: name|manuf_data;connectable;long_range;timeout_s;interval_ms\n    \
Empty params stops advertisings\n  \
connect                   Connect to given address\n    \
params: mac_address;long_range\n  \
cancel_connect\n  \
disconnect\n  \
add_uuid                  Add service or charact uuid\n    \
param: uuid_in_hex\n  \
notify                    Enable notifications\n    \
param: handle\n  \
write_cmd                 Write charact value\n    \
param: handle;value_in_hex\n  \
write                     Write charact value with response\n    \
param: handle;value_in_hex\n  \
read                      Read charact value\n    \
param: handle\n  \
nusc                      Write nus client string\n    \
param: string\n  \
restart                   Restart unit with possible dfu mode\n    \
param: 1|0\n  \
mac                       Show unit mac address\n  \
led                       Switch a board led\n    \
param: index;1|0\n";

/// Interpreter state
pub struct BleTool {
    enrf: Enrf,
    leds: Option<Leds>,
}

impl BleTool {
    pub fn new(enrf: Enrf, leds: Option<Leds>) -> Self {
        Self { enrf, leds }
    }

    pub fn enrf(&self) -> &Enrf {
        &self.enrf
    }

    async fn execute(&mut self, command: Command, line: &CommandLine<'_>) -> CommandResult {
        let enrf = self.enrf;
        match command {
            Command::Vers => system::handle_vers(),
            Command::Help => Ok(Reply::Raw(HELP)),
            Command::TxPow => gap::handle_tx_pow(&enrf, line),
            Command::Scan => gap::handle_scan(&enrf, line).await,
            Command::Advertise => gap::handle_advertise(&enrf, line).await,
            Command::Connect => gap::handle_connect(&enrf, line).await,
            Command::CancelConnect => validate(enrf.cancel_connect()),
            Command::Disconnect => validate(enrf.disconnect()),
            Command::AddUuid => uuid::handle_add_uuid(&enrf, line),
            Command::Notify => gattc::handle_notify(&enrf, line).await,
            Command::WriteCmd => gattc::handle_write(&enrf, line, crate::ble::client::WriteOp::Command).await,
            Command::Write => gattc::handle_write(&enrf, line, crate::ble::client::WriteOp::Request).await,
            Command::Read => gattc::handle_read(&enrf, line).await,
            Command::Nusc => gattc::handle_nusc(&enrf, line).await,
            Command::Restart => system::handle_restart(&enrf, line).await,
            Command::Mac => system::handle_mac(&enrf),
            Command::Led => system::handle_led(self.leds.as_mut(), line),
        }
    }

    /// Run one input line and write its response
    pub async fn handle_line(&mut self, text: &str) {
        let line = CommandLine::parse(text);
        let Some(command) = Command::parse(&line) else {
            respond(&invalid_command(line.command())).await;
            return;
        };
        debug!("Command {} with {} params", command, line.param_count());

        let result = self.execute(command, &line).await;
        match render(line.command(), &result) {
            Rendered::Line(response) => respond(&response).await,
            Rendered::Raw(text) => respond(text).await,
            Rendered::Nothing => {}
        }
    }

    /// Write the asynchronous line of a stack event
    pub async fn handle_event(&mut self, event: &BleEvent) {
        if let Some(response) = events::event_response(event) {
            respond(&response).await;
        }
    }
}
