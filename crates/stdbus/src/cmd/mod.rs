use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use stdbus_frame::{ReadErrorPolicy, ReceiveConfig};
use stdbus_link::LinkConfig;
use stdbus_transport::{DataBits, LineConfig, Parity, StopBits};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod encode;
pub mod exchange;
pub mod poll;
pub mod ports;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send one request frame and print the reply payload.
    Exchange(ExchangeArgs),
    /// Repeat the same exchange at a fixed interval.
    Poll(PollArgs),
    /// Encode a payload into a wire frame without touching a port.
    Encode(EncodeArgs),
    /// Decode and verify a wire frame without touching a port.
    Decode(DecodeArgs),
    /// List serial ports available on this host.
    Ports(PortsArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Exchange(args) => exchange::run(args, format),
        Command::Poll(args) => poll::run(args, format),
        Command::Encode(args) => encode::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Ports(args) => ports::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Serial line and receive settings shared by the commands that open a port.
#[derive(Args, Debug)]
pub struct LineArgs {
    /// Serial port to open (e.g. /dev/ttyUSB0, COM3).
    pub port: String,
    /// Line rate in baud.
    #[arg(long, short = 'b', default_value_t = stdbus_transport::DEFAULT_BAUD_RATE)]
    pub baud: u32,
    /// Timeout of each read (e.g. 10ms, 1s).
    #[arg(long, default_value = "10ms")]
    pub timeout: String,
    /// Data bits per character (5-8).
    #[arg(long, default_value_t = 8)]
    pub data_bits: u8,
    /// Parity: none, odd or even.
    #[arg(long, default_value = "none")]
    pub parity: String,
    /// Stop bits (1 or 2).
    #[arg(long, default_value_t = 1)]
    pub stop_bits: u8,
    /// Consecutive empty reads before giving up on a reply.
    #[arg(long, default_value_t = stdbus_frame::DEFAULT_EMPTY_READ_LIMIT)]
    pub empty_reads: u32,
    /// Maximum escaped reply body in bytes.
    #[arg(long, default_value_t = stdbus_frame::DEFAULT_MAX_FRAME_LEN)]
    pub max_frame: usize,
    /// Count read errors as empty reads instead of failing the exchange.
    #[arg(long)]
    pub tolerate_read_errors: bool,
}

impl LineArgs {
    pub fn link_config(&self) -> CliResult<LinkConfig> {
        let usage = |err: stdbus_transport::InvalidSetting| CliError::new(USAGE, err.to_string());

        if self.empty_reads == 0 {
            return Err(CliError::new(USAGE, "--empty-reads must be at least 1"));
        }
        if self.max_frame == 0 {
            return Err(CliError::new(USAGE, "--max-frame must be at least 1"));
        }

        let line = LineConfig {
            baud_rate: self.baud,
            data_bits: DataBits::try_from(self.data_bits).map_err(usage)?,
            parity: self.parity.parse::<Parity>().map_err(usage)?,
            stop_bits: StopBits::try_from(self.stop_bits).map_err(usage)?,
            read_timeout: parse_duration(&self.timeout)?,
        };
        let receive = ReceiveConfig {
            empty_read_limit: self.empty_reads,
            max_frame_len: self.max_frame,
            read_error_policy: if self.tolerate_read_errors {
                ReadErrorPolicy::TreatAsEmpty
            } else {
                ReadErrorPolicy::Fail
            },
        };
        Ok(LinkConfig { line, receive })
    }
}

/// Where the request payload comes from. Exactly one source is required.
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct PayloadArgs {
    /// Payload as hex (e.g. "01 03 00 00", "c0:7d").
    #[arg(long)]
    pub hex: Option<String>,
    /// Payload as a UTF-8 string.
    #[arg(long)]
    pub data: Option<String>,
    /// Read the payload from a file.
    #[arg(long)]
    pub file: Option<PathBuf>,
}

impl PayloadArgs {
    pub fn resolve(&self) -> CliResult<Vec<u8>> {
        if let Some(hex) = &self.hex {
            return parse_hex(hex);
        }
        if let Some(data) = &self.data {
            return Ok(data.as_bytes().to_vec());
        }
        if let Some(path) = &self.file {
            return fs::read(path).map_err(|err| {
                crate::exit::io_error(&format!("failed reading {}", path.display()), err)
            });
        }
        Ok(Vec::new())
    }
}

#[derive(Args, Debug)]
pub struct ExchangeArgs {
    #[command(flatten)]
    pub line: LineArgs,
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct PollArgs {
    #[command(flatten)]
    pub line: LineArgs,
    #[command(flatten)]
    pub payload: PayloadArgs,
    /// Delay between exchanges (e.g. 1s, 250ms).
    #[arg(long, default_value = "1s")]
    pub interval: String,
    /// Stop after N exchanges.
    #[arg(long)]
    pub count: Option<u64>,
    /// Exit on the first failed exchange instead of reporting and continuing.
    #[arg(long)]
    pub stop_on_error: bool,
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub payload: PayloadArgs,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame as hex, including the c0 ... c1 delimiters.
    pub frame: String,
    /// Input is a frame body with the delimiters already stripped.
    #[arg(long)]
    pub body: bool,
}

#[derive(Args, Debug, Default)]
pub struct PortsArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Parse hex bytes, ignoring whitespace, `:` separators and `0x` prefixes.
pub fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let cleaned: String = input
        .split(|c: char| c.is_whitespace() || c == ':' || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.strip_prefix("0x")
                .or_else(|| part.strip_prefix("0X"))
                .unwrap_or(part)
        })
        .collect();

    hex::decode(&cleaned).map_err(|err| CliError::new(USAGE, format!("invalid hex {input:?}: {err}")))
}

/// Parse `250ms`, `2s` or a bare millisecond count such as `10`.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, suffix) = input.split_at(split);

    let value: u64 = digits
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration {input:?}")))?;
    let duration = match suffix.trim() {
        "" | "ms" => Duration::from_millis(value),
        "s" => Duration::from_secs(value),
        other => {
            return Err(CliError::new(
                USAGE,
                format!("invalid duration {input:?}: unknown unit {other:?}"),
            ))
        }
    };

    if duration.is_zero() {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }
    Ok(duration)
}
