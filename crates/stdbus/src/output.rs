use std::io::{IsTerminal, Write};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use stdbus_transport::{PortInfo, PortKind};

use crate::exit::CliError;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A byte buffer to print along with where it came from.
pub struct Report<'a> {
    /// What the bytes are: "reply", "frame" or "payload".
    pub kind: &'static str,
    pub bytes: &'a [u8],
    pub port: Option<&'a str>,
    pub seq: Option<u64>,
    pub elapsed: Option<Duration>,
}

impl<'a> Report<'a> {
    pub fn new(kind: &'static str, bytes: &'a [u8]) -> Self {
        Self {
            kind,
            bytes,
            port: None,
            seq: None,
            elapsed: None,
        }
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    port: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seq: Option<u64>,
    size: usize,
    hex: String,
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<f64>,
    timestamp: String,
}

pub fn print_report(report: &Report<'_>, format: OutputFormat) {
    let hex = hex::encode(report.bytes);
    let elapsed_ms = report.elapsed.map(duration_ms);

    match format {
        OutputFormat::Json => {
            let out = ReportOutput {
                kind: report.kind,
                port: report.port,
                seq: report.seq,
                size: report.bytes.len(),
                hex,
                text: printable_text(report.bytes),
                elapsed_ms,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["KIND", "SIZE", "HEX", "TEXT"])
                .add_row(vec![
                    report.kind.to_string(),
                    report.bytes.len().to_string(),
                    spaced_hex(report.bytes),
                    printable_text(report.bytes).unwrap_or("-").to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            let mut line = format!("{} size={} hex={}", report.kind, report.bytes.len(), hex);
            if let Some(seq) = report.seq {
                line = format!("#{seq} {line}");
            }
            if let Some(ms) = elapsed_ms {
                line.push_str(&format!(" time={ms:.2}ms"));
            }
            if let Some(text) = printable_text(report.bytes) {
                line.push_str(&format!(" text={text:?}"));
            }
            println!("{line}");
        }
        OutputFormat::Raw => {
            print_raw(report.bytes);
        }
    }
}

#[derive(Serialize)]
struct ErrorOutput<'a> {
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    seq: Option<u64>,
    code: i32,
    error: &'a str,
    timestamp: String,
}

/// Report a failed exchange without aborting the command.
pub fn print_error(seq: Option<u64>, err: &CliError, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ErrorOutput {
                kind: "error",
                seq,
                code: err.code,
                error: &err.message,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => match seq {
            Some(seq) => println!("#{seq} error code={} {}", err.code, err.message),
            None => println!("error code={} {}", err.code, err.message),
        },
        OutputFormat::Raw => eprintln!("error: {err}"),
    }
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    vid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

impl<'a> From<&'a PortInfo> for PortOutput<'a> {
    fn from(port: &'a PortInfo) -> Self {
        let (vid, pid, description) = match &port.kind {
            PortKind::Usb {
                vid,
                pid,
                manufacturer,
                product,
                serial_number,
            } => {
                let description = [manufacturer, product, serial_number]
                    .into_iter()
                    .flatten()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(" ");
                (
                    Some(format!("{vid:04x}")),
                    Some(format!("{pid:04x}")),
                    (!description.is_empty()).then_some(description),
                )
            }
            _ => (None, None, None),
        };
        Self {
            name: &port.name,
            kind: port.kind.label(),
            vid,
            pid,
            description,
        }
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    let rows: Vec<PortOutput<'_>> = ports.iter().map(PortOutput::from).collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "TYPE", "VID:PID", "DESCRIPTION"]);
            for row in &rows {
                let ids = match (&row.vid, &row.pid) {
                    (Some(vid), Some(pid)) => format!("{vid}:{pid}"),
                    _ => "-".to_string(),
                };
                table.add_row(vec![
                    row.name.to_string(),
                    row.kind.to_string(),
                    ids,
                    row.description.clone().unwrap_or_else(|| "-".to_string()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for row in &rows {
                println!("{}", row.name);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

/// Hex with a space between bytes, e.g. `c0 01 c1`.
pub fn spaced_hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// The payload as text when it is printable UTF-8.
fn printable_text(data: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(data).ok()?;
    text.chars()
        .all(|c| !c.is_control() || c.is_ascii_whitespace())
        .then_some(text)
}

fn duration_ms(d: Duration) -> f64 {
    (d.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
