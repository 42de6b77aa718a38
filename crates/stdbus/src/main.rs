mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "stdbus", version, about = "Framed serial request/response CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        default_value = "warn",
        env = "STDBUS_LOG",
        global = true
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_exchange_subcommand() {
        let cli = Cli::try_parse_from([
            "stdbus",
            "exchange",
            "/dev/ttyUSB0",
            "--baud",
            "115200",
            "--hex",
            "01 02",
        ])
        .expect("exchange args should parse");

        match cli.command {
            Command::Exchange(args) => {
                assert_eq!(args.line.port, "/dev/ttyUSB0");
                assert_eq!(args.line.baud, 115_200);
                assert_eq!(args.payload.resolve().unwrap(), vec![0x01, 0x02]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_conflicting_payload_args() {
        let err = Cli::try_parse_from([
            "stdbus",
            "exchange",
            "/dev/ttyUSB0",
            "--hex",
            "01",
            "--data",
            "hello",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn requires_a_payload_source() {
        let err = Cli::try_parse_from(["stdbus", "exchange", "/dev/ttyUSB0"])
            .expect_err("missing payload should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn parses_poll_subcommand() {
        let cli = Cli::try_parse_from([
            "stdbus",
            "poll",
            "COM3",
            "--data",
            "status",
            "--interval",
            "250ms",
            "--count",
            "10",
            "--tolerate-read-errors",
        ])
        .expect("poll args should parse");

        match cli.command {
            Command::Poll(args) => {
                assert_eq!(args.count, Some(10));
                assert!(args.line.tolerate_read_errors);
                assert!(!args.stop_on_error);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_decode_with_global_format() {
        let cli = Cli::try_parse_from(["stdbus", "decode", "c0 01 c1", "--body", "--format", "raw"])
            .expect("decode args should parse");
        assert!(matches!(cli.command, Command::Decode(ref args) if args.body));
        assert!(matches!(cli.format, Some(OutputFormat::Raw)));
    }
}
