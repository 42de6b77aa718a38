use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use stdbus_link::Link;
use tracing::{debug, info};

use crate::cmd::{parse_duration, PollArgs};
use crate::exit::{link_error, CliError, CliResult, SUCCESS};
use crate::output::{print_error, print_report, OutputFormat, Report};

/// Outcome of a polling session.
#[derive(Debug, Default, PartialEq, Eq)]
struct PollSummary {
    sent: u64,
    failed: u64,
}

pub fn run(args: PollArgs, format: OutputFormat) -> CliResult<i32> {
    let config = args.line.link_config()?;
    let interval = parse_duration(&args.interval)?;
    let request = args.payload.resolve()?;

    let mut link = Link::open_with_config(&args.line.port, config)
        .map_err(|err| link_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let port = args.line.port.as_str();
    let summary = poll_loop(
        &mut link,
        &request,
        PollPlan {
            interval,
            count: args.count,
            stop_on_error: args.stop_on_error,
        },
        &running,
        |seq, outcome| match outcome {
            Ok((reply, elapsed)) => {
                let report = Report {
                    port: Some(port),
                    seq: Some(seq),
                    elapsed: Some(elapsed),
                    ..Report::new("reply", reply)
                };
                print_report(&report, format);
            }
            Err(err) => print_error(Some(seq), err, format),
        },
    )?;

    info!(port, sent = summary.sent, failed = summary.failed, "polling stopped");
    Ok(SUCCESS)
}

struct PollPlan {
    interval: Duration,
    count: Option<u64>,
    stop_on_error: bool,
}

type Outcome<'a> = Result<(&'a [u8], Duration), &'a CliError>;

/// Exchange `request` until the count is reached, `running` is cleared, or
/// an exchange fails with `stop_on_error` set.
fn poll_loop<S, F>(
    link: &mut Link<S>,
    request: &[u8],
    plan: PollPlan,
    running: &AtomicBool,
    mut report: F,
) -> CliResult<PollSummary>
where
    S: Read + Write,
    F: FnMut(u64, Outcome<'_>),
{
    let mut summary = PollSummary::default();

    while running.load(Ordering::SeqCst) {
        if plan.count.is_some_and(|count| summary.sent >= count) {
            break;
        }

        let started = Instant::now();
        let seq = summary.sent;
        summary.sent += 1;

        match link.exchange(request) {
            Ok(reply) => report(seq, Ok((reply.as_ref(), started.elapsed()))),
            Err(err) => {
                summary.failed += 1;
                let err = link_error("exchange failed", err);
                report(seq, Err(&err));
                if plan.stop_on_error {
                    return Err(err);
                }
            }
        }

        if plan.count.is_some_and(|count| summary.sent >= count) {
            break;
        }

        let spent = started.elapsed();
        if let Some(pause) = plan.interval.checked_sub(spent) {
            debug!(?pause, "waiting for next poll");
            std::thread::sleep(pause);
        }
    }

    Ok(summary)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{self, ErrorKind};

    use bytes::BytesMut;
    use stdbus_frame::{append_checksum, encode_frame, Crc16, ReceiveConfig};

    use super::*;
    use crate::exit::TIMEOUT;

    /// Replies with one scripted chunk per read; silence once exhausted.
    struct ScriptedDevice {
        chunks: VecDeque<Vec<u8>>,
    }

    impl Read for ScriptedDevice {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) if !chunk.is_empty() => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                _ => Err(ErrorKind::TimedOut.into()),
            }
        }
    }

    impl Write for ScriptedDevice {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn frame_for(payload: &[u8]) -> Vec<u8> {
        let checksummed = append_checksum(&Crc16::new(), payload).unwrap();
        let mut frame = BytesMut::new();
        encode_frame(&checksummed, &mut frame).unwrap();
        frame.to_vec()
    }

    fn device(chunks: Vec<Vec<u8>>) -> Link<ScriptedDevice> {
        Link::from_stream(
            ScriptedDevice {
                chunks: chunks.into(),
            },
            ReceiveConfig::default(),
        )
    }

    fn plan(count: Option<u64>, stop_on_error: bool) -> PollPlan {
        PollPlan {
            interval: Duration::from_millis(1),
            count,
            stop_on_error,
        }
    }

    #[test]
    fn polls_until_count() {
        let mut link = device(vec![frame_for(b"a"), frame_for(b"b"), frame_for(b"c")]);
        let running = AtomicBool::new(true);
        let mut replies = Vec::new();

        let summary = poll_loop(&mut link, b"req", plan(Some(3), false), &running, |seq, out| {
            replies.push((seq, out.map(|(reply, _)| reply.to_vec()).ok()));
        })
        .unwrap();

        assert_eq!(summary, PollSummary { sent: 3, failed: 0 });
        assert_eq!(
            replies,
            vec![
                (0, Some(b"a".to_vec())),
                (1, Some(b"b".to_vec())),
                (2, Some(b"c".to_vec())),
            ]
        );
    }

    #[test]
    fn failures_are_reported_and_polling_continues() {
        // Three silent reads time out the second exchange.
        let mut link = device(vec![
            frame_for(b"a"),
            Vec::new(),
            Vec::new(),
            Vec::new(),
            frame_for(b"c"),
        ]);
        let running = AtomicBool::new(true);
        let mut codes = Vec::new();

        let summary = poll_loop(&mut link, b"req", plan(Some(3), false), &running, |_, out| {
            codes.push(out.err().map(|err| err.code));
        })
        .unwrap();

        assert_eq!(summary, PollSummary { sent: 3, failed: 1 });
        assert_eq!(codes, vec![None, Some(TIMEOUT), None]);
    }

    #[test]
    fn stop_on_error_returns_first_failure() {
        let mut link = device(Vec::new());
        let running = AtomicBool::new(true);
        let mut calls = 0;

        let err = poll_loop(&mut link, b"req", plan(None, true), &running, |_, _| calls += 1)
            .unwrap_err();

        assert_eq!(err.code, TIMEOUT);
        assert_eq!(calls, 1);
    }

    #[test]
    fn cleared_flag_stops_before_sending() {
        let mut link = device(vec![frame_for(b"a")]);
        let running = AtomicBool::new(false);

        let summary = poll_loop(&mut link, b"req", plan(None, false), &running, |_, _| {
            panic!("nothing should be exchanged")
        })
        .unwrap();

        assert_eq!(summary, PollSummary::default());
    }
}
