use bytes::Bytes;
use stdbus_frame::{decode_frame, strip_delimiters, verify_checksum, Crc16, FrameError};
use tracing::warn;

use crate::cmd::{parse_hex, DecodeArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = parse_hex(&args.frame)?;
    let payload = decode(&raw, args.body).map_err(|err| frame_error("decode failed", err))?;
    print_report(&Report::new("payload", &payload), format);
    Ok(SUCCESS)
}

fn decode(raw: &[u8], body_only: bool) -> Result<Bytes, FrameError> {
    let body = if body_only {
        raw
    } else {
        strip_delimiters(raw)?
    };
    let checksummed = decode_frame(body)?;
    verify_checksum(&Crc16::new(), checksummed).inspect_err(|err| {
        if let FrameError::ChecksumMismatch { payload, .. } = err {
            warn!(payload = %hex::encode(payload), "frame failed checksum");
        }
    })
}
