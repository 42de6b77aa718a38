use bytes::BytesMut;
use stdbus_frame::{append_checksum, encode_frame, Crc16};

use crate::cmd::EncodeArgs;
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_report, OutputFormat, Report};

pub fn run(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = args.payload.resolve()?;
    let frame = encode(&payload)?;
    print_report(&Report::new("frame", &frame), format);
    Ok(SUCCESS)
}

fn encode(payload: &[u8]) -> CliResult<BytesMut> {
    let checksummed =
        append_checksum(&Crc16::new(), payload).map_err(|err| frame_error("encode failed", err))?;
    let mut frame = BytesMut::new();
    encode_frame(&checksummed, &mut frame).map_err(|err| frame_error("encode failed", err))?;
    Ok(frame)
}
