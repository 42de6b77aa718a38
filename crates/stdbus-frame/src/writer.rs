use std::io::{ErrorKind, Write};

use tracing::debug;

use crate::error::{FrameError, Result};

/// Write one encoded frame to `dst` and flush it (blocking).
///
/// The frame is handed to the stream as a single buffer; short writes are
/// continued and `Interrupted` is retried, every other failure is
/// reported as [`FrameError::Write`].
pub fn write_frame<W: Write + ?Sized>(dst: &mut W, frame: &[u8]) -> Result<()> {
    let mut offset = 0usize;
    while offset < frame.len() {
        match dst.write(&frame[offset..]) {
            Ok(0) => return Err(FrameError::Write(ErrorKind::WriteZero.into())),
            Ok(n) => offset += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Write(err)),
        }
    }

    loop {
        match dst.flush() {
            Ok(()) => break,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(FrameError::Write(err)),
        }
    }

    debug!(len = frame.len(), "frame written");
    Ok(())
}
