use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::{debug, trace, warn};

use crate::codec::{CHECKSUM_LEN, END, START};
use crate::error::{FrameError, Result};

/// Consecutive empty reads tolerated before a receive gives up.
pub const DEFAULT_EMPTY_READ_LIMIT: u32 = 3;

/// Default bound on the captured (still escaped) frame body.
pub const DEFAULT_MAX_FRAME_LEN: usize = 4 * 1024;

const READ_CHUNK_SIZE: usize = 512;

/// What to do when the stream reports a read error other than a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadErrorPolicy {
    /// Abort the receive with [`FrameError::Read`].
    #[default]
    Fail,
    /// Log the error and count the attempt as an empty read.
    TreatAsEmpty,
}

/// Configuration for the frame receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveConfig {
    /// Consecutive empty reads before [`FrameError::ReceiveTimeout`]. Default: 3.
    pub empty_read_limit: u32,
    /// Maximum escaped body length in bytes. Default: 4 KiB.
    pub max_frame_len: usize,
    /// Handling of non-timeout read errors. Default: fail.
    pub read_error_policy: ReadErrorPolicy,
}

impl Default for ReceiveConfig {
    fn default() -> Self {
        Self {
            empty_read_limit: DEFAULT_EMPTY_READ_LIMIT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            read_error_policy: ReadErrorPolicy::default(),
        }
    }
}

impl ReceiveConfig {
    /// Raise limits that could never let a frame through: at least one
    /// read per receive, and room for the two checksum bytes.
    fn clamped(self) -> Self {
        let clamped = Self {
            empty_read_limit: self.empty_read_limit.max(1),
            max_frame_len: self.max_frame_len.max(CHECKSUM_LEN),
            ..self
        };
        if clamped != self {
            warn!(
                empty_read_limit = clamped.empty_read_limit,
                max_frame_len = clamped.max_frame_len,
                "receive limits raised to their minimum"
            );
        }
        clamped
    }
}

/// Receiver state between bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveState {
    /// Dropping bytes until a start delimiter shows up.
    WaitingForStart,
    /// Inside a frame, collecting body bytes until the end delimiter.
    Capturing,
}

/// Extracts exactly one delimited frame body from a byte stream.
///
/// Bytes before the first start delimiter are dropped, which lets the
/// receiver resynchronize after line noise or a half-received frame. The
/// returned body excludes both delimiters and is still escaped.
#[derive(Debug)]
pub struct FrameReceiver {
    buf: BytesMut,
    state: ReceiveState,
    config: ReceiveConfig,
}

impl FrameReceiver {
    /// Create a receiver with default configuration.
    pub fn new() -> Self {
        Self::with_config(ReceiveConfig::default())
    }

    /// Create a receiver with explicit configuration.
    ///
    /// A zero `empty_read_limit` is raised to 1 and a `max_frame_len` below
    /// [`CHECKSUM_LEN`] is raised to it.
    pub fn with_config(config: ReceiveConfig) -> Self {
        Self {
            buf: BytesMut::with_capacity(READ_CHUNK_SIZE),
            state: ReceiveState::WaitingForStart,
            config: config.clamped(),
        }
    }

    /// Current receiver configuration.
    pub fn config(&self) -> &ReceiveConfig {
        &self.config
    }

    /// Current state of the receive state machine.
    pub fn state(&self) -> ReceiveState {
        self.state
    }

    /// Read from `src` until one complete frame body has been captured.
    ///
    /// Each loop iteration is one blocking read bounded by the stream's own
    /// timeout. A read that yields nothing (`Ok(0)`, `TimedOut` or
    /// `WouldBlock`) counts towards the empty-read limit; any data resets
    /// the count. Bytes following the end delimiter in the same chunk are
    /// discarded.
    pub fn receive_frame<R: Read + ?Sized>(&mut self, src: &mut R) -> Result<BytesMut> {
        self.state = ReceiveState::WaitingForStart;
        self.buf.clear();

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let mut empty_reads = 0u32;

        loop {
            let read = match src.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => 0,
                Err(err) => match self.config.read_error_policy {
                    ReadErrorPolicy::Fail => return Err(FrameError::Read(err)),
                    ReadErrorPolicy::TreatAsEmpty => {
                        warn!(error = %err, "read error treated as empty read");
                        0
                    }
                },
            };

            if read == 0 {
                empty_reads += 1;
                trace!(empty_reads, state = ?self.state, "empty read");
                if empty_reads >= self.config.empty_read_limit {
                    debug!(attempts = empty_reads, captured = self.buf.len(), "receive timed out");
                    self.state = ReceiveState::WaitingForStart;
                    return Err(FrameError::ReceiveTimeout {
                        attempts: empty_reads,
                    });
                }
                continue;
            }

            empty_reads = 0;
            trace!(bytes = read, state = ?self.state, "read chunk");

            for &byte in &chunk[..read] {
                if let Some(body) = self.push(byte)? {
                    return Ok(body);
                }
            }
        }
    }

    /// Feed one byte through the state machine.
    fn push(&mut self, byte: u8) -> Result<Option<BytesMut>> {
        match self.state {
            ReceiveState::WaitingForStart => {
                if byte == START {
                    self.buf.clear();
                    self.state = ReceiveState::Capturing;
                }
            }
            ReceiveState::Capturing => match byte {
                END => {
                    self.state = ReceiveState::WaitingForStart;
                    debug!(len = self.buf.len(), "frame captured");
                    return Ok(Some(self.buf.split()));
                }
                START => {
                    debug!(dropped = self.buf.len(), "start delimiter inside frame, restarting capture");
                    self.buf.clear();
                }
                _ => {
                    if self.buf.len() >= self.config.max_frame_len {
                        let size = self.buf.len() + 1;
                        self.buf.clear();
                        self.state = ReceiveState::WaitingForStart;
                        return Err(FrameError::FrameTooLarge {
                            size,
                            max: self.config.max_frame_len,
                        });
                    }
                    self.buf.extend_from_slice(&[byte]);
                }
            },
        }
        Ok(None)
    }
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new()
    }
}
