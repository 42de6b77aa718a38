//! Delimited, byte-stuffed framing with CRC-16/MODBUS integrity checks.
//!
//! Every frame on the wire looks like:
//! - A start delimiter `0xC0`
//! - The payload followed by its CRC-16/MODBUS checksum (low byte first),
//!   with every reserved byte escaped as `0x7D, b ^ 0x7D`
//! - An end delimiter `0xC1`
//!
//! The codec functions are pure. [`FrameReceiver`] pulls exactly one frame
//! out of a noisy byte stream and [`write_frame`] pushes one onto it.

pub mod checksum;
pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use checksum::Crc16;
pub use codec::{
    append_checksum, decode_frame, encode_frame, is_reserved, strip_delimiters, verify_checksum,
    CHECKSUM_LEN, END, ESC, START,
};
pub use error::{FrameError, Result};
pub use reader::{
    FrameReceiver, ReadErrorPolicy, ReceiveConfig, ReceiveState, DEFAULT_EMPTY_READ_LIMIT,
    DEFAULT_MAX_FRAME_LEN,
};
pub use writer::write_frame;
