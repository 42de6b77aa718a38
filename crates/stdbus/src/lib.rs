//! Framed, CRC-checked request/response exchange over serial lines.
//!
//! stdbus sends one payload at a time to a device on a half-duplex serial
//! line and waits for its reply. Payloads travel inside `0xC0 ... 0xC1`
//! delimited frames, byte-stuffed with `0x7D` and protected by a
//! CRC-16/MODBUS checksum.
//!
//! # Crate Structure
//!
//! - [`transport`] — Serial line access (open, line settings, port listing)
//! - [`frame`] — Wire codec, checksum and the frame receive state machine
//! - [`link`] — The request/response exchange coordinator

/// Re-export transport types.
pub mod transport {
    pub use stdbus_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use stdbus_frame::*;
}

/// Re-export link types.
pub mod link {
    pub use stdbus_link::*;
}

pub use stdbus_link::{Link, LinkConfig, LinkError};
