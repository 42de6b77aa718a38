//! Serial line transport for stdbus.
//!
//! This is the lowest layer of stdbus. It opens a half-duplex serial line
//! with a per-read timeout and exposes it as a plain `Read + Write` stream
//! through the [`SerialLine`] type. Everything else builds on top of it.

pub mod config;
pub mod error;
pub mod serial;

pub use config::{
    DataBits, InvalidSetting, LineConfig, Parity, StopBits, DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT,
};
pub use error::{Result, TransportError};
pub use serial::{available_ports, PortInfo, PortKind, SerialLine};
