//! Half-duplex request/response exchange over a framed serial line.
//!
//! This is the "just works" layer. Open a [`Link`] on a serial port, hand
//! it a payload, and get back the validated payload of the reply frame.

pub mod config;
pub mod error;
pub mod link;

pub use config::LinkConfig;
pub use error::{LinkError, Result};
pub use link::Link;
