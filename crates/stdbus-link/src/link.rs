use std::io::{Read, Write};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use stdbus_frame::{
    append_checksum, decode_frame, encode_frame, verify_checksum, write_frame, Crc16, FrameError,
    FrameReceiver, ReceiveConfig,
};
use stdbus_transport::{LineConfig, SerialLine};
use tracing::{debug, warn};

use crate::config::LinkConfig;
use crate::error::Result;

/// One end of a half-duplex framed serial line.
///
/// A link owns its stream and its checksum table. Every [`exchange`]
/// writes one request frame and then blocks until one reply frame has
/// been received, or the receive gives up. Exchanges take `&mut self`, so
/// a link shared between threads needs external locking.
///
/// [`exchange`]: Link::exchange
pub struct Link<S = SerialLine> {
    stream: S,
    crc: Crc16,
    receiver: FrameReceiver,
    tx: BytesMut,
}

impl Link<SerialLine> {
    /// Open a serial port at `baud_rate`, 8N1, with the given read timeout.
    pub fn open(port: &str, baud_rate: u32, read_timeout: Duration) -> Result<Self> {
        Self::open_with_config(port, LinkConfig::new(baud_rate, read_timeout))
    }

    /// Open a serial port with explicit configuration.
    pub fn open_with_config(port: &str, config: LinkConfig) -> Result<Self> {
        let line = SerialLine::open(port, &config.line)?;
        Ok(Self::from_stream(line, config.receive))
    }

    /// Line settings of the underlying serial port.
    pub fn line_config(&self) -> &LineConfig {
        self.stream.config()
    }
}

impl<S: Read + Write> Link<S> {
    /// Wrap an already open duplex stream.
    ///
    /// The stream must apply its own read timeout; the link only counts
    /// reads that come back empty.
    pub fn from_stream(stream: S, receive: ReceiveConfig) -> Self {
        Self {
            stream,
            crc: Crc16::new(),
            receiver: FrameReceiver::with_config(receive),
            tx: BytesMut::new(),
        }
    }

    /// Send `request` and return the payload of the reply frame.
    ///
    /// Nothing is retried here; every failure ends the exchange and is
    /// returned as is.
    pub fn exchange(&mut self, request: &[u8]) -> Result<Bytes> {
        let checksummed = append_checksum(&self.crc, request)?;
        self.tx.clear();
        encode_frame(&checksummed, &mut self.tx)?;

        debug!(payload = request.len(), frame = self.tx.len(), "sending request");
        write_frame(&mut self.stream, &self.tx)?;

        let body = self.receiver.receive_frame(&mut self.stream)?;
        let checksummed = decode_frame(&body)?;

        match verify_checksum(&self.crc, checksummed) {
            Ok(payload) => {
                debug!(payload = payload.len(), "reply received");
                Ok(payload)
            }
            Err(err) => {
                if let FrameError::ChecksumMismatch { residue, .. } = &err {
                    warn!(
                        residue = %format!("{residue:#06x}"),
                        frame = %hex::encode(&body),
                        "reply failed checksum"
                    );
                }
                Err(err.into())
            }
        }
    }

    /// Receive state machine settings.
    pub fn receive_config(&self) -> &ReceiveConfig {
        self.receiver.config()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consume the link and return the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> std::fmt::Debug for Link<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link")
            .field("receive", self.receiver.config())
            .finish_non_exhaustive()
    }
}
