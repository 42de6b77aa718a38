/// Errors that can occur in serial transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the named serial port.
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    /// Failed to enumerate the serial ports on this host.
    #[error("failed to enumerate serial ports: {0}")]
    Enumerate(serialport::Error),
}

impl TransportError {
    /// The underlying serialport error kind.
    pub fn serial_kind(&self) -> serialport::ErrorKind {
        match self {
            TransportError::Open { source, .. } | TransportError::Enumerate(source) => source.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
