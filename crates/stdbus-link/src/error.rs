/// Errors that can occur during a link exchange.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The serial line could not be opened.
    #[error("open error: {0}")]
    Open(#[from] stdbus_transport::TransportError),

    /// Encoding, transfer or validation of a frame failed.
    #[error("frame error: {0}")]
    Frame(#[from] stdbus_frame::FrameError),
}

impl LinkError {
    /// True when the peer did not answer in time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            LinkError::Frame(stdbus_frame::FrameError::ReceiveTimeout { .. })
        )
    }
}

pub type Result<T> = std::result::Result<T, LinkError>;
