use bytes::Bytes;

/// Errors that can occur during frame encoding, decoding and transfer.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A codec step was handed a zero-length buffer.
    #[error("empty input")]
    EmptyInput,

    /// The frame body ends with an escape marker that has no following byte.
    #[error("frame body ends in a dangling escape byte (0x7D)")]
    TruncatedEscape,

    /// The CRC-16/MODBUS self-check over payload and checksum was not zero.
    ///
    /// `payload` is what the frame would have carried; it is kept for
    /// diagnostics only and must not be treated as valid data.
    #[error("checksum mismatch (residue {residue:#06x})")]
    ChecksumMismatch { residue: u16, payload: Bytes },

    /// The captured frame body grew past the configured maximum.
    #[error("frame too large (more than {max} bytes, got {size})")]
    FrameTooLarge { size: usize, max: usize },

    /// A complete frame did not start with `0xC0` and end with `0xC1`.
    #[error("frame is not wrapped in 0xC0 ... 0xC1 delimiters")]
    MissingDelimiter,

    /// No complete frame arrived within the allowed number of empty reads.
    #[error("receive timeout after {attempts} empty reads")]
    ReceiveTimeout { attempts: u32 },

    /// Writing the encoded frame to the stream failed.
    #[error("frame write error: {0}")]
    Write(#[source] std::io::Error),

    /// Reading from the stream failed.
    #[error("frame read error: {0}")]
    Read(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
