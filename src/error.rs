//! Error representations

/// Error for encoding or decoding an HTTP/1.1 message.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Input/output failure on the underlying stream.
    ///
    /// The connection is in an unknown state and must be abandoned.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The start line (request line or status line) does not parse.
    #[error("malformed message head")]
    MalformedHead,

    /// A header line does not parse, or the stream ended before the blank
    /// line terminating the header block.
    #[error("malformed header fields")]
    MalformedHeaders,

    /// The peer closed the stream before sending any data.
    ///
    /// Not a protocol violation: a server treats this as "no more requests"
    /// rather than bad client data.
    #[error("connection closed before any data")]
    CleanClose,
}

impl CodecError {
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(..))
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedHead | Self::MalformedHeaders)
    }

    pub fn is_clean_close(&self) -> bool {
        matches!(self, Self::CleanClose)
    }
}
