// SPDX-License-Identifier: MPL-2.0
use crate::media::MediaKind;
use std::fmt;

#[derive(Debug, Clone)]
pub enum Error {
    Io(String),
    Config(String),
    Decoder(DecoderError),
}

/// Failures raised by a demux/decode session.
///
/// Setup failures are fatal to a decoder instance and surface as an
/// init-error message. Everything else is recoverable and only moves the
/// decoding state machine (EOF and read errors idle the loop, seek errors
/// leave playback untouched).
#[derive(Debug, Clone, PartialEq)]
pub enum DecoderError {
    /// The source could not be opened (missing file, bad URL, protocol error).
    OpenInput(String),

    /// Container opened but stream information could not be probed.
    StreamInfo(String),

    /// The container has no stream of the requested kind.
    NoStream(MediaKind),

    /// No decoder is available for the stream's codec.
    CodecNotFound(String),

    /// A decoder exists but refused to open with the given parameters.
    CodecOpen(String),

    /// End of the stream, or the decoder reported it was flushed.
    EndOfStream,

    /// Demuxing the next packet failed.
    Read(String),

    /// The decoder rejected a packet or frame conversion failed.
    Decode(String),

    /// The demuxer could not seek to the requested position.
    Seek(String),
}

impl fmt::Display for DecoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecoderError::OpenInput(msg) => write!(f, "Failed to open input: {}", msg),
            DecoderError::StreamInfo(msg) => write!(f, "Failed to find stream info: {}", msg),
            DecoderError::NoStream(kind) => write!(f, "No {} stream found", kind),
            DecoderError::CodecNotFound(codec) => write!(f, "Decoder not found: {}", codec),
            DecoderError::CodecOpen(msg) => write!(f, "Failed to open codec: {}", msg),
            DecoderError::EndOfStream => write!(f, "End of stream"),
            DecoderError::Read(msg) => write!(f, "Packet read failed: {}", msg),
            DecoderError::Decode(msg) => write!(f, "Decoding failed: {}", msg),
            DecoderError::Seek(msg) => write!(f, "Seek failed: {}", msg),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O Error: {}", e),
            Error::Config(e) => write!(f, "Config Error: {}", e),
            Error::Decoder(e) => write!(f, "Decoder Error: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl std::error::Error for DecoderError {}

impl From<DecoderError> for Error {
    fn from(err: DecoderError) -> Self {
        Error::Decoder(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
