use std::io;

use thiserror::Error;

/// Errors produced while decoding, analyzing or encoding audio.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("audio: invalid argument: {0}")]
    InvalidArgument(String),

    #[error("audio: unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("audio: corrupt data: {0}")]
    CorruptData(String),

    #[error("audio: codec error: {0}")]
    Codec(String),

    #[error("audio: io error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

impl From<hound::Error> for AudioError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                AudioError::CorruptData(format!("unexpected end of file: {e}"))
            }
            hound::Error::IoError(e) => AudioError::Io(e),
            hound::Error::FormatError(msg) => AudioError::CorruptData(msg.to_string()),
            hound::Error::TooWide => {
                AudioError::CorruptData("sample has more bits than declared".to_string())
            }
            hound::Error::UnfinishedSample => {
                AudioError::CorruptData("data ends in the middle of a sample".to_string())
            }
            hound::Error::Unsupported => {
                AudioError::UnsupportedFormat("wave encoding not supported".to_string())
            }
            hound::Error::InvalidSampleFormat => {
                AudioError::UnsupportedFormat("invalid sample format".to_string())
            }
            #[allow(unreachable_patterns)]
            other => AudioError::CorruptData(other.to_string()),
        }
    }
}
