use std::io;

use beatvault_audio::AudioError;
use beatvault_kv::KVError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SongError {
    #[error("songs: invalid argument: {0}")]
    InvalidArgument(String),

    #[error("songs: unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("songs: corrupt data: {0}")]
    CorruptData(String),

    #[error("songs: not found: {0}")]
    NotFound(String),

    #[error("songs: io error: {0}")]
    Io(String),

    #[error("songs: codec error: {0}")]
    Codec(String),

    #[error("songs: serialization error: {0}")]
    Serialization(String),
}

pub type SongResult<T> = Result<T, SongError>;

impl From<AudioError> for SongError {
    fn from(e: AudioError) -> Self {
        match e {
            AudioError::InvalidArgument(msg) => SongError::InvalidArgument(msg),
            AudioError::UnsupportedFormat(msg) => SongError::UnsupportedFormat(msg),
            AudioError::CorruptData(msg) => SongError::CorruptData(msg),
            AudioError::Codec(msg) => SongError::Codec(msg),
            AudioError::Io(e) => SongError::Io(e.to_string()),
        }
    }
}

impl From<KVError> for SongError {
    fn from(e: KVError) -> Self {
        SongError::Io(e.to_string())
    }
}

impl From<io::Error> for SongError {
    fn from(e: io::Error) -> Self {
        SongError::Io(e.to_string())
    }
}
