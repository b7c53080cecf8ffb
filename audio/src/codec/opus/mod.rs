//! Opus frame encoding through libopus.
//!
//! Linked only with the `opus` feature. Set `OPUS_LIB_DIR` when libopus is
//! not on the default library path.

mod encoder;
mod ffi;

pub use encoder::*;
