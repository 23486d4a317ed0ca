//! Error taxonomy for the container codec, the playback engine and the
//! stream manager.
//!
//! Every failure is a local return value.  Nothing in the library panics or
//! exits the process on bad input; escalation is the application's call.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// The file is not a usable `.hpv` container.  Fatal to `open()`.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Invalid magic number: {0:#010x}")]
    BadMagic(u32),
    #[error("Truncated header or frame size table")]
    Truncated,
    #[error("Invalid frame width {0} (must be 1..=8192)")]
    InvalidWidth(u32),
    #[error("Invalid frame height {0} (must be 1..=8192)")]
    InvalidHeight(u32),
    #[error("Invalid frame rate 0")]
    InvalidFrameRate,
    #[error("File contains no frames")]
    NoFrames,
    #[error("Unknown compression type {0}")]
    UnknownCompressionType(u32),
    #[error("Frame size table checksum mismatch (stored {stored:#010x}, computed {computed:#010x})")]
    ChecksumMismatch { stored: u32, computed: u32 },
    #[error("Frame {frame} ends at byte {end}, past end of file ({file_len} B)")]
    FrameDataOutOfBounds { frame: usize, end: u64, file_len: u64 },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Decompression error: {0}")]
    Decompression(String),
    #[error("Decompressed {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// A control call was made in a state that does not allow it.
/// No state is mutated and no event is emitted.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateError {
    #[error("No file is open")]
    NotOpen,
    #[error("A file is already open; close it first")]
    AlreadyOpen,
    #[error("Already playing")]
    AlreadyPlaying,
    #[error("Not playing")]
    NotPlaying,
    #[error("Not paused")]
    NotPaused,
    #[error("Neither playing nor paused")]
    NotActive,
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error("Invalid frame rate {0}")]
    InvalidFrameRate(u32),
    #[error("Speed {0} is too close to zero")]
    SpeedTooLow(f64),
    #[error("Position {0} outside [0, 1]")]
    PositionOutOfRange(f64),
    #[error("Frame {frame} outside [0, {count})")]
    FrameOutOfRange { frame: i64, count: u64 },
    #[error("Decode thread failed to read frame {frame}")]
    SeekFailed { frame: i64 },
    #[error("Seek not acknowledged within {0:?}")]
    SeekTimeout(Duration),
    #[error("Failed to spawn decode thread: {0}")]
    ThreadSpawn(io::Error),
}

impl EngineError {
    pub fn is_state(&self) -> bool {
        matches!(self, EngineError::State(_))
    }
}

#[derive(Error, Debug)]
pub enum ManagerError {
    #[error("Stream capacity exceeded (max {max})")]
    CapacityExceeded { max: usize },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
