//! Error types for the `framestore` crate.
//!
//! This module defines [`SequenceError`], the unified error type returned by
//! all fallible operations in the crate. Errors carry enough context (paths,
//! frame numbers, archive ordinals) to diagnose a failure without additional
//! logging at the call site.

use std::{io::Error as IoError, path::PathBuf};

#[cfg(feature = "native-video")]
use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framestore` operations.
///
/// Open-time variants ([`Open`](SequenceError::Open),
/// [`MissingPattern`](SequenceError::MissingPattern),
/// [`NoBackend`](SequenceError::NoBackend)) drive factory fallback. Every
/// other variant describes a failure of a single read, write, or seek and
/// leaves the handle usable.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SequenceError {
    /// A backend declined or failed to open the input.
    #[error("Failed to open sequence at {path}: {reason}")]
    Open {
        /// Path (without any `::` suffix) the backend tried to open.
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// No backend could open the given path.
    #[error("No reader or writer backend could open {path}")]
    NoBackend {
        /// The full path, including any `::` suffix.
        path: String,
    },

    /// An archive writer was asked to open a path without a `::pattern`
    /// suffix.
    #[error("Archive {path} needs an entry name pattern, e.g. {path}::frame_%04d.png")]
    MissingPattern {
        /// The archive path.
        path: PathBuf,
    },

    /// A printf-style name pattern could not be parsed.
    #[error("Invalid name pattern {pattern:?}: {reason}")]
    InvalidPattern {
        /// The pattern text.
        pattern: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The requested frame is not part of the sequence.
    #[error("Frame {frame} is not present in the sequence")]
    FrameNotFound {
        /// The logical frame number that was requested.
        frame: i64,
    },

    /// A sequential stream ran out before the target position was reached.
    #[error("Cannot seek to position {target}: stream ended at position {reached}")]
    Seek {
        /// Target ordinal.
        target: usize,
        /// Ordinal reached when the stream was exhausted.
        reached: usize,
    },

    /// Only 8-bit and 16-bit samples can be stored.
    #[error("Unsupported bit depth: {0} (expected 8 or 16)")]
    UnsupportedBitDepth(u8),

    /// Only 1, 3, and 4 channel frames can be stored.
    #[error("Unsupported channel count: {0} (expected 1, 3, or 4)")]
    UnsupportedChannelCount(u8),

    /// A frame payload could not be decoded.
    #[error("Failed to decode frame: {0}")]
    Decode(String),

    /// A frame could not be encoded.
    #[error("Failed to encode frame: {0}")]
    Encode(String),

    /// An index file line could not be parsed.
    #[error("Malformed index file {path} at line {line}: {reason}")]
    MalformedIndex {
        /// Path of the index file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// An external process could not be spawned or misbehaved.
    #[error("External process error: {0}")]
    Process(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while encoding or decoding a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "native-video")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

#[cfg(feature = "native-video")]
impl From<FfmpegError> for SequenceError {
    fn from(error: FfmpegError) -> Self {
        SequenceError::FfmpegError(error.to_string())
    }
}

impl SequenceError {
    /// Shorthand for an [`Open`](SequenceError::Open) error.
    pub(crate) fn open(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SequenceError::Open {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
