use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::raster::TransformErrorKind;

/// Error type for the various reasons why a fingerprint could not be created
/// from a frame or photo.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum HashCreationErrorKind {
    /// A raster transform in the hashing pipeline rejected its input.
    #[error("transform failed: {0}")]
    Transform(#[from] TransformErrorKind),

    /// The photo at src_path could not be opened or decoded. The error text
    /// from the image decoder is preserved; batch operations log this and
    /// skip the file.
    #[error("Failed to read photo {src_path}: {error}")]
    PhotoRead { src_path: PathBuf, error: String },

    /// A VideoFingerprint was given two frames with the same frame number.
    /// Frame numbers need not be contiguous, but must be unique within one
    /// video.
    #[error("duplicate frame number {frame_number} in {src_path}")]
    DuplicateFrameNumber { src_path: PathBuf, frame_number: u32 },

    /// No frames at all could be decoded from the video at src_path.
    #[error("no frames decoded from {0}")]
    EmptyVideo(PathBuf),
}
