pub mod distance;
mod fingerprint;
mod hash_creation_error_kind;
mod perceptual_hasher;
pub mod photo;

pub use fingerprint::{FrameFingerprint, PhotoFingerprint, VideoFingerprint};
pub use hash_creation_error_kind::HashCreationErrorKind;
pub use perceptual_hasher::PerceptualHasher;
