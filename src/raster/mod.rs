mod blur;
mod pixel_buffer;
mod quantize;
mod resize;
mod sobel;

pub use blur::fast_gaussian_blur;
pub use pixel_buffer::{LockedFrame, PixelBuffer, Rgb};
pub use quantize::{grayscale, quantize_binary};
pub use resize::resize_bilinear;
pub use sobel::sobel;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for contract violations in the raster transforms.
///
/// All variants here indicate malformed input rather than environmental
/// failure, so callers are expected to treat them as fatal for the frame
/// being processed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformErrorKind {
    /// Raw byte import where the buffer length does not match
    /// width * height * bytes_per_pixel.
    #[error("raw buffer size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A resize where the target dimensions equal the source dimensions.
    #[error("resize to identical dimensions ({width}x{height})")]
    DegenerateResize { width: u32, height: u32 },

    /// A resize or buffer creation with a zero dimension.
    #[error("zero dimension ({width}x{height})")]
    ZeroDimension { width: u32, height: u32 },

    /// A DCT requested over data that does not form a square matrix.
    #[error("non-square matrix: {len} values cannot form a {dimension}x{dimension} matrix")]
    NonSquareMatrix { len: usize, dimension: usize },
}
