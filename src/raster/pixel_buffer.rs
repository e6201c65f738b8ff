use std::sync::Arc;

use image::{GrayImage, RgbImage};

use super::TransformErrorKind;

const BYTES_PER_PIXEL: usize = 3;

/// One RGB sample.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// An owned, mutable RGB24 raster. The foundation of all the transforms in
/// this crate.
///
/// A `PixelBuffer` has exactly one writer for its whole lifetime (enforced by
/// `&mut`). When a frame is handed off for concurrent reading it is consumed
/// into a [`LockedFrame`], after which no mutation is possible.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    samples: Vec<u8>,
}

impl PixelBuffer {
    /// Create a zeroed (black) buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, TransformErrorKind> {
        if width == 0 || height == 0 {
            return Err(TransformErrorKind::ZeroDimension { width, height });
        }

        Ok(Self {
            width,
            height,
            samples: vec![0u8; width as usize * height as usize * BYTES_PER_PIXEL],
        })
    }

    /// Import a raw RGB24 byte buffer. The byte count must match the
    /// dimensions exactly.
    pub fn from_raw(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, TransformErrorKind> {
        if width == 0 || height == 0 {
            return Err(TransformErrorKind::ZeroDimension { width, height });
        }

        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if bytes.len() != expected {
            return Err(TransformErrorKind::SizeMismatch {
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            width,
            height,
            samples: bytes,
        })
    }

    /// Import a raw BGR24 byte buffer (the pixel format produced by the
    /// external video decoder), swapping into RGB order.
    pub fn from_bgr24(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self, TransformErrorKind> {
        let mut ret = Self::from_raw(width, height, bytes)?;
        for px in ret.samples.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.swap(0, 2);
        }
        Ok(ret)
    }

    pub fn from_rgb_image(img: &RgbImage) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            samples: img.as_raw().clone(),
        }
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_raw(self.width, self.height, self.samples.clone())
            .expect("dimensions always match samples")
    }

    /// Export the red channel as a grayscale image. Only meaningful for
    /// channel-packed grayscale buffers (see [`super::grayscale`]).
    pub fn to_gray_image(&self) -> GrayImage {
        let luma = self
            .samples
            .chunks_exact(BYTES_PER_PIXEL)
            .map(|px| px[0])
            .collect::<Vec<_>>();

        GrayImage::from_raw(self.width, self.height, luma)
            .expect("dimensions always match samples")
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Total size of the sample storage, used by the pipeline memory gate.
    pub fn byte_len(&self) -> usize {
        self.samples.len()
    }

    /// Fetch one pixel. Panics if (x, y) is outside the buffer; coordinates
    /// out of range are a programmer error, not an environmental one.
    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        assert!(
            x < self.width && y < self.height,
            "pixel access out of range: ({x}, {y}) in {}x{} buffer",
            self.width,
            self.height
        );

        let idx = self.sample_idx(x, y);
        Rgb {
            r: self.samples[idx],
            g: self.samples[idx + 1],
            b: self.samples[idx + 2],
        }
    }

    /// Overwrite one pixel. Panics if (x, y) is outside the buffer.
    pub fn set_pixel(&mut self, x: u32, y: u32, px: Rgb) {
        assert!(
            x < self.width && y < self.height,
            "pixel access out of range: ({x}, {y}) in {}x{} buffer",
            self.width,
            self.height
        );

        let idx = self.sample_idx(x, y);
        self.samples[idx] = px.r;
        self.samples[idx + 1] = px.g;
        self.samples[idx + 2] = px.b;
    }

    /// Iterate every sample of one channel (0 = red, 1 = green, 2 = blue) in
    /// row-major order.
    pub fn channel_values(&self, channel: usize) -> impl Iterator<Item = u8> + '_ {
        assert!(channel < BYTES_PER_PIXEL);
        self.samples
            .chunks_exact(BYTES_PER_PIXEL)
            .map(move |px| px[channel])
    }

    pub(crate) fn samples(&self) -> &[u8] {
        &self.samples
    }

    pub(crate) fn samples_mut(&mut self) -> &mut [u8] {
        &mut self.samples
    }

    /// Freeze the buffer into an immutable, cheaply cloneable view suitable
    /// for handing to concurrent readers. The runtime "locked" flag of
    /// classic designs is replaced here by the type system: a `LockedFrame`
    /// has no mutating methods at all.
    pub fn lock(self) -> LockedFrame {
        LockedFrame {
            width: self.width,
            height: self.height,
            samples: Arc::new(self.samples),
        }
    }

    fn sample_idx(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }
}

/// A frozen, read-only view of a [`PixelBuffer`]. Clones share the sample
/// storage.
#[derive(Clone, Debug)]
pub struct LockedFrame {
    width: u32,
    height: u32,
    samples: Arc<Vec<u8>>,
}

impl LockedFrame {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn byte_len(&self) -> usize {
        self.samples.len()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb {
        assert!(
            x < self.width && y < self.height,
            "pixel access out of range: ({x}, {y}) in {}x{} buffer",
            self.width,
            self.height
        );

        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        Rgb {
            r: self.samples[idx],
            g: self.samples[idx + 1],
            b: self.samples[idx + 2],
        }
    }

    /// Reopen a mutable copy of the frame. The original locked view is
    /// unaffected.
    pub fn to_buffer(&self) -> PixelBuffer {
        PixelBuffer {
            width: self.width,
            height: self.height,
            samples: (*self.samples).clone(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_raw_rejects_wrong_size() {
        let err = PixelBuffer::from_raw(4, 4, vec![0u8; 47]).unwrap_err();
        match err {
            TransformErrorKind::SizeMismatch { expected, actual } => {
                assert_eq!(expected, 48);
                assert_eq!(actual, 47);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(PixelBuffer::new(0, 10).is_err());
        assert!(PixelBuffer::from_raw(10, 0, vec![]).is_err());
    }

    #[test]
    fn test_get_set_pixel_roundtrip() {
        let mut buf = PixelBuffer::new(3, 2).unwrap();
        let px = Rgb { r: 1, g: 2, b: 3 };
        buf.set_pixel(2, 1, px);
        assert_eq!(buf.pixel(2, 1), px);
        assert_eq!(buf.pixel(0, 0), Rgb::default());
    }

    #[test]
    #[should_panic]
    fn test_out_of_range_access_panics() {
        let buf = PixelBuffer::new(3, 2).unwrap();
        let _ = buf.pixel(3, 0);
    }

    #[test]
    fn test_bgr_import_swaps_channels() {
        let buf = PixelBuffer::from_bgr24(1, 1, vec![10, 20, 30]).unwrap();
        assert_eq!(buf.pixel(0, 0), Rgb { r: 30, g: 20, b: 10 });
    }

    #[test]
    fn test_locked_frame_shares_and_preserves_contents() {
        let mut buf = PixelBuffer::new(2, 2).unwrap();
        buf.set_pixel(1, 1, Rgb { r: 9, g: 8, b: 7 });
        let locked = buf.lock();
        let clone = locked.clone();
        assert_eq!(clone.pixel(1, 1), Rgb { r: 9, g: 8, b: 7 });
        assert_eq!(locked.to_buffer().pixel(1, 1), Rgb { r: 9, g: 8, b: 7 });
    }

    #[test]
    fn test_image_conversion_roundtrip() {
        let mut buf = PixelBuffer::new(4, 3).unwrap();
        buf.set_pixel(3, 2, Rgb { r: 200, g: 100, b: 50 });
        let img = buf.to_rgb_image();
        assert_eq!(PixelBuffer::from_rgb_image(&img), buf);
    }
}
