use crate::{
    definitions::*,
    raster::{
        fast_gaussian_blur, grayscale, quantize_binary, resize_bilinear, sobel, LockedFrame,
        PixelBuffer,
    },
    utils::{bit_pack::BitCompressor, dct_ops},
};

use super::{FrameFingerprint, HashCreationErrorKind};

/// Orchestrates the raster transforms into a 64-bit perceptual hash, plus an
/// optional compressed edge thumbnail.
///
/// The hash pipeline: resize to 32x32, grayscale, fast gaussian blur
/// (sigma 3), 2D DCT, then reduce the top-left 8x8 coefficient block to one
/// bit each against the block's median. The median is taken over all 64
/// coefficients including the DC term (the sorted middle element, index 32).
/// Bit `y*8 + x` of the hash corresponds to coefficient (x, y), row-major.
///
/// The edge side-channel runs Sobel on the (unblurred) grayscale image,
/// binary-quantizes it, resizes to 16x16 and bit-packs the result into a
/// 32-byte thumbnail.
///
/// Hashers are stateless; the only shared data is the read-only DCT plan
/// cache, so any number may run in parallel.
#[derive(Copy, Clone, Debug, Default)]
pub struct PerceptualHasher;

impl PerceptualHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a frame and produce the edge thumbnail.
    pub fn hash_frame(&self, frame: &LockedFrame) -> Result<(u64, Vec<u8>), HashCreationErrorKind> {
        let gray = Self::normalized_gray(frame)?;
        let hash = Self::dct_hash(&gray)?;
        let thumbnail = Self::edge_thumbnail(&gray)?;
        Ok((hash, thumbnail))
    }

    /// The cheaper variant: hash only, skipping the edge side-channel
    /// entirely.
    pub fn hash_frame_only(&self, frame: &LockedFrame) -> Result<u64, HashCreationErrorKind> {
        let gray = Self::normalized_gray(frame)?;
        Self::dct_hash(&gray)
    }

    /// Fingerprint one video frame.
    pub fn fingerprint_frame(
        &self,
        frame_number: u32,
        frame: &LockedFrame,
        with_thumbnail: bool,
    ) -> Result<FrameFingerprint, HashCreationErrorKind> {
        if with_thumbnail {
            let (hash, thumbnail) = self.hash_frame(frame)?;
            Ok(FrameFingerprint::new(frame_number, hash, Some(thumbnail)))
        } else {
            let hash = self.hash_frame_only(frame)?;
            Ok(FrameFingerprint::new(frame_number, hash, None))
        }
    }

    //stages 1-2: resize to the hash input size and go channel-packed gray.
    fn normalized_gray(frame: &LockedFrame) -> Result<PixelBuffer, HashCreationErrorKind> {
        let buf = frame.to_buffer();
        let resized = if buf.width() == RESIZE_IMAGE_X && buf.height() == RESIZE_IMAGE_Y {
            buf
        } else {
            resize_bilinear(&buf, RESIZE_IMAGE_X, RESIZE_IMAGE_Y)?
        };

        Ok(grayscale(&resized))
    }

    //stages 3-6: blur, DCT, reduce the top-left 8x8 block to sign bits
    //against its median.
    fn dct_hash(gray: &PixelBuffer) -> Result<u64, HashCreationErrorKind> {
        let blurred = fast_gaussian_blur(gray, BLUR_SIGMA, BLUR_PASSES);

        let rowstride = blurred.width() as usize;
        let dct = dct_ops::dct_of_gray_buffer(&blurred)?;

        let mut coeffs = [0f64; HASH_IMAGE_X * HASH_IMAGE_Y];
        for y in 0..HASH_IMAGE_Y {
            for x in 0..HASH_IMAGE_X {
                coeffs[y * HASH_IMAGE_X + x] = dct[y * rowstride + x];
            }
        }

        let mut sorted = coeffs;
        sorted.sort_by(f64::total_cmp);
        let median = sorted[coeffs.len() / 2];

        let mut hash = 0u64;
        for (i, coeff) in coeffs.iter().enumerate() {
            if *coeff >= median {
                hash |= 1u64 << i;
            }
        }

        Ok(hash)
    }

    //stage 7, the edge side-channel: sobel, binary quantize, downsize,
    //bit-pack.
    fn edge_thumbnail(gray: &PixelBuffer) -> Result<Vec<u8>, HashCreationErrorKind> {
        let edges = sobel(gray);
        let binary = quantize_binary(&edges);
        let thumb = resize_bilinear(&binary, THUMB_IMAGE_X, THUMB_IMAGE_Y)?;

        let bits = thumb.channel_values(0).collect::<Vec<_>>();
        Ok(BitCompressor::compress(&bits))
    }
}

#[cfg(test)]
mod test {
    use rand::prelude::*;

    use super::*;
    use crate::raster::{resize_bilinear, Rgb};

    //a smooth diagonal gradient; hashes of smooth images are stable under
    //small perturbations
    fn gradient_frame(width: u32, height: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                let v = ((x + y) * 255 / (width + height - 2)) as u8;
                buf.set_pixel(x, y, Rgb { r: v, g: v, b: v });
            }
        }
        buf
    }

    fn checkerboard_frame(width: u32, height: u32, cell: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                let v = if ((x / cell) + (y / cell)) % 2 == 0 { 0 } else { 255 };
                buf.set_pixel(x, y, Rgb { r: v, g: v, b: v });
            }
        }
        buf
    }

    #[test]
    fn test_hash_is_deterministic() {
        let frame = gradient_frame(64, 48).lock();
        let hasher = PerceptualHasher::new();

        let (hash_1, thumb_1) = hasher.hash_frame(&frame).unwrap();
        let (hash_2, thumb_2) = hasher.hash_frame(&frame).unwrap();
        assert_eq!(hash_1, hash_2);
        assert_eq!(thumb_1, thumb_2);
    }

    #[test]
    fn test_hash_only_variant_agrees_with_full_pipeline() {
        let frame = checkerboard_frame(64, 64, 8).lock();
        let hasher = PerceptualHasher::new();

        let (full_hash, _thumb) = hasher.hash_frame(&frame).unwrap();
        assert_eq!(hasher.hash_frame_only(&frame).unwrap(), full_hash);
    }

    #[test]
    fn test_thumbnail_is_32_bytes() {
        let frame = gradient_frame(100, 80).lock();
        let (_hash, thumb) = PerceptualHasher::new().hash_frame(&frame).unwrap();
        assert_eq!(thumb.len(), (THUMB_IMAGE_X * THUMB_IMAGE_Y / 8) as usize);
    }

    //a smooth random texture: a seeded coarse grid upscaled bilinearly.
    //Unlike a plain gradient (whose low-frequency DCT coefficients are
    //mostly exact zeroes, leaving the sign-vs-median test balanced on a
    //knife edge), this spreads the coefficients well clear of their median
    fn textured_frame(width: u32, height: u32, rng: &mut StdRng) -> PixelBuffer {
        let mut coarse = PixelBuffer::new(8, 6).unwrap();
        for y in 0..6 {
            for x in 0..8 {
                let v = rng.gen::<u8>();
                coarse.set_pixel(x, y, Rgb { r: v, g: v, b: v });
            }
        }
        resize_bilinear(&coarse, width, height).unwrap()
    }

    #[test]
    fn test_near_duplicate_hashes_are_close() {
        let mut rng = StdRng::seed_from_u64(21);

        let original = textured_frame(64, 48, &mut rng);

        //a lightly re-encoded render of the same scene: a handful of
        //pixels off by one
        let mut noisy = original.clone();
        for _ in 0..60 {
            let x = rng.gen_range(0..64);
            let y = rng.gen_range(0..48);
            let px = noisy.pixel(x, y);
            let v = px.r.saturating_add(1);
            noisy.set_pixel(x, y, Rgb { r: v, g: v, b: v });
        }

        let hasher = PerceptualHasher::new();
        let hash_a = hasher.hash_frame_only(&original.lock()).unwrap();
        let hash_b = hasher.hash_frame_only(&noisy.lock()).unwrap();

        let distance = (hash_a ^ hash_b).count_ones();
        assert!(distance <= 2, "near-duplicate distance was {distance}");
    }

    #[test]
    fn test_rescaled_frame_hashes_identically() {
        //the same scene rendered at double resolution: each pixel becomes
        //a 2x2 block, which the centre-mapped bilinear downsize inverts
        //exactly, so the hashes must be equal bit for bit
        let mut rng = StdRng::seed_from_u64(22);
        let small = textured_frame(32, 32, &mut rng);

        let mut doubled = PixelBuffer::new(64, 64).unwrap();
        for y in 0..64 {
            for x in 0..64 {
                doubled.set_pixel(x, y, small.pixel(x / 2, y / 2));
            }
        }

        let hasher = PerceptualHasher::new();
        let hash_small = hasher.hash_frame_only(&small.lock()).unwrap();
        let hash_doubled = hasher.hash_frame_only(&doubled.lock()).unwrap();
        assert_eq!(hash_small, hash_doubled);
    }

    #[test]
    fn test_unrelated_images_hash_far_apart() {
        let hasher = PerceptualHasher::new();
        let hash_a = hasher.hash_frame_only(&gradient_frame(64, 48).lock()).unwrap();
        let hash_b = hasher
            .hash_frame_only(&checkerboard_frame(64, 48, 8).lock())
            .unwrap();

        let distance = (hash_a ^ hash_b).count_ones();
        assert!(distance >= 7, "unrelated distance was only {distance}");
    }

    #[test]
    fn test_accepts_frames_already_at_hash_input_size() {
        let frame = gradient_frame(RESIZE_IMAGE_X, RESIZE_IMAGE_Y).lock();
        assert!(PerceptualHasher::new().hash_frame(&frame).is_ok());
    }
}
