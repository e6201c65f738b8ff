use super::{PixelBuffer, Rgb};

/// Convert to channel-packed grayscale.
///
/// `luma = floor(R * 0.299) + floor(G * 0.587) + floor(B * 0.114)`, written
/// into all three channels so that downstream stages need no special
/// single-channel buffer handling (they read the red channel).
pub fn grayscale(src: &PixelBuffer) -> PixelBuffer {
    let mut dst = src.clone();
    for y in 0..src.height() {
        for x in 0..src.width() {
            let px = src.pixel(x, y);
            let luma = (px.r as f64 * 0.299).floor()
                + (px.g as f64 * 0.587).floor()
                + (px.b as f64 * 0.114).floor();
            let luma = luma.min(255.0) as u8;
            dst.set_pixel(x, y, Rgb { r: luma, g: luma, b: luma });
        }
    }
    dst
}

/// Binary threshold against the per-channel median over the whole image:
/// u8::MAX where the channel is at or above its median, 0 below.
pub fn quantize_binary(src: &PixelBuffer) -> PixelBuffer {
    let medians: [u8; 3] = [
        channel_median(src, 0),
        channel_median(src, 1),
        channel_median(src, 2),
    ];

    let mut dst = src.clone();
    for y in 0..src.height() {
        for x in 0..src.width() {
            let px = src.pixel(x, y);
            let quantize = |v: u8, median: u8| if v >= median { u8::MAX } else { 0 };
            dst.set_pixel(
                x,
                y,
                Rgb {
                    r: quantize(px.r, medians[0]),
                    g: quantize(px.g, medians[1]),
                    b: quantize(px.b, medians[2]),
                },
            );
        }
    }
    dst
}

fn channel_median(src: &PixelBuffer, channel: usize) -> u8 {
    let mut values = src.channel_values(channel).collect::<Vec<_>>();
    values.sort_unstable();
    values[values.len() / 2]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_grayscale_matches_floored_weights() {
        let mut buf = PixelBuffer::new(1, 1).unwrap();
        buf.set_pixel(0, 0, Rgb { r: 100, g: 150, b: 200 });

        let gray = grayscale(&buf);
        //floor(100*0.299) + floor(150*0.587) + floor(200*0.114) = 29 + 88 + 22
        let expected = 139;
        assert_eq!(gray.pixel(0, 0), Rgb { r: expected, g: expected, b: expected });
    }

    #[test]
    fn test_quantize_splits_at_median() {
        //half dark, half bright image quantizes to pure black/white
        let mut buf = PixelBuffer::new(4, 2).unwrap();
        for y in 0..2 {
            for x in 0..4 {
                let v = if x < 2 { 10 } else { 240 };
                buf.set_pixel(x, y, Rgb { r: v, g: v, b: v });
            }
        }

        let binary = quantize_binary(&buf);
        for y in 0..2 {
            assert_eq!(binary.pixel(0, y).r, 0);
            assert_eq!(binary.pixel(1, y).r, 0);
            assert_eq!(binary.pixel(2, y).r, u8::MAX);
            assert_eq!(binary.pixel(3, y).r, u8::MAX);
        }
    }

    #[test]
    fn test_quantize_constant_image_is_all_white() {
        //every value equals the median, and the threshold is inclusive
        let mut buf = PixelBuffer::new(3, 3).unwrap();
        for y in 0..3 {
            for x in 0..3 {
                buf.set_pixel(x, y, Rgb { r: 77, g: 77, b: 77 });
            }
        }

        let binary = quantize_binary(&buf);
        assert!((0..3).all(|y| (0..3).all(|x| binary.pixel(x, y).r == u8::MAX)));
    }
}
