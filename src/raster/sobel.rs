use super::{PixelBuffer, Rgb};

/// Sobel edge magnitude over the red channel (the channel carrying luma for
/// channel-packed grayscale buffers).
///
/// Each gradient is computed as two separable 1D convolutions: a [1, 2, 1]
/// smoothing pass perpendicular to the gradient axis and a [1, 0, -1]
/// difference pass along it. Samples beyond the border are taken as zero.
/// The output magnitude `sqrt(gx^2 + gy^2)` is rounded and clamped to a byte,
/// written channel-packed.
pub fn sobel(src: &PixelBuffer) -> PixelBuffer {
    let width = src.width() as i64;
    let height = src.height() as i64;

    let luma = |x: i64, y: i64| -> i64 {
        //zero padding at the borders
        if x < 0 || y < 0 || x >= width || y >= height {
            0
        } else {
            src.pixel(x as u32, y as u32).r as i64
        }
    };

    //horizontal gradient: smooth columns with [1,2,1], then difference rows
    //with [1,0,-1]
    let mut smooth_v = vec![0i64; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            smooth_v[(y * width + x) as usize] = luma(x, y - 1) + 2 * luma(x, y) + luma(x, y + 1);
        }
    }

    //vertical gradient: smooth rows with [1,2,1], then difference columns
    let mut smooth_h = vec![0i64; (width * height) as usize];
    for y in 0..height {
        for x in 0..width {
            smooth_h[(y * width + x) as usize] = luma(x - 1, y) + 2 * luma(x, y) + luma(x + 1, y);
        }
    }

    let at = |buf: &[i64], x: i64, y: i64| -> i64 {
        if x < 0 || y < 0 || x >= width || y >= height {
            0
        } else {
            buf[(y * width + x) as usize]
        }
    };

    let mut dst = src.clone();
    for y in 0..height {
        for x in 0..width {
            let gx = at(&smooth_v, x - 1, y) - at(&smooth_v, x + 1, y);
            let gy = at(&smooth_h, x, y - 1) - at(&smooth_h, x, y + 1);

            let magnitude = ((gx * gx + gy * gy) as f64).sqrt().round().min(255.0) as u8;
            dst.set_pixel(
                x as u32,
                y as u32,
                Rgb {
                    r: magnitude,
                    g: magnitude,
                    b: magnitude,
                },
            );
        }
    }

    dst
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_flat_interior_has_no_response() {
        let mut buf = PixelBuffer::new(9, 9).unwrap();
        for y in 0..9 {
            for x in 0..9 {
                buf.set_pixel(x, y, Rgb { r: 120, g: 120, b: 120 });
            }
        }

        let edges = sobel(&buf);
        //the interior is flat; only the zero-padded borders respond
        for y in 1..8 {
            for x in 1..8 {
                assert_eq!(edges.pixel(x, y).r, 0, "at ({x}, {y})");
            }
        }
        assert!(edges.pixel(0, 4).r > 0);
    }

    #[test]
    fn test_vertical_edge_detected() {
        //left half dark, right half bright
        let mut buf = PixelBuffer::new(8, 8).unwrap();
        for y in 0..8 {
            for x in 4..8 {
                buf.set_pixel(x, y, Rgb { r: 200, g: 200, b: 200 });
            }
        }

        let edges = sobel(&buf);
        //strong response along the boundary columns, none on the flat
        //interior either side
        assert!(edges.pixel(3, 4).r > 0);
        assert!(edges.pixel(4, 4).r > 0);
        assert_eq!(edges.pixel(1, 4).r, 0);
        assert_eq!(edges.pixel(6, 4).r, 0);
    }
}
