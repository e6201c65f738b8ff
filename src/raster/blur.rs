use super::PixelBuffer;

/// One box-blur pass with the given radius: a horizontal sliding-window
/// running sum followed by a vertical one, normalized by 1/(2r+1). Pixels
/// beyond the border contribute the replicated border pixel's weight.
pub fn box_blur(src: &PixelBuffer, radius: u32) -> PixelBuffer {
    if radius == 0 {
        return src.clone();
    }

    let horz = box_blur_axis(src, radius, Axis::Horizontal);
    box_blur_axis(&horz, radius, Axis::Vertical)
}

/// Approximate a gaussian blur of standard deviation `sigma` by `passes`
/// successive box blurs.
///
/// Box widths come from the closed-form ideal-averaging-filter-width formula
/// `w_ideal = sqrt(12 sigma^2 / n + 1)`, floored to the nearest odd integer
/// for the lower width (upper width = lower + 2), with the count of
/// lower-width passes chosen by rounding the ideal count. This trades exact
/// gaussian weights for O(1)-per-pixel cost per pass.
pub fn fast_gaussian_blur(src: &PixelBuffer, sigma: f64, passes: u32) -> PixelBuffer {
    let mut ret = src.clone();
    for radius in box_radii_for_gaussian(sigma, passes) {
        ret = box_blur(&ret, radius);
    }
    ret
}

/// The box-blur radii whose successive application approximates a gaussian
/// of the given sigma.
fn box_radii_for_gaussian(sigma: f64, passes: u32) -> Vec<u32> {
    let n = passes as f64;

    let w_ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut wl = w_ideal.floor() as i64;
    if wl % 2 == 0 {
        wl -= 1;
    }
    let wl = wl.max(1);
    let wu = wl + 2;

    let m_ideal = (12.0 * sigma * sigma - n * (wl * wl) as f64 - 4.0 * n * wl as f64 - 3.0 * n)
        / (-4.0 * wl as f64 - 4.0);
    let m = m_ideal.round() as i64;

    (0..passes as i64)
        .map(|i| {
            let width = if i < m { wl } else { wu };
            ((width - 1) / 2) as u32
        })
        .collect()
}

enum Axis {
    Horizontal,
    Vertical,
}

fn box_blur_axis(src: &PixelBuffer, radius: u32, axis: Axis) -> PixelBuffer {
    let (width, height) = (src.width() as usize, src.height() as usize);
    let (lanes, lane_len) = match axis {
        Axis::Horizontal => (height, width),
        Axis::Vertical => (width, height),
    };

    let mut dst = src.clone();

    let r = radius as usize;
    let norm = 1.0 / (2 * r + 1) as f64;

    let sample = |buf: &PixelBuffer, lane: usize, i: usize, ch: usize| -> u32 {
        let (x, y) = match axis {
            Axis::Horizontal => (i, lane),
            Axis::Vertical => (lane, i),
        };
        buf.samples()[(y * width + x) * 3 + ch] as u32
    };

    for lane in 0..lanes {
        for ch in 0..3 {
            //prime the window: the left/top border pixel replicated (r+1)
            //times, plus the first r in-range pixels
            let first = sample(src, lane, 0, ch);
            let last = sample(src, lane, lane_len - 1, ch);

            let mut acc: u32 = first * (r as u32 + 1);
            for i in 0..r.min(lane_len) {
                acc += sample(src, lane, i, ch);
            }
            //when the window is wider than the lane, the remainder is
            //replicated from the far border
            if r > lane_len {
                acc += last * (r - lane_len) as u32;
            }

            for i in 0..lane_len {
                let leading = (i + r).min(lane_len - 1);
                let trailing = i.saturating_sub(r + 1).min(lane_len - 1);

                acc += sample(src, lane, leading, ch);
                //the first iteration's window was primed without a trailing
                //element yet; from then on one falls out per step
                if i > 0 {
                    acc -= sample(src, lane, trailing, ch);
                } else {
                    acc -= first;
                }

                let (x, y) = match axis {
                    Axis::Horizontal => (i, lane),
                    Axis::Vertical => (lane, i),
                };
                dst.samples_mut()[(y * width + x) * 3 + ch] =
                    (acc as f64 * norm).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    dst
}
