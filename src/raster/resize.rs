use super::{PixelBuffer, Rgb, TransformErrorKind};

/// Bilinear resize to an explicit target size.
///
/// Resizing to the source's own dimensions is rejected rather than silently
/// short-circuited, so that callers notice redundant pipeline stages.
pub fn resize_bilinear(
    src: &PixelBuffer,
    new_width: u32,
    new_height: u32,
) -> Result<PixelBuffer, TransformErrorKind> {
    if new_width == 0 || new_height == 0 {
        return Err(TransformErrorKind::ZeroDimension {
            width: new_width,
            height: new_height,
        });
    }

    if new_width == src.width() && new_height == src.height() {
        return Err(TransformErrorKind::DegenerateResize {
            width: new_width,
            height: new_height,
        });
    }

    let mut dst = PixelBuffer::new(new_width, new_height)?;

    let x_scale = src.width() as f64 / new_width as f64;
    let y_scale = src.height() as f64 / new_height as f64;

    for dst_y in 0..new_height {
        //map the centre of the target pixel back into source coordinates
        let src_y = ((dst_y as f64 + 0.5) * y_scale - 0.5).max(0.0);
        let y0 = src_y.floor() as u32;
        let y1 = (y0 + 1).min(src.height() - 1);
        let y_frac = src_y - y0 as f64;

        for dst_x in 0..new_width {
            let src_x = ((dst_x as f64 + 0.5) * x_scale - 0.5).max(0.0);
            let x0 = src_x.floor() as u32;
            let x1 = (x0 + 1).min(src.width() - 1);
            let x_frac = src_x - x0 as f64;

            let p00 = src.pixel(x0, y0);
            let p10 = src.pixel(x1, y0);
            let p01 = src.pixel(x0, y1);
            let p11 = src.pixel(x1, y1);

            let lerp2 = |c00: u8, c10: u8, c01: u8, c11: u8| -> u8 {
                let top = c00 as f64 + (c10 as f64 - c00 as f64) * x_frac;
                let bot = c01 as f64 + (c11 as f64 - c01 as f64) * x_frac;
                (top + (bot - top) * y_frac).round().clamp(0.0, 255.0) as u8
            };

            dst.set_pixel(
                dst_x,
                dst_y,
                Rgb {
                    r: lerp2(p00.r, p10.r, p01.r, p11.r),
                    g: lerp2(p00.g, p10.g, p01.g, p11.g),
                    b: lerp2(p00.b, p10.b, p01.b, p11.b),
                },
            );
        }
    }

    Ok(dst)
}
