use lazy_static::lazy_static;
use parking_lot::Mutex;
use rustdct::DctPlanner;
use transpose::transpose_inplace;

use crate::raster::{PixelBuffer, TransformErrorKind};

lazy_static! {
    //Process-wide DCT planner. Plans (and the FFT twiddle tables behind
    //them) are pure functions of the transform length, so they are computed
    //once and reused by every hashing worker for the lifetime of the process.
    static ref DCT_PLANNER: Mutex<DctPlanner<f64>> = Mutex::new(DctPlanner::new());
}

/// Forward 2D DCT-II of a square matrix, in row-major order.
///
/// Implemented as an FFT-backed 1D DCT over every row, a transpose, a DCT
/// over every column, and a transpose back, then scaled by 4/(N*N). This is
/// numerically equivalent (within floating tolerance) to the naive O(N^4)
/// direct-sum transform but runs in O(N^2 log N).
pub fn dct_2d(mut values: Vec<f64>, dimension: usize) -> Result<Vec<f64>, TransformErrorKind> {
    if dimension == 0 || values.len() != dimension * dimension {
        return Err(TransformErrorKind::NonSquareMatrix {
            len: values.len(),
            dimension,
        });
    }

    let dct = DCT_PLANNER.lock().plan_dct2(dimension);

    //round 1 of the DCT (on rows):
    values.chunks_exact_mut(dimension).for_each(|row| {
        dct.process_dct2(row);
    });

    //now transpose...
    let mut scratch = vec![0f64; dimension];
    transpose_inplace(&mut values, &mut scratch, dimension, dimension);

    //round 2 of the DCT (on cols):
    values.chunks_exact_mut(dimension).for_each(|col| {
        dct.process_dct2(col);
    });

    //now transpose back...
    transpose_inplace(&mut values, &mut scratch, dimension, dimension);

    //and finally, normalize
    for val in values.iter_mut() {
        *val *= 4f64 / (dimension * dimension) as f64;
    }

    Ok(values)
}

/// DCT of a channel-packed grayscale buffer. Samples are centred around zero
/// before the transform so the DC coefficient stays small.
pub fn dct_of_gray_buffer(buf: &PixelBuffer) -> Result<Vec<f64>, TransformErrorKind> {
    let dimension = buf.width() as usize;
    if buf.height() as usize != dimension {
        return Err(TransformErrorKind::NonSquareMatrix {
            len: buf.width() as usize * buf.height() as usize,
            dimension,
        });
    }

    let values = buf
        .channel_values(0)
        .map(|v| v as f64 - 128.0)
        .collect::<Vec<_>>();

    dct_2d(values, dimension)
}
