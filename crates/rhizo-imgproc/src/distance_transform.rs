use rhizo_image::{Image, ImageError, Mask};

use crate::parallel;

// large enough to dominate any squared distance inside an image
const INF: f64 = 1e20;

/// One dimensional squared distance transform of a sampled function.
///
/// Felzenszwalb & Huttenlocher lower envelope of parabolas.
fn edt_1d(f: &[f64], d: &mut [f64], v: &mut [usize], z: &mut [f64]) {
    let n = f.len();
    if n == 0 {
        return;
    }

    let mut k = 0usize;
    v[0] = 0;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;

    for q in 1..n {
        let qf = q as f64;
        let mut s;
        loop {
            let p = v[k] as f64;
            s = ((f[q] + qf * qf) - (f[v[k]] + p * p)) / (2.0 * qf - 2.0 * p);
            // z[0] is -inf so the envelope never empties
            if k > 0 && s <= z[k] {
                k -= 1;
            } else {
                break;
            }
        }
        k += 1;
        v[k] = q;
        z[k] = s;
        z[k + 1] = f64::INFINITY;
    }

    k = 0;
    for (q, out) in d.iter_mut().enumerate() {
        let qf = q as f64;
        while z[k + 1] < qf {
            k += 1;
        }
        let p = v[k] as f64;
        *out = (qf - p) * (qf - p) + f[v[k]];
    }
}

/// Squared euclidean distance of every foreground pixel to the nearest background pixel.
///
/// Background pixels are 0. The values are exact integers. When the mask has
/// no background pixel at all, distances are measured to the outside of the
/// image instead.
pub fn squared_distance_transform(src: &Mask, dst: &mut Image<f64, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (rows, cols) = (src.rows(), src.cols());
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    if src.as_slice().iter().all(|&v| v) {
        parallel::par_fill_rows(dst, |r, row| {
            for (c, out) in row.iter_mut().enumerate() {
                let dr = (r + 1).min(rows - r) as f64;
                let dc = (c + 1).min(cols - c) as f64;
                *out = dr.min(dc).powi(2);
            }
        });
        return Ok(());
    }

    // columns first
    let data = src.as_slice();
    let mut tmp = vec![0.0f64; rows * cols];
    {
        let mut f = vec![0.0f64; rows];
        let mut d = vec![0.0f64; rows];
        let mut v = vec![0usize; rows];
        let mut z = vec![0.0f64; rows + 1];
        for c in 0..cols {
            for r in 0..rows {
                f[r] = if data[r * cols + c] { INF } else { 0.0 };
            }
            edt_1d(&f, &mut d, &mut v, &mut z);
            for r in 0..rows {
                tmp[r * cols + c] = d[r];
            }
        }
    }

    // then rows, in parallel
    parallel::par_fill_rows(dst, |r, row| {
        let f = &tmp[r * cols..(r + 1) * cols];
        let mut v = vec![0usize; cols];
        let mut z = vec![0.0f64; cols + 1];
        edt_1d(f, row, &mut v, &mut z);
    });

    Ok(())
}

/// Euclidean distance of every foreground pixel to the nearest background pixel.
///
/// # Example
///
/// ```
/// use rhizo_image::{Image, ImageSize};
/// use rhizo_imgproc::distance_transform::distance_transform;
///
/// let mask = Image::<bool, 1>::new(
///     ImageSize { width: 5, height: 1 },
///     vec![false, true, true, true, false],
/// ).unwrap();
///
/// let mut dist = Image::<f32, 1>::from_size_val(mask.size(), 0.0).unwrap();
/// distance_transform(&mask, &mut dist).unwrap();
/// assert_eq!(dist.as_slice(), &[0.0, 1.0, 2.0, 1.0, 0.0]);
/// ```
pub fn distance_transform(src: &Mask, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    let mut squared = Image::<f64, 1>::from_size_val(src.size(), 0.0)?;
    squared_distance_transform(src, &mut squared)?;
    parallel::par_iter_rows_val(&squared, dst, |s, d| *d = s.sqrt() as f32);
    Ok(())
}
