use rayon::prelude::*;
use rhizo_image::{Image, ImageError};

/// Contrast limited adaptive histogram equalization (CLAHE).
///
/// The plane is split into tiles of `kernel_size` pixels. Each tile gets a
/// clipped, equalized histogram mapping and every pixel is mapped by
/// bilinear interpolation between the four nearest tile mappings.
///
/// # Arguments
///
/// * `src` - The input plane with samples in [0, 1].
/// * `dst` - The equalized plane, samples in [0, 1].
/// * `kernel_size` - Tile `(height, width)`, defaults to 1/8 of the plane dimensions.
/// * `clip_limit` - Clip limit as a fraction of the tile area, in [0, 1].
/// * `nbins` - Number of histogram bins.
///
/// # Errors
///
/// Returns an error if the sizes differ or `nbins` is zero.
pub fn equalize_adapthist(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel_size: Option<(usize, usize)>,
    clip_limit: f32,
    nbins: usize,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if nbins == 0 {
        return Err(ImageError::InvalidParameter(
            "nbins".to_string(),
            "must be positive".to_string(),
        ));
    }

    let (rows, cols) = (src.rows(), src.cols());
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let (ky, kx) = kernel_size.unwrap_or((rows / 8, cols / 8));
    let (ky, kx) = (ky.clamp(1, rows), kx.clamp(1, cols));
    let ny = rows.div_ceil(ky);
    let nx = cols.div_ceil(kx);

    let data = src.as_slice();
    let bin_of = |v: f32| ((v.clamp(0.0, 1.0) * nbins as f32) as usize).min(nbins - 1);

    // one mapping per tile, indexed [ty * nx + tx][bin]
    let maps = (0..ny * nx)
        .into_par_iter()
        .map(|t| {
            let (ty, tx) = (t / nx, t % nx);
            let (r0, c0) = (ty * ky, tx * kx);
            let (r1, c1) = ((r0 + ky).min(rows), (c0 + kx).min(cols));

            let mut hist = vec![0usize; nbins];
            for r in r0..r1 {
                for &v in &data[r * cols + c0..r * cols + c1] {
                    hist[bin_of(v)] += 1;
                }
            }

            let area = (r1 - r0) * (c1 - c0);
            let clip = ((clip_limit * (ky * kx) as f32) as usize).max(1);
            clip_histogram(&mut hist, clip);

            let mut cdf = 0usize;
            hist.iter()
                .map(|&h| {
                    cdf += h;
                    cdf as f32 / area as f32
                })
                .collect::<Vec<f32>>()
        })
        .collect::<Vec<_>>();

    // tile centers along one axis: index and weight of the lower neighbor
    let interp = |p: usize, k: usize, n: usize| -> (usize, usize, f32) {
        let pos = (p as f32 + 0.5) / k as f32 - 0.5;
        if pos <= 0.0 {
            return (0, 0, 1.0);
        }
        let lo = pos.floor() as usize;
        if lo + 1 >= n {
            return (n - 1, n - 1, 1.0);
        }
        (lo, lo + 1, 1.0 - (pos - lo as f32))
    };

    crate::parallel::par_fill_rows(dst, |r, row| {
        let (y0, y1, wy) = interp(r, ky, ny);
        for (c, out) in row.iter_mut().enumerate() {
            let (x0, x1, wx) = interp(c, kx, nx);
            let b = bin_of(data[r * cols + c]);
            let top = wx * maps[y0 * nx + x0][b] + (1.0 - wx) * maps[y0 * nx + x1][b];
            let bottom = wx * maps[y1 * nx + x0][b] + (1.0 - wx) * maps[y1 * nx + x1][b];
            *out = (wy * top + (1.0 - wy) * bottom).clamp(0.0, 1.0);
        }
    });

    Ok(())
}

/// Clip a histogram at `limit` and spread the excess evenly over all bins.
fn clip_histogram(hist: &mut [usize], limit: usize) {
    let excess = hist
        .iter()
        .map(|&h| h.saturating_sub(limit))
        .sum::<usize>();
    if excess == 0 {
        return;
    }

    let n = hist.len();
    let increment = excess / n;
    let mut remainder = excess % n;
    for h in hist.iter_mut() {
        *h = (*h).min(limit) + increment;
        if remainder > 0 {
            *h += 1;
            remainder -= 1;
        }
    }
}
