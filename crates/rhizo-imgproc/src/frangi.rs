use rhizo_image::{Image, ImageError};

use crate::{filter::gaussian_blur, parallel};

/// Scales `start, start + step, ...` strictly below `end`.
///
/// A range holding no scale yields `[start]` so that the filter always runs
/// at least once.
pub fn scale_space(start: f32, end: f32, step: f32) -> Vec<f32> {
    let mut sigmas = Vec::new();
    if step > 0.0 {
        let mut i = 0;
        loop {
            let sigma = start + i as f32 * step;
            if sigma >= end {
                break;
            }
            sigmas.push(sigma);
            i += 1;
        }
    }
    if sigmas.is_empty() {
        sigmas.push(start);
    }
    sigmas
}

/// Derivative along the rows (`axis_rows = true`) or the columns.
///
/// Central differences inside, one sided differences on the first and last
/// sample.
fn gradient(src: &Image<f32, 1>, dst: &mut Image<f32, 1>, axis_rows: bool) {
    let (rows, cols) = (src.rows(), src.cols());
    let data = src.as_slice();
    parallel::par_fill_rows(dst, |r, row| {
        for (c, out) in row.iter_mut().enumerate() {
            let at = |rr: usize, cc: usize| data[rr * cols + cc];
            let (n, i) = if axis_rows { (rows, r) } else { (cols, c) };
            let step = |i: usize| if axis_rows { at(i, c) } else { at(r, i) };
            *out = if n < 2 {
                0.0
            } else if i == 0 {
                step(1) - step(0)
            } else if i == n - 1 {
                step(n - 1) - step(n - 2)
            } else {
                (step(i + 1) - step(i - 1)) / 2.0
            };
        }
    });
}

/// Eigenvalues of the symmetric matrix `[[a, b], [b, d]]`, largest magnitude first.
fn eigenvalues(a: f32, b: f32, d: f32) -> (f32, f32) {
    let half_trace = (a + d) / 2.0;
    let root = (((a - d) / 2.0).powi(2) + b * b).sqrt();
    let (e1, e2) = (half_trace + root, half_trace - root);
    if e1.abs() >= e2.abs() {
        (e1, e2)
    } else {
        (e2, e1)
    }
}

/// Frangi vesselness filter.
///
/// At every scale the image is smoothed with a gaussian of that sigma and the
/// eigenvalues `l1`, `l2` (`|l1| >= |l2|`) of its hessian are computed. The
/// response is `exp(-rb / (2 beta1^2)) * (1 - exp(-s2 / (2 beta2^2)))` with
/// `rb = (l2 / l1)^2` and `s2 = l1^2 + l2^2`. Pixels whose dominant eigenvalue
/// has the sign of a bright ridge (for `black_ridges`) or of a dark ridge are
/// zeroed. The output is the maximum response over all scales.
///
/// # Arguments
///
/// * `src` - The input plane.
/// * `dst` - The vesselness response.
/// * `sigmas` - The scales of the filter.
/// * `beta1` - Sensitivity to deviation from a line-like structure.
/// * `beta2` - Sensitivity to the overall second order structure.
/// * `black_ridges` - Whether the ridges are darker than the background.
///
/// # Errors
///
/// Returns an error if the sizes differ or a beta is not positive.
pub fn frangi(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    sigmas: &[f32],
    beta1: f32,
    beta2: f32,
    black_ridges: bool,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if beta1 <= 0.0 || beta2 <= 0.0 {
        return Err(ImageError::InvalidParameter(
            "beta".to_string(),
            format!("beta1 = {beta1} and beta2 = {beta2} must be positive"),
        ));
    }

    let size = src.size();
    let b1 = 2.0 * beta1 * beta1;
    let b2 = 2.0 * beta2 * beta2;

    dst.as_slice_mut().iter_mut().for_each(|v| *v = 0.0);

    let mut smoothed = Image::from_size_val(size, 0.0f32)?;
    let mut dr = Image::from_size_val(size, 0.0f32)?;
    let mut dc = Image::from_size_val(size, 0.0f32)?;
    let mut drr = Image::from_size_val(size, 0.0f32)?;
    let mut drc = Image::from_size_val(size, 0.0f32)?;
    let mut dcc = Image::from_size_val(size, 0.0f32)?;

    for &sigma in sigmas {
        gaussian_blur(src, &mut smoothed, sigma)?;
        gradient(&smoothed, &mut dr, true);
        gradient(&smoothed, &mut dc, false);
        gradient(&dr, &mut drr, true);
        gradient(&dr, &mut drc, false);
        gradient(&dc, &mut dcc, false);

        let (hrr, hrc, hcc) = (drr.as_slice(), drc.as_slice(), dcc.as_slice());
        let cols = size.width;
        parallel::par_fill_rows(dst, |r, row| {
            for (c, out) in row.iter_mut().enumerate() {
                let idx = r * cols + c;
                let (mut l1, l2) = eigenvalues(hrr[idx], hrc[idx], hcc[idx]);
                if (black_ridges && l1 < 0.0) || (!black_ridges && l1 > 0.0) {
                    continue;
                }
                if l1 == 0.0 {
                    l1 = 1e-10;
                }
                let rb = (l2 / l1).powi(2);
                let s2 = l1 * l1 + l2 * l2;
                let v = (-rb / b1).exp() * (1.0 - (-s2 / b2).exp());
                if v > *out {
                    *out = v;
                }
            }
        });
    }

    Ok(())
}
