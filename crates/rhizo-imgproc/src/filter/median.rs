use rhizo_image::{Image, ImageError};

use super::separable_filter::reflect_index;
use crate::parallel;

/// Median filter over a square window with symmetric border handling.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image, same size as the source.
/// * `kernel_size` - The side of the square window, must be odd.
pub fn median_filter(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    kernel_size: usize,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if kernel_size % 2 == 0 {
        return Err(ImageError::InvalidKernelSize(
            kernel_size,
            "median window must be odd".to_string(),
        ));
    }

    let (rows, cols) = (src.rows(), src.cols());
    let half = (kernel_size / 2) as isize;
    let data = src.as_slice();

    parallel::par_fill_rows(dst, |r, row| {
        let mut window = Vec::with_capacity(kernel_size * kernel_size);
        for (c, out) in row.iter_mut().enumerate() {
            window.clear();
            for dr in -half..=half {
                let rr = reflect_index(r as isize + dr, rows);
                for dc in -half..=half {
                    let cc = reflect_index(c as isize + dc, cols);
                    window.push(data[rr * cols + cc]);
                }
            }
            let mid = window.len() / 2;
            let (_, median, _) = window.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
            *out = *median;
        }
    });

    Ok(())
}
