use rayon::prelude::*;
use rhizo_image::{Image, ImageError};

/// Map a possibly out-of-range index back into `[0, n)` by symmetric reflection.
///
/// The edge sample is repeated, i.e. `-1 -> 0`, `-2 -> 1` and `n -> n - 1`.
pub fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    if n == 1 {
        return 0;
    }
    let period = 2 * n;
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - 1 - i;
    }
    i as usize
}

/// Apply a separable 2D filter with symmetric border handling.
///
/// The horizontal kernel runs first into a temporary buffer, followed by the
/// vertical kernel. Both kernels are centered on their middle sample.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image, same size as the source.
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
pub fn separable_filter<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if kernel_x.is_empty() || kernel_y.is_empty() {
        return Err(ImageError::InvalidKernelSize(
            0,
            "separable kernels must not be empty".to_string(),
        ));
    }

    let (rows, cols) = (src.rows(), src.cols());
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let half_x = (kernel_x.len() / 2) as isize;
    let half_y = (kernel_y.len() / 2) as isize;
    let src_data = src.as_slice();
    let mut temp = vec![0.0f32; src_data.len()];

    // horizontal pass
    temp.par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(r, row)| {
            let src_row = &src_data[r * cols * C..(r + 1) * cols * C];
            for c in 0..cols {
                for ch in 0..C {
                    let mut acc = 0.0;
                    for (k, &w) in kernel_x.iter().enumerate() {
                        let cc = reflect_index(c as isize + k as isize - half_x, cols);
                        acc += w * src_row[cc * C + ch];
                    }
                    row[c * C + ch] = acc;
                }
            }
        });

    // vertical pass
    dst.as_slice_mut()
        .par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(r, row)| {
            for (k, &w) in kernel_y.iter().enumerate() {
                let rr = reflect_index(r as isize + k as isize - half_y, rows);
                let tmp_row = &temp[rr * cols * C..(rr + 1) * cols * C];
                if k == 0 {
                    row.iter_mut()
                        .zip(tmp_row.iter())
                        .for_each(|(d, &t)| *d = w * t);
                } else {
                    row.iter_mut()
                        .zip(tmp_row.iter())
                        .for_each(|(d, &t)| *d += w * t);
                }
            }
        });

    Ok(())
}

#[cfg(test)]
mod tests {
    use rhizo_image::{Image, ImageError, ImageSize};

    #[test]
    fn test_reflect_index() {
        assert_eq!(super::reflect_index(-1, 4), 0);
        assert_eq!(super::reflect_index(-2, 4), 1);
        assert_eq!(super::reflect_index(4, 4), 3);
        assert_eq!(super::reflect_index(5, 4), 2);
        assert_eq!(super::reflect_index(2, 4), 2);
        assert_eq!(super::reflect_index(-3, 1), 0);
    }

    #[test]
    fn test_separable_identity() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let src = Image::<f32, 1>::new(size, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;
        super::separable_filter(&src, &mut dst, &[0.0, 1.0, 0.0], &[1.0])?;
        assert_eq!(dst.as_slice(), src.as_slice());
        Ok(())
    }

    #[test]
    fn test_separable_box_constant() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 4,
        };
        let src = Image::<f32, 1>::from_size_val(size, 0.5)?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let k = [1.0 / 3.0; 3];
        super::separable_filter(&src, &mut dst, &k, &k)?;
        for v in dst.as_slice() {
            approx::assert_relative_eq!(*v, 0.5, epsilon = 1e-6);
        }
        Ok(())
    }
}
