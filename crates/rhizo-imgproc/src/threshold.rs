use std::cmp::PartialOrd;

use rhizo_image::{Image, ImageError};

use crate::filter;
use crate::parallel;

/// Statistic used to compute a local threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalThresholdMethod {
    /// Gaussian weighted mean with `sigma = (block_size - 1) / 6`.
    #[default]
    Gaussian,
    /// Arithmetic mean of the block.
    Mean,
    /// Median of the block.
    Median,
}

/// Apply a binary threshold to an image.
///
/// # Arguments
///
/// * `src` - The input image of an arbitrary number of channels and type.
/// * `dst` - The output mask, `true` where the input value is greater than the threshold.
/// * `threshold` - The threshold value. Must be the same type as the image.
///
/// # Examples
///
/// ```
/// use rhizo_image::{Image, ImageSize};
/// use rhizo_imgproc::threshold::threshold_binary;
///
/// let data = vec![100u8, 200, 50, 150, 200, 250];
/// let image = Image::<_, 1>::new(ImageSize { width: 2, height: 3 }, data).unwrap();
///
/// let mut thresholded = Image::<bool, 1>::from_size_val(image.size(), false).unwrap();
///
/// threshold_binary(&image, &mut thresholded, 100).unwrap();
/// assert_eq!(thresholded.as_slice(), &[false, true, false, true, true, true]);
/// ```
pub fn threshold_binary<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<bool, C>,
    threshold: T,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    // run the thresholding operation in parallel
    parallel::par_iter_rows_val(src, dst, |src_pixel, dst_pixel| {
        *dst_pixel = *src_pixel > threshold;
    });

    Ok(())
}

/// Compute the local threshold surface of a plane.
///
/// Each output pixel is the chosen statistic of the `block_size` neighborhood
/// minus `offset`. Borders are handled by symmetric reflection.
///
/// # Arguments
///
/// * `src` - The input plane.
/// * `dst` - The output threshold surface.
/// * `block_size` - Odd side length of the neighborhood.
/// * `method` - The local statistic.
/// * `offset` - Constant subtracted from the statistic.
///
/// # Errors
///
/// Returns an error when `block_size` is even or the sizes differ.
pub fn local_threshold(
    src: &Image<f32, 1>,
    dst: &mut Image<f32, 1>,
    block_size: usize,
    method: LocalThresholdMethod,
    offset: f32,
) -> Result<(), ImageError> {
    if block_size % 2 == 0 {
        return Err(ImageError::InvalidKernelSize(
            block_size,
            "the local threshold block size must be odd".to_string(),
        ));
    }

    match method {
        LocalThresholdMethod::Gaussian => {
            let sigma = (block_size as f32 - 1.0) / 6.0;
            filter::gaussian_blur(src, dst, sigma)?;
        }
        LocalThresholdMethod::Mean => filter::box_blur(src, dst, block_size)?,
        LocalThresholdMethod::Median => filter::median_filter(src, dst, block_size)?,
    }

    dst.as_slice_mut().iter_mut().for_each(|v| *v -= offset);

    Ok(())
}

/// Threshold a plane against its local threshold surface.
///
/// The output is `true` where the pixel is strictly greater than the local
/// statistic minus `offset`.
pub fn threshold_local(
    src: &Image<f32, 1>,
    dst: &mut Image<bool, 1>,
    block_size: usize,
    method: LocalThresholdMethod,
    offset: f32,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let mut surface = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    local_threshold(src, &mut surface, block_size, method, offset)?;

    parallel::par_iter_rows_val_two(src, &surface, dst, |v, t, out| {
        *out = v > t;
    });

    Ok(())
}

/// Compute the Otsu threshold of a floating point plane.
///
/// The samples are binned into 256 bins spanning their range and the bin
/// center maximizing the between-class variance is returned.
///
/// # Errors
///
/// Returns an error for an empty image.
pub fn otsu_threshold(src: &Image<f32, 1>) -> Result<f32, ImageError> {
    let image = src.as_slice();
    if image.is_empty() {
        return Err(ImageError::EmptyImage);
    }

    let (min, max) = image
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if min == max {
        return Ok(min);
    }

    const BINS: usize = 256;
    let bin_width = (max - min) / BINS as f32;
    let mut histogram = [0u32; BINS];

    // Compute histogram
    for &pixel in image {
        let idx = (((pixel - min) / bin_width) as usize).min(BINS - 1);
        histogram[idx] += 1;
    }

    let center = |i: usize| min + (i as f32 + 0.5) * bin_width;

    let total_pixels = image.len() as f64;
    let sum_total = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| center(i) as f64 * count as f64)
        .sum::<f64>();

    let mut best_variance = 0.0;
    let mut best_bin = 0;

    // Initialize accumulators
    let mut weight_back = 0.0;
    let mut sum_back = 0.0;

    // Iterate through all possible thresholds
    for (i, &hist_count) in histogram.iter().enumerate() {
        weight_back += hist_count as f64;
        sum_back += center(i) as f64 * hist_count as f64;

        // Skip empty classes
        if weight_back == 0.0 || weight_back == total_pixels {
            continue;
        }

        let mean_back = sum_back / weight_back;
        let weight_fore = total_pixels - weight_back;
        let mean_fore = (sum_total - sum_back) / weight_fore;

        // Calculate between-class variance
        let variance = weight_back * weight_fore * (mean_back - mean_fore).powi(2);

        if variance > best_variance {
            best_variance = variance;
            best_bin = i;
        }
    }

    Ok(center(best_bin))
}

#[cfg(test)]
mod tests {
    use rhizo_image::{Image, ImageError, ImageSize};

    use super::LocalThresholdMethod;

    #[test]
    fn threshold_binary() -> Result<(), ImageError> {
        let data = vec![100u8, 200, 50, 150, 200, 250];
        let image = Image::<_, 1>::new(
            ImageSize {
                width: 2,
                height: 3,
            },
            data,
        )?;

        let mut thresholded = Image::<bool, 1>::from_size_val(image.size(), false)?;

        super::threshold_binary(&image, &mut thresholded, 100)?;

        assert_eq!(
            thresholded.as_slice(),
            &[false, true, false, true, true, true]
        );

        Ok(())
    }

    #[test]
    fn threshold_local_dark_object() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 21,
            height: 21,
        };
        // dark 3x3 object on a bright background
        let image = Image::<f32, 1>::from_fn(size, |r, c, _| {
            if (9..12).contains(&r) && (9..12).contains(&c) {
                0.0
            } else {
                1.0
            }
        })?;

        for method in [
            LocalThresholdMethod::Gaussian,
            LocalThresholdMethod::Mean,
            LocalThresholdMethod::Median,
        ] {
            let mut above = Image::<bool, 1>::from_size_val(size, false)?;
            super::threshold_local(&image, &mut above, 7, method, 0.05)?;
            // object pixels fall below the local statistic, background is above it
            assert!(!above.get_pixel(10, 10, 0)?);
            assert!(above.get_pixel(0, 0, 0)?);
            assert_eq!(above.as_slice().iter().filter(|&&v| !v).count(), 9);
        }

        Ok(())
    }

    #[test]
    fn threshold_local_even_block() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 4,
        };
        let image = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let mut above = Image::<bool, 1>::from_size_val(size, false)?;
        let res = super::threshold_local(&image, &mut above, 4, LocalThresholdMethod::Mean, 0.0);
        assert!(res.is_err());
        Ok(())
    }

    #[test]
    fn test_otsu_threshold() -> Result<(), ImageError> {
        let data = vec![0.1f32, 0.9, 0.1, 0.8, 0.2, 0.9];
        let image = Image::<_, 1>::new(
            ImageSize {
                width: 2,
                height: 3,
            },
            data,
        )?;

        let t = super::otsu_threshold(&image)?;
        assert!(t > 0.15 && t < 0.8);
        Ok(())
    }
}
