use crate::parallel;
use rhizo_image::{Image, ImageError};

/// Convert an RGB image to an HSV image.
///
/// The input image is assumed to have 3 channels in the order R, G, B with
/// samples in [0, 1].
///
/// # Returns
///
/// The HSV image with the following channels, all in [0, 1]:
///
/// * H: the hue as a fraction of a full turn.
/// * S: the saturation.
/// * V: the value.
///
/// # Example
///
/// ```
/// use rhizo_image::{Image, ImageSize};
/// use rhizo_imgproc::color::hsv_from_rgb;
///
/// let image = Image::<f32, 3>::new(
///     ImageSize {
///         width: 1,
///         height: 1,
///     },
///     vec![1.0, 0.0, 0.0],
/// )
/// .unwrap();
///
/// let mut hsv = Image::<f32, 3>::from_size_val(image.size(), 0.0).unwrap();
///
/// hsv_from_rgb(&image, &mut hsv).unwrap();
///
/// assert_eq!(hsv.as_slice(), &[0.0, 1.0, 1.0]);
/// ```
pub fn hsv_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 3>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        let (r, g, b) = (src_pixel[0], src_pixel[1], src_pixel[2]);

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let h = if delta == 0.0 {
            0.0
        } else if max == r {
            ((g - b) / delta) % 6.0
        } else if max == g {
            ((b - r) / delta) + 2.0
        } else {
            ((r - g) / delta) + 4.0
        };

        // wrap into a fraction of a turn
        let h = h / 6.0;
        let h = if h < 0.0 { h + 1.0 } else { h };

        let s = if max == 0.0 { 0.0 } else { delta / max };

        dst_pixel[0] = h;
        dst_pixel[1] = s;
        dst_pixel[2] = max;
    });

    Ok(())
}
