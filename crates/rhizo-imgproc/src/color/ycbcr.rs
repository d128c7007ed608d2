use crate::parallel;
use rhizo_image::{Image, ImageError};

/// Convert an RGB image to studio-range YCbCr (ITU-R BT.601).
///
/// The input samples are in [0, 1]. The output Y channel lies in
/// [16, 235] and the chroma channels in [16, 240].
pub fn ycbcr_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 3>) -> Result<(), ImageError> {
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
        dst_pixel[0] = 16.0 + 65.481 * r + 128.553 * g + 24.966 * b;
        dst_pixel[1] = 128.0 - 37.797 * r - 74.203 * g + 112.0 * b;
        dst_pixel[2] = 128.0 + 112.0 * r - 93.786 * g - 18.214 * b;
    });

    Ok(())
}
