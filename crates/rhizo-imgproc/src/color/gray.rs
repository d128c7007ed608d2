use crate::parallel;
use rhizo_image::{Image, ImageError};

/// Convert an RGB image to grayscale using the ITU-R BT.709 luma weights.
///
/// # Arguments
///
/// * `src` - The input RGB image with samples in [0, 1].
/// * `dst` - The output grayscale image.
///
/// Precondition: the input and output images must have the same size.
pub fn gray_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    const RW: f32 = 0.2125;
    const GW: f32 = 0.7154;
    const BW: f32 = 0.0721;

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = RW * src_pixel[0] + GW * src_pixel[1] + BW * src_pixel[2];
    });

    Ok(())
}
