use rhizo_image::{Image, ImageError};

use super::kernels;
use super::separable_filter::separable_filter;

/// Blur an image using a gaussian blur filter
///
/// The kernel is truncated at four standard deviations. A non-positive
/// sigma copies the source unchanged.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `sigma` - The standard deviation of the gaussian, in pixels.
pub fn gaussian_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    sigma: f32,
) -> Result<(), ImageError> {
    if sigma <= 0.0 {
        return separable_filter(src, dst, &[1.0], &[1.0]);
    }
    let kernel_size = 2 * kernels::gaussian_kernel_radius(sigma) + 1;
    let kernel = kernels::gaussian_kernel_1d(kernel_size, sigma);
    separable_filter(src, dst, &kernel, &kernel)
}

/// Blur an image using a box blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The side of the square window, must be odd.
pub fn box_blur<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_size: usize,
) -> Result<(), ImageError> {
    if kernel_size % 2 == 0 {
        return Err(ImageError::InvalidKernelSize(
            kernel_size,
            "box blur window must be odd".to_string(),
        ));
    }
    let kernel = kernels::box_blur_kernel_1d(kernel_size);
    separable_filter(src, dst, &kernel, &kernel)
}

/// Gradient magnitude of the normalized scharr operator.
///
/// The magnitude is `sqrt((gx^2 + gy^2) / 2)`.
pub fn scharr_magnitude(src: &Image<f32, 1>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    let (deriv, smooth) = kernels::scharr_kernel_1d();
    let mut gx = Image::from_size_val(src.size(), 0.0f32)?;
    let mut gy = Image::from_size_val(src.size(), 0.0f32)?;
    separable_filter(src, &mut gx, &deriv, &smooth)?;
    separable_filter(src, &mut gy, &smooth, &deriv)?;

    crate::parallel::par_iter_rows_val_two(&gx, &gy, dst, |x, y, out| {
        *out = ((x * x + y * y) / 2.0).sqrt();
    });

    Ok(())
}

/// Response of the prewitt operator to horizontal edges.
pub fn prewitt_horizontal(src: &Image<f32, 1>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    let (deriv, smooth) = kernels::prewitt_kernel_1d();
    separable_filter(src, dst, &smooth, &deriv)
}

/// Response of the prewitt operator to vertical edges.
pub fn prewitt_vertical(src: &Image<f32, 1>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    let (deriv, smooth) = kernels::prewitt_kernel_1d();
    separable_filter(src, dst, &deriv, &smooth)
}
