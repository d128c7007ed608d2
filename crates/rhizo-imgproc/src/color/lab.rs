use crate::parallel;
use rhizo_image::{Image, ImageError};

// sRGB (D65) to CIE XYZ
const RGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.412453, 0.357580, 0.180423],
    [0.212671, 0.715160, 0.072169],
    [0.019334, 0.119193, 0.950227],
];

/// Reference white of the D65 illuminant.
pub const D65_WHITE: [f32; 3] = [0.95047, 1.0, 1.08883];

fn linearize(c: f32) -> f32 {
    if c > 0.04045 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

fn rgb_to_xyz(pixel: &[f32]) -> [f32; 3] {
    let rgb = [
        linearize(pixel[0]),
        linearize(pixel[1]),
        linearize(pixel[2]),
    ];
    let mut xyz = [0.0f32; 3];
    for (out, row) in xyz.iter_mut().zip(RGB_TO_XYZ.iter()) {
        *out = row[0] * rgb[0] + row[1] * rgb[1] + row[2] * rgb[2];
    }
    xyz
}

/// Convert an RGB image to CIE XYZ.
///
/// The input samples are sRGB in [0, 1]. The output Y channel is in [0, 1],
/// X and Z reach the D65 white point at most.
pub fn xyz_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 3>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        dst_pixel.copy_from_slice(&rgb_to_xyz(src_pixel));
    });

    Ok(())
}

/// Convert an RGB image to CIE L*a*b* under the D65 illuminant.
///
/// # Returns
///
/// * L: lightness in [0, 100].
/// * a: green-red axis, roughly [-128, 127].
/// * b: blue-yellow axis, roughly [-128, 127].
pub fn lab_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 3>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let f = |t: f32| {
        if t > 0.008856 {
            t.cbrt()
        } else {
            7.787 * t + 16.0 / 116.0
        }
    };

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        let xyz = rgb_to_xyz(src_pixel);
        let fx = f(xyz[0] / D65_WHITE[0]);
        let fy = f(xyz[1] / D65_WHITE[1]);
        let fz = f(xyz[2] / D65_WHITE[2]);

        dst_pixel[0] = 116.0 * fy - 16.0;
        dst_pixel[1] = 500.0 * (fx - fy);
        dst_pixel[2] = 200.0 * (fy - fz);
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use rhizo_image::{Image, ImageError, ImageSize};

    #[test]
    fn lab_white_and_black() -> Result<(), ImageError> {
        let image = Image::<f32, 3>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0],
        )?;
        let mut lab = Image::<f32, 3>::from_size_val(image.size(), 0.0)?;
        super::lab_from_rgb(&image, &mut lab)?;

        let px = lab.as_slice();
        approx::assert_abs_diff_eq!(px[0], 100.0, epsilon = 0.01);
        approx::assert_abs_diff_eq!(px[1], 0.0, epsilon = 0.05);
        approx::assert_abs_diff_eq!(px[2], 0.0, epsilon = 0.05);
        approx::assert_abs_diff_eq!(px[3], 0.0, epsilon = 1e-4);
        Ok(())
    }

    #[test]
    fn xyz_white() -> Result<(), ImageError> {
        let image = Image::<f32, 3>::from_size_val(
            ImageSize {
                width: 1,
                height: 1,
            },
            1.0,
        )?;
        let mut xyz = Image::<f32, 3>::from_size_val(image.size(), 0.0)?;
        super::xyz_from_rgb(&image, &mut xyz)?;
        for (v, w) in xyz.as_slice().iter().zip(super::D65_WHITE.iter()) {
            approx::assert_abs_diff_eq!(v, w, epsilon = 1e-3);
        }
        Ok(())
    }
}
