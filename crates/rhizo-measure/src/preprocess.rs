//! Image quality checks run before segmentation.

use rhizo_image::{Image, Plane};
use rhizo_imgproc::filter::{prewitt_horizontal, prewitt_vertical};

use crate::error::MeasureError;
use crate::raster::Raster;

fn variance(values: &[f32]) -> f64 {
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    values.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n
}

/// Check an image for motion blur.
///
/// Motion smears edges across the direction of movement, so the edge
/// strength becomes unbalanced between the two axes. The test statistic is
/// the variance of the vertical edge response over the variance of the
/// horizontal one, and the image passes when it lies strictly between
/// `1 / ratio` and `ratio`.
///
/// # Errors
///
/// Returns an error if `ratio` is not positive or the plane is empty.
pub fn detect_motion_blur(plane: &Plane, ratio: f64) -> Result<bool, MeasureError> {
    if !(ratio > 0.0) {
        return Err(MeasureError::InvalidParameter(
            "ratio".to_string(),
            format!("{ratio} must be positive"),
        ));
    }
    if plane.as_slice().is_empty() {
        return Err(rhizo_image::ImageError::EmptyImage.into());
    }

    let mut vertical = Image::from_size_val(plane.size(), 0.0f32)?;
    let mut horizontal = Image::from_size_val(plane.size(), 0.0f32)?;
    prewitt_vertical(plane, &mut vertical)?;
    prewitt_horizontal(plane, &mut horizontal)?;

    let test = variance(vertical.as_slice()) / variance(horizontal.as_slice());
    log::debug!("motion blur statistic: {test}");
    Ok(test < ratio && test > 1.0 / ratio)
}

/// Correct uneven illumination with a blank exposure.
///
/// Every sample is divided by the matching sample of `brightfield` scaled
/// by `factor`, and capped at 1.
///
/// # Errors
///
/// Returns an error if the rasters differ in size or number of bands.
pub fn correct_brightfield(
    raster: &Raster,
    brightfield: &Raster,
    factor: f32,
) -> Result<Raster, MeasureError> {
    let correct = |v: &f32, b: &f32| (v / (b * factor)).min(1.0);
    match (raster, brightfield) {
        (Raster::Mono(image), Raster::Mono(blank)) => Ok(Raster::Mono(image.zip_map(blank, correct)?)),
        (Raster::Rgb(image), Raster::Rgb(blank)) => Ok(Raster::Rgb(image.zip_map(blank, correct)?)),
        _ => Err(MeasureError::BandCountMismatch(
            brightfield.num_bands(),
            raster.num_bands(),
        )),
    }
}
