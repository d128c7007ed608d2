use rhizo_image::Mask;
use rhizo_imgproc::morphology::{self, Kernel, KernelShape};
use serde::{Deserialize, Serialize};

use crate::error::MeasureError;

/// Parameters of the gap filling.
///
/// A step whose radius or size is zero is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapFillParams {
    /// Radius of the closing disk.
    pub closing_radius: f32,
    /// Enclosed holes below this many pixels are filled.
    pub min_hole_size: usize,
    /// Radius of the median smoothing disk, possibly fractional.
    pub median_radius: f32,
}

impl Default for GapFillParams {
    fn default() -> Self {
        Self {
            closing_radius: 7.0,
            min_hole_size: 300,
            median_radius: 0.0,
        }
    }
}

impl GapFillParams {
    /// Check that the radii are not negative.
    pub fn validate(&self) -> Result<(), MeasureError> {
        for (name, radius) in [
            ("closing_radius", self.closing_radius),
            ("median_radius", self.median_radius),
        ] {
            if !(radius >= 0.0) {
                return Err(MeasureError::InvalidParameter(
                    name.to_string(),
                    format!("{radius} must not be negative"),
                ));
            }
        }
        Ok(())
    }
}

/// Merge close edges of an object and fill its small holes.
///
/// Binary closing with a disk, then filling of enclosed holes smaller than
/// `min_hole_size`, then a binary median with a disk.
///
/// # Example
///
/// ```
/// use rhizo_image::{Image, ImageSize};
/// use rhizo_measure::gaps::{fill_gaps, GapFillParams};
///
/// // two parallel edges two pixels apart
/// let mask = Image::<bool, 1>::from_fn(ImageSize { width: 20, height: 9 }, |r, c, _| {
///     (2..18).contains(&c) && (r == 3 || r == 5)
/// }).unwrap();
///
/// let params = GapFillParams { closing_radius: 1.0, min_hole_size: 0, median_radius: 0.0 };
/// let filled = fill_gaps(&mask, &params).unwrap();
/// assert!(filled.get_pixel(10, 4, 0).unwrap());
/// ```
pub fn fill_gaps(objects: &Mask, params: &GapFillParams) -> Result<Mask, MeasureError> {
    params.validate()?;

    let mut out = objects.clone();
    let mut tmp = Mask::from_size_val(objects.size(), false)?;

    if params.closing_radius > 0.0 {
        let kernel = Kernel::new(KernelShape::Disk {
            radius: params.closing_radius,
        });
        morphology::close(&out, &mut tmp, &kernel)?;
        std::mem::swap(&mut out, &mut tmp);
    }

    if params.min_hole_size > 0 {
        morphology::remove_small_holes(&out, &mut tmp, params.min_hole_size)?;
        std::mem::swap(&mut out, &mut tmp);
    }

    if params.median_radius > 0.0 {
        let kernel = Kernel::new(KernelShape::Disk {
            radius: params.median_radius,
        });
        morphology::binary_median(&out, &mut tmp, &kernel)?;
        std::mem::swap(&mut out, &mut tmp);
    }

    Ok(out)
}
