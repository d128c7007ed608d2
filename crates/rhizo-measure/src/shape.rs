use rayon::prelude::*;
use rhizo_image::{ImageSize, Mask};
use rhizo_imgproc::label::{label, Connectivity};
use rhizo_imgproc::morphology::{self, Kernel, KernelShape};
use rhizo_imgproc::regionprops::regionprops;
use serde::{Deserialize, Serialize};

use crate::error::MeasureError;
use crate::skeleton::{skeleton_length, SkeletonParams};

/// Thresholds of the morphology filter.
///
/// The defaults let every object through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyParams {
    /// Eccentricity above which the loose test passes.
    pub loose_eccentricity: f64,
    /// Solidity below which the loose test passes.
    pub loose_solidity: f64,
    /// Eccentricity above which the strict test passes.
    pub strict_eccentricity: f64,
    /// Solidity below which the strict test passes.
    pub strict_solidity: f64,
    /// Minimum major axis length.
    pub min_length: f64,
    /// Minimum area in pixels.
    pub min_size: usize,
}

impl Default for MorphologyParams {
    fn default() -> Self {
        Self {
            loose_eccentricity: 0.0,
            loose_solidity: 1.0,
            strict_eccentricity: 0.0,
            strict_solidity: 1.0,
            min_length: 0.0,
            min_size: 0,
        }
    }
}

/// Keep elongated, non-convex objects.
///
/// An object is kept when
/// `(solidity < loose_solidity && eccentricity > loose_eccentricity)
/// || (solidity < strict_solidity || eccentricity > strict_eccentricity)`
/// and its major axis is longer than `min_length` and its area larger than
/// `min_size`.
pub fn morphology_filter(objects: &Mask, params: &MorphologyParams) -> Result<Mask, MeasureError> {
    if params.strict_solidity >= 1.0 && params.strict_eccentricity <= 0.0 {
        log::warn!(
            "morphology filter: strict solidity {} and strict eccentricity {} pass almost every object",
            params.strict_solidity,
            params.strict_eccentricity
        );
    }

    let regions = label(objects, Connectivity::Eight)?;
    let keep = std::iter::once(false)
        .chain(regionprops(&regions).iter().map(|p| {
            let loose = p.solidity < params.loose_solidity
                && p.eccentricity > params.loose_eccentricity;
            let strict = p.solidity < params.strict_solidity
                || p.eccentricity > params.strict_eccentricity;
            (loose || strict) && p.major_axis_length > params.min_length && p.area > params.min_size
        }))
        .collect::<Vec<_>>();

    log::debug!(
        "morphology filter kept {} of {} objects",
        keep.iter().filter(|&&k| k).count(),
        regions.num_labels
    );

    Ok(regions.select(&keep))
}

/// Parameters of the hollow filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HollowParams {
    /// Objects whose skeleton shrinks by this factor or more on filling are removed.
    pub ratio: f64,
    /// Radius of the closing disk.
    pub fill_radius: f32,
}

impl Default for HollowParams {
    fn default() -> Self {
        Self {
            ratio: 1.3,
            fill_radius: 15.0,
        }
    }
}

/// Remove hollow objects such as rings and bubbles.
///
/// Every object is closed with a disk of `fill_radius` on its own padded
/// crop. The object is removed when its skeleton length before filling
/// divided by its length after filling reaches `ratio`.
pub fn hollow_filter(
    objects: &Mask,
    params: &HollowParams,
    skeleton: &SkeletonParams,
) -> Result<Mask, MeasureError> {
    if !(params.fill_radius >= 0.0) {
        return Err(MeasureError::InvalidParameter(
            "fill_radius".to_string(),
            format!("{} must not be negative", params.fill_radius),
        ));
    }

    let regions = label(objects, Connectivity::Eight)?;
    let kernel = Kernel::new(KernelShape::Disk {
        radius: params.fill_radius,
    });
    let margin = params.fill_radius.ceil() as usize + 1;
    let (rows, cols) = (objects.rows(), objects.cols());
    let labels = regions.labels.as_slice();

    let solid = regions
        .bounding_boxes()
        .par_iter()
        .enumerate()
        .map(|(i, bbox)| -> Result<bool, MeasureError> {
            // the window is padded with background past the image border
            let size = ImageSize {
                width: bbox.width() + 2 * margin,
                height: bbox.height() + 2 * margin,
            };
            let label = i as u32 + 1;
            let object = Mask::from_fn(size, |r, c, _| {
                let (rr, cc) = (r + bbox.min_row, c + bbox.min_col);
                rr >= margin
                    && cc >= margin
                    && rr - margin < rows
                    && cc - margin < cols
                    && labels[(rr - margin) * cols + cc - margin] == label
            })?;

            let mut filled = Mask::from_size_val(size, false)?;
            morphology::close(&object, &mut filled, &kernel)?;

            let unfilled_length = skeleton_length(&object, skeleton)?;
            let filled_length = skeleton_length(&filled, skeleton)?;
            let ratio = if filled_length > 0.0 {
                unfilled_length / filled_length
            } else if unfilled_length > 0.0 {
                f64::INFINITY
            } else {
                1.0
            };
            Ok(ratio < params.ratio)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let keep = std::iter::once(false).chain(solid).collect::<Vec<_>>();
    Ok(regions.select(&keep))
}
