use std::str::FromStr;

use rhizo_image::{Mask, Plane};
use rhizo_imgproc::label::{label, Connectivity};
use rhizo_imgproc::morphology::{self, Kernel, KernelShape};
use serde::{Deserialize, Serialize};

use crate::bands::{project_band, Colorspace};
use crate::error::MeasureError;
use crate::raster::Raster;
use crate::stats::median;

/// A structuring element in a configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Footprint {
    /// Edge neighbors within a `size x size` window.
    Cross {
        /// Side of the window.
        size: usize,
    },
    /// The full `size x size` window.
    Square {
        /// Side of the window.
        size: usize,
    },
    /// All offsets within `radius`.
    Disk {
        /// Radius in pixels, possibly fractional.
        radius: f32,
    },
}

impl Footprint {
    /// Build the structuring element.
    pub fn kernel(&self) -> Result<Kernel, MeasureError> {
        let shape = match *self {
            Footprint::Cross { size } | Footprint::Square { size } if size == 0 => {
                return Err(MeasureError::InvalidParameter(
                    "footprint".to_string(),
                    "size must be positive".to_string(),
                ));
            }
            Footprint::Disk { radius } if !(radius >= 0.0) => {
                return Err(MeasureError::InvalidParameter(
                    "footprint".to_string(),
                    format!("radius {radius} must not be negative"),
                ));
            }
            Footprint::Cross { size } => KernelShape::Cross { size },
            Footprint::Square { size } => KernelShape::Box { size },
            Footprint::Disk { radius } => KernelShape::Disk { radius },
        };
        Ok(Kernel::new(shape))
    }
}

/// Whether `v` lies in `[low, high]`, wrapping around when `low > high`.
fn in_circular_range(v: f32, low: f32, high: f32) -> bool {
    if low <= high {
        (low..=high).contains(&v)
    } else {
        v >= low || v <= high
    }
}

/// Keep the objects with enough pixels inside a value range.
///
/// The range is circular: when `low > high` it wraps around the end of the
/// scale, as hue does, and covers `[low, 1] U [0, high]`.
///
/// # Arguments
///
/// * `plane` - The values to test.
/// * `objects` - The candidate objects.
/// * `low` - Start of the range.
/// * `high` - End of the range.
/// * `percent` - Minimum share, in percent, of object pixels within the range.
pub fn grayscale_range_filter(
    plane: &Plane,
    objects: &Mask,
    low: f32,
    high: f32,
    percent: f32,
) -> Result<Mask, MeasureError> {
    if plane.size() != objects.size() {
        return Err(rhizo_image::ImageError::InvalidImageSize(
            plane.cols(),
            plane.rows(),
            objects.cols(),
            objects.rows(),
        )
        .into());
    }

    let regions = label(objects, Connectivity::Eight)?;
    let mut inside = vec![0usize; regions.num_labels + 1];
    for (&l, &v) in regions.labels.as_slice().iter().zip(plane.as_slice()) {
        if l > 0 && in_circular_range(v, low, high) {
            inside[l as usize] += 1;
        }
    }

    let keep = regions
        .areas()
        .iter()
        .zip(inside.iter())
        .enumerate()
        .map(|(l, (&area, &n))| l > 0 && 100.0 * n as f32 / area as f32 >= percent)
        .collect::<Vec<_>>();

    Ok(regions.select(&keep))
}

/// A range filter on one band of the source raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorFilterParams {
    /// Colorspace of the band.
    #[serde(default)]
    pub colorspace: Colorspace,
    /// Band index in the colorspace.
    pub band: usize,
    /// Start of the range, in [0, 1].
    pub low: f32,
    /// End of the range, in [0, 1].
    pub high: f32,
    /// Minimum share of object pixels in the range, in percent.
    pub percent: f32,
}

impl ColorFilterParams {
    /// Whether a single value passes the range.
    pub(crate) fn contains(&self, v: f32) -> bool {
        in_circular_range(v, self.low, self.high)
    }
}

/// Keep the objects whose color falls in a range of one band.
pub fn color_filter(
    raster: &Raster,
    objects: &Mask,
    params: &ColorFilterParams,
) -> Result<Mask, MeasureError> {
    let plane = project_band(raster, params.colorspace, params.band)?;
    grayscale_range_filter(&plane, objects, params.low, params.high, params.percent)
}

/// Rule separating real objects from dirt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmallObjectMethod {
    /// Keep objects larger than `median + param * std` of all areas.
    #[default]
    Gaussian,
    /// Keep objects larger than `param` pixels.
    Threshold,
}

impl FromStr for SmallObjectMethod {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gaussian" => Ok(SmallObjectMethod::Gaussian),
            "threshold" => Ok(SmallObjectMethod::Threshold),
            _ => Err(MeasureError::UnknownMode(
                "small object removal".to_string(),
                s.to_string(),
            )),
        }
    }
}

/// Parameters of the small object removal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmallObjectParams {
    /// The removal rule.
    pub method: SmallObjectMethod,
    /// Standard deviations above the median area, or minimum area in pixels.
    pub param: f64,
}

impl Default for SmallObjectParams {
    fn default() -> Self {
        Self {
            method: SmallObjectMethod::Gaussian,
            param: 5.0,
        }
    }
}

/// Remove objects by area.
pub fn small_object_removal(
    objects: &Mask,
    params: &SmallObjectParams,
) -> Result<Mask, MeasureError> {
    let regions = label(objects, Connectivity::Eight)?;
    if regions.num_labels == 0 {
        return Ok(objects.clone());
    }

    let areas = regions.areas()[1..]
        .iter()
        .map(|&a| a as f64)
        .collect::<Vec<_>>();

    let cutoff = match params.method {
        SmallObjectMethod::Gaussian => {
            let n = areas.len() as f64;
            let mean = areas.iter().sum::<f64>() / n;
            let std = (areas.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n).sqrt();
            median(&mut areas.clone()) + params.param * std
        }
        SmallObjectMethod::Threshold => params.param,
    };
    log::debug!("small object cutoff: {cutoff} pixels");

    let keep = std::iter::once(false)
        .chain(areas.iter().map(|&a| a > cutoff))
        .collect::<Vec<_>>();
    Ok(regions.select(&keep))
}

/// Parameters of the noise smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseSmoothingParams {
    /// Element of the opening and closing.
    pub separation: Footprint,
    /// Element of the median smoothing.
    pub smoothing: Footprint,
    /// Minimum number of median rounds per pass.
    pub rounds: usize,
}

impl Default for NoiseSmoothingParams {
    fn default() -> Self {
        Self {
            separation: Footprint::Cross { size: 3 },
            // 5x5 without its corners
            smoothing: Footprint::Disk {
                radius: 5f32.sqrt(),
            },
            rounds: 2,
        }
    }
}

// passes before giving up on a fixed point
const MAX_SMOOTHING_PASSES: usize = 64;

/// Separate loosely touching objects and smooth their edges.
///
/// A pass is an opening then a closing with the separation element, followed
/// by `rounds` of binary median filtering with the smoothing element. Passes
/// are repeated until the mask no longer changes, so smoothing an already
/// smoothed mask leaves it as is.
pub fn noise_smoothing(
    objects: &Mask,
    params: &NoiseSmoothingParams,
) -> Result<Mask, MeasureError> {
    let separation = params.separation.kernel()?;
    let smoothing = params.smoothing.kernel()?;

    let mut current = objects.clone();
    let mut opened = Mask::from_size_val(objects.size(), false)?;
    let mut next = Mask::from_size_val(objects.size(), false)?;
    let mut tmp = Mask::from_size_val(objects.size(), false)?;

    for pass in 1..=MAX_SMOOTHING_PASSES {
        morphology::open(&current, &mut opened, &separation)?;
        morphology::close(&opened, &mut next, &separation)?;
        for _ in 0..params.rounds {
            morphology::binary_median(&next, &mut tmp, &smoothing)?;
            std::mem::swap(&mut next, &mut tmp);
        }

        if next == current {
            log::debug!("noise smoothing settled after {pass} passes");
            return Ok(current);
        }
        std::mem::swap(&mut current, &mut next);
    }

    log::warn!("noise smoothing did not settle after {MAX_SMOOTHING_PASSES} passes");
    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhizo_image::{Image, ImageSize};

    fn two_objects() -> Result<(Plane, Mask), MeasureError> {
        let size = ImageSize {
            width: 10,
            height: 4,
        };
        // left object bright, right object dark
        let plane = Image::from_fn(size, |_, c, _| if c < 5 { 0.9 } else { 0.1 })?;
        let mask = Image::from_fn(size, |r, c, _| (1..3).contains(&r) && c != 4)?;
        Ok((plane, mask))
    }

    #[test]
    fn test_grayscale_range_filter() -> Result<(), MeasureError> {
        let (plane, mask) = two_objects()?;
        let kept = grayscale_range_filter(&plane, &mask, 0.8, 1.0, 50.0)?;
        assert_eq!(kept.count(), 8);
        assert!(kept.get_pixel(0, 1, 0)?);
        assert!(!kept.get_pixel(9, 1, 0)?);

        // wrapping range keeps both
        let kept = grayscale_range_filter(&plane, &mask, 0.8, 0.2, 100.0)?;
        assert_eq!(kept, mask);
        Ok(())
    }

    #[test]
    fn test_small_object_removal() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 20,
            height: 20,
        };
        // one 6x6 block and three single pixels
        let mask = Image::from_fn(size, |r, c, _| {
            ((2..8).contains(&r) && (2..8).contains(&c)) || (r == 15 && c % 5 == 0 && c > 0)
        })?;

        let params = SmallObjectParams {
            method: SmallObjectMethod::Threshold,
            param: 1.0,
        };
        assert_eq!(small_object_removal(&mask, &params)?.count(), 36);

        let params = SmallObjectParams {
            method: SmallObjectMethod::Gaussian,
            param: 1.0,
        };
        assert_eq!(small_object_removal(&mask, &params)?.count(), 36);

        assert!(matches!(
            "otsu".parse::<SmallObjectMethod>(),
            Err(MeasureError::UnknownMode(..))
        ));
        let parsed: Result<SmallObjectParams, _> =
            serde_json::from_str(r#"{"method": "otsu", "param": 2}"#);
        assert!(parsed.is_err());
        Ok(())
    }

    #[test]
    fn test_noise_smoothing_removes_specks() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 20,
            height: 20,
        };
        let mask = Image::from_fn(size, |r, c, _| {
            ((5..15).contains(&r) && (5..15).contains(&c)) || (r == 2 && c == 2)
        })?;
        let smoothed = noise_smoothing(&mask, &NoiseSmoothingParams::default())?;
        assert!(!smoothed.get_pixel(2, 2, 0)?);
        assert!(smoothed.get_pixel(10, 10, 0)?);
        Ok(())
    }

    #[test]
    fn test_noise_smoothing_is_idempotent() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 40,
            height: 30,
        };
        let params = NoiseSmoothingParams::default();

        // an isolated rectangle whose corners get rounded off
        let rectangle = Image::from_fn(size, |r, c, _| (10..20).contains(&r) && (8..33).contains(&c))?;
        let once = noise_smoothing(&rectangle, &params)?;
        assert!(once.get_pixel(20, 15, 0)?);
        assert_eq!(noise_smoothing(&once, &params)?, once);
        Ok(())
    }
}
