use rhizo_image::Mask;
use rhizo_imgproc::label::{label, Connectivity};
use serde::{Deserialize, Serialize};

use crate::error::MeasureError;
use crate::skeleton::{GeometryTable, ObjectBundle};
use crate::stats::percentile;

/// Parameters of the diameter filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiameterParams {
    /// Objects whose upper percentile diameter reaches this are removed.
    pub max_diameter: f64,
    /// Objects whose lower percentile diameter does not exceed this are removed.
    pub min_diameter: f64,
    /// Percentile of the ceiling test, in [0, 100].
    pub max_percentile: f64,
    /// Percentile of the floor test, which only runs when set.
    pub min_percentile: Option<f64>,
    /// Also remove single skeleton pixels outside of the diameter range.
    pub pixel_level: bool,
}

impl Default for DiameterParams {
    fn default() -> Self {
        Self {
            max_diameter: 1000.0,
            min_diameter: -1.0,
            max_percentile: 100.0,
            min_percentile: None,
            pixel_level: false,
        }
    }
}

impl DiameterParams {
    /// Check that the percentiles lie in [0, 100].
    pub fn validate(&self) -> Result<(), MeasureError> {
        for q in std::iter::once(self.max_percentile).chain(self.min_percentile) {
            if !(0.0..=100.0).contains(&q) {
                return Err(MeasureError::InvalidParameter(
                    "percentile".to_string(),
                    format!("{q} is outside [0, 100]"),
                ));
            }
        }
        Ok(())
    }
}

/// Remove objects that are too thick or too thin.
///
/// The diameters of the skeleton pixels of every object are reduced to a
/// percentile. An object is removed when its `max_percentile` diameter is at
/// least `max_diameter`, or, when `min_percentile` is set, when its
/// `min_percentile` diameter is at most `min_diameter`. With `pixel_level`,
/// skeleton pixels of the kept objects outside `[min_diameter, max_diameter]`
/// are cleared as well. Objects left without skeleton are removed.
pub fn diameter_filter(
    bundle: &ObjectBundle,
    params: &DiameterParams,
) -> Result<ObjectBundle, MeasureError> {
    params.validate()?;

    let regions = bundle.regions();
    let mut diameters = vec![Vec::new(); regions.num_labels + 1];
    for (&l, &d) in regions
        .labels
        .as_slice()
        .iter()
        .zip(bundle.diameter().as_slice())
    {
        if l > 0 && d > 0.0 {
            diameters[l as usize].push(d);
        }
    }

    let in_range = |d: f64| d >= params.min_diameter && d <= params.max_diameter;

    let keep = diameters
        .iter_mut()
        .enumerate()
        .map(|(l, values)| {
            if l == 0 || values.is_empty() {
                return false;
            }
            let mut pass = percentile(values, params.max_percentile) < params.max_diameter;
            if let Some(q) = params.min_percentile {
                pass &= percentile(values, q) > params.min_diameter;
            }
            if params.pixel_level {
                pass &= values.iter().any(|&d| in_range(d));
            }
            pass
        })
        .collect::<Vec<_>>();

    log::debug!(
        "diameter filter kept {} of {} objects",
        keep.iter().filter(|&&k| k).count(),
        regions.num_labels
    );

    let objects = regions.select(&keep);
    if !params.pixel_level {
        return ObjectBundle::from_rasters(objects, bundle.length(), bundle.diameter());
    }

    let trimmed = |v: &f64, d: &f64| if *d > 0.0 && !in_range(*d) { 0.0 } else { *v };
    let length = bundle.length().zip_map(bundle.diameter(), trimmed)?;
    let diameter = bundle.diameter().zip_map(bundle.diameter(), trimmed)?;
    ObjectBundle::from_rasters(objects, &length, &diameter)
}

/// Parameters of the length to width filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthWidthParams {
    /// Minimum ratio of length to mean diameter.
    pub threshold: f64,
}

impl Default for LengthWidthParams {
    fn default() -> Self {
        Self { threshold: 5.0 }
    }
}

// keeps degenerate objects from dividing by zero
const RATIO_EPSILON: f64 = 1e-5;

/// Check that a geometry table has one row per label of `objects`, plus the
/// background row.
fn check_geometry(geometry: &GeometryTable, objects: &Mask) -> Result<(), MeasureError> {
    let num_labels = label(objects, Connectivity::Eight)?.num_labels;
    if geometry.len() != num_labels + 1 {
        return Err(MeasureError::GeometryMismatch(geometry.len(), num_labels));
    }
    Ok(())
}

/// Keep the objects that are long compared to their width.
///
/// # Errors
///
/// Returns [`MeasureError::GeometryMismatch`] when the geometry table does
/// not describe the labels of the objects.
pub fn length_width_filter(
    bundle: &ObjectBundle,
    params: &LengthWidthParams,
) -> Result<ObjectBundle, MeasureError> {
    let geometry = bundle.geometry();
    check_geometry(geometry, bundle.objects())?;

    let keep = geometry
        .rows()
        .iter()
        .enumerate()
        .map(|(l, row)| l > 0 && row.length / (row.diameter + RATIO_EPSILON) > params.threshold)
        .collect::<Vec<_>>();

    bundle.select(&keep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::SkeletonParams;
    use rhizo_image::{Image, ImageSize};

    // a bar 3 pixels thick above a bar 7 pixels thick
    fn bars() -> Result<ObjectBundle, MeasureError> {
        let size = ImageSize {
            width: 60,
            height: 20,
        };
        let mask = Image::from_fn(size, |r, c, _| {
            (5..55).contains(&c) && ((2..5).contains(&r) || (9..16).contains(&r))
        })?;
        ObjectBundle::from_mask(&mask, &SkeletonParams::default())
    }

    #[test]
    fn test_diameter_ceiling_and_floor() -> Result<(), MeasureError> {
        let bundle = bars()?;
        assert_eq!(bundle.geometry().num_objects(), 2);

        let ceiling = DiameterParams {
            max_diameter: 6.0,
            ..Default::default()
        };
        let thin = diameter_filter(&bundle, &ceiling)?;
        assert_eq!(thin.geometry().num_objects(), 1);
        assert!(thin.objects().get_pixel(30, 3, 0)?);

        let floor = DiameterParams {
            min_diameter: 6.0,
            min_percentile: Some(50.0),
            ..Default::default()
        };
        let thick = diameter_filter(&bundle, &floor)?;
        assert_eq!(thick.geometry().num_objects(), 1);
        assert!(thick.objects().get_pixel(30, 12, 0)?);
        Ok(())
    }

    #[test]
    fn test_diameter_pixel_level() -> Result<(), MeasureError> {
        let bundle = bars()?;
        let params = DiameterParams {
            max_diameter: 6.0,
            max_percentile: 0.0,
            pixel_level: true,
            ..Default::default()
        };
        let trimmed = diameter_filter(&bundle, &params)?;
        assert!(trimmed.diameter().as_slice().iter().all(|&d| d <= 6.0));
        assert_eq!(
            trimmed.geometry().len(),
            label(trimmed.objects(), Connectivity::Eight)?.num_labels + 1
        );
        Ok(())
    }

    #[test]
    fn test_length_width_filter() -> Result<(), MeasureError> {
        let bundle = bars()?;
        let all = length_width_filter(&bundle, &LengthWidthParams { threshold: 1.0 })?;
        assert_eq!(all.geometry().num_objects(), 2);

        // the thin bar is about 50 long and 4 wide, the thick one 8 wide
        let thin = length_width_filter(&bundle, &LengthWidthParams { threshold: 9.0 })?;
        assert_eq!(thin.geometry().num_objects(), 1);
        assert!(thin.objects().get_pixel(30, 3, 0)?);

        let none = length_width_filter(&bundle, &LengthWidthParams { threshold: 1e6 })?;
        assert_eq!(none.geometry().len(), 1);
        assert_eq!(none.objects().count(), 0);
        Ok(())
    }

    #[test]
    fn test_stale_geometry_is_rejected() -> Result<(), MeasureError> {
        let bundle = bars()?;
        check_geometry(bundle.geometry(), bundle.objects())?;

        // a table of two objects against a mask holding only one of them
        let thin = Image::from_fn(bundle.objects().size(), |r, c, _| {
            (5..55).contains(&c) && (2..5).contains(&r)
        })?;
        assert!(matches!(
            check_geometry(bundle.geometry(), &thin),
            Err(MeasureError::GeometryMismatch(3, 1))
        ));
        Ok(())
    }

    #[test]
    fn test_percentile_validation() {
        let params = DiameterParams {
            min_percentile: Some(120.0),
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }
}
