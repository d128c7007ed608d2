use rhizo_image::Image;
use serde::Serialize;

use crate::error::MeasureError;
use crate::skeleton::GeometryTable;

/// Totals of one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    /// Name of the image.
    pub image_name: String,
    /// Total length of all objects.
    pub length: f64,
    /// Number of objects.
    pub n_objects: usize,
    /// Length weighted mean diameter, NaN without any measurable object.
    pub mean_diameter: f64,
}

/// Length of one diameter class of one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiameterClassRow {
    /// Name of the image.
    pub image_name: String,
    /// Upper bound of the class.
    pub diameter_class: f64,
    /// Total length of the class.
    pub length: f64,
}

/// The summary of one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Summary {
    /// One row of totals.
    Total(SummaryRow),
    /// One row per diameter class.
    ByDiameter(Vec<DiameterClassRow>),
}

/// Sum the lengths of a geometry table.
///
/// The mean diameter is weighted by length and skips objects without a
/// diameter.
pub fn summarize_geometry(geometry: &GeometryTable, image_name: &str) -> SummaryRow {
    let objects = geometry.objects();
    let length = objects.iter().map(|row| row.length).sum::<f64>();

    let (weighted, weights) = objects
        .iter()
        .filter(|row| !row.diameter.is_nan())
        .fold((0.0, 0.0), |(wd, w), row| {
            (wd + row.length * row.diameter, w + row.length)
        });
    let mean_diameter = if weights > 0.0 {
        weighted / weights
    } else {
        f64::NAN
    };

    SummaryRow {
        image_name: image_name.to_string(),
        length,
        n_objects: geometry.num_objects(),
        mean_diameter,
    }
}

/// Split the skeleton length of an image into diameter classes.
///
/// Diameters are truncated to integers and a pixel falls in the class of the
/// largest bound not above it, the bounds being 0 followed by `breakpoints`.
/// Every class is labeled by its upper bound, the last one by the largest
/// truncated diameter plus one. Pixels without diameter go to the first
/// class, so that the class lengths always add up to the total length.
///
/// Returns the rows together with a raster holding `class + 1` on the
/// skeleton and 0 elsewhere.
///
/// # Errors
///
/// Returns an error if the breakpoints are not ascending and non-negative or
/// the rasters differ in size.
pub fn bin_by_diameter(
    length: &Image<f64, 1>,
    diameter: &Image<f64, 1>,
    breakpoints: &[f64],
    image_name: &str,
) -> Result<(Vec<DiameterClassRow>, Image<u32, 1>), MeasureError> {
    if breakpoints.iter().any(|&b| !(b >= 0.0)) || breakpoints.windows(2).any(|w| w[0] > w[1]) {
        return Err(MeasureError::InvalidParameter(
            "breakpoints".to_string(),
            format!("{breakpoints:?} must be non-negative and ascending"),
        ));
    }

    if length.size() != diameter.size() {
        return Err(rhizo_image::ImageError::InvalidImageSize(
            length.cols(),
            length.rows(),
            diameter.cols(),
            diameter.rows(),
        )
        .into());
    }

    let bounds = std::iter::once(0.0)
        .chain(breakpoints.iter().copied())
        .collect::<Vec<_>>();
    let class_of = |d: f64| bounds.iter().rposition(|&b| b <= d.trunc()).unwrap_or(0);

    let classes = diameter.map(|&d| if d > 0.0 { class_of(d) as u32 + 1 } else { 0 });

    let mut lengths = vec![0.0; bounds.len()];
    for (&c, &l) in classes.as_slice().iter().zip(length.as_slice()) {
        lengths[c.saturating_sub(1) as usize] += l;
    }

    let top = diameter
        .as_slice()
        .iter()
        .fold(0.0f64, |m, &d| m.max(d.trunc()))
        + 1.0;
    let rows = lengths
        .into_iter()
        .enumerate()
        .map(|(i, length)| DiameterClassRow {
            image_name: image_name.to_string(),
            diameter_class: bounds.get(i + 1).copied().unwrap_or(top),
            length,
        })
        .collect();

    Ok((rows, classes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::{ObjectBundle, SkeletonParams};
    use rhizo_image::ImageSize;

    #[test]
    fn test_summarize_geometry() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 40,
            height: 20,
        };
        let mask = Image::from_fn(size, |r, c, _| {
            ((2..5).contains(&r) && (2..38).contains(&c)) || ((10..17).contains(&r) && (2..38).contains(&c))
        })?;
        let bundle = ObjectBundle::from_mask(&mask, &SkeletonParams::default())?;
        let row = summarize_geometry(bundle.geometry(), "bars.png");

        assert_eq!(row.image_name, "bars.png");
        assert_eq!(row.n_objects, 2);
        let rows = bundle.geometry().objects();
        approx::assert_relative_eq!(row.length, rows[0].length + rows[1].length);
        assert!(row.mean_diameter > rows[0].diameter.min(rows[1].diameter));
        assert!(row.mean_diameter < rows[0].diameter.max(rows[1].diameter));
        Ok(())
    }

    #[test]
    fn test_summarize_empty() -> Result<(), MeasureError> {
        let mask = Image::from_size_val(ImageSize { width: 4, height: 4 }, false)?;
        let bundle = ObjectBundle::from_mask(&mask, &SkeletonParams::default())?;
        let row = summarize_geometry(bundle.geometry(), "empty");
        assert_eq!(row.n_objects, 0);
        assert_eq!(row.length, 0.0);
        assert!(row.mean_diameter.is_nan());
        Ok(())
    }

    #[test]
    fn test_bin_by_diameter() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 4,
            height: 1,
        };
        let length = Image::new(size, vec![1.0, 2.0, 3.0, 4.0])?;
        let diameter = Image::new(size, vec![0.0, 1.5, 4.0, 9.9])?;

        let (rows, classes) = bin_by_diameter(&length, &diameter, &[2.0, 5.0], "img")?;
        assert_eq!(classes.as_slice(), &[0, 1, 2, 3]);
        let labels = rows.iter().map(|r| r.diameter_class).collect::<Vec<_>>();
        assert_eq!(labels, vec![2.0, 5.0, 10.0]);
        let lengths = rows.iter().map(|r| r.length).collect::<Vec<_>>();
        assert_eq!(lengths, vec![3.0, 3.0, 4.0]);

        assert!(bin_by_diameter(&length, &diameter, &[5.0, 2.0], "img").is_err());
        Ok(())
    }
}
