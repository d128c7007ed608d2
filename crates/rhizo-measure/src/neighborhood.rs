use rayon::prelude::*;
use rhizo_image::{ImageSize, Mask};
use rhizo_imgproc::label::{label, Connectivity};
use rhizo_imgproc::morphology::{self, Kernel, KernelShape};
use serde::{Deserialize, Serialize};

use crate::bands::{project_band, Colorspace};
use crate::error::MeasureError;
use crate::raster::Raster;
use crate::stats::median;

/// Parameters of the neighborhood filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighborhoodParams {
    /// Largest accepted difference between opposite sides.
    pub max_diff: f64,
    /// Distance kept free between an object and its neighborhoods.
    pub gap: usize,
    /// Depth of the neighborhoods.
    pub depth: usize,
    /// Colorspace of the compared band.
    pub colorspace: Colorspace,
    /// The compared band.
    pub band: usize,
}

impl Default for NeighborhoodParams {
    fn default() -> Self {
        Self {
            max_diff: 0.1,
            gap: 4,
            depth: 4,
            colorspace: Colorspace::Rgb,
            band: 2,
        }
    }
}

// left, right, up, down
const DIRECTIONS: [(isize, isize); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Grow a mask towards `direction`, two pixels per iteration.
fn grow(mask: &Mask, direction: (isize, isize), iterations: usize) -> Result<Mask, MeasureError> {
    let (rows, cols) = (mask.rows() as isize, mask.cols() as isize);
    let mut out = mask.clone();
    for _ in 0..iterations {
        let data = out.as_slice();
        let next = Mask::from_fn(out.size(), |r, c, _| {
            (0..3).any(|step| {
                let rr = r as isize - step * direction.0;
                let cc = c as isize - step * direction.1;
                rr >= 0 && cc >= 0 && rr < rows && cc < cols && data[(rr * cols + cc) as usize]
            })
        })?;
        out = next;
    }
    Ok(out)
}

/// Median of the plane over the largest 4-connected parts of a neighborhood.
///
/// Ties in area are pooled. NaN for an empty neighborhood.
fn dominant_median(region: &Mask, plane: &[f32]) -> Result<f64, MeasureError> {
    let parts = label(region, Connectivity::Four)?;
    let areas = parts.areas();
    let Some(&largest) = areas[1..].iter().max() else {
        return Ok(f64::NAN);
    };

    let mut values = parts
        .labels
        .as_slice()
        .iter()
        .zip(plane)
        .filter(|(&l, _)| l > 0 && areas[l as usize] == largest)
        .map(|(_, &v)| v as f64)
        .collect::<Vec<_>>();
    Ok(median(&mut values))
}

/// Remove objects whose opposite sides have a different background.
///
/// A thin filament lies on a uniform background, whereas the border of a
/// larger particle has a different brightness on each side. For every object
/// four neighborhoods are grown to its left, right, top and bottom, beyond a
/// `gap` around it. The object is removed when the medians of the selected
/// band over the left and right, or top and bottom, neighborhoods differ by
/// more than `max_diff`. Objects with an empty neighborhood are kept.
pub fn neighborhood_filter(
    raster: &Raster,
    objects: &Mask,
    params: &NeighborhoodParams,
) -> Result<Mask, MeasureError> {
    let plane = project_band(raster, params.colorspace, params.band)?;
    if plane.size() != objects.size() {
        return Err(rhizo_image::ImageError::InvalidImageSize(
            plane.cols(),
            plane.rows(),
            objects.cols(),
            objects.rows(),
        )
        .into());
    }

    let iterations = (params.depth + 2) / 2;
    let margin = params.gap + 2 * iterations;
    let gap = Kernel::new(KernelShape::Disk {
        radius: params.gap as f32,
    });

    let regions = label(objects, Connectivity::Eight)?;
    let (rows, cols) = (objects.rows(), objects.cols());

    let uniform = regions
        .bounding_boxes()
        .par_iter()
        .enumerate()
        .map(|(i, bbox)| -> Result<bool, MeasureError> {
            let window = bbox.expand(margin, rows, cols);
            let size = ImageSize {
                width: window.width(),
                height: window.height(),
            };
            let label = i as u32 + 1;
            let object = regions
                .labels
                .crop(window.min_col, window.min_row, size)?
                .map(|&l| l == label);
            let values = plane.crop(window.min_col, window.min_row, size)?;

            let mut near = Mask::from_size_val(size, false)?;
            morphology::dilate(&object, &mut near, &gap)?;

            let mut medians = [0.0; 4];
            for (m, &direction) in medians.iter_mut().zip(DIRECTIONS.iter()) {
                let side = grow(&object, direction, iterations)?.zip_map(&near, |&g, &n| g && !n)?;
                *m = dominant_median(&side, values.as_slice())?;
            }

            let [left, right, up, down] = medians;
            // NaN differences compare false and keep the object
            Ok(!((left - right).abs() > params.max_diff || (up - down).abs() > params.max_diff))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let keep = std::iter::once(false).chain(uniform).collect::<Vec<_>>();
    Ok(regions.select(&keep))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhizo_image::Image;

    fn params() -> NeighborhoodParams {
        NeighborhoodParams {
            colorspace: Colorspace::Gray,
            band: 0,
            ..Default::default()
        }
    }

    #[test]
    fn test_grow_left() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 8,
            height: 1,
        };
        let mask = Image::from_fn(size, |_, c, _| c == 6)?;
        let grown = grow(&mask, (0, -1), 2)?;
        assert_eq!(
            grown.as_slice(),
            &[false, false, true, true, true, true, true, false]
        );
        Ok(())
    }

    #[test]
    fn test_neighborhood_filter() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 40,
            height: 40,
        };
        let filament = Image::from_fn(size, |r, c, _| (5..35).contains(&r) && (19..21).contains(&c))?;

        let uniform = Raster::Mono(Image::from_size_val(size, 0.5)?);
        assert_eq!(neighborhood_filter(&uniform, &filament, &params())?, filament);

        // the filament sits on a step between two backgrounds
        let step = Raster::Mono(Image::from_fn(size, |_, c, _| if c < 20 { 0.2 } else { 0.9 })?);
        assert_eq!(neighborhood_filter(&step, &filament, &params())?.count(), 0);

        assert!(matches!(
            neighborhood_filter(&step, &filament, &NeighborhoodParams::default()),
            Err(MeasureError::ColorspaceOnMonoImage(_))
        ));
        Ok(())
    }
}
