//! Line intersect length estimation (Tennant, 1975).
//!
//! An independent estimate of total length to validate skeleton based
//! measurements: count the crossings of the objects with a square grid.

use rhizo_image::{ImageSize, Mask};
use rhizo_imgproc::label::{label, Connectivity};

use crate::error::MeasureError;

/// Offset of the first grid line: half a grid, halves rounded to even.
fn first_line(grid: usize) -> usize {
    let half = grid / 2;
    if grid % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    }
}

/// Draw a square grid.
///
/// Lines are `weight` pixels thick and repeat every `grid` pixels, starting
/// half a grid away from the top left corner.
///
/// # Errors
///
/// Returns an error if `grid` or `weight` is zero.
pub fn draw_fishnet(size: ImageSize, grid: usize, weight: usize) -> Result<Mask, MeasureError> {
    if grid == 0 || weight == 0 {
        return Err(MeasureError::InvalidParameter(
            "fishnet".to_string(),
            format!("grid {grid} and weight {weight} must be positive"),
        ));
    }

    let start = first_line(grid);
    let on_line = |i: usize| i >= start && (i - start) % grid < weight;
    Ok(Mask::from_fn(size, |r, c, _| on_line(r) || on_line(c))?)
}

/// Count the crossings of the objects with a grid of side `grid`.
///
/// Every 8-connected piece of the objects lying on the grid is one crossing.
pub fn tennant_intercepts(objects: &Mask, grid: usize) -> Result<usize, MeasureError> {
    let net = draw_fishnet(objects.size(), grid, 1)?;
    let crossings = objects.zip_map(&net, |&o, &n| o && n)?;
    Ok(label(&crossings, Connectivity::Eight)?.num_labels)
}

/// Length estimate from a count of crossings: `11/14 * intercepts * grid`.
pub fn tennant_length_estimate(intercepts: usize, grid: usize) -> f64 {
    11.0 / 14.0 * intercepts as f64 * grid as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_fishnet() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 20,
            height: 20,
        };
        let net = draw_fishnet(size, 10, 1)?;
        assert!(net.get_pixel(5, 0, 0)?);
        assert!(net.get_pixel(0, 15, 0)?);
        assert!(!net.get_pixel(0, 0, 0)?);
        assert_eq!(net.count(), 2 * 20 + 2 * 20 - 4);

        assert_eq!(first_line(5), 2);
        assert_eq!(first_line(7), 4);
        assert!(draw_fishnet(size, 0, 1).is_err());
        Ok(())
    }

    #[test]
    fn test_tennant_intercepts() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 40,
            height: 40,
        };
        // a horizontal line crossing the vertical grid lines at 5, 15, 25 and 35
        let line = Mask::from_fn(size, |r, c, _| r == 12 && (2..38).contains(&c))?;
        assert_eq!(tennant_intercepts(&line, 10)?, 4);
        approx::assert_relative_eq!(tennant_length_estimate(4, 10), 440.0 / 14.0);
        Ok(())
    }
}
