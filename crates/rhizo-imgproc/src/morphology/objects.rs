use rhizo_image::{ImageError, Mask};

use crate::label::{label, Connectivity};

/// Remove connected regions smaller than `min_size` pixels.
///
/// # Arguments
///
/// * `src` - The input mask.
/// * `dst` - The output mask, same size as the input.
/// * `min_size` - Regions with fewer pixels are removed.
/// * `connectivity` - Adjacency used to form regions.
pub fn remove_small_objects(
    src: &Mask,
    dst: &mut Mask,
    min_size: usize,
    connectivity: Connectivity,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let regions = label(src, connectivity)?;
    let keep = regions
        .areas()
        .iter()
        .enumerate()
        .map(|(l, &a)| l > 0 && a >= min_size)
        .collect::<Vec<_>>();

    *dst = regions.select(&keep);
    Ok(())
}

/// Fill enclosed holes smaller than `area_threshold` pixels.
///
/// A hole is a 4-connected background region that does not touch the image
/// border.
pub fn remove_small_holes(
    src: &Mask,
    dst: &mut Mask,
    area_threshold: usize,
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let background = src.map(|&v| !v);
    let holes = label(&background, Connectivity::Four)?;
    let areas = holes.areas();

    let (rows, cols) = (src.rows(), src.cols());
    let mut touches_border = vec![false; holes.num_labels + 1];
    for (idx, &l) in holes.labels.as_slice().iter().enumerate() {
        let (r, c) = (idx / cols, idx % cols);
        if r == 0 || c == 0 || r + 1 == rows || c + 1 == cols {
            touches_border[l as usize] = true;
        }
    }

    *dst = src.zip_map(&holes.labels, |&v, &l| {
        v || (l > 0 && !touches_border[l as usize] && areas[l as usize] < area_threshold)
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhizo_image::{Image, ImageSize};

    #[test]
    fn test_remove_small_objects() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 10,
            height: 10,
        };
        let src = Image::from_fn(size, |r, c, _| {
            (r < 3 && c < 3) || (r == 8 && c == 8) || (r == 7 && c == 7)
        })?;
        let mut dst = src.clone();

        remove_small_objects(&src, &mut dst, 3, Connectivity::Eight)?;
        assert_eq!(dst.count(), 9);

        // the diagonal pair is one region under 8-connectivity only
        remove_small_objects(&src, &mut dst, 2, Connectivity::Eight)?;
        assert_eq!(dst.count(), 11);
        remove_small_objects(&src, &mut dst, 2, Connectivity::Four)?;
        assert_eq!(dst.count(), 9);

        Ok(())
    }

    #[test]
    fn test_remove_small_holes() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 12,
            height: 12,
        };
        // ring with a 2x2 hole plus a notch open to the border
        let src = Image::from_fn(size, |r, c, _| {
            let ring = (2..8).contains(&r) && (2..8).contains(&c);
            let hole = (4..6).contains(&r) && (4..6).contains(&c);
            let notch = r == 11 && c == 5;
            (ring && !hole) || (r >= 10 && !notch)
        })?;
        let mut dst = src.clone();

        remove_small_holes(&src, &mut dst, 5)?;
        assert!(dst.get_pixel(4, 4, 0)?);
        assert!(!dst.get_pixel(5, 11, 0)?);

        remove_small_holes(&src, &mut dst, 4)?;
        assert!(!dst.get_pixel(4, 4, 0)?);

        Ok(())
    }
}
