use rayon::prelude::*;

use crate::label::{BoundingBox, LabeledRegions};

/// Shape descriptors of one labeled region.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionProperties {
    /// The label of the region.
    pub label: u32,
    /// Number of pixels.
    pub area: usize,
    /// Bounding box of the region.
    pub bbox: BoundingBox,
    /// Centroid as `(row, col)`.
    pub centroid: (f64, f64),
    /// Length of the major axis of the ellipse with the same second moments.
    pub major_axis_length: f64,
    /// Length of the minor axis of the ellipse with the same second moments.
    pub minor_axis_length: f64,
    /// Eccentricity of that ellipse, 0 for a circle and towards 1 when elongated.
    pub eccentricity: f64,
    /// Number of pixels whose centers lie in the convex hull of the region.
    pub convex_area: usize,
    /// Ratio of `area` to `convex_area`.
    pub solidity: f64,
}

fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Convex hull of a point set in counter-clockwise order (monotone chain).
fn convex_hull(mut points: Vec<(f64, f64)>) -> Vec<(f64, f64)> {
    points.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    points.dedup();
    if points.len() < 3 {
        return points;
    }

    let mut hull: Vec<(f64, f64)> = Vec::with_capacity(2 * points.len());
    for &p in points.iter() {
        while hull.len() >= 2 && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in points.iter().rev().skip(1) {
        while hull.len() >= lower_len && cross(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0
        {
            hull.pop();
        }
        hull.push(p);
    }
    hull.pop();
    hull
}

/// Count the pixel centers of a bounding box lying inside or on a convex polygon.
fn count_inside(hull: &[(f64, f64)], bbox: &BoundingBox) -> usize {
    const EPS: f64 = 1e-9;
    let n = hull.len();
    let mut count = 0;
    for r in bbox.min_row..bbox.max_row {
        for c in bbox.min_col..bbox.max_col {
            let p = (r as f64, c as f64);
            let inside = (0..n).all(|i| cross(hull[i], hull[(i + 1) % n], p) >= -EPS);
            if inside {
                count += 1;
            }
        }
    }
    count
}

fn describe(label: u32, pixels: &[(usize, usize)], bbox: BoundingBox) -> RegionProperties {
    let area = pixels.len();
    let n = area as f64;

    let (sr, sc) = pixels
        .iter()
        .fold((0.0, 0.0), |(a, b), &(r, c)| (a + r as f64, b + c as f64));
    let centroid = (sr / n, sc / n);

    // central second moments normalized by the area
    let (mut mu20, mut mu02, mut mu11) = (0.0, 0.0, 0.0);
    for &(r, c) in pixels {
        let dr = r as f64 - centroid.0;
        let dc = c as f64 - centroid.1;
        mu20 += dr * dr;
        mu02 += dc * dc;
        mu11 += dr * dc;
    }
    let (a, b, d) = (mu20 / n, mu11 / n, mu02 / n);
    let half_trace = (a + d) / 2.0;
    let root = (((a - d) / 2.0).powi(2) + b * b).sqrt();
    let l1 = half_trace + root;
    let l2 = (half_trace - root).max(0.0);

    let eccentricity = if l1 == 0.0 {
        0.0
    } else {
        (1.0 - l2 / l1).max(0.0).sqrt()
    };

    // hull over the pixel corners of the row extremes
    let mut extremes = vec![(usize::MAX, 0usize); bbox.height()];
    for &(r, c) in pixels {
        let e = &mut extremes[r - bbox.min_row];
        e.0 = e.0.min(c);
        e.1 = e.1.max(c);
    }
    let mut corners = Vec::with_capacity(8 * extremes.len());
    for (i, &(lo, hi)) in extremes.iter().enumerate() {
        if lo == usize::MAX {
            continue;
        }
        let r = (bbox.min_row + i) as f64;
        for c in [lo as f64, hi as f64] {
            corners.push((r - 0.5, c - 0.5));
            corners.push((r - 0.5, c + 0.5));
            corners.push((r + 0.5, c - 0.5));
            corners.push((r + 0.5, c + 0.5));
        }
    }
    let hull = convex_hull(corners);
    let convex_area = count_inside(&hull, &bbox).max(area);

    RegionProperties {
        label,
        area,
        bbox,
        centroid,
        major_axis_length: 4.0 * l1.sqrt(),
        minor_axis_length: 4.0 * l2.sqrt(),
        eccentricity,
        convex_area,
        solidity: area as f64 / convex_area as f64,
    }
}

/// Measure the shape descriptors of every labeled region.
///
/// The result is ordered by label.
pub fn regionprops(regions: &LabeledRegions) -> Vec<RegionProperties> {
    let cols = regions.labels.cols();
    let mut pixels = vec![Vec::new(); regions.num_labels];
    for (idx, &l) in regions.labels.as_slice().iter().enumerate() {
        if l > 0 {
            pixels[l as usize - 1].push((idx / cols, idx % cols));
        }
    }

    let boxes = regions.bounding_boxes();
    pixels
        .par_iter()
        .zip(boxes.par_iter())
        .enumerate()
        .map(|(i, (px, bbox))| describe(i as u32 + 1, px, *bbox))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::{label, Connectivity};
    use rhizo_image::{Image, ImageError, ImageSize};

    #[test]
    fn test_convex_hull_square() {
        let hull = convex_hull(vec![(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0), (0.5, 0.5)]);
        assert_eq!(hull.len(), 4);
    }

    #[test]
    fn test_regionprops_square_and_line() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 30,
            height: 12,
        };
        let mask = Image::from_fn(size, |r, c, _| {
            ((1..6).contains(&r) && (1..6).contains(&c)) || (r == 9 && (2..28).contains(&c))
        })?;
        let regions = label(&mask, Connectivity::Eight)?;
        let props = regionprops(&regions);
        assert_eq!(props.len(), 2);

        let square = &props[0];
        assert_eq!(square.area, 25);
        assert_eq!(square.centroid, (3.0, 3.0));
        approx::assert_abs_diff_eq!(square.eccentricity, 0.0, epsilon = 1e-9);
        assert_eq!(square.convex_area, 25);
        approx::assert_relative_eq!(square.solidity, 1.0);

        let line = &props[1];
        assert_eq!(line.area, 26);
        approx::assert_relative_eq!(line.eccentricity, 1.0);
        // 4 * sqrt((n^2 - 1) / 12)
        approx::assert_relative_eq!(
            line.major_axis_length,
            4.0 * ((26.0f64 * 26.0 - 1.0) / 12.0).sqrt(),
            epsilon = 1e-9
        );
        Ok(())
    }

    #[test]
    fn test_regionprops_l_shape_solidity() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 12,
            height: 12,
        };
        // L shape: vertical and horizontal arms of width 2
        let mask = Image::from_fn(size, |r, c, _| {
            ((1..11).contains(&r) && (1..3).contains(&c))
                || ((9..11).contains(&r) && (1..11).contains(&c))
        })?;
        let regions = label(&mask, Connectivity::Eight)?;
        let props = regionprops(&regions);
        assert_eq!(props.len(), 1);
        assert_eq!(props[0].area, 36);
        assert!(props[0].solidity < 0.75);
        assert!(props[0].convex_area > props[0].area);
        Ok(())
    }
}
