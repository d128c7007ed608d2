use std::sync::OnceLock;

use rhizo_image::{Image, ImageError, Mask};

use crate::distance_transform::squared_distance_transform;

const CENTER: usize = 1 << 4;

/// Bit of each 3x3 neighbor, row major, the center being bit 4.
fn neighborhood_code(data: &[bool], rows: usize, cols: usize, r: usize, c: usize) -> usize {
    let mut code = 0usize;
    let mut bit = 0usize;
    for dr in -1isize..=1 {
        for dc in -1isize..=1 {
            let rr = r as isize + dr;
            let cc = c as isize + dc;
            if rr >= 0
                && cc >= 0
                && (rr as usize) < rows
                && (cc as usize) < cols
                && data[rr as usize * cols + cc as usize]
            {
                code |= 1 << bit;
            }
            bit += 1;
        }
    }
    code
}

/// Number of 8-connected groups of set bits in a 3x3 pattern.
fn pattern_components(code: usize) -> usize {
    let set = |i: usize| code & (1 << i) != 0;
    let mut seen = [false; 9];
    let mut count = 0;
    for start in 0..9 {
        if !set(start) || seen[start] {
            continue;
        }
        count += 1;
        let mut stack = vec![start];
        seen[start] = true;
        while let Some(i) = stack.pop() {
            let (r, c) = ((i / 3) as isize, (i % 3) as isize);
            for dr in -1..=1 {
                for dc in -1..=1 {
                    let (rr, cc) = (r + dr, c + dc);
                    if !(0..3).contains(&rr) || !(0..3).contains(&cc) {
                        continue;
                    }
                    let j = (rr * 3 + cc) as usize;
                    if set(j) && !seen[j] {
                        seen[j] = true;
                        stack.push(j);
                    }
                }
            }
        }
    }
    count
}

/// Whether the center of a 3x3 pattern must be kept.
///
/// A center pixel is kept when removing it changes the number of connected
/// groups in its neighborhood, or when fewer than three pixels are set.
fn keep_table() -> &'static [bool; 512] {
    static TABLE: OnceLock<[bool; 512]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = [false; 512];
        for (code, keep) in table.iter_mut().enumerate() {
            if code & CENTER == 0 {
                continue;
            }
            let changes_topology =
                pattern_components(code) != pattern_components(code & !CENTER);
            let sparse = code.count_ones() < 3;
            *keep = changes_topology || sparse;
        }
        table
    })
}

/// Whether a pixel is strictly farther from the background than its 8 neighbors.
fn is_ridge_peak(squared: &[f64], rows: usize, cols: usize, r: usize, c: usize) -> bool {
    let center = squared[r * cols + c];
    (-1isize..=1).all(|dr| {
        (-1isize..=1).all(|dc| {
            let (rr, cc) = (r as isize + dr, c as isize + dc);
            if (dr == 0 && dc == 0) || rr < 0 || cc < 0 || rr as usize >= rows || cc as usize >= cols {
                return true;
            }
            squared[rr as usize * cols + cc as usize] < center
        })
    })
}

/// Medial axis of a binary mask.
///
/// Foreground pixels are visited once, from the closest to the boundary to the
/// farthest, and removed unless they are needed to preserve the local topology.
/// Strict local maxima of the distance are always kept.
/// Within a distance level, pixels with fewer foreground neighbors are visited
/// last so that the arms reaching into corners survive. Remaining ties are
/// broken by raster order, which makes the result deterministic.
///
/// # Arguments
///
/// * `src` - The input mask.
/// * `skeleton` - The output medial axis.
/// * `distance` - The euclidean distance of every foreground pixel to the background.
///
/// # Example
///
/// ```
/// use rhizo_image::{Image, ImageSize};
/// use rhizo_imgproc::medial_axis::medial_axis;
///
/// let mask = Image::<bool, 1>::from_fn(ImageSize { width: 12, height: 5 }, |r, c, _| {
///     (1..4).contains(&r) && (1..11).contains(&c)
/// }).unwrap();
///
/// let mut skeleton = Image::<bool, 1>::from_size_val(mask.size(), false).unwrap();
/// let mut distance = Image::<f32, 1>::from_size_val(mask.size(), 0.0).unwrap();
/// medial_axis(&mask, &mut skeleton, &mut distance).unwrap();
///
/// assert!(skeleton.get_pixel(5, 2, 0).unwrap());
/// assert!(!skeleton.get_pixel(5, 1, 0).unwrap());
/// assert_eq!(distance.get_pixel(5, 2, 0).unwrap(), 2.0);
/// ```
pub fn medial_axis(
    src: &Mask,
    skeleton: &mut Mask,
    distance: &mut Image<f32, 1>,
) -> Result<(), ImageError> {
    if src.size() != skeleton.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            skeleton.cols(),
            skeleton.rows(),
        ));
    }
    if src.size() != distance.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            distance.cols(),
            distance.rows(),
        ));
    }

    let (rows, cols) = (src.rows(), src.cols());
    let data = src.as_slice();

    let mut squared = Image::<f64, 1>::from_size_val(src.size(), 0.0)?;
    squared_distance_transform(src, &mut squared)?;
    let squared = squared.as_slice();

    // (squared distance, cornerness, raster index)
    let mut order = data
        .iter()
        .enumerate()
        .filter(|(_, &v)| v)
        .map(|(idx, _)| {
            let code = neighborhood_code(data, rows, cols, idx / cols, idx % cols);
            let cornerness = 9 - code.count_ones();
            (squared[idx] as u64, cornerness, idx)
        })
        .collect::<Vec<_>>();
    order.sort_unstable();

    let table = keep_table();
    let result = skeleton.as_slice_mut();
    result.copy_from_slice(data);
    for &(_, _, idx) in &order {
        let (r, c) = (idx / cols, idx % cols);
        let code = neighborhood_code(result, rows, cols, r, c) | CENTER;
        result[idx] = table[code] || is_ridge_peak(squared, rows, cols, r, c);
    }

    distance
        .as_slice_mut()
        .iter_mut()
        .zip(squared.iter())
        .for_each(|(d, &s)| *d = s.sqrt() as f32);

    Ok(())
}
