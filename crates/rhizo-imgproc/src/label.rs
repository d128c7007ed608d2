use rhizo_image::{Image, ImageError, Mask};

/// Pixel adjacency used to group foreground pixels into regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connectivity {
    /// Edge neighbors only.
    Four,
    /// Edge and corner neighbors.
    #[default]
    Eight,
}

impl Connectivity {
    /// Offsets `(dr, dc)` of the neighbors that precede a pixel in raster order.
    fn backward_offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(0, -1), (-1, 0)],
            Connectivity::Eight => &[(0, -1), (-1, -1), (-1, 0), (-1, 1)],
        }
    }

    /// Offsets `(dr, dc)` of every neighbor of a pixel.
    pub fn offsets(&self) -> &'static [(isize, isize)] {
        match self {
            Connectivity::Four => &[(-1, 0), (0, -1), (0, 1), (1, 0)],
            Connectivity::Eight => &[
                (-1, -1),
                (-1, 0),
                (-1, 1),
                (0, -1),
                (0, 1),
                (1, -1),
                (1, 0),
                (1, 1),
            ],
        }
    }
}

/// A disjoint-set (union-find) data structure.
pub struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    /// Creates a new UnionFind structure with length `len`.
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    /// Returns the representative (root) of the set containing `id`, with path compression.
    pub fn get_representative(&mut self, mut id: usize) -> usize {
        let mut root = id;

        // Chase down the root
        while self.parent[root] != root {
            root = self.parent[root];
        }

        // Go back and collapse the tree
        while self.parent[id] != root {
            let tmp = self.parent[id];
            self.parent[id] = root;
            id = tmp;
        }

        root
    }

    /// Unites the sets containing `aid` and `bid`, returning the representative of the resulting set.
    pub fn connect(&mut self, aid: usize, bid: usize) -> usize {
        let aroot = self.get_representative(aid);
        let broot = self.get_representative(bid);

        if aroot == broot {
            return aroot;
        }

        let asize = self.size[aroot];
        let bsize = self.size[broot];

        if asize > bsize {
            self.parent[broot] = aroot;
            self.size[aroot] += bsize;
            aroot
        } else {
            self.parent[aroot] = broot;
            self.size[broot] += asize;
            broot
        }
    }

    /// Returns the number of elements in the UnionFind structure.
    pub fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the structure holds no elements.
    pub fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }
}

/// Axis aligned bounding box of a region, end coordinates exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    /// First row.
    pub min_row: usize,
    /// First column.
    pub min_col: usize,
    /// One past the last row.
    pub max_row: usize,
    /// One past the last column.
    pub max_col: usize,
}

impl BoundingBox {
    /// Height of the box in pixels.
    pub fn height(&self) -> usize {
        self.max_row - self.min_row
    }

    /// Width of the box in pixels.
    pub fn width(&self) -> usize {
        self.max_col - self.min_col
    }

    /// Grow the box by `margin` pixels on every side, clipped to `rows x cols`.
    pub fn expand(&self, margin: usize, rows: usize, cols: usize) -> Self {
        Self {
            min_row: self.min_row.saturating_sub(margin),
            min_col: self.min_col.saturating_sub(margin),
            max_row: (self.max_row + margin).min(rows),
            max_col: (self.max_col + margin).min(cols),
        }
    }
}

/// A label image where 0 is background and `1..=num_labels` identify regions.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRegions {
    /// The label of every pixel.
    pub labels: Image<u32, 1>,
    /// The number of regions.
    pub num_labels: usize,
}

impl LabeledRegions {
    /// Pixel count of every region, indexed by label (entry 0 is the background).
    pub fn areas(&self) -> Vec<usize> {
        let mut areas = vec![0usize; self.num_labels + 1];
        for &l in self.labels.as_slice() {
            areas[l as usize] += 1;
        }
        areas
    }

    /// Bounding box of every region, indexed by `label - 1`.
    pub fn bounding_boxes(&self) -> Vec<BoundingBox> {
        let mut boxes = vec![
            BoundingBox {
                min_row: usize::MAX,
                min_col: usize::MAX,
                max_row: 0,
                max_col: 0,
            };
            self.num_labels
        ];

        let cols = self.labels.cols();
        for (idx, &l) in self.labels.as_slice().iter().enumerate() {
            if l == 0 {
                continue;
            }
            let (r, c) = (idx / cols, idx % cols);
            let b = &mut boxes[l as usize - 1];
            b.min_row = b.min_row.min(r);
            b.min_col = b.min_col.min(c);
            b.max_row = b.max_row.max(r + 1);
            b.max_col = b.max_col.max(c + 1);
        }

        boxes
    }

    /// Mask of the pixels whose region is flagged in `keep`, indexed by label.
    ///
    /// Labels beyond the end of `keep` are dropped.
    pub fn select(&self, keep: &[bool]) -> Mask {
        self.labels
            .map(|&l| l != 0 && keep.get(l as usize).copied().unwrap_or(false))
    }

    /// Mask of a single region.
    pub fn region(&self, label: u32) -> Mask {
        self.labels.map(|&l| l != 0 && l == label)
    }
}

/// Label the connected regions of a mask.
///
/// Labels are assigned in raster-scan order of the first pixel of each
/// region, starting at 1.
///
/// # Example
///
/// ```
/// use rhizo_image::{Image, ImageSize};
/// use rhizo_imgproc::label::{label, Connectivity};
///
/// let mask = Image::<bool, 1>::new(
///     ImageSize { width: 3, height: 2 },
///     vec![true, false, true, false, true, false],
/// ).unwrap();
///
/// assert_eq!(label(&mask, Connectivity::Eight).unwrap().num_labels, 1);
/// assert_eq!(label(&mask, Connectivity::Four).unwrap().num_labels, 3);
/// ```
pub fn label(src: &Mask, connectivity: Connectivity) -> Result<LabeledRegions, ImageError> {
    let (rows, cols) = (src.rows(), src.cols());
    let data = src.as_slice();
    let mut uf = UnionFind::new(data.len());

    for r in 0..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            if !data[idx] {
                continue;
            }
            for &(dr, dc) in connectivity.backward_offsets() {
                let rr = r as isize + dr;
                let cc = c as isize + dc;
                if rr < 0 || cc < 0 || cc >= cols as isize {
                    continue;
                }
                let nidx = rr as usize * cols + cc as usize;
                if data[nidx] {
                    uf.connect(idx, nidx);
                }
            }
        }
    }

    // relabel the roots in order of first appearance
    let mut root_label = vec![0u32; data.len()];
    let mut labels = vec![0u32; data.len()];
    let mut num_labels = 0u32;
    for idx in 0..data.len() {
        if !data[idx] {
            continue;
        }
        let root = uf.get_representative(idx);
        if root_label[root] == 0 {
            num_labels += 1;
            root_label[root] = num_labels;
        }
        labels[idx] = root_label[root];
    }

    Ok(LabeledRegions {
        labels: Image::new(src.size(), labels)?,
        num_labels: num_labels as usize,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhizo_image::ImageSize;

    #[test]
    fn test_union() {
        let mut uf = UnionFind::new(10);

        uf.connect(0, 1);
        assert_eq!(uf.get_representative(0), uf.get_representative(1));

        uf.connect(1, 2);
        assert_eq!(uf.get_representative(0), uf.get_representative(2));

        uf.connect(3, 4);
        assert_ne!(uf.get_representative(0), uf.get_representative(4));

        uf.connect(0, 3);
        assert_eq!(uf.get_representative(0), uf.get_representative(4));
        assert_eq!(uf.len(), 10);
    }

    #[test]
    fn test_label_order_and_boxes() -> Result<(), ImageError> {
        #[rustfmt::skip]
        let mask = Image::<bool, 1>::new(
            ImageSize { width: 5, height: 4 },
            vec![
                false, false, false, true,  true,
                true,  false, false, false, true,
                true,  false, true,  false, false,
                false, false, true,  false, false,
            ],
        )?;

        let regions = label(&mask, Connectivity::Eight)?;
        assert_eq!(regions.num_labels, 3);
        // first appearance in raster order
        assert_eq!(regions.labels.get_pixel(3, 0, 0)?, 1);
        assert_eq!(regions.labels.get_pixel(0, 1, 0)?, 2);
        assert_eq!(regions.labels.get_pixel(2, 3, 0)?, 3);
        assert_eq!(regions.areas(), vec![13, 3, 2, 2]);

        let boxes = regions.bounding_boxes();
        assert_eq!(
            boxes[0],
            BoundingBox {
                min_row: 0,
                min_col: 3,
                max_row: 2,
                max_col: 5
            }
        );

        let kept = regions.select(&[false, false, true, false]);
        assert_eq!(kept.count(), 2);
        assert!(kept.get_pixel(0, 2, 0)?);

        Ok(())
    }

    #[test]
    fn test_label_empty() -> Result<(), ImageError> {
        let mask = Image::<bool, 1>::from_size_val(
            ImageSize {
                width: 3,
                height: 3,
            },
            false,
        )?;
        let regions = label(&mask, Connectivity::Four)?;
        assert_eq!(regions.num_labels, 0);
        assert_eq!(regions.areas(), vec![9]);
        Ok(())
    }
}
