//! Medial axis skeletons with per-pixel length and diameter.
//!
//! The length of a skeleton is not its pixel count. Every skeleton pixel gets
//! a fractional contribution looked up from the configuration of its 3x3
//! neighborhood, following Kimura, Kikuchi & Yamasaki (1999), "Accurate root
//! length measurement by image analysis", Plant and Soil 216: 117-127.

use rhizo_image::{Image, ImageError, Mask};
use rhizo_imgproc::label::{label, Connectivity, LabeledRegions};
use rhizo_imgproc::medial_axis::medial_axis;
use serde::{Deserialize, Serialize};

use crate::error::MeasureError;

// neighborhood weights: center 1, edge neighbors 2, corner neighbors 10
const CENTER_WEIGHT: usize = 1;
const EDGE_WEIGHT: usize = 2;
const CORNER_WEIGHT: usize = 10;
const NUM_CODES: usize = CENTER_WEIGHT + 4 * EDGE_WEIGHT + 4 * CORNER_WEIGHT + 1;

// correction for randomly oriented segments
const RANDOM_CORRECTION: f64 = 0.948;

/// How skeleton pixels are converted to length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkeletonParams {
    /// Assume randomly oriented segments.
    ///
    /// Every contribution is scaled by 0.948, straight segments included, so
    /// a straight line of N pixels measures `0.948 * (N - 1)`. Set it to
    /// false to measure straight lines as `N - 1` whatever `m` is.
    pub random: bool,
    /// Orientation bias in [0, 1], used when `random` is false.
    pub m: f64,
}

impl Default for SkeletonParams {
    fn default() -> Self {
        Self {
            random: true,
            m: 0.5,
        }
    }
}

impl SkeletonParams {
    /// Check that `m` lies in [0, 1].
    pub fn validate(&self) -> Result<(), MeasureError> {
        if !(0.0..=1.0).contains(&self.m) {
            return Err(MeasureError::InvalidParameter(
                "m".to_string(),
                format!("{} is outside [0, 1]", self.m),
            ));
        }
        Ok(())
    }

    /// Length contribution of a skeleton pixel for every neighborhood code.
    ///
    /// A code is the weighted sum of the set pixels of a 3x3 window. Even codes
    /// have no center pixel and contribute nothing, and a lone pixel counts
    /// for half a pixel.
    pub fn length_table(&self) -> [f64; NUM_CODES] {
        let mut table = [0.0; NUM_CODES];
        for (code, w) in table.iter_mut().enumerate() {
            if code % 2 == 0 {
                continue;
            }
            let edges = ((code % CORNER_WEIGHT) / EDGE_WEIGHT) as f64;
            let corners = (code / CORNER_WEIGHT) as f64;
            *w = if self.random {
                0.5 * (edges + corners * std::f64::consts::SQRT_2) * RANDOM_CORRECTION
            } else {
                let m = self.m;
                0.5 * ((corners.powi(2) + (corners + edges * m).powi(2)).sqrt() + edges * (1.0 - m))
            };
        }
        table[CENTER_WEIGHT] = 0.5;
        table
    }
}

/// Length contribution of every pixel of a skeleton.
///
/// Pixels off the skeleton are 0.
pub fn length_raster(
    skeleton: &Mask,
    params: &SkeletonParams,
) -> Result<Image<f64, 1>, ImageError> {
    let table = params.length_table();
    let (rows, cols) = (skeleton.rows(), skeleton.cols());
    let data = skeleton.as_slice();

    let at = |r: isize, c: isize| -> bool {
        r >= 0 && c >= 0 && (r as usize) < rows && (c as usize) < cols && data[r as usize * cols + c as usize]
    };

    Image::from_fn(skeleton.size(), |r, c, _| {
        let (r, c) = (r as isize, c as isize);
        if !at(r, c) {
            return 0.0;
        }
        let mut code = CENTER_WEIGHT;
        for (dr, dc) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
            if at(r + dr, c + dc) {
                code += EDGE_WEIGHT;
            }
        }
        for (dr, dc) in [(-1, -1), (-1, 1), (1, -1), (1, 1)] {
            if at(r + dr, c + dc) {
                code += CORNER_WEIGHT;
            }
        }
        table[code]
    })
}

/// Total skeleton length of a mask.
pub fn skeleton_length(objects: &Mask, params: &SkeletonParams) -> Result<f64, MeasureError> {
    let mut skeleton = Image::from_size_val(objects.size(), false)?;
    let mut distance = Image::from_size_val(objects.size(), 0.0f32)?;
    medial_axis(objects, &mut skeleton, &mut distance)?;
    Ok(length_raster(&skeleton, params)?.as_slice().iter().sum())
}

/// Length and mean diameter of one object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeometryRow {
    /// Sum of the length raster over the object.
    pub length: f64,
    /// Mean of the diameter raster over the skeleton of the object, NaN without skeleton.
    pub diameter: f64,
}

/// Per-object geometry, row `i` describing label `i` and row 0 the zeroed background.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryTable {
    rows: Vec<GeometryRow>,
}

impl GeometryTable {
    /// Aggregate the rasters of each label.
    ///
    /// The skeleton is the set of pixels with a positive diameter.
    fn aggregate(
        regions: &LabeledRegions,
        length: &Image<f64, 1>,
        diameter: &Image<f64, 1>,
    ) -> Self {
        let n = regions.num_labels + 1;
        let mut sum_length = vec![0.0; n];
        let mut sum_diameter = vec![0.0; n];
        let mut count = vec![0usize; n];

        let pixels = regions
            .labels
            .as_slice()
            .iter()
            .zip(length.as_slice())
            .zip(diameter.as_slice());
        for ((&l, &len), &d) in pixels {
            if l == 0 {
                continue;
            }
            let l = l as usize;
            sum_length[l] += len;
            if d > 0.0 {
                sum_diameter[l] += d;
                count[l] += 1;
            }
        }

        let mut rows = (0..n)
            .map(|l| GeometryRow {
                length: sum_length[l],
                diameter: if count[l] > 0 {
                    sum_diameter[l] / count[l] as f64
                } else {
                    f64::NAN
                },
            })
            .collect::<Vec<_>>();
        rows[0] = GeometryRow {
            length: 0.0,
            diameter: 0.0,
        };

        Self { rows }
    }

    /// Number of rows, background included.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows. Never true for a table built from objects.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, background first.
    pub fn rows(&self) -> &[GeometryRow] {
        &self.rows
    }

    /// The rows of the objects, without the background.
    pub fn objects(&self) -> &[GeometryRow] {
        &self.rows[1..]
    }

    /// Number of objects.
    pub fn num_objects(&self) -> usize {
        self.rows.len() - 1
    }
}

/// Objects, their skeleton rasters and their geometry, kept consistent.
///
/// The only ways to build a bundle are [`ObjectBundle::from_mask`] and
/// [`ObjectBundle::from_rasters`], so the table always summarizes exactly
/// the labels of the current objects.
#[derive(Debug, Clone)]
pub struct ObjectBundle {
    objects: Mask,
    regions: LabeledRegions,
    length: Image<f64, 1>,
    diameter: Image<f64, 1>,
    geometry: GeometryTable,
}

impl ObjectBundle {
    /// Skeletonize a mask and measure its objects.
    ///
    /// # Errors
    ///
    /// Returns an error if `params` is invalid.
    pub fn from_mask(objects: &Mask, params: &SkeletonParams) -> Result<Self, MeasureError> {
        params.validate()?;

        let regions = label(objects, Connectivity::Eight)?;
        let mut skeleton = Image::from_size_val(objects.size(), false)?;
        let mut distance = Image::from_size_val(objects.size(), 0.0f32)?;
        medial_axis(objects, &mut skeleton, &mut distance)?;

        let diameter = skeleton.zip_map(&distance, |&s, &d| if s { 2.0 * d as f64 } else { 0.0 })?;
        let length = length_raster(&skeleton, params)?;
        let geometry = GeometryTable::aggregate(&regions, &length, &diameter);

        log::debug!(
            "skeletonized {} objects over {} skeleton pixels",
            regions.num_labels,
            skeleton.count()
        );

        Ok(Self {
            objects: objects.clone(),
            regions,
            length,
            diameter,
            geometry,
        })
    }

    /// Rebuild a bundle from edited rasters.
    ///
    /// The objects are relabeled, the rasters are cleared outside of them and
    /// the geometry is aggregated again.
    ///
    /// # Errors
    ///
    /// Returns an error if the rasters do not match the size of the objects.
    pub fn from_rasters(
        objects: Mask,
        length: &Image<f64, 1>,
        diameter: &Image<f64, 1>,
    ) -> Result<Self, MeasureError> {
        let length = objects.zip_map(length, |&o, &v| if o { v } else { 0.0 })?;
        let diameter = objects.zip_map(diameter, |&o, &v| if o { v } else { 0.0 })?;
        let regions = label(&objects, Connectivity::Eight)?;
        let geometry = GeometryTable::aggregate(&regions, &length, &diameter);

        Ok(Self {
            objects,
            regions,
            length,
            diameter,
            geometry,
        })
    }

    /// The object mask.
    pub fn objects(&self) -> &Mask {
        &self.objects
    }

    /// The labels of the objects, in the order of the geometry rows.
    pub fn regions(&self) -> &LabeledRegions {
        &self.regions
    }

    /// The length raster.
    pub fn length(&self) -> &Image<f64, 1> {
        &self.length
    }

    /// The diameter raster.
    pub fn diameter(&self) -> &Image<f64, 1> {
        &self.diameter
    }

    /// The geometry table.
    pub fn geometry(&self) -> &GeometryTable {
        &self.geometry
    }

    /// The skeleton: pixels with a positive diameter.
    pub fn skeleton(&self) -> Mask {
        self.diameter.map(|&d| d > 0.0)
    }

    /// Keep only the objects flagged in `keep`, indexed by label.
    pub(crate) fn select(&self, keep: &[bool]) -> Result<Self, MeasureError> {
        Self::from_rasters(self.regions.select(keep), &self.length, &self.diameter)
    }
}
