//! Typed configuration of the segmentation pipelines.
//!
//! Every optional stage is a [`Stage`], either `"skip"` or
//! `{"apply": {...}}`. Omitted fields take their defaults.
//!
//! ```
//! use rhizo_measure::config::ThresholdingConfig;
//!
//! let config = ThresholdingConfig::from_json(
//!     r#"{
//!         "color": "dark",
//!         "thresholds": [{"block_size": 51, "method": "mean", "offset": 0.02}],
//!         "length_width": {"apply": {"threshold": 5.0}}
//!     }"#,
//! )
//! .unwrap();
//! assert!(config.diameter.is_skip());
//! assert!(!config.length_width.is_skip());
//! ```

use std::str::FromStr;

use rhizo_imgproc::threshold::LocalThresholdMethod;
use serde::{Deserialize, Serialize};

use crate::bands::ColorSpec;
use crate::error::MeasureError;
use crate::gaps::GapFillParams;
use crate::geometry_filters::{DiameterParams, LengthWidthParams};
use crate::neighborhood::NeighborhoodParams;
use crate::noise::{ColorFilterParams, NoiseSmoothingParams, SmallObjectParams};
use crate::shape::{HollowParams, MorphologyParams};
use crate::skeleton::SkeletonParams;
use crate::stage::Stage;

/// Maximum number of color filters of the vesselness pipeline.
pub const MAX_COLOR_FILTERS: usize = 3;

/// Local statistic of the adaptive threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMethod {
    /// Gaussian weighted mean.
    #[default]
    Gaussian,
    /// Arithmetic mean.
    Mean,
    /// Median.
    Median,
}

impl FromStr for ThresholdMethod {
    type Err = MeasureError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gaussian" => Ok(ThresholdMethod::Gaussian),
            "mean" => Ok(ThresholdMethod::Mean),
            "median" => Ok(ThresholdMethod::Median),
            _ => Err(MeasureError::UnknownMode(
                "threshold".to_string(),
                s.to_string(),
            )),
        }
    }
}

impl From<ThresholdMethod> for LocalThresholdMethod {
    fn from(method: ThresholdMethod) -> Self {
        match method {
            ThresholdMethod::Gaussian => LocalThresholdMethod::Gaussian,
            ThresholdMethod::Mean => LocalThresholdMethod::Mean,
            ThresholdMethod::Median => LocalThresholdMethod::Median,
        }
    }
}

/// Adaptive threshold of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    /// Odd side of the neighborhood.
    pub block_size: usize,
    /// The local statistic.
    pub method: ThresholdMethod,
    /// Constant subtracted from the statistic.
    pub offset: f32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            block_size: 35,
            method: ThresholdMethod::Gaussian,
            offset: 0.0,
        }
    }
}

impl ThresholdParams {
    /// Check that the block size is odd.
    pub fn validate(&self) -> Result<(), MeasureError> {
        if self.block_size % 2 == 0 {
            return Err(MeasureError::InvalidParameter(
                "block_size".to_string(),
                format!("{} must be odd", self.block_size),
            ));
        }
        Ok(())
    }
}

/// Contrast limited adaptive histogram equalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaheParams {
    /// Tile `(height, width)`, 1/8 of the image by default.
    pub kernel_size: Option<(usize, usize)>,
    /// Clip limit in [0, 1].
    pub clip_limit: f32,
    /// Number of histogram bins.
    pub nbins: usize,
}

impl Default for ClaheParams {
    fn default() -> Self {
        Self {
            kernel_size: None,
            clip_limit: 0.01,
            nbins: 256,
        }
    }
}

/// Shape of the region of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskShape {
    /// Centered ellipse.
    #[default]
    Ellipse,
    /// Centered rectangle.
    Rectangle,
}

/// Region of interest applied to the thresholded objects.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskParams {
    /// The shape.
    pub shape: MaskShape,
    /// Vertical and horizontal half axes, the inscribed circle by default.
    pub half_axes: Option<(f32, f32)>,
}

/// The vesselness filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrangiParams {
    /// First and excluded last scale.
    pub scale_range: (f32, f32),
    /// Step between scales.
    pub scale_step: f32,
    /// Sensitivity to deviation from a line.
    pub beta1: f32,
    /// Sensitivity to second order structure.
    pub beta2: f32,
}

impl Default for FrangiParams {
    fn default() -> Self {
        Self {
            scale_range: (1.0, 10.0),
            scale_step: 2.0,
            beta1: 0.5,
            beta2: 15.0,
        }
    }
}

/// Edge based separation of touching objects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeSeparationParams {
    /// Sigma of the blur before edge detection.
    pub sigma: f32,
}

impl Default for EdgeSeparationParams {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

fn check_thresholds(color: &ColorSpec, thresholds: &[ThresholdParams]) -> Result<(), MeasureError> {
    color.validate()?;
    if thresholds.len() != color.num_bands() {
        return Err(MeasureError::BandCountMismatch(
            thresholds.len(),
            color.num_bands(),
        ));
    }
    thresholds.iter().try_for_each(ThresholdParams::validate)
}

fn check_bins(bins: &Option<Vec<f64>>) -> Result<(), MeasureError> {
    if let Some(bins) = bins {
        if bins.iter().any(|&b| !(b >= 0.0)) || bins.windows(2).any(|w| w[0] > w[1]) {
            return Err(MeasureError::InvalidParameter(
                "diameter_bins".to_string(),
                format!("{bins:?} must be non-negative and ascending"),
            ));
        }
    }
    Ok(())
}

/// Configuration of the thresholding pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdingConfig {
    /// Analysis planes.
    pub color: ColorSpec,
    /// Contrast enhancement of every plane.
    pub clahe: Stage<ClaheParams>,
    /// One threshold per plane.
    pub thresholds: Vec<ThresholdParams>,
    /// Region of interest.
    pub mask: Stage<MaskParams>,
    /// Dirt removal.
    pub small_objects: Stage<SmallObjectParams>,
    /// Noise smoothing.
    pub smoothing: Stage<NoiseSmoothingParams>,
    /// Shape filter.
    pub morphology: Stage<MorphologyParams>,
    /// Gap filling.
    pub gap_fill: Stage<GapFillParams>,
    /// Skeleton length mode.
    pub skeleton: SkeletonParams,
    /// Length to width filter.
    pub length_width: Stage<LengthWidthParams>,
    /// Diameter filter.
    pub diameter: Stage<DiameterParams>,
    /// Breakpoints of the diameter classes, a single total when absent.
    pub diameter_bins: Option<Vec<f64>>,
}

impl Default for ThresholdingConfig {
    fn default() -> Self {
        Self {
            color: ColorSpec::Dark,
            clahe: Stage::Skip,
            thresholds: vec![ThresholdParams::default()],
            mask: Stage::Skip,
            small_objects: Stage::Skip,
            smoothing: Stage::Skip,
            morphology: Stage::Skip,
            gap_fill: Stage::Skip,
            skeleton: SkeletonParams::default(),
            length_width: Stage::Skip,
            diameter: Stage::Skip,
            diameter_bins: None,
        }
    }
}

impl ThresholdingConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, MeasureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the consistency of the configuration.
    ///
    /// Only the mandatory stages and the cross field constraints are checked
    /// here. Parameters of optional stages are checked when the stage runs.
    pub fn validate(&self) -> Result<(), MeasureError> {
        check_thresholds(&self.color, &self.thresholds)?;
        self.skeleton.validate()?;
        check_bins(&self.diameter_bins)
    }
}

/// Configuration of the vesselness pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrangiConfig {
    /// Analysis planes.
    pub color: ColorSpec,
    /// Contrast enhancement of every plane.
    pub clahe: Stage<ClaheParams>,
    /// Separation of touching objects along edges.
    pub edge_separation: Stage<EdgeSeparationParams>,
    /// The vesselness filter of every plane.
    pub frangi: FrangiParams,
    /// One threshold per plane, applied to the vesselness response.
    pub thresholds: Vec<ThresholdParams>,
    /// Up to three color filters.
    pub color_filters: Vec<Stage<ColorFilterParams>>,
    /// Neighborhood filter.
    pub neighborhood: Stage<NeighborhoodParams>,
    /// Shape filter before gap filling.
    pub morphology: Stage<MorphologyParams>,
    /// Hollow filter.
    pub hollow: Stage<HollowParams>,
    /// Gap filling.
    pub gap_fill: Stage<GapFillParams>,
    /// Shape filter after gap filling.
    pub morphology_after_gaps: Stage<MorphologyParams>,
    /// Skeleton length mode.
    pub skeleton: SkeletonParams,
    /// Diameter filter.
    pub diameter: Stage<DiameterParams>,
    /// Breakpoints of the diameter classes, a single total when absent.
    pub diameter_bins: Option<Vec<f64>>,
}

impl Default for FrangiConfig {
    fn default() -> Self {
        Self {
            color: ColorSpec::Dark,
            clahe: Stage::Skip,
            edge_separation: Stage::Skip,
            frangi: FrangiParams::default(),
            thresholds: vec![ThresholdParams::default()],
            color_filters: Vec::new(),
            neighborhood: Stage::Skip,
            morphology: Stage::Skip,
            hollow: Stage::Skip,
            gap_fill: Stage::Skip,
            morphology_after_gaps: Stage::Skip,
            skeleton: SkeletonParams::default(),
            diameter: Stage::Skip,
            diameter_bins: None,
        }
    }
}

impl FrangiConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, MeasureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the consistency of the configuration.
    ///
    /// Only the mandatory stages and the cross field constraints are checked
    /// here. Parameters of optional stages are checked when the stage runs.
    pub fn validate(&self) -> Result<(), MeasureError> {
        check_thresholds(&self.color, &self.thresholds)?;
        if self.color_filters.len() > MAX_COLOR_FILTERS {
            return Err(MeasureError::InvalidParameter(
                "color_filters".to_string(),
                format!(
                    "{} filters given, at most {MAX_COLOR_FILTERS} are supported",
                    self.color_filters.len()
                ),
            ));
        }
        let (start, end) = self.frangi.scale_range;
        if !(start > 0.0) || !(self.frangi.scale_step > 0.0) || end < start {
            return Err(MeasureError::InvalidParameter(
                "scale_range".to_string(),
                format!("({start}, {end}) by {} is not a valid scale range", self.frangi.scale_step),
            ));
        }
        self.skeleton.validate()?;
        check_bins(&self.diameter_bins)
    }
}
