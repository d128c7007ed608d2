//! End to end pipelines from a raster to per-image measurements.
//!
//! Both pipelines select the analysis planes, binarize them, refine the
//! objects through optional stages, skeletonize and summarize. Band
//! selection, thresholding and skeletonization are mandatory and propagate
//! their errors. Every other stage is a [`Stage`](crate::stage::Stage): a
//! failing stage is reported in [`SegmentationResult::warnings`] and the
//! pipeline goes on with the objects it had before that stage.

use rhizo_image::{Image, Mask, Plane};
use rhizo_imgproc::enhance::equalize_adapthist;
use rhizo_imgproc::threshold::local_threshold;

use crate::config::{ClaheParams, ThresholdParams};
use crate::error::MeasureError;
use crate::skeleton::ObjectBundle;
use crate::stage::{run_stage, Stage, StageWarning};
use crate::summarize::{bin_by_diameter, summarize_geometry, Summary};

mod frangi;
pub use frangi::segment_frangi;

mod thresholding;
pub use thresholding::segment_thresholding;

/// The outcome of a pipeline run on one image.
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    /// Name of the image.
    pub image_name: String,
    /// Totals, or lengths per diameter class.
    pub summary: Summary,
    /// Final objects with their skeleton rasters and geometry.
    pub bundle: ObjectBundle,
    /// Diameter class of every skeleton pixel, when classes were requested.
    pub diameter_classes: Option<Image<u32, 1>>,
    /// Optional stages that failed and were skipped.
    pub warnings: Vec<StageWarning>,
}

/// Enhance the contrast of every plane.
fn enhance(planes: Vec<Plane>, clahe: &Stage<ClaheParams>, warnings: &mut Vec<StageWarning>) -> Vec<Plane> {
    planes
        .into_iter()
        .map(|plane| {
            run_stage(
                "contrast enhancement",
                clahe,
                plane,
                |plane, params| {
                    let mut dst = Image::from_size_val(plane.size(), 0.0f32)?;
                    equalize_adapthist(plane, &mut dst, params.kernel_size, params.clip_limit, params.nbins)?;
                    Ok(dst)
                },
                warnings,
            )
        })
        .collect()
}

/// Objects of a dark-on-light plane: pixels not above their local threshold.
fn dark_objects(plane: &Plane, params: &ThresholdParams) -> Result<Mask, MeasureError> {
    params.validate()?;
    let mut surface = Image::from_size_val(plane.size(), 0.0f32)?;
    local_threshold(
        plane,
        &mut surface,
        params.block_size,
        params.method.into(),
        params.offset,
    )?;
    Ok(plane.zip_map(&surface, |&v, &t| !(v > t))?)
}

/// Intersect the objects of every plane.
fn intersect(masks: Vec<Mask>) -> Result<Mask, MeasureError> {
    let mut masks = masks.into_iter();
    let Some(first) = masks.next() else {
        return Err(MeasureError::BandCountMismatch(0, 1));
    };
    masks.try_fold(first, |acc, m| Ok(acc.zip_map(&m, |&a, &b| a && b)?))
}

/// Summarize a bundle, per diameter class when breakpoints are given.
fn summarize(
    bundle: &ObjectBundle,
    bins: Option<&[f64]>,
    image_name: &str,
) -> Result<(Summary, Option<Image<u32, 1>>), MeasureError> {
    match bins {
        None => Ok((
            Summary::Total(summarize_geometry(bundle.geometry(), image_name)),
            None,
        )),
        Some(breakpoints) => {
            let (rows, classes) =
                bin_by_diameter(bundle.length(), bundle.diameter(), breakpoints, image_name)?;
            Ok((Summary::ByDiameter(rows), Some(classes)))
        }
    }
}
