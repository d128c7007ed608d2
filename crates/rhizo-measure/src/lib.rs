#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// analysis band selection and colorspace projection.
pub mod bands;

/// typed configuration of the pipelines.
pub mod config;

/// error types of the measurement pipeline.
pub mod error;

/// gap filling of segmented objects.
pub mod gaps;

/// filters on skeleton length and diameter.
pub mod geometry_filters;

/// neighborhood comparison of thin objects.
pub mod neighborhood;

/// color range, dirt and noise filters.
pub mod noise;

/// image quality checks.
pub mod preprocess;

/// source rasters.
pub mod raster;

/// end to end segmentation pipelines.
pub mod segmentation;

/// shape filters on labeled objects.
pub mod shape;

/// skeletonization and per-object geometry.
pub mod skeleton;

/// optional pipeline stages.
pub mod stage;

mod stats;

/// per-image summaries.
pub mod summarize;

/// line intersect length estimation.
pub mod tennant;

pub use crate::error::MeasureError;
pub use crate::raster::Raster;
pub use crate::segmentation::{segment_frangi, segment_thresholding, SegmentationResult};
pub use crate::skeleton::{GeometryTable, ObjectBundle};
