#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// color transformations module.
pub mod color;

/// euclidean distance transform of binary masks.
pub mod distance_transform;

/// utilities to draw shape masks.
pub mod draw;

/// image enhancement module.
pub mod enhance;

/// image filtering module.
pub mod filter;

/// vesselness filtering of tube-like structures.
pub mod frangi;

/// connected component labeling.
pub mod label;

/// medial axis thinning of binary masks.
pub mod medial_axis;

/// binary morphology module.
pub mod morphology;

/// module containing parallization utilities.
pub mod parallel;

/// per-region shape descriptors.
pub mod regionprops;

/// operations to threshold images.
pub mod threshold;
