// Binary morphological image processing operations.

/// Kernel (structuring element) utilities.
pub mod kernel;
pub use kernel::{Kernel, KernelShape};

/// Dilation, erosion and the derived filters.
pub mod ops;
pub use ops::{binary_median, close, dilate, erode, open};

/// Removal of small regions and holes.
pub mod objects;
pub use objects::{remove_small_holes, remove_small_objects};
