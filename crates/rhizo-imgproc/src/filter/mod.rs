mod kernels;
pub use kernels::*;

mod median;
pub use median::median_filter;

mod ops;
pub use ops::*;

mod separable_filter;
pub use separable_filter::{reflect_index, separable_filter};
