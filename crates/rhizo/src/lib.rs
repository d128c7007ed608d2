#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use rhizo_image as image;

#[doc(inline)]
pub use rhizo_imgproc as imgproc;

#[doc(inline)]
pub use rhizo_measure as measure;
