mod gray;
mod hsv;
mod lab;
mod ycbcr;

pub use gray::gray_from_rgb;
pub use hsv::hsv_from_rgb;
pub use lab::{lab_from_rgb, xyz_from_rgb, D65_WHITE};
pub use ycbcr::ycbcr_from_rgb;
