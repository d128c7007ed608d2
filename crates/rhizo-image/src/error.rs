/// An error type for the image module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when two images that must match have different sizes.
    #[error("Image size mismatch: ({0}x{1}) vs ({2}x{3})")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when the requested channel does not exist.
    #[error("Channel index {0} is out of bounds for {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a pixel coordinate is outside the image.
    #[error("Pixel index ({0}, {1}) is out of bounds ({2}x{3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a crop window does not fit inside the image.
    #[error("Crop window {0}x{1} at ({2}, {3}) does not fit the image")]
    InvalidCropWindow(usize, usize, usize, usize),

    /// Error when a kernel or window size is not usable.
    #[error("Invalid kernel size {0}: {1}")]
    InvalidKernelSize(usize, String),

    /// Error when an operation receives an invalid numeric parameter.
    #[error("Invalid parameter {0}: {1}")]
    InvalidParameter(String, String),

    /// Error when a pixel value cannot be represented in the target type.
    #[error("Failed to cast image data")]
    CastError,

    /// Error when the image has no pixels.
    #[error("Image is empty")]
    EmptyImage,
}
