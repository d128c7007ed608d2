use rhizo_image::ImageError;

/// An error type for the measurement pipeline.
#[derive(thiserror::Error, Debug)]
pub enum MeasureError {
    /// Error when two lists describing the same bands disagree in length.
    #[error("Expected {1} band entries, got {0}")]
    BandCountMismatch(usize, usize),

    /// Error when colorspace arguments are given for a single band image.
    #[error("Colorspace {0} requested for a single band image")]
    ColorspaceOnMonoImage(String),

    /// Error when a mode string is not recognized.
    #[error("Unknown {0} mode: {1}")]
    UnknownMode(String, String),

    /// Error when a parameter is outside of its valid domain.
    #[error("Invalid parameter {0}: {1}")]
    InvalidParameter(String, String),

    /// Error when the geometry table does not describe the current objects.
    #[error("Geometry table has {0} rows but the objects hold {1} labels")]
    GeometryMismatch(usize, usize),

    /// Error when a configuration document cannot be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// Error raised by an image operation.
    #[error(transparent)]
    Image(#[from] ImageError),
}

impl MeasureError {
    /// Whether the error comes from malformed or inconsistent parameters.
    ///
    /// Configuration errors are fatal for the current image only.
    pub fn is_config_error(&self) -> bool {
        !matches!(self, MeasureError::Image(_))
    }
}
