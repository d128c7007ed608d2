use rhizo_image::{Image, ImageError, ImageSize};

/// A decoded source image with samples in [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub enum Raster {
    /// A single band image.
    Mono(Image<f32, 1>),
    /// A three band RGB image.
    Rgb(Image<f32, 3>),
}

impl Raster {
    /// Create an RGB raster from interleaved 8-bit samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the data length does not match the size.
    pub fn from_rgb8(size: ImageSize, data: Vec<u8>) -> Result<Self, ImageError> {
        let image = Image::<u8, 3>::new(size, data)?;
        Ok(Raster::Rgb(image.cast_and_scale(1.0 / 255.0)?))
    }

    /// Create a single band raster from 8-bit samples.
    ///
    /// # Errors
    ///
    /// Returns an error if the data length does not match the size.
    pub fn from_mono8(size: ImageSize, data: Vec<u8>) -> Result<Self, ImageError> {
        let image = Image::<u8, 1>::new(size, data)?;
        Ok(Raster::Mono(image.cast_and_scale(1.0 / 255.0)?))
    }

    /// The size of the raster in pixels.
    pub fn size(&self) -> ImageSize {
        match self {
            Raster::Mono(image) => image.size(),
            Raster::Rgb(image) => image.size(),
        }
    }

    /// The number of bands.
    pub fn num_bands(&self) -> usize {
        match self {
            Raster::Mono(_) => 1,
            Raster::Rgb(_) => 3,
        }
    }
}

impl From<Image<f32, 1>> for Raster {
    fn from(image: Image<f32, 1>) -> Self {
        Raster::Mono(image)
    }
}

impl From<Image<f32, 3>> for Raster {
    fn from(image: Image<f32, 3>) -> Self {
        Raster::Rgb(image)
    }
}
