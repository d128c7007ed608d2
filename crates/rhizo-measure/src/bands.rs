use rhizo_image::{Image, Plane};
use rhizo_imgproc::color;
use serde::{Deserialize, Serialize};

use crate::error::MeasureError;
use crate::raster::Raster;

/// Colorspaces a band can be selected from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colorspace {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Hue, saturation, value.
    Hsv,
    /// CIE L*a*b* under D65.
    Lab,
    /// CIE XYZ under D65.
    Xyz,
    /// Studio range YCbCr.
    Ycbcr,
    /// Luminance only.
    Gray,
}

impl Colorspace {
    /// Number of bands of the colorspace.
    pub fn num_bands(&self) -> usize {
        match self {
            Colorspace::Gray => 1,
            _ => 3,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Colorspace::Rgb => "rgb",
            Colorspace::Hsv => "hsv",
            Colorspace::Lab => "lab",
            Colorspace::Xyz => "xyz",
            Colorspace::Ycbcr => "ycbcr",
            Colorspace::Gray => "gray",
        }
    }

    /// Map a sample of `band` from its nominal range onto [0, 1].
    fn rescale(&self, band: usize, v: f32) -> f32 {
        let v = match (self, band) {
            (Colorspace::Lab, 0) => v / 100.0,
            (Colorspace::Lab, _) => (v + 128.0) / 255.0,
            (Colorspace::Xyz, b) => v / color::D65_WHITE[b],
            (Colorspace::Ycbcr, 0) => (v - 16.0) / 219.0,
            (Colorspace::Ycbcr, _) => (v - 16.0) / 224.0,
            _ => v,
        };
        v.clamp(0.0, 1.0)
    }
}

/// Band selection for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSelection {
    /// Colorspace the bands are taken from.
    #[serde(default)]
    pub colorspace: Colorspace,
    /// Band indices within the colorspace.
    pub bands: Vec<usize>,
    /// Per band: are the objects darker than the background?
    pub dark_on_light: Vec<bool>,
}

/// How the analysis planes are taken from a raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpec {
    /// Luminance, dark objects on a light background.
    #[default]
    Dark,
    /// Luminance, light objects on a dark background.
    Light,
    /// Explicit bands of a colorspace.
    Bands(BandSelection),
}

impl ColorSpec {
    /// Number of planes this selection produces.
    pub fn num_bands(&self) -> usize {
        match self {
            ColorSpec::Dark | ColorSpec::Light => 1,
            ColorSpec::Bands(selection) => selection.bands.len(),
        }
    }

    /// Check the band lists against each other and the colorspace.
    pub fn validate(&self) -> Result<(), MeasureError> {
        let ColorSpec::Bands(selection) = self else {
            return Ok(());
        };

        let channels = selection.colorspace.num_bands();
        if selection.bands.is_empty() || selection.bands.len() > channels {
            return Err(MeasureError::BandCountMismatch(
                selection.bands.len(),
                channels,
            ));
        }
        if let Some(&band) = selection.bands.iter().find(|&&b| b >= channels) {
            return Err(MeasureError::InvalidParameter(
                "bands".to_string(),
                format!("band {band} does not exist in {}", selection.colorspace.name()),
            ));
        }
        if selection.dark_on_light.len() != selection.bands.len() {
            return Err(MeasureError::BandCountMismatch(
                selection.dark_on_light.len(),
                selection.bands.len(),
            ));
        }
        Ok(())
    }
}

fn gray(image: &Image<f32, 3>) -> Result<Plane, MeasureError> {
    let mut dst = Image::from_size_val(image.size(), 0.0f32)?;
    color::gray_from_rgb(image, &mut dst)?;
    Ok(dst)
}

/// Convert an RGB image into `colorspace`, bands rescaled to [0, 1].
fn convert(image: &Image<f32, 3>, colorspace: Colorspace) -> Result<Vec<Plane>, MeasureError> {
    let mut converted = Image::<f32, 3>::from_size_val(image.size(), 0.0)?;
    match colorspace {
        Colorspace::Gray => return Ok(vec![gray(image)?]),
        Colorspace::Rgb => converted = image.clone(),
        Colorspace::Hsv => color::hsv_from_rgb(image, &mut converted)?,
        Colorspace::Lab => color::lab_from_rgb(image, &mut converted)?,
        Colorspace::Xyz => color::xyz_from_rgb(image, &mut converted)?,
        Colorspace::Ycbcr => color::ycbcr_from_rgb(image, &mut converted)?,
    }

    Ok(converted
        .split_channels()?
        .into_iter()
        .enumerate()
        .map(|(band, plane)| plane.map(|&v| colorspace.rescale(band, v)))
        .collect())
}

/// Project one band of a raster, rescaled to [0, 1], without any inversion.
///
/// A single band raster only accepts the gray colorspace and band 0.
pub fn project_band(
    raster: &Raster,
    colorspace: Colorspace,
    band: usize,
) -> Result<Plane, MeasureError> {
    match raster {
        Raster::Mono(image) => {
            if colorspace != Colorspace::Gray {
                return Err(MeasureError::ColorspaceOnMonoImage(
                    colorspace.name().to_string(),
                ));
            }
            if band != 0 {
                return Err(MeasureError::BandCountMismatch(band + 1, 1));
            }
            Ok(image.map(|v| v.clamp(0.0, 1.0)))
        }
        Raster::Rgb(image) => {
            let channels = colorspace.num_bands();
            if band >= channels {
                return Err(MeasureError::BandCountMismatch(band + 1, channels));
            }
            let mut planes = convert(image, colorspace)?;
            Ok(planes.swap_remove(band))
        }
    }
}

/// Extract the analysis planes of a raster.
///
/// Every plane is rescaled to [0, 1] and brought to the dark-on-light
/// convention: a plane whose objects are lighter than the background is
/// inverted as `1 - x`, so objects are always the low values downstream.
///
/// # Errors
///
/// Fails with a configuration error when the band lists are inconsistent or
/// when colorspace bands are requested from a single band raster.
pub fn select_bands(raster: &Raster, spec: &ColorSpec) -> Result<Vec<Plane>, MeasureError> {
    spec.validate()?;

    let invert = |plane: Plane| plane.map(|&v| 1.0 - v);
    let planes = match (spec, raster) {
        (ColorSpec::Dark | ColorSpec::Light, Raster::Mono(image)) => {
            vec![image.map(|v| v.clamp(0.0, 1.0))]
        }
        (ColorSpec::Dark | ColorSpec::Light, Raster::Rgb(image)) => vec![gray(image)?],
        (ColorSpec::Bands(selection), Raster::Mono(_)) => {
            return Err(MeasureError::ColorspaceOnMonoImage(
                selection.colorspace.name().to_string(),
            ));
        }
        (ColorSpec::Bands(selection), Raster::Rgb(image)) => {
            let converted = convert(image, selection.colorspace)?;
            selection
                .bands
                .iter()
                .zip(selection.dark_on_light.iter())
                .map(|(&band, &dark)| {
                    let plane = converted[band].clone();
                    if dark {
                        plane
                    } else {
                        invert(plane)
                    }
                })
                .collect()
        }
    };

    Ok(match spec {
        ColorSpec::Light => planes.into_iter().map(invert).collect(),
        _ => planes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhizo_image::ImageSize;

    fn rgb_raster() -> Result<Raster, MeasureError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let image = Image::<f32, 3>::from_fn(size, |r, c, ch| (r * 3 + c + ch) as f32 / 10.0)?;
        Ok(Raster::Rgb(image))
    }

    #[test]
    fn test_select_red_band() -> Result<(), MeasureError> {
        let raster = rgb_raster()?;
        let Raster::Rgb(image) = &raster else {
            unreachable!()
        };
        let red = image.channel(0)?;

        let spec = ColorSpec::Bands(BandSelection {
            colorspace: Colorspace::Rgb,
            bands: vec![0],
            dark_on_light: vec![true],
        });
        let planes = select_bands(&raster, &spec)?;
        assert_eq!(planes.len(), 1);
        assert_eq!(planes[0], red);

        let spec = ColorSpec::Bands(BandSelection {
            colorspace: Colorspace::Rgb,
            bands: vec![0],
            dark_on_light: vec![false],
        });
        let planes = select_bands(&raster, &spec)?;
        for (p, r) in planes[0].as_slice().iter().zip(red.as_slice()) {
            approx::assert_relative_eq!(*p, 1.0 - r);
        }
        Ok(())
    }

    #[test]
    fn test_select_bands_errors() -> Result<(), MeasureError> {
        let raster = rgb_raster()?;
        let spec = ColorSpec::Bands(BandSelection {
            colorspace: Colorspace::Hsv,
            bands: vec![0, 2],
            dark_on_light: vec![true],
        });
        assert!(matches!(
            select_bands(&raster, &spec),
            Err(MeasureError::BandCountMismatch(1, 2))
        ));

        let mono = Raster::Mono(Image::from_size_val(raster.size(), 0.5)?);
        let spec = ColorSpec::Bands(BandSelection {
            colorspace: Colorspace::Rgb,
            bands: vec![0],
            dark_on_light: vec![true],
        });
        let err = select_bands(&mono, &spec);
        assert!(matches!(err, Err(MeasureError::ColorspaceOnMonoImage(_))));
        assert!(err.is_err_and(|e| e.is_config_error()));
        Ok(())
    }

    #[test]
    fn test_light_mono_is_inverted() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 2,
            height: 1,
        };
        let mono = Raster::Mono(Image::new(size, vec![0.25, 1.0])?);
        let planes = select_bands(&mono, &ColorSpec::Light)?;
        assert_eq!(planes[0].as_slice(), &[0.75, 0.0]);
        Ok(())
    }

    #[test]
    fn test_project_band_ranges() -> Result<(), MeasureError> {
        let raster = rgb_raster()?;
        for colorspace in [
            Colorspace::Rgb,
            Colorspace::Hsv,
            Colorspace::Lab,
            Colorspace::Xyz,
            Colorspace::Ycbcr,
        ] {
            for band in 0..3 {
                let plane = project_band(&raster, colorspace, band)?;
                assert!(plane.as_slice().iter().all(|v| (0.0..=1.0).contains(v)));
            }
        }
        assert!(project_band(&raster, Colorspace::Gray, 1).is_err());
        Ok(())
    }

    #[test]
    fn test_color_spec_serde() -> Result<(), MeasureError> {
        let spec: ColorSpec = serde_json::from_str("\"dark\"")?;
        assert_eq!(spec, ColorSpec::Dark);
        let spec: ColorSpec = serde_json::from_str(
            r#"{"bands": {"colorspace": "lab", "bands": [2], "dark_on_light": [false]}}"#,
        )?;
        assert_eq!(spec.num_bands(), 1);
        Ok(())
    }
}
