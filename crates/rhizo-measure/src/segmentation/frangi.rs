use rhizo_image::{Image, Mask, Plane};
use rhizo_imgproc::filter::{gaussian_blur, scharr_magnitude};
use rhizo_imgproc::frangi::{frangi, scale_space};
use rhizo_imgproc::medial_axis::medial_axis;
use rhizo_imgproc::threshold::otsu_threshold;

use super::{dark_objects, enhance, intersect, summarize, SegmentationResult};
use crate::bands::{project_band, select_bands};
use crate::config::{EdgeSeparationParams, FrangiConfig, FrangiParams};
use crate::error::MeasureError;
use crate::gaps::fill_gaps;
use crate::geometry_filters::diameter_filter;
use crate::neighborhood::neighborhood_filter;
use crate::noise::{color_filter, ColorFilterParams};
use crate::raster::Raster;
use crate::shape::{hollow_filter, morphology_filter};
use crate::skeleton::ObjectBundle;
use crate::stage::run_stage;

/// Thin edges of all planes, used to cut touching objects apart.
///
/// Every plane is blurred, its Scharr magnitude thresholded with Otsu and
/// the resulting edges are reduced to their medial axis.
fn separation_edges(planes: &[Plane], params: &EdgeSeparationParams) -> Result<Mask, MeasureError> {
    let Some(first) = planes.first() else {
        return Err(MeasureError::BandCountMismatch(0, 1));
    };
    let size = first.size();

    let mut edges = Mask::from_size_val(size, false)?;
    let mut blurred = Image::from_size_val(size, 0.0f32)?;
    let mut magnitude = Image::from_size_val(size, 0.0f32)?;
    let mut skeleton = Mask::from_size_val(size, false)?;
    let mut distance = Image::from_size_val(size, 0.0f32)?;

    for plane in planes {
        gaussian_blur(plane, &mut blurred, params.sigma)?;
        scharr_magnitude(&blurred, &mut magnitude)?;
        let t = otsu_threshold(&magnitude)?;
        let strong = magnitude.map(|&m| m > t);
        medial_axis(&strong, &mut skeleton, &mut distance)?;
        edges = edges.zip_map(&skeleton, |&e, &s| e || s)?;
    }

    Ok(edges)
}

/// Vesselness response rescaled to [0, 1] and inverted, ridges being low.
fn ridge_plane(plane: &Plane, params: &FrangiParams) -> Result<Plane, MeasureError> {
    let sigmas = scale_space(params.scale_range.0, params.scale_range.1, params.scale_step);
    let mut response = Image::from_size_val(plane.size(), 0.0f32)?;
    frangi(plane, &mut response, &sigmas, params.beta1, params.beta2, true)?;

    let max = response.as_slice().iter().fold(0.0f32, |m, &v| m.max(v));
    Ok(if max > 0.0 {
        response.map(|&v| 1.0 - v / max)
    } else {
        response.map(|_| 1.0)
    })
}

/// Give back to the objects the edge pixels they lost to the separation.
///
/// An edge pixel of the thresholded objects is restored when it passes every
/// color range and touches a kept object pixel.
fn reexpand(
    kept: &Mask,
    thresholded: &Mask,
    edges: &Mask,
    filters: &[(&ColorFilterParams, Plane)],
) -> Result<Mask, MeasureError> {
    let (rows, cols) = (kept.rows() as isize, kept.cols() as isize);
    let kept_data = kept.as_slice();
    let candidates = thresholded.zip_map(edges, |&t, &e| t && e)?;
    let candidates = candidates.as_slice();

    Ok(Mask::from_fn(kept.size(), |r, c, _| {
        let idx = r * kept.cols() + c;
        if kept_data[idx] {
            return true;
        }
        if !candidates[idx] {
            return false;
        }
        let passes = filters
            .iter()
            .all(|(params, plane)| params.contains(plane.as_slice()[idx]));
        let touches = (-1..=1).any(|dr| {
            (-1..=1).any(|dc| {
                let (rr, cc) = (r as isize + dr, c as isize + dc);
                rr >= 0 && cc >= 0 && rr < rows && cc < cols && kept_data[(rr * cols + cc) as usize]
            })
        });
        passes && touches
    })?)
}

/// Segment and measure the filaments of a raster with a vesselness filter.
///
/// Every plane goes through the Frangi filter and its inverted response is
/// thresholded against its local statistic; the objects of all planes are
/// intersected. When edge separation is enabled, thin edges are cut out of
/// the objects before the color filters and those that pass the color
/// ranges are restored afterwards. The objects then go through the
/// neighborhood, morphology, hollow and gap filling stages and a second
/// morphology filter, are skeletonized and go through the diameter filter
/// before being summarized.
///
/// # Errors
///
/// Returns an error when the configuration is inconsistent or a mandatory
/// stage fails.
pub fn segment_frangi(
    raster: &Raster,
    config: &FrangiConfig,
    image_name: &str,
) -> Result<SegmentationResult, MeasureError> {
    config.validate()?;
    let mut warnings = Vec::new();

    let planes = select_bands(raster, &config.color)?;
    log::debug!("{image_name}: selected {} bands", planes.len());
    let planes = enhance(planes, &config.clahe, &mut warnings);

    let edges = run_stage(
        "edge separation",
        &config.edge_separation,
        Mask::from_size_val(raster.size(), false)?,
        |_, params| separation_edges(&planes, params),
        &mut warnings,
    );

    let masks = planes
        .iter()
        .zip(config.thresholds.iter())
        .map(|(plane, params)| dark_objects(&ridge_plane(plane, &config.frangi)?, params))
        .collect::<Result<Vec<_>, _>>()?;
    let thresholded = intersect(masks)?;
    log::debug!("{image_name}: thresholded {} pixels", thresholded.count());

    let mut objects = thresholded.zip_map(&edges, |&t, &e| t && !e)?;
    for (i, stage) in config.color_filters.iter().enumerate() {
        objects = run_stage(
            &format!("color filter {}", i + 1),
            stage,
            objects,
            |objects, params| color_filter(raster, objects, params),
            &mut warnings,
        );
    }

    if edges.any() {
        // a filter whose band cannot be projected was already skipped above
        let filters = config
            .color_filters
            .iter()
            .filter_map(|stage| stage.params())
            .filter_map(|params| {
                project_band(raster, params.colorspace, params.band)
                    .ok()
                    .map(|plane| (params, plane))
            })
            .collect::<Vec<_>>();
        objects = reexpand(&objects, &thresholded, &edges, &filters)?;
    }

    let objects = run_stage(
        "neighborhood filter",
        &config.neighborhood,
        objects,
        |objects, params| neighborhood_filter(raster, objects, params),
        &mut warnings,
    );
    let objects = run_stage(
        "morphology filter",
        &config.morphology,
        objects,
        morphology_filter,
        &mut warnings,
    );
    let objects = run_stage(
        "hollow filter",
        &config.hollow,
        objects,
        |objects, params| hollow_filter(objects, params, &config.skeleton),
        &mut warnings,
    );
    let objects = run_stage("gap filling", &config.gap_fill, objects, fill_gaps, &mut warnings);
    let objects = run_stage(
        "morphology filter after gap filling",
        &config.morphology_after_gaps,
        objects,
        morphology_filter,
        &mut warnings,
    );

    let bundle = ObjectBundle::from_mask(&objects, &config.skeleton)?;
    log::debug!(
        "{image_name}: skeletonized {} objects",
        bundle.geometry().num_objects()
    );

    let bundle = run_stage(
        "diameter filter",
        &config.diameter,
        bundle,
        diameter_filter,
        &mut warnings,
    );

    let (summary, diameter_classes) =
        summarize(&bundle, config.diameter_bins.as_deref(), image_name)?;

    Ok(SegmentationResult {
        image_name: image_name.to_string(),
        summary,
        bundle,
        diameter_classes,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::Colorspace;
    use crate::config::ThresholdParams;
    use crate::stage::Stage;
    use rhizo_image::ImageSize;

    fn dark_line() -> Result<Raster, MeasureError> {
        let size = ImageSize {
            width: 64,
            height: 64,
        };
        let image = Image::from_fn(size, |r, c, _| {
            if (10..54).contains(&r) && (30..33).contains(&c) {
                0.1
            } else {
                0.9
            }
        })?;
        Ok(Raster::Mono(image))
    }

    fn config() -> FrangiConfig {
        FrangiConfig {
            frangi: FrangiParams {
                scale_range: (1.0, 3.0),
                scale_step: 1.0,
                beta1: 0.5,
                beta2: 0.05,
            },
            thresholds: vec![ThresholdParams {
                block_size: 31,
                offset: 0.1,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_ridge_plane_is_low_on_the_line() -> Result<(), MeasureError> {
        let Raster::Mono(image) = dark_line()? else {
            unreachable!()
        };
        let ridges = ridge_plane(&image, &config().frangi)?;
        assert!(ridges.get_pixel(31, 32, 0)? < 0.5);
        assert!(ridges.get_pixel(5, 32, 0)? > 0.9);
        Ok(())
    }

    #[test]
    fn test_segment_line() -> Result<(), MeasureError> {
        let result = segment_frangi(&dark_line()?, &config(), "line")?;
        assert!(result.warnings.is_empty());
        assert!(result.bundle.objects().get_pixel(31, 32, 0)?);
        assert!(!result.bundle.objects().get_pixel(5, 5, 0)?);
        Ok(())
    }

    #[test]
    fn test_color_filter_on_mono_raster_warns() -> Result<(), MeasureError> {
        let config = FrangiConfig {
            color_filters: vec![Stage::Apply(ColorFilterParams {
                colorspace: Colorspace::Hsv,
                band: 0,
                low: 0.0,
                high: 1.0,
                percent: 10.0,
            })],
            edge_separation: Stage::Apply(EdgeSeparationParams::default()),
            ..config()
        };
        let result = segment_frangi(&dark_line()?, &config, "line")?;
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].stage, "color filter 1");
        Ok(())
    }

    #[test]
    fn test_reexpand_restores_touching_edges() -> Result<(), MeasureError> {
        let size = ImageSize {
            width: 5,
            height: 1,
        };
        let thresholded = Image::new(size, vec![true, true, true, true, false])?;
        let edges = Image::new(size, vec![false, true, false, true, false])?;
        let kept = Image::new(size, vec![true, false, false, false, false])?;
        let restored = reexpand(&kept, &thresholded, &edges, &[])?;
        assert_eq!(restored.as_slice(), &[true, true, false, false, false]);
        Ok(())
    }
}
