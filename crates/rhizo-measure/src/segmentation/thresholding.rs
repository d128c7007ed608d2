use rhizo_imgproc::draw::{draw_ellipse, draw_rectangle};

use super::{dark_objects, enhance, intersect, summarize, SegmentationResult};
use crate::bands::select_bands;
use crate::config::{MaskShape, ThresholdingConfig};
use crate::error::MeasureError;
use crate::gaps::fill_gaps;
use crate::geometry_filters::{diameter_filter, length_width_filter};
use crate::noise::{noise_smoothing, small_object_removal};
use crate::raster::Raster;
use crate::shape::morphology_filter;
use crate::skeleton::ObjectBundle;
use crate::stage::run_stage;

/// Segment and measure the objects of a raster by adaptive thresholding.
///
/// Every plane is thresholded against its local statistic and the objects
/// of all planes are intersected. The objects then go through the region of
/// interest, dirt removal, noise smoothing, morphology filter and gap
/// filling stages, are skeletonized, and go through the length to width and
/// diameter filters before being summarized.
///
/// # Errors
///
/// Returns an error when the configuration is inconsistent or a mandatory
/// stage fails.
pub fn segment_thresholding(
    raster: &Raster,
    config: &ThresholdingConfig,
    image_name: &str,
) -> Result<SegmentationResult, MeasureError> {
    config.validate()?;
    let mut warnings = Vec::new();

    let planes = select_bands(raster, &config.color)?;
    log::debug!("{image_name}: selected {} bands", planes.len());
    let planes = enhance(planes, &config.clahe, &mut warnings);

    let masks = planes
        .iter()
        .zip(config.thresholds.iter())
        .map(|(plane, params)| dark_objects(plane, params))
        .collect::<Result<Vec<_>, _>>()?;
    let objects = intersect(masks)?;
    log::debug!("{image_name}: thresholded {} pixels", objects.count());

    let objects = run_stage(
        "mask",
        &config.mask,
        objects,
        |objects, params| {
            let roi = match params.shape {
                MaskShape::Ellipse => draw_ellipse(objects.size(), params.half_axes)?,
                MaskShape::Rectangle => draw_rectangle(objects.size(), params.half_axes)?,
            };
            Ok(objects.zip_map(&roi, |&o, &m| o && m)?)
        },
        &mut warnings,
    );
    let objects = run_stage(
        "small object removal",
        &config.small_objects,
        objects,
        small_object_removal,
        &mut warnings,
    );
    let objects = run_stage(
        "noise smoothing",
        &config.smoothing,
        objects,
        noise_smoothing,
        &mut warnings,
    );
    let objects = run_stage(
        "morphology filter",
        &config.morphology,
        objects,
        morphology_filter,
        &mut warnings,
    );
    let objects = run_stage("gap filling", &config.gap_fill, objects, fill_gaps, &mut warnings);

    let bundle = ObjectBundle::from_mask(&objects, &config.skeleton)?;
    log::debug!(
        "{image_name}: skeletonized {} objects",
        bundle.geometry().num_objects()
    );

    let bundle = run_stage(
        "length width filter",
        &config.length_width,
        bundle,
        length_width_filter,
        &mut warnings,
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
    use crate::config::{MaskParams, ThresholdParams};
    use crate::gaps::GapFillParams;
    use crate::geometry_filters::DiameterParams;
    use crate::stage::Stage;
    use crate::summarize::Summary;
    use rhizo_image::{Image, ImageSize};

    fn dark_square() -> Result<Raster, MeasureError> {
        let size = ImageSize {
            width: 40,
            height: 40,
        };
        let image = Image::from_fn(size, |r, c, _| {
            if (15..25).contains(&r) && (15..25).contains(&c) {
                0.0
            } else {
                1.0
            }
        })?;
        Ok(Raster::Mono(image))
    }

    fn config() -> ThresholdingConfig {
        ThresholdingConfig {
            thresholds: vec![ThresholdParams {
                block_size: 31,
                offset: 0.05,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_segment_square() -> Result<(), MeasureError> {
        let result = segment_thresholding(&dark_square()?, &config(), "square")?;
        assert!(result.warnings.is_empty());
        assert_eq!(result.bundle.objects().count(), 100);
        let Summary::Total(row) = result.summary else {
            panic!("expected totals");
        };
        assert_eq!(row.n_objects, 1);
        assert!(result.diameter_classes.is_none());
        Ok(())
    }

    #[test]
    fn test_failing_stage_is_skipped() -> Result<(), MeasureError> {
        let config = ThresholdingConfig {
            mask: Stage::Apply(MaskParams {
                half_axes: Some((-1.0, 5.0)),
                ..Default::default()
            }),
            diameter_bins: Some(vec![2.0, 4.0]),
            ..config()
        };
        let result = segment_thresholding(&dark_square()?, &config, "square")?;
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].stage, "mask");
        assert_eq!(result.bundle.objects().count(), 100);

        let Summary::ByDiameter(rows) = result.summary else {
            panic!("expected diameter classes");
        };
        assert_eq!(rows.len(), 3);
        Ok(())
    }

    #[test]
    fn test_invalid_optional_parameters_warn() -> Result<(), MeasureError> {
        let config = ThresholdingConfig {
            gap_fill: Stage::Apply(GapFillParams {
                closing_radius: -1.0,
                ..Default::default()
            }),
            diameter: Stage::Apply(DiameterParams {
                max_percentile: 120.0,
                ..Default::default()
            }),
            ..config()
        };
        config.validate()?;

        let result = segment_thresholding(&dark_square()?, &config, "square")?;
        let stages = result
            .warnings
            .iter()
            .map(|w| w.stage.as_str())
            .collect::<Vec<_>>();
        assert_eq!(stages, vec!["gap filling", "diameter filter"]);
        assert_eq!(result.bundle.objects().count(), 100);
        Ok(())
    }
}
