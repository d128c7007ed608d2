use rhizo_image::{Image, ImageError, ImageSize, Mask};

fn check_half_axes(half_axes: (f32, f32)) -> Result<(), ImageError> {
    if half_axes.0 <= 0.0 || half_axes.1 <= 0.0 {
        return Err(ImageError::InvalidParameter(
            "half_axes".to_string(),
            format!("{half_axes:?} must be positive"),
        ));
    }
    Ok(())
}

fn inscribed(size: ImageSize) -> (f32, f32) {
    let r = size.width.min(size.height) as f32 / 2.0;
    (r, r)
}

/// Draw a filled ellipse centered on the image.
///
/// # Arguments
///
/// * `size` - The size of the mask.
/// * `half_axes` - Vertical and horizontal half axes in pixels. `None` draws
///   the circle inscribed in the image.
///
/// # Example
///
/// ```
/// use rhizo_image::ImageSize;
/// use rhizo_imgproc::draw::draw_ellipse;
///
/// let mask = draw_ellipse(ImageSize { width: 9, height: 9 }, None).unwrap();
/// assert!(mask.get_pixel(4, 4, 0).unwrap());
/// assert!(!mask.get_pixel(0, 0, 0).unwrap());
/// ```
pub fn draw_ellipse(size: ImageSize, half_axes: Option<(f32, f32)>) -> Result<Mask, ImageError> {
    let (a, b) = half_axes.unwrap_or_else(|| inscribed(size));
    check_half_axes((a, b))?;

    let cy = (size.height as f32 - 1.0) / 2.0;
    let cx = (size.width as f32 - 1.0) / 2.0;
    Image::from_fn(size, |r, c, _| {
        let dy = (r as f32 - cy) / a;
        let dx = (c as f32 - cx) / b;
        dy * dy + dx * dx <= 1.0
    })
}

/// Draw a filled rectangle centered on the image.
///
/// `half_sides` are the vertical and horizontal half lengths in pixels, the
/// default being the square inscribed in the image.
pub fn draw_rectangle(size: ImageSize, half_sides: Option<(f32, f32)>) -> Result<Mask, ImageError> {
    let (a, b) = half_sides.unwrap_or_else(|| inscribed(size));
    check_half_axes((a, b))?;

    let cy = (size.height as f32 - 1.0) / 2.0;
    let cx = (size.width as f32 - 1.0) / 2.0;
    Image::from_fn(size, |r, c, _| {
        (r as f32 - cy).abs() <= a && (c as f32 - cx).abs() <= b
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_ellipse_axes() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 21,
            height: 11,
        };
        let mask = draw_ellipse(size, Some((2.0, 8.0)))?;
        // center row spans 2 * 8 + 1 pixels
        let row = (0..21).filter(|&c| mask.get_pixel(c, 5, 0).unwrap_or(false)).count();
        assert_eq!(row, 17);
        let col = (0..11).filter(|&r| mask.get_pixel(10, r, 0).unwrap_or(false)).count();
        assert_eq!(col, 5);
        Ok(())
    }

    #[test]
    fn test_draw_rectangle_default() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 8,
            height: 4,
        };
        let mask = draw_rectangle(size, None)?;
        // half side of 2 around a center at column 3.5
        assert_eq!(mask.count(), 4 * 4);
        assert!(draw_rectangle(size, Some((0.0, 1.0))).is_err());
        Ok(())
    }
}
