use rhizo_image::{Image, ImageError, Mask};

use super::kernel::Kernel;
use crate::filter::reflect_index;
use crate::parallel;

fn check_sizes(src: &Mask, dst: &Mask) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

/// Shared sweep of dilation and erosion.
///
/// `hit` is the value that decides the output as soon as it is found under
/// the kernel; pixels outside the image read as `border`.
fn sweep(src: &Mask, dst: &mut Mask, kernel: &Kernel, hit: bool, border: bool) {
    let (rows, cols) = (src.rows() as isize, src.cols() as isize);
    let data = src.as_slice();
    let offsets = kernel.offsets();

    parallel::par_fill_rows(dst, |r, row| {
        for (c, out) in row.iter_mut().enumerate() {
            let found = offsets.iter().any(|&(dy, dx)| {
                let rr = r as isize + dy;
                let cc = c as isize + dx;
                let v = if rr < 0 || cc < 0 || rr >= rows || cc >= cols {
                    border
                } else {
                    data[(rr * cols + cc) as usize]
                };
                v == hit
            });
            *out = if found { hit } else { !hit };
        }
    });
}

/// Binary dilation of a mask.
///
/// Pixels outside the image are treated as background.
///
/// # Arguments
///
/// * `src` - The input mask.
/// * `dst` - The output mask, same size as the input.
/// * `kernel` - The structuring element.
pub fn dilate(src: &Mask, dst: &mut Mask, kernel: &Kernel) -> Result<(), ImageError> {
    check_sizes(src, dst)?;
    sweep(src, dst, kernel, true, false);
    Ok(())
}

/// Binary erosion of a mask.
///
/// Pixels outside the image are treated as foreground, so objects touching
/// the border are not eroded from it.
///
/// # Arguments
///
/// * `src` - The input mask.
/// * `dst` - The output mask, same size as the input.
/// * `kernel` - The structuring element.
pub fn erode(src: &Mask, dst: &mut Mask, kernel: &Kernel) -> Result<(), ImageError> {
    check_sizes(src, dst)?;
    sweep(src, dst, kernel, false, true);
    Ok(())
}

/// Binary opening: erosion followed by dilation.
pub fn open(src: &Mask, dst: &mut Mask, kernel: &Kernel) -> Result<(), ImageError> {
    let mut tmp = Image::from_size_val(src.size(), false)?;
    erode(src, &mut tmp, kernel)?;
    dilate(&tmp, dst, kernel)
}

/// Binary closing: dilation followed by erosion.
pub fn close(src: &Mask, dst: &mut Mask, kernel: &Kernel) -> Result<(), ImageError> {
    let mut tmp = Image::from_size_val(src.size(), false)?;
    dilate(src, &mut tmp, kernel)?;
    erode(&tmp, dst, kernel)
}

/// Binary median filter over the footprint of a kernel.
///
/// The output is the middle order statistic of the footprint, i.e. `true`
/// when at least `n - n / 2` of the `n` footprint samples are `true`. Borders
/// are handled by symmetric reflection.
pub fn binary_median(src: &Mask, dst: &mut Mask, kernel: &Kernel) -> Result<(), ImageError> {
    check_sizes(src, dst)?;

    let (rows, cols) = (src.rows(), src.cols());
    let data = src.as_slice();
    let offsets = kernel.offsets();
    let n = offsets.len();
    let needed = n - n / 2;

    parallel::par_fill_rows(dst, |r, row| {
        for (c, out) in row.iter_mut().enumerate() {
            let count = offsets
                .iter()
                .filter(|&&(dy, dx)| {
                    let rr = reflect_index(r as isize + dy, rows);
                    let cc = reflect_index(c as isize + dx, cols);
                    data[rr * cols + cc]
                })
                .count();
            *out = n > 0 && count >= needed;
        }
    });

    Ok(())
}
