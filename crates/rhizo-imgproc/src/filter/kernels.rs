/// Create a box blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
///
/// # Returns
///
/// A vector of the kernel.
pub fn box_blur_kernel_1d(kernel_size: usize) -> Vec<f32> {
    vec![1.0 / kernel_size as f32; kernel_size]
}

/// Radius of a gaussian kernel truncated at four standard deviations.
pub fn gaussian_kernel_radius(sigma: f32) -> usize {
    (4.0 * sigma + 0.5).max(0.0) as usize
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// A vector of the kernel.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = (kernel_size - 1) as f32 / 2.0;
    let sigma_sq = sigma * sigma;

    // compute the kernel
    for i in 0..kernel_size {
        let x = i as f32 - mean;
        kernel.push((-(x * x) / (2.0 * sigma_sq)).exp());
    }

    // normalize the kernel
    let norm = kernel.iter().sum::<f32>();
    kernel.iter_mut().for_each(|k| *k /= norm);
    kernel
}

/// Create the derivative pair of a normalized scharr operator.
///
/// # Returns
///
/// The derivative kernel and the orthogonal smoothing kernel.
pub fn scharr_kernel_1d() -> (Vec<f32>, Vec<f32>) {
    (vec![-0.5, 0.0, 0.5], vec![3.0 / 16.0, 10.0 / 16.0, 3.0 / 16.0])
}

/// Create the derivative pair of a normalized prewitt operator.
///
/// # Returns
///
/// The derivative kernel and the orthogonal smoothing kernel.
pub fn prewitt_kernel_1d() -> (Vec<f32>, Vec<f32>) {
    (vec![-0.5, 0.0, 0.5], vec![1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gaussian_kernel_1d() {
        let kernel = gaussian_kernel_1d(5, 0.5);

        let expected = [
            0.00026386508,
            0.10645077,
            0.78657067,
            0.10645077,
            0.00026386508,
        ];

        for (k, e) in kernel.iter().zip(expected.iter()) {
            approx::assert_relative_eq!(k, e, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_gaussian_kernel_radius() {
        assert_eq!(gaussian_kernel_radius(1.0), 4);
        assert_eq!(gaussian_kernel_radius(4.67), 19);
    }

    #[test]
    fn test_derivative_kernels_sum() {
        let (d, s) = scharr_kernel_1d();
        approx::assert_relative_eq!(d.iter().sum::<f32>(), 0.0);
        approx::assert_relative_eq!(s.iter().sum::<f32>(), 1.0);
        let (d, s) = prewitt_kernel_1d();
        approx::assert_relative_eq!(d.iter().sum::<f32>(), 0.0);
        approx::assert_relative_eq!(s.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
    }
}
