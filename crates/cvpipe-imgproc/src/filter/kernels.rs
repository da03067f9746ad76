use cvpipe_image::ImageError;

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

/// The sigma used for a gaussian kernel when none is given.
pub fn default_gaussian_sigma(kernel_size: usize) -> f32 {
    0.3 * ((kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Create a gaussian blur kernel.
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel.
/// * `sigma` - The sigma of the gaussian kernel. When not positive it is derived
///   from the kernel size with [`default_gaussian_sigma`].
///
/// # Returns
///
/// A normalized vector of the kernel.
pub fn gaussian_kernel_1d(kernel_size: usize, sigma: f32) -> Vec<f32> {
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        default_gaussian_sigma(kernel_size)
    };

    let mut kernel = Vec::with_capacity(kernel_size);

    let mean = (kernel_size as f32 - 1.0) / 2.0;
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

/// Create a 1d derivative kernel of the given order.
///
/// Order 0 is the binomial smoothing kernel that accompanies a derivative
/// along the other axis.
///
/// # Arguments
///
/// * `order` - The derivative order, 0, 1 or 2.
/// * `kernel_size` - The size of the kernel, 1, 3 or 5.
///
/// # Errors
///
/// Returns [`ImageError::InvalidKernelSize`] for any other combination.
pub fn derivative_kernel_1d(order: usize, kernel_size: usize) -> Result<Vec<f32>, ImageError> {
    let kernel = match (order, kernel_size) {
        (0, 1) => vec![1.0],
        (0, 3) => vec![1.0, 2.0, 1.0],
        (0, 5) => vec![1.0, 4.0, 6.0, 4.0, 1.0],
        (1, 1) | (1, 3) => vec![-1.0, 0.0, 1.0],
        (1, 5) => vec![-1.0, -2.0, 0.0, 2.0, 1.0],
        (2, 1) | (2, 3) => vec![1.0, -2.0, 1.0],
        (2, 5) => vec![1.0, 0.0, -2.0, 0.0, 1.0],
        _ => return Err(ImageError::InvalidKernelSize(kernel_size, order)),
    };
    Ok(kernel)
}

/// Create a sobel kernel pair (derivative, smoothing).
///
/// # Arguments
///
/// * `kernel_size` - The size of the kernel, 3 or 5.
pub fn sobel_kernel_1d(kernel_size: usize) -> Result<(Vec<f32>, Vec<f32>), ImageError> {
    Ok((
        derivative_kernel_1d(1, kernel_size)?,
        derivative_kernel_1d(0, kernel_size)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sobel_kernel_1d() -> Result<(), ImageError> {
        let kernel = sobel_kernel_1d(3)?;
        assert_eq!(kernel.0, vec![-1.0, 0.0, 1.0]);
        assert_eq!(kernel.1, vec![1.0, 2.0, 1.0]);

        let kernel = sobel_kernel_1d(5)?;
        assert_eq!(kernel.0, vec![-1.0, -2.0, 0.0, 2.0, 1.0]);
        assert_eq!(kernel.1, vec![1.0, 4.0, 6.0, 4.0, 1.0]);

        assert!(sobel_kernel_1d(7).is_err());
        Ok(())
    }

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

        for (i, &k) in kernel.iter().enumerate() {
            approx::assert_relative_eq!(k, expected[i], epsilon = 1e-6);
        }
    }

    #[test]
    fn test_gaussian_kernel_default_sigma() {
        approx::assert_relative_eq!(default_gaussian_sigma(5), 1.1, epsilon = 1e-6);

        let kernel = gaussian_kernel_1d(5, 0.0);
        approx::assert_relative_eq!(kernel.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        assert!(kernel[2] > kernel[1] && kernel[1] > kernel[0]);
    }
}
