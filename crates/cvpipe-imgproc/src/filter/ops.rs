use cvpipe_image::{Image, ImageDtype, ImageError};

use super::{filter2d, kernels, separable_filter};

/// Blur an image using a box blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The size of the kernel (kernel_x, kernel_y).
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn box_blur<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel_size: (usize, usize),
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if kernel_size.0 == 0 || kernel_size.1 == 0 {
        return Err(ImageError::InvalidKernelSize(kernel_size.0, kernel_size.1));
    }
    let kernel_x = kernels::box_blur_kernel_1d(kernel_size.0);
    let kernel_y = kernels::box_blur_kernel_1d(kernel_size.1);
    separable_filter(src, dst, &kernel_x, &kernel_y)?;
    Ok(())
}

/// Blur an image using a gaussian blur filter
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The size of the kernel (kernel_x, kernel_y). Both must be odd.
/// * `sigma` - The sigma of the gaussian kernel. Non positive values are derived from the kernel size.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
pub fn gaussian_blur<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel_size: (usize, usize),
    sigma: (f32, f32),
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if kernel_size.0 % 2 == 0 || kernel_size.1 % 2 == 0 {
        return Err(ImageError::InvalidKernelSize(kernel_size.0, kernel_size.1));
    }
    let kernel_x = kernels::gaussian_kernel_1d(kernel_size.0, sigma.0);
    let kernel_y = kernels::gaussian_kernel_1d(kernel_size.1, sigma.1);
    separable_filter(src, dst, &kernel_x, &kernel_y)?;
    Ok(())
}

/// Compute the sobel derivative of an image.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `dx` - The order of the derivative along x, at most 2.
/// * `dy` - The order of the derivative along y, at most 2.
/// * `kernel_size` - The aperture size, 1, 3 or 5.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::filter::sobel;
///
/// let src = Image::<f32, 1>::new(
///     ImageSize { width: 3, height: 3 },
///     vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0, 0.0, 1.0, 2.0],
/// )
/// .unwrap();
/// let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0).unwrap();
///
/// sobel(&src, &mut dst, 1, 0, 3).unwrap();
/// assert_eq!(dst.as_slice()[4], 8.0);
/// ```
pub fn sobel<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    dx: usize,
    dy: usize,
    kernel_size: usize,
) -> Result<(), ImageError> {
    let kernel_x = kernels::derivative_kernel_1d(dx, kernel_size)?;
    let kernel_y = kernels::derivative_kernel_1d(dy, kernel_size)?;
    separable_filter(src, dst, &kernel_x, &kernel_y)
}

/// Compute the laplacian of an image.
///
/// Aperture 1 uses the 3x3 kernel `[0, 1, 0; 1, -4, 1; 0, 1, 0]`, larger apertures
/// sum the second order sobel derivatives along both axes.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The aperture size, 1, 3 or 5.
pub fn laplacian<const C: usize>(
    src: &Image<f32, C>,
    dst: &mut Image<f32, C>,
    kernel_size: usize,
) -> Result<(), ImageError> {
    if kernel_size == 1 {
        #[rustfmt::skip]
        let kernel = [
            0.0, 1.0, 0.0,
            1.0, -4.0, 1.0,
            0.0, 1.0, 0.0,
        ];
        return filter2d(src, dst, &kernel, (3, 3));
    }

    let d2 = kernels::derivative_kernel_1d(2, kernel_size)?;
    let smooth = kernels::derivative_kernel_1d(0, kernel_size)?;

    let mut dxx = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    separable_filter(src, &mut dxx, &d2, &smooth)?;
    separable_filter(src, dst, &smooth, &d2)?;

    dst.as_slice_mut()
        .iter_mut()
        .zip(dxx.as_slice())
        .for_each(|(d, &xx)| *d += xx);

    Ok(())
}
