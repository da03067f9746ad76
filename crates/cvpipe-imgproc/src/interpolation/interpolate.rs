use cvpipe_image::{Image, ImageDtype};

use super::bicubic::bicubic_interpolation;
use super::bilinear::bilinear_interpolation;
use super::nearest::nearest_neighbor_interpolation;

/// Interpolation mode for the resize and warp operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    /// Nearest neighbor interpolation
    Nearest,
    /// Bilinear interpolation
    Bilinear,
    /// Bicubic interpolation
    Bicubic,
}

/// How samples outside of the image are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    /// Clamp the coordinates to the image.
    Replicate,
    /// Samples outside of the image are zero.
    Constant,
}

/// Read the pixel at (x, y), resolving out of bounds coordinates with `border`.
#[inline]
pub(crate) fn tap<T, const C: usize>(
    image: &Image<T, C>,
    x: isize,
    y: isize,
    border: BorderMode,
) -> Option<&[T]> {
    let (cols, rows) = (image.cols() as isize, image.rows() as isize);
    if cols == 0 || rows == 0 {
        return None;
    }

    match border {
        BorderMode::Replicate => {
            let x = x.clamp(0, cols - 1) as usize;
            let y = y.clamp(0, rows - 1) as usize;
            Some(image.pixel(x, y))
        }
        BorderMode::Constant => {
            if x < 0 || y < 0 || x >= cols || y >= rows {
                None
            } else {
                Some(image.pixel(x as usize, y as usize))
            }
        }
    }
}

/// Kernel for interpolating a pixel value
///
/// # Arguments
///
/// * `image` - The input image container with shape (height, width, C).
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `interpolation` - The interpolation mode to use.
/// * `border` - How samples outside the image are read.
///
/// # Returns
///
/// The interpolated pixel values.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::interpolation::{interpolate_pixel, BorderMode, InterpolationMode};
///
/// let image = Image::<f32, 1>::new(ImageSize { width: 2, height: 1 }, vec![0.0, 10.0]).unwrap();
///
/// let pixel = interpolate_pixel(&image, 0.5, 0.0, InterpolationMode::Bilinear, BorderMode::Replicate);
/// assert_eq!(pixel, [5.0]);
/// ```
pub fn interpolate_pixel<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
    interpolation: InterpolationMode,
    border: BorderMode,
) -> [f32; C] {
    match interpolation {
        InterpolationMode::Nearest => nearest_neighbor_interpolation(image, u, v, border),
        InterpolationMode::Bilinear => bilinear_interpolation(image, u, v, border),
        InterpolationMode::Bicubic => bicubic_interpolation(image, u, v, border),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvpipe_image::{ImageError, ImageSize};

    #[test]
    fn test_interpolate_on_grid() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new(
            ImageSize {
                width: 3,
                height: 3,
            },
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9],
        )?;

        for mode in [
            InterpolationMode::Nearest,
            InterpolationMode::Bilinear,
            InterpolationMode::Bicubic,
        ] {
            let p = interpolate_pixel(&image, 1.0, 1.0, mode, BorderMode::Replicate);
            approx::assert_relative_eq!(p[0], 5.0, epsilon = 1e-5);
        }

        Ok(())
    }

    #[test]
    fn test_interpolate_constant_border() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            8.0,
        )?;

        let p = interpolate_pixel(
            &image,
            -0.5,
            0.0,
            InterpolationMode::Bilinear,
            BorderMode::Constant,
        );
        assert_eq!(p, [4.0]);

        let p = interpolate_pixel(
            &image,
            -0.5,
            0.0,
            InterpolationMode::Bilinear,
            BorderMode::Replicate,
        );
        assert_eq!(p, [8.0]);

        Ok(())
    }
}
