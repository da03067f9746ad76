use cvpipe_image::{Image, ImageDtype, ImageError, ImageSize};

use crate::filter::separable_filter;
use crate::interpolation::InterpolationMode;
use crate::parallel;
use crate::resize::resize_native;

/// Binomial weights of the 5x5 pyramid kernel, applied once per axis.
const BINOMIAL5: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// The size of the next level down the pyramid, `((W + 1) / 2, (H + 1) / 2)`.
pub fn pyrdown_size(size: ImageSize) -> ImageSize {
    ImageSize {
        width: (size.width + 1) / 2,
        height: (size.height + 1) / 2,
    }
}

/// Smooth with the pyramid kernel and keep every other row and column.
///
/// `dst` must have size [`pyrdown_size`] of the source.
///
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::pyramid::{pyrdown, pyrdown_size};
///
/// let image = Image::<u8, 1>::from_size_val(ImageSize { width: 5, height: 4 }, 7).unwrap();
/// let mut downsampled = Image::<u8, 1>::from_size_val(pyrdown_size(image.size()), 0).unwrap();
///
/// pyrdown(&image, &mut downsampled).unwrap();
/// assert_eq!(downsampled.size(), ImageSize { width: 3, height: 2 });
/// assert!(downsampled.as_slice().iter().all(|&v| v == 7));
/// ```
pub fn pyrdown<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    let expected = pyrdown_size(src.size());
    if dst.size() != expected {
        return Err(ImageError::InvalidImageSize(
            expected.width,
            expected.height,
            dst.width(),
            dst.height(),
        ));
    }

    let mut blurred = Image::<f32, C>::from_size_val(src.size(), 0.0)?;
    let src_f32 = src.cast::<f32>()?;

    separable_filter(&src_f32, &mut blurred, &BINOMIAL5, &BINOMIAL5)?;

    parallel::par_fill_rows(dst, |r, dst_row| {
        for (c, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
            let pixel = blurred.pixel(c * 2, r * 2);
            for (d, &p) in dst_pixel.iter_mut().zip(pixel.iter()) {
                *d = T::from_f32(p);
            }
        }
    });

    Ok(())
}

/// Bilinear upsampling to the size of `dst`, smoothed with the pyramid kernel.
///
/// `dst` is usually twice the size of `src` but any non empty size works.
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::pyramid::pyrup;
///
/// let level = Image::<u8, 3>::from_size_val(ImageSize { width: 3, height: 2 }, 40).unwrap();
/// let mut up = Image::<u8, 3>::from_size_val(ImageSize { width: 6, height: 4 }, 0).unwrap();
///
/// pyrup(&level, &mut up).unwrap();
/// assert!(up.as_slice().iter().all(|&v| v == 40));
/// ```
pub fn pyrup<T, const C: usize>(src: &Image<T, C>, dst: &mut Image<T, C>) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if dst.width() == 0 || dst.height() == 0 {
        return Err(ImageError::InvalidImageSize(
            src.width() * 2,
            src.height() * 2,
            dst.width(),
            dst.height(),
        ));
    }

    let src_f32 = src.cast::<f32>()?;
    let mut upsampled = Image::<f32, C>::from_size_val(dst.size(), 0.0)?;
    resize_native(&src_f32, &mut upsampled, InterpolationMode::Bilinear)?;

    let mut blurred = Image::<f32, C>::from_size_val(dst.size(), 0.0)?;
    separable_filter(&upsampled, &mut blurred, &BINOMIAL5, &BINOMIAL5)?;

    dst.as_slice_mut()
        .iter_mut()
        .zip(blurred.as_slice())
        .for_each(|(d, &b)| *d = T::from_f32(b));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pyrup_stays_within_source_range() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::new([2, 2].into(), vec![0.0, 1.0, 2.0, 3.0])?;
        let mut dst = Image::<f32, 1>::from_size_val([4, 4].into(), -1.0)?;
        pyrup(&src, &mut dst)?;

        assert!(dst.as_slice().iter().all(|v| (0.0..=3.0).contains(v)));

        let empty = Image::<f32, 1>::from_size_val([0, 0].into(), 0.0)?;
        let mut dst_empty = empty.clone();
        assert!(pyrup(&src, &mut dst_empty).is_err());

        Ok(())
    }

    #[test]
    fn pyrdown_rejects_wrong_destination() -> Result<(), ImageError> {
        let src = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 5,
                height: 5,
            },
            0,
        )?;
        let mut dst = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            0,
        )?;

        assert_eq!(
            pyrdown(&src, &mut dst),
            Err(ImageError::InvalidImageSize(3, 3, 2, 2))
        );

        Ok(())
    }

    #[test]
    fn pyrdown_of_flat_row() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::new(
            ImageSize {
                width: 4,
                height: 1,
            },
            vec![16.0, 16.0, 16.0, 16.0],
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(pyrdown_size(src.size()), 0.0)?;
        pyrdown(&src, &mut dst)?;

        assert_eq!(dst.size(), ImageSize { width: 2, height: 1 });
        approx::assert_relative_eq!(dst.as_slice()[0], 16.0, epsilon = 1e-5);
        approx::assert_relative_eq!(dst.as_slice()[1], 16.0, epsilon = 1e-5);

        Ok(())
    }
}
