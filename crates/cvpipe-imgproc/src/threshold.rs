use num_traits::Zero;

use cvpipe_image::{Image, ImageError};

use crate::core::check_size;
use crate::filter;
use crate::parallel;

/// Fixed level threshold variants. A sample passes when it is greater than
/// or equal to the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdType {
    /// See [`threshold_binary`].
    Binary,
    /// See [`threshold_binary_inverse`].
    BinaryInv,
    /// See [`threshold_truncate`].
    Trunc,
    /// See [`threshold_to_zero`].
    ToZero,
    /// See [`threshold_to_zero_inverse`].
    ToZeroInv,
}

/// How the local threshold of [`adaptive_threshold`] is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdaptiveMethod {
    /// Mean of the block neighborhood.
    Mean,
    /// Gaussian weighted sum of the block neighborhood.
    Gaussian,
}

fn map_samples<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    f: impl Fn(T) -> T + Send + Sync,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    check_size(src, dst)?;
    parallel::par_iter_rows_val(src, dst, |s, d| *d = f(*s));
    Ok(())
}

/// `max_value` where a sample reaches `threshold`, zero elsewhere.
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::threshold::threshold_binary;
///
/// let levels = Image::<u8, 1>::new(ImageSize { width: 4, height: 1 }, vec![0, 127, 128, 255]).unwrap();
/// let mut mask = Image::<u8, 1>::from_size_val(levels.size(), 9).unwrap();
///
/// threshold_binary(&levels, &mut mask, 128, 255).unwrap();
/// assert_eq!(mask.as_slice(), &[0, 0, 255, 255]);
/// ```
pub fn threshold_binary<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
    max_value: T,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd + Zero,
{
    map_samples(src, dst, |v| if v >= threshold { max_value } else { T::zero() })
}

/// Zero where a sample reaches `threshold`, `max_value` elsewhere.
pub fn threshold_binary_inverse<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
    max_value: T,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd + Zero,
{
    map_samples(src, dst, |v| if v >= threshold { T::zero() } else { max_value })
}

/// Clip samples from above at `threshold`.
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::threshold::threshold_truncate;
///
/// let levels = Image::<f32, 1>::new(ImageSize { width: 3, height: 1 }, vec![0.2, 0.5, 0.9]).unwrap();
/// let mut clipped = Image::<f32, 1>::from_size_val(levels.size(), 0.0).unwrap();
///
/// threshold_truncate(&levels, &mut clipped, 0.5).unwrap();
/// assert_eq!(clipped.as_slice(), &[0.2, 0.5, 0.5]);
/// ```
pub fn threshold_truncate<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd,
{
    map_samples(src, dst, |v| if v >= threshold { threshold } else { v })
}

/// Keep samples that reach `threshold`, zero the rest.
pub fn threshold_to_zero<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd + Zero,
{
    map_samples(src, dst, |v| if v >= threshold { v } else { T::zero() })
}

/// Zero samples that reach `threshold`, keep the rest.
pub fn threshold_to_zero_inverse<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd + Zero,
{
    map_samples(src, dst, |v| if v >= threshold { T::zero() } else { v })
}

/// Dispatch on `threshold_type`.
///
/// `max_value` only matters for the two binary variants.
pub fn threshold<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    threshold: T,
    max_value: T,
    threshold_type: ThresholdType,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd + Zero,
{
    match threshold_type {
        ThresholdType::Binary => threshold_binary(src, dst, threshold, max_value),
        ThresholdType::BinaryInv => threshold_binary_inverse(src, dst, threshold, max_value),
        ThresholdType::Trunc => threshold_truncate(src, dst, threshold),
        ThresholdType::ToZero => threshold_to_zero(src, dst, threshold),
        ThresholdType::ToZeroInv => threshold_to_zero_inverse(src, dst, threshold),
    }
}

/// 255 where every channel lies in `lower[c]..=upper[c]`, 0 elsewhere.
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::threshold::in_range;
///
/// // hsv pixels: a saturated green and a saturated red
/// let hsv = Image::<u8, 3>::new(ImageSize { width: 2, height: 1 }, vec![60, 200, 200, 10, 200, 200]).unwrap();
///
/// let mut mask = Image::<u8, 1>::from_size_val(hsv.size(), 0).unwrap();
/// in_range(&hsv, &mut mask, &[50, 100, 100], &[70, 255, 255]).unwrap();
/// assert_eq!(mask.as_slice(), &[255, 0]);
/// ```
pub fn in_range<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<u8, 1>,
    lower: &[T; C],
    upper: &[T; C],
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync + PartialOrd,
{
    check_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |px, mask| {
        let inside = (0..C).all(|c| lower[c] <= px[c] && px[c] <= upper[c]);
        mask[0] = if inside { 255 } else { 0 };
    });

    Ok(())
}

/// Threshold a grayscale image against a threshold computed per pixel.
///
/// The local threshold is the mean (or Gaussian weighted mean) of the
/// `block_size x block_size` neighborhood minus `c`. With [`ThresholdType::Binary`]
/// a pixel becomes `max_value` when it is strictly above its local threshold.
///
/// `block_size` must be odd and at least 3, and only the two binary
/// threshold types are accepted.
pub fn adaptive_threshold(
    src: &Image<u8, 1>,
    dst: &mut Image<u8, 1>,
    max_value: u8,
    method: AdaptiveMethod,
    threshold_type: ThresholdType,
    block_size: usize,
    c: f32,
) -> Result<(), ImageError> {
    check_size(src, dst)?;

    if block_size < 3 || block_size % 2 == 0 {
        return Err(ImageError::InvalidKernelSize(block_size, block_size));
    }

    let inverse = match threshold_type {
        ThresholdType::Binary => false,
        ThresholdType::BinaryInv => true,
        _ => return Err(ImageError::InvalidKernelSize(block_size, block_size)),
    };

    let src_f32 = src.cast::<f32>()?;
    let mut local = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    match method {
        AdaptiveMethod::Mean => {
            filter::box_blur(&src_f32, &mut local, (block_size, block_size))?;
        }
        AdaptiveMethod::Gaussian => {
            filter::gaussian_blur(&src_f32, &mut local, (block_size, block_size), (0.0, 0.0))?;
        }
    }

    parallel::par_iter_rows_val_two(src, &local, dst, |&src_pixel, &mean, dst_pixel| {
        let above = src_pixel as f32 > mean - c;
        *dst_pixel = if above != inverse { max_value } else { 0 };
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvpipe_image::ImageSize;

    #[test]
    fn threshold_binary_gradient_inclusive() -> Result<(), ImageError> {
        let data = (0..=255u8).collect::<Vec<_>>();
        let image = Image::<u8, 1>::new(
            ImageSize {
                width: 256,
                height: 1,
            },
            data,
        )?;

        let mut thresholded = Image::<u8, 1>::from_size_val(image.size(), 0)?;
        threshold_binary(&image, &mut thresholded, 127, 255)?;

        for (x, &v) in thresholded.as_slice().iter().enumerate() {
            assert_eq!(v, if x >= 127 { 255 } else { 0 });
        }

        Ok(())
    }

    #[test]
    fn threshold_variants() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new(
            ImageSize {
                width: 3,
                height: 1,
            },
            vec![50.0, 127.0, 200.0],
        )?;
        let mut dst = Image::<f32, 1>::from_size_val(image.size(), 0.0)?;

        threshold(&image, &mut dst, 127.0, 255.0, ThresholdType::BinaryInv)?;
        assert_eq!(dst.as_slice(), &[255.0, 0.0, 0.0]);

        threshold(&image, &mut dst, 127.0, 255.0, ThresholdType::Trunc)?;
        assert_eq!(dst.as_slice(), &[50.0, 127.0, 127.0]);

        threshold(&image, &mut dst, 127.0, 255.0, ThresholdType::ToZero)?;
        assert_eq!(dst.as_slice(), &[0.0, 127.0, 200.0]);

        threshold(&image, &mut dst, 127.0, 255.0, ThresholdType::ToZeroInv)?;
        assert_eq!(dst.as_slice(), &[50.0, 0.0, 0.0]);

        Ok(())
    }

    #[test]
    fn adaptive_threshold_flat_image() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 5,
                height: 5,
            },
            100,
        )?;
        let mut dst = Image::<u8, 1>::from_size_val(image.size(), 0)?;

        // every pixel equals its neighborhood mean, so it is above mean - 2
        adaptive_threshold(
            &image,
            &mut dst,
            255,
            AdaptiveMethod::Mean,
            ThresholdType::Binary,
            3,
            2.0,
        )?;
        assert!(dst.as_slice().iter().all(|&v| v == 255));

        adaptive_threshold(
            &image,
            &mut dst,
            255,
            AdaptiveMethod::Gaussian,
            ThresholdType::BinaryInv,
            3,
            2.0,
        )?;
        assert!(dst.as_slice().iter().all(|&v| v == 0));

        Ok(())
    }

    #[test]
    fn adaptive_threshold_even_block() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 5,
                height: 5,
            },
            100,
        )?;
        let mut dst = Image::<u8, 1>::from_size_val(image.size(), 0)?;

        let res = adaptive_threshold(
            &image,
            &mut dst,
            255,
            AdaptiveMethod::Mean,
            ThresholdType::Binary,
            4,
            2.0,
        );
        assert_eq!(res, Err(ImageError::InvalidKernelSize(4, 4)));

        Ok(())
    }
}
