use rayon::prelude::*;

use cvpipe_image::{Image, ImageDtype, ImageError};

use crate::parallel;

pub(crate) fn check_size<T1, const C1: usize, T2, const C2: usize>(
    a: &Image<T1, C1>,
    b: &Image<T2, C2>,
) -> Result<(), ImageError> {
    if a.size() != b.size() {
        return Err(ImageError::InvalidImageSize(
            a.cols(),
            a.rows(),
            b.cols(),
            b.rows(),
        ));
    }
    Ok(())
}

/// Add two images sample by sample.
///
/// Integer results saturate to the range of the sample type.
///
/// # Arguments
///
/// * `src1` - The first input image.
/// * `src2` - The second input image.
/// * `dst` - The output image.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::core::add;
///
/// let size = ImageSize { width: 2, height: 1 };
/// let a = Image::<u8, 1>::new(size, vec![100, 200]).unwrap();
/// let b = Image::<u8, 1>::new(size, vec![100, 100]).unwrap();
/// let mut sum = Image::<u8, 1>::from_size_val(size, 0).unwrap();
///
/// add(&a, &b, &mut sum).unwrap();
/// assert_eq!(sum.as_slice(), &[200, 255]);
/// ```
pub fn add<T, const C: usize>(
    src1: &Image<T, C>,
    src2: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    check_size(src1, src2)?;
    check_size(src1, dst)?;

    parallel::par_iter_rows_val_two(src1, src2, dst, |&a, &b, d| {
        *d = T::from_f32(a.to_f32() + b.to_f32());
    });

    Ok(())
}

/// Subtract the second image from the first one sample by sample.
///
/// Integer results saturate to the range of the sample type.
pub fn subtract<T, const C: usize>(
    src1: &Image<T, C>,
    src2: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    check_size(src1, src2)?;
    check_size(src1, dst)?;

    parallel::par_iter_rows_val_two(src1, src2, dst, |&a, &b, d| {
        *d = T::from_f32(a.to_f32() - b.to_f32());
    });

    Ok(())
}

/// Performs weighted addition of two images `src1` and `src2` with weights `alpha`
/// and `beta`, and an optional scalar `gamma`. The formula used is:
///
/// dst(x,y,c) = (src1(x,y,c) * alpha + src2(x,y,c) * beta + gamma)
///
/// # Arguments
///
/// * `src1` - The first input image.
/// * `alpha` - Weight of the first image elements to be multiplied.
/// * `src2` - The second input image.
/// * `beta` - Weight of the second image elements to be multiplied.
/// * `gamma` - Scalar added to each sum.
/// * `dst` - The output image.
///
/// # Errors
///
/// Returns an error if the sizes of `src1` and `src2` do not match.
/// Returns an error if the size of `dst` does not match the size of `src1` or `src2`.
pub fn add_weighted<T, const C: usize>(
    src1: &Image<T, C>,
    alpha: f32,
    src2: &Image<T, C>,
    beta: f32,
    gamma: f32,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    check_size(src1, src2)?;
    check_size(src1, dst)?;

    parallel::par_iter_rows_val_two(src1, src2, dst, |&a, &b, d| {
        *d = T::from_f32(a.to_f32() * alpha + b.to_f32() * beta + gamma);
    });

    Ok(())
}

/// Perform a bitwise AND operation between two images using an optional mask.
///
/// The mask is a binary image where the value 0 is considered as False
/// and any other value is considered as True. Masked out pixels are set to zero.
///
/// # Arguments
///
/// * `src1` - The first input image.
/// * `src2` - The second input image.
/// * `dst` - The output image.
/// * `mask` - The binary mask to apply to the image.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::core::bitwise_and;
///
/// let image = Image::<u8, 3>::new(
///    ImageSize {
///        width: 2,
///        height: 2,
///    },
///    vec![0, 1, 2, 253, 254, 255, 128, 129, 130, 64, 65, 66],
/// ).unwrap();
///
/// let mask = Image::<u8, 1>::new(
///    ImageSize {
///        width: 2,
///        height: 2,
///    },
///    vec![255, 0, 255, 0],
/// ).unwrap();
///
/// let mut output = Image::<u8, 3>::from_size_val(image.size(), 0).unwrap();
///
/// bitwise_and(&image, &image, &mut output, Some(&mask)).unwrap();
///
/// assert_eq!(output.as_slice(), &[0, 1, 2, 0, 0, 0, 128, 129, 130, 0, 0, 0]);
/// ```
pub fn bitwise_and<const C: usize>(
    src1: &Image<u8, C>,
    src2: &Image<u8, C>,
    dst: &mut Image<u8, C>,
    mask: Option<&Image<u8, 1>>,
) -> Result<(), ImageError> {
    check_size(src1, src2)?;
    check_size(src1, dst)?;

    let Some(mask) = mask else {
        parallel::par_iter_rows_val_two(src1, src2, dst, |&a, &b, d| *d = a & b);
        return Ok(());
    };

    check_size(src1, mask)?;

    dst.as_slice_mut()
        .par_chunks_exact_mut(C)
        .zip(src1.as_slice().par_chunks_exact(C))
        .zip(src2.as_slice().par_chunks_exact(C))
        .zip(mask.as_slice().par_iter())
        .for_each(|(((out, inp1), inp2), &msk)| {
            for c in 0..C {
                out[c] = if msk != 0 { inp1[c] & inp2[c] } else { 0 };
            }
        });

    Ok(())
}

/// Scale, shift and take the absolute value of every sample, saturating to u8.
///
/// dst(x,y,c) = |src(x,y,c) * alpha + beta|
///
/// # Arguments
///
/// * `src` - The input image.
/// * `dst` - The output 8-bit image.
/// * `alpha` - The scale factor.
/// * `beta` - The offset added after scaling.
pub fn convert_scale_abs<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<u8, C>,
    alpha: f32,
    beta: f32,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    check_size(src, dst)?;

    parallel::par_iter_rows_val(src, dst, |&s, d| {
        *d = u8::from_f32((s.to_f32() * alpha + beta).abs());
    });

    Ok(())
}

/// Stretch the samples of an image linearly so they span `[min, max]`.
///
/// The minimum and maximum are taken over all the channels. A constant image is
/// mapped to `min`.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `dst` - The output image.
/// * `min` - The value the smallest sample is mapped to.
/// * `max` - The value the largest sample is mapped to.
pub fn normalize_min_max<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    min: f32,
    max: f32,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    check_size(src, dst)?;

    let (lo, hi) = src
        .as_slice()
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            let v = v.to_f32();
            (lo.min(v), hi.max(v))
        });

    let scale = if hi - lo > f32::EPSILON {
        (max - min) / (hi - lo)
    } else {
        0.0
    };
    let shift = min - lo * scale;

    parallel::par_iter_rows_val(src, dst, |&s, d| {
        *d = T::from_f32(s.to_f32() * scale + shift);
    });

    Ok(())
}

/// Interleave three single channel images into a three channel image.
pub fn merge3<T>(
    c0: &Image<T, 1>,
    c1: &Image<T, 1>,
    c2: &Image<T, 1>,
    dst: &mut Image<T, 3>,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    check_size(c0, c1)?;
    check_size(c0, c2)?;
    check_size(c0, dst)?;

    dst.as_slice_mut()
        .par_chunks_exact_mut(3)
        .zip(c0.as_slice().par_iter())
        .zip(c1.as_slice().par_iter())
        .zip(c2.as_slice().par_iter())
        .for_each(|(((out, &a), &b), &c)| {
            out[0] = a;
            out[1] = b;
            out[2] = c;
        });

    Ok(())
}

/// Copy an image, overwriting one of its channels with a constant.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `dst` - The output image.
/// * `channel` - The channel to overwrite.
/// * `value` - The value written to the channel.
pub fn set_channel<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    channel: usize,
    value: T,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    check_size(src, dst)?;
    if channel >= C {
        return Err(ImageError::ChannelIndexOutOfBounds(channel, C));
    }

    parallel::par_iter_rows(src, dst, |s, d| {
        d.copy_from_slice(s);
        d[channel] = value;
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvpipe_image::ImageSize;

    fn size() -> ImageSize {
        ImageSize {
            width: 2,
            height: 2,
        }
    }

    #[test]
    fn test_add_subtract_saturate() -> Result<(), ImageError> {
        let a = Image::<u8, 1>::new(size(), vec![0, 100, 200, 255])?;
        let b = Image::<u8, 1>::new(size(), vec![10, 100, 100, 1])?;
        let mut dst = Image::<u8, 1>::from_size_val(size(), 0)?;

        add(&a, &b, &mut dst)?;
        assert_eq!(dst.as_slice(), &[10, 200, 255, 255]);

        subtract(&a, &b, &mut dst)?;
        assert_eq!(dst.as_slice(), &[0, 0, 100, 254]);

        let small = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 1,
                height: 1,
            },
            0,
        )?;
        assert!(add(&a, &small, &mut dst).is_err());

        Ok(())
    }

    #[test]
    fn test_add_weighted() -> Result<(), ImageError> {
        let src1 = Image::<f32, 1>::new(size(), vec![1.0, 2.0, 3.0, 4.0])?;
        let src2 = Image::<f32, 1>::new(size(), vec![4.0, 5.0, 6.0, 7.0])?;
        let expected = [11.0, 15.0, 19.0, 23.0];

        let mut weighted = Image::<f32, 1>::from_size_val(src1.size(), 0.0)?;
        add_weighted(&src1, 2.0, &src2, 2.0, 1.0, &mut weighted)?;

        weighted
            .as_slice()
            .iter()
            .zip(expected.iter())
            .for_each(|(a, b)| {
                approx::assert_relative_eq!(a, b, epsilon = 1e-6);
            });

        Ok(())
    }

    #[test]
    fn test_bitwise_and_without_mask() -> Result<(), ImageError> {
        let a = Image::<u8, 1>::new(size(), vec![0b1100, 0xff, 0x0f, 0])?;
        let b = Image::<u8, 1>::new(size(), vec![0b1010, 0xf0, 0x0f, 0xff])?;
        let mut dst = Image::<u8, 1>::from_size_val(size(), 0)?;

        bitwise_and(&a, &b, &mut dst, None)?;
        assert_eq!(dst.as_slice(), &[0b1000, 0xf0, 0x0f, 0]);

        Ok(())
    }

    #[test]
    fn test_convert_scale_abs() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::new(size(), vec![-10.0, 0.5, 100.0, -400.0])?;
        let mut dst = Image::<u8, 1>::from_size_val(size(), 0)?;

        convert_scale_abs(&src, &mut dst, 2.0, 0.0)?;
        assert_eq!(dst.as_slice(), &[20, 1, 200, 255]);

        Ok(())
    }

    #[test]
    fn test_normalize_min_max() -> Result<(), ImageError> {
        let src = Image::<f32, 1>::new(size(), vec![-1.0, 0.0, 1.0, 3.0])?;
        let mut dst = Image::<f32, 1>::from_size_val(size(), 0.0)?;

        normalize_min_max(&src, &mut dst, 0.0, 255.0)?;
        approx::assert_relative_eq!(dst.as_slice()[0], 0.0);
        approx::assert_relative_eq!(dst.as_slice()[1], 63.75);
        approx::assert_relative_eq!(dst.as_slice()[3], 255.0);

        let flat = Image::<u8, 1>::from_size_val(size(), 9)?;
        let mut out = Image::<u8, 1>::from_size_val(size(), 0)?;
        normalize_min_max(&flat, &mut out, 10.0, 20.0)?;
        assert_eq!(out.as_slice(), &[10, 10, 10, 10]);

        Ok(())
    }

    #[test]
    fn test_merge_and_set_channel() -> Result<(), ImageError> {
        let single = ImageSize {
            width: 2,
            height: 1,
        };
        let r = Image::<u8, 1>::new(single, vec![1, 2])?;
        let g = Image::<u8, 1>::new(single, vec![3, 4])?;
        let b = Image::<u8, 1>::new(single, vec![5, 6])?;

        let mut merged = Image::<u8, 3>::from_size_val(single, 0)?;
        merge3(&r, &g, &b, &mut merged)?;
        assert_eq!(merged.as_slice(), &[1, 3, 5, 2, 4, 6]);

        let mut zeroed = Image::<u8, 3>::from_size_val(single, 0)?;
        set_channel(&merged, &mut zeroed, 1, 0)?;
        assert_eq!(zeroed.as_slice(), &[1, 0, 5, 2, 0, 6]);

        assert_eq!(
            set_channel(&merged, &mut zeroed, 3, 0),
            Err(ImageError::ChannelIndexOutOfBounds(3, 3))
        );

        Ok(())
    }
}
