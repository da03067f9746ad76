use cvpipe_image::{Image, ImageDtype, ImageError};

use crate::interpolation::{interpolate_pixel, BorderMode, InterpolationMode};
use crate::parallel;

/// Resize an image to a new size.
///
/// The function resizes an image to the size of `dst` using the specified interpolation mode.
/// Destination pixel centers are mapped onto the source grid with
/// `u = (x + 0.5) * src_w / dst_w - 0.5` and the borders are replicated.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container.
/// * `interpolation` - The interpolation mode to use.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::resize::resize_native;
/// use cvpipe_imgproc::interpolation::InterpolationMode;
///
/// let image = Image::<_, 3>::new(
///     ImageSize {
///         width: 4,
///         height: 5,
///     },
///     vec![0f32; 4 * 5 * 3],
/// )
/// .unwrap();
///
/// let new_size = ImageSize {
///     width: 2,
///     height: 3,
/// };
///
/// let mut image_resized = Image::<_, 3>::from_size_val(new_size, 0.0).unwrap();
///
/// resize_native(
///     &image,
///     &mut image_resized,
///     InterpolationMode::Nearest,
/// )
/// .unwrap();
///
/// assert_eq!(image_resized.num_channels(), 3);
/// assert_eq!(image_resized.size().width, 2);
/// assert_eq!(image_resized.size().height, 3);
/// ```
pub fn resize_native<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    interpolation: InterpolationMode,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if src.cols() == 0 || src.rows() == 0 {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    // shortcut when the sizes already match
    if src.size() == dst.size() {
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    let scale_x = src.cols() as f32 / dst.cols() as f32;
    let scale_y = src.rows() as f32 / dst.rows() as f32;

    parallel::par_fill_rows(dst, |r, dst_row| {
        let v = (r as f32 + 0.5) * scale_y - 0.5;
        for (c, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
            let u = (c as f32 + 0.5) * scale_x - 0.5;
            let pixel = interpolate_pixel(src, u, v, interpolation, BorderMode::Replicate);
            for (d, &p) in dst_pixel.iter_mut().zip(pixel.iter()) {
                *d = T::from_f32(p);
            }
        }
    });

    Ok(())
}

// per destination index, the source indices it covers and their weights
fn area_weights(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f32)>> {
    let scale = src_len as f32 / dst_len as f32;
    (0..dst_len)
        .map(|i| {
            let start = i as f32 * scale;
            let end = ((i + 1) as f32 * scale).min(src_len as f32);
            let mut weights = Vec::new();
            let mut s = start.floor() as usize;
            while (s as f32) < end && s < src_len {
                let lo = start.max(s as f32);
                let hi = end.min((s + 1) as f32);
                if hi > lo {
                    weights.push((s, (hi - lo) / (end - start)));
                }
                s += 1;
            }
            weights
        })
        .collect()
}

/// Resize an image by averaging the source area covered by every destination pixel.
///
/// Source pixels partially covered contribute in proportion to the covered fraction.
///
/// # Arguments
///
/// * `src` - The input image container.
/// * `dst` - The output image container, its size is the target size.
pub fn resize_area<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if src.cols() == 0 || src.rows() == 0 {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let wx = area_weights(src.cols(), dst.cols());
    let wy = area_weights(src.rows(), dst.rows());

    parallel::par_fill_rows(dst, |r, dst_row| {
        for (c, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
            let mut acc = [0.0f32; C];
            for &(y, wyv) in wy[r].iter() {
                for &(x, wxv) in wx[c].iter() {
                    let w = wxv * wyv;
                    for (a, &p) in acc.iter_mut().zip(src.pixel(x, y).iter()) {
                        *a += p.to_f32() * w;
                    }
                }
            }
            for (d, &a) in dst_pixel.iter_mut().zip(acc.iter()) {
                *d = T::from_f32(a);
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvpipe_image::ImageSize;

    #[test]
    fn resize_smoke_ch3() -> Result<(), ImageError> {
        let image = Image::<_, 3>::new(
            ImageSize {
                width: 4,
                height: 5,
            },
            vec![0f32; 4 * 5 * 3],
        )?;

        let new_size = ImageSize {
            width: 2,
            height: 3,
        };

        let mut image_resized = Image::<_, 3>::from_size_val(new_size, 0.0)?;

        resize_native(&image, &mut image_resized, InterpolationMode::Bilinear)?;

        assert_eq!(image_resized.num_channels(), 3);
        assert_eq!(image_resized.size().width, 2);
        assert_eq!(image_resized.size().height, 3);

        Ok(())
    }

    #[test]
    fn resize_cubic_upscale_constant() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::from_size_val(
            ImageSize {
                width: 10,
                height: 10,
            },
            128,
        )?;

        let mut resized = Image::<u8, 3>::from_size_val(
            ImageSize {
                width: 20,
                height: 20,
            },
            0,
        )?;
        resize_native(&image, &mut resized, InterpolationMode::Bicubic)?;

        assert!(resized.as_slice().iter().all(|&v| v == 128));

        Ok(())
    }

    #[test]
    fn resize_nearest_upscale_replicates() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![1, 2],
        )?;

        let mut resized = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 4,
                height: 2,
            },
            0,
        )?;
        resize_native(&image, &mut resized, InterpolationMode::Nearest)?;

        assert_eq!(resized.as_slice(), &[1, 1, 2, 2, 1, 1, 2, 2]);

        Ok(())
    }

    #[test]
    fn resize_area_halves() -> Result<(), ImageError> {
        let image = Image::<f32, 1>::new(
            ImageSize {
                width: 4,
                height: 2,
            },
            vec![0.0, 2.0, 4.0, 6.0, 2.0, 4.0, 6.0, 8.0],
        )?;

        let mut resized = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 1,
            },
            0.0,
        )?;
        resize_area(&image, &mut resized)?;

        assert_eq!(resized.as_slice(), &[2.0, 6.0]);

        Ok(())
    }
}
