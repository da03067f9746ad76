use rayon::prelude::*;

use cvpipe_image::{Image, ImageDtype, ImageError};

use crate::border::reflect_101;

/// Apply a separable filter to an image.
///
/// The kernels are correlated with the image, anchored at their center
/// (`len / 2`), and the borders are mirrored without repeating the edge sample.
/// The accumulation happens in f32 and is converted back with
/// [`ImageDtype::from_f32`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_x` - The horizontal kernel.
/// * `kernel_y` - The vertical kernel.
///
/// PRECONDITION: `src` and `dst` must have the same shape.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::filter::separable_filter;
///
/// let src = Image::<f32, 1>::new(ImageSize { width: 3, height: 1 }, vec![0.0, 3.0, 0.0]).unwrap();
/// let mut dst = Image::<f32, 1>::from_size_val(src.size(), 0.0).unwrap();
///
/// separable_filter(&src, &mut dst, &[1.0 / 3.0; 3], &[1.0]).unwrap();
/// assert_eq!(dst.as_slice(), &[2.0, 1.0, 2.0]);
/// ```
pub fn separable_filter<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel_x: &[f32],
    kernel_y: &[f32],
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if kernel_x.is_empty() || kernel_y.is_empty() {
        return Err(ImageError::InvalidKernelSize(kernel_x.len(), kernel_y.len()));
    }

    let rows = src.rows();
    let cols = src.cols();
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let half_x = (kernel_x.len() / 2) as isize;
    let half_y = (kernel_y.len() / 2) as isize;

    // horizontal pass into a f32 buffer
    let src_data = src.as_slice();
    let mut temp = vec![0.0f32; src_data.len()];
    temp.par_chunks_exact_mut(cols * C)
        .zip(src_data.par_chunks_exact(cols * C))
        .for_each(|(temp_row, src_row)| {
            for c in 0..cols {
                let mut acc = [0.0f32; C];
                for (i, &k) in kernel_x.iter().enumerate() {
                    let x = reflect_101(c as isize + i as isize - half_x, cols);
                    for (ch, acc_val) in acc.iter_mut().enumerate() {
                        *acc_val += src_row[x * C + ch].to_f32() * k;
                    }
                }
                temp_row[c * C..(c + 1) * C].copy_from_slice(&acc);
            }
        });

    // vertical pass into the destination
    dst.as_slice_mut()
        .par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(r, dst_row)| {
            let mut acc = vec![0.0f32; cols * C];
            for (i, &k) in kernel_y.iter().enumerate() {
                let y = reflect_101(r as isize + i as isize - half_y, rows);
                let temp_row = &temp[y * cols * C..(y + 1) * cols * C];
                acc.iter_mut()
                    .zip(temp_row.iter())
                    .for_each(|(a, &t)| *a += t * k);
            }
            dst_row
                .iter_mut()
                .zip(acc.iter())
                .for_each(|(d, &a)| *d = T::from_f32(a));
        });

    Ok(())
}

/// Correlate an image with a dense 2d kernel.
///
/// The kernel is stored row-major with `kernel_size = (width, height)` and is
/// anchored at `(width / 2, height / 2)`. Borders are mirrored like
/// [`separable_filter`].
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel` - The kernel weights.
/// * `kernel_size` - The size of the kernel (width, height).
pub fn filter2d<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &[f32],
    kernel_size: (usize, usize),
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    let (kw, kh) = kernel_size;
    if kw == 0 || kh == 0 || kernel.len() != kw * kh {
        return Err(ImageError::InvalidKernelSize(kw, kh));
    }

    let rows = src.rows();
    let cols = src.cols();
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let anchor_x = (kw / 2) as isize;
    let anchor_y = (kh / 2) as isize;

    dst.as_slice_mut()
        .par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(r, dst_row)| {
            for c in 0..cols {
                let mut acc = [0.0f32; C];
                for ky in 0..kh {
                    let y = reflect_101(r as isize + ky as isize - anchor_y, rows);
                    for kx in 0..kw {
                        let k = kernel[ky * kw + kx];
                        if k == 0.0 {
                            continue;
                        }
                        let x = reflect_101(c as isize + kx as isize - anchor_x, cols);
                        let pixel = src.pixel(x, y);
                        for (ch, acc_val) in acc.iter_mut().enumerate() {
                            *acc_val += pixel[ch].to_f32() * k;
                        }
                    }
                }
                for (ch, &acc_val) in acc.iter().enumerate() {
                    dst_row[c * C + ch] = T::from_f32(acc_val);
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
    fn test_separable_filter_impulse() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 5,
            height: 5,
        };

        let mut img = Image::<f32, 1>::from_size_val(size, 0.0)?;
        img.set_pixel(2, 2, 0, 9.0)?;

        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let kernel = [1.0, 1.0, 1.0];
        separable_filter(&img, &mut dst, &kernel, &kernel)?;

        #[rustfmt::skip]
        assert_eq!(
            dst.as_slice(),
            &[
                0.0, 0.0, 0.0, 0.0, 0.0,
                0.0, 9.0, 9.0, 9.0, 0.0,
                0.0, 9.0, 9.0, 9.0, 0.0,
                0.0, 9.0, 9.0, 9.0, 0.0,
                0.0, 0.0, 0.0, 0.0, 0.0,
            ]
        );

        Ok(())
    }

    #[test]
    fn test_separable_filter_u8_saturates() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 1,
        };
        let img = Image::<u8, 1>::new(size, vec![200, 200, 200])?;
        let mut dst = Image::<u8, 1>::from_size_val(size, 0)?;

        separable_filter(&img, &mut dst, &[1.0, 1.0, 1.0], &[1.0])?;
        assert_eq!(dst.as_slice(), &[255, 255, 255]);

        Ok(())
    }

    #[test]
    fn test_filter2d_matches_separable() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let img = Image::<f32, 1>::new(size, (0..12).map(|v| v as f32).collect())?;

        let mut a = Image::<f32, 1>::from_size_val(size, 0.0)?;
        separable_filter(&img, &mut a, &[1.0, 2.0, 1.0], &[1.0, 2.0, 1.0])?;

        #[rustfmt::skip]
        let kernel = [
            1.0, 2.0, 1.0,
            2.0, 4.0, 2.0,
            1.0, 2.0, 1.0,
        ];
        let mut b = Image::<f32, 1>::from_size_val(size, 0.0)?;
        filter2d(&img, &mut b, &kernel, (3, 3))?;

        for (x, y) in a.as_slice().iter().zip(b.as_slice()) {
            approx::assert_relative_eq!(x, y, epsilon = 1e-4);
        }

        Ok(())
    }

    #[test]
    fn test_filter2d_invalid_kernel() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let img = Image::<f32, 1>::from_size_val(size, 0.0)?;
        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;

        assert_eq!(
            filter2d(&img, &mut dst, &[1.0; 5], (2, 2)),
            Err(ImageError::InvalidKernelSize(2, 2))
        );

        Ok(())
    }
}
