use rayon::prelude::*;

use cvpipe_image::{Image, ImageDtype, ImageError};

use crate::border::{reflect_101, replicate};

/// Blur an image with a median filter.
///
/// Every sample is replaced by the median of its `kernel_size x kernel_size`
/// neighborhood in the same channel. Borders replicate the edge pixels.
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `kernel_size` - The odd side length of the neighborhood.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::filter::median_blur;
///
/// let src = Image::<u8, 1>::new(
///     ImageSize { width: 3, height: 3 },
///     vec![0, 0, 0, 0, 255, 0, 0, 0, 0],
/// )
/// .unwrap();
/// let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0).unwrap();
///
/// median_blur(&src, &mut dst, 3).unwrap();
/// assert!(dst.as_slice().iter().all(|&v| v == 0));
/// ```
pub fn median_blur<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel_size: usize,
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

    if kernel_size == 0 || kernel_size % 2 == 0 {
        return Err(ImageError::InvalidKernelSize(kernel_size, kernel_size));
    }

    let rows = src.rows();
    let cols = src.cols();
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let half = (kernel_size / 2) as isize;
    let mid = kernel_size * kernel_size / 2;

    dst.as_slice_mut()
        .par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(r, dst_row)| {
            let mut window = Vec::with_capacity(kernel_size * kernel_size);
            for c in 0..cols {
                for ch in 0..C {
                    window.clear();
                    for dy in -half..=half {
                        let y = replicate(r as isize + dy, rows);
                        for dx in -half..=half {
                            let x = replicate(c as isize + dx, cols);
                            window.push(src.pixel(x, y)[ch]);
                        }
                    }
                    let (_, median, _) = window.select_nth_unstable_by(mid, |a, b| {
                        a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal)
                    });
                    dst_row[c * C + ch] = *median;
                }
            }
        });

    Ok(())
}

/// Smooth an image while preserving edges.
///
/// Each output pixel is the average of the pixels inside a disc of diameter
/// `diameter`, weighted by a gaussian on the spatial distance and a gaussian
/// on the color distance (sum of absolute channel differences).
///
/// # Arguments
///
/// * `src` - The source image with shape (H, W, C).
/// * `dst` - The destination image with shape (H, W, C).
/// * `diameter` - The diameter of the neighborhood. When 0 it is derived from `sigma_space`.
/// * `sigma_color` - The sigma of the color weight.
/// * `sigma_space` - The sigma of the spatial weight.
pub fn bilateral_filter<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    diameter: usize,
    sigma_color: f32,
    sigma_space: f32,
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

    let sigma_color = if sigma_color <= 0.0 { 1.0 } else { sigma_color };
    let sigma_space = if sigma_space <= 0.0 { 1.0 } else { sigma_space };

    let radius = if diameter == 0 {
        (sigma_space * 1.5).round() as isize
    } else {
        (diameter / 2) as isize
    };
    let radius = radius.max(1);

    let rows = src.rows();
    let cols = src.cols();
    if rows == 0 || cols == 0 {
        return Ok(());
    }

    let color_coeff = -0.5 / (sigma_color * sigma_color);
    let space_coeff = -0.5 / (sigma_space * sigma_space);

    // precompute the disc offsets and their spatial weights
    let mut offsets = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d2 = (dx * dx + dy * dy) as f32;
            if d2 <= (radius * radius) as f32 {
                offsets.push((dx, dy, (d2 * space_coeff).exp()));
            }
        }
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(cols * C)
        .enumerate()
        .for_each(|(r, dst_row)| {
            for c in 0..cols {
                let center = src.pixel(c, r);
                let mut acc = [0.0f32; C];
                let mut weight_sum = 0.0f32;
                for &(dx, dy, space_weight) in offsets.iter() {
                    let x = reflect_101(c as isize + dx, cols);
                    let y = reflect_101(r as isize + dy, rows);
                    let pixel = src.pixel(x, y);

                    let color_dist = pixel
                        .iter()
                        .zip(center.iter())
                        .map(|(&a, &b)| (a.to_f32() - b.to_f32()).abs())
                        .sum::<f32>();
                    let w = space_weight * (color_dist * color_dist * color_coeff).exp();

                    for (acc_val, &p) in acc.iter_mut().zip(pixel.iter()) {
                        *acc_val += p.to_f32() * w;
                    }
                    weight_sum += w;
                }

                for (ch, &acc_val) in acc.iter().enumerate() {
                    dst_row[c * C + ch] = T::from_f32(acc_val / weight_sum);
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
    fn test_median_blur_removes_salt() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 5,
            height: 5,
        };
        let mut img = Image::<u8, 3>::from_size_val(size, 10)?;
        img.set_pixel(2, 2, 1, 255)?;

        let mut dst = Image::<u8, 3>::from_size_val(size, 0)?;
        median_blur(&img, &mut dst, 3)?;
        assert!(dst.as_slice().iter().all(|&v| v == 10));

        assert_eq!(
            median_blur(&img, &mut dst, 4),
            Err(ImageError::InvalidKernelSize(4, 4))
        );

        Ok(())
    }

    #[test]
    fn test_bilateral_keeps_edge() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 8,
            height: 4,
        };
        let data = (0..4)
            .flat_map(|_| (0..8).map(|x| if x < 4 { 0.0 } else { 200.0 }))
            .collect::<Vec<f32>>();
        let img = Image::<f32, 1>::new(size, data)?;

        let mut dst = Image::<f32, 1>::from_size_val(size, 0.0)?;
        bilateral_filter(&img, &mut dst, 5, 10.0, 5.0)?;

        // the color weight across the step is negligible
        approx::assert_relative_eq!(dst.pixel(3, 1)[0], 0.0, epsilon = 1e-3);
        approx::assert_relative_eq!(dst.pixel(4, 1)[0], 200.0, epsilon = 1e-3);

        Ok(())
    }
}
