use crate::{core::check_size, parallel};
use cvpipe_image::{Image, ImageError};

/// BT.601 luma weights for red, green and blue.
const LUMA: [f32; 3] = [0.299, 0.587, 0.114];

/// Luma weights scaled by 256 for the 8-bit path. They sum to 256.
const LUMA_Q8: [u16; 3] = [77, 150, 29];

/// Luma of a floating point rgb image.
///
/// `dst` must have the size of `src`. Samples keep their range, so an image in
/// `[0, 255]` produces luma in `[0, 255]`.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::color::gray_from_rgb;
///
/// let size = ImageSize { width: 1, height: 2 };
/// let rgb = Image::<f32, 3>::new(size, vec![1.0, 1.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
/// let mut luma = Image::<f32, 1>::from_size_val(size, -1.0).unwrap();
///
/// gray_from_rgb(&rgb, &mut luma).unwrap();
/// assert!((luma.as_slice()[0] - 1.0).abs() < 1e-6);
/// assert_eq!(luma.as_slice()[1], 0.0);
/// ```
pub fn gray_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 1>) -> Result<(), ImageError> {
    check_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |rgb, luma| {
        luma[0] = rgb.iter().zip(LUMA).map(|(&v, w)| v * w).sum();
    });

    Ok(())
}

/// Luma of an 8-bit rgb image, computed in fixed point with rounding.
pub fn gray_from_rgb_u8(src: &Image<u8, 3>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    check_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |rgb, luma| {
        let acc: u16 = rgb
            .iter()
            .zip(LUMA_Q8)
            .map(|(&v, w)| v as u16 * w)
            .sum();
        luma[0] = ((acc + 128) >> 8) as u8;
    });

    Ok(())
}

/// Expand a single channel image to three identical channels.
///
/// Used wherever a gray result has to be drawn on in color.
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::color::rgb_from_gray;
///
/// let mask = Image::<u8, 1>::new(ImageSize { width: 2, height: 1 }, vec![0, 255]).unwrap();
/// let mut canvas = Image::<u8, 3>::from_size_val(mask.size(), 1).unwrap();
///
/// rgb_from_gray(&mask, &mut canvas).unwrap();
/// assert_eq!(canvas.as_slice(), &[0, 0, 0, 255, 255, 255]);
/// ```
pub fn rgb_from_gray<T>(src: &Image<T, 1>, dst: &mut Image<T, 3>) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    check_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |gray, rgb| rgb.fill(gray[0]));

    Ok(())
}
