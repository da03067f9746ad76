use crate::parallel;
use cvpipe_image::{Image, ImageError};

/// Swap the first and third channels of an image.
///
/// Converts RGB to BGR and, since the operation is its own inverse, BGR to RGB.
///
/// # Arguments
///
/// * `src` - The input image with 3 channels.
/// * `dst` - The output image with the channels swapped.
///
/// Precondition: the input and output images must have the same size.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::color::bgr_from_rgb;
///
/// let rgb = Image::<u8, 3>::new(ImageSize { width: 1, height: 1 }, vec![1, 2, 3]).unwrap();
/// let mut bgr = Image::<u8, 3>::from_size_val(rgb.size(), 0).unwrap();
///
/// bgr_from_rgb(&rgb, &mut bgr).unwrap();
/// assert_eq!(bgr.as_slice(), &[3, 2, 1]);
/// ```
pub fn bgr_from_rgb<T>(src: &Image<T, 3>, dst: &mut Image<T, 3>) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    parallel::par_iter_rows(src, dst, |src_pixel, dst_pixel| {
        dst_pixel[0] = src_pixel[2];
        dst_pixel[1] = src_pixel[1];
        dst_pixel[2] = src_pixel[0];
    });

    Ok(())
}
