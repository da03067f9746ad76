use cvpipe_image::{Image, ImageDtype};

use super::interpolate::{tap, BorderMode};

/// Kernel for nearest neighbor interpolation
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `border` - How samples outside the image are read.
///
/// # Returns
///
/// The nearest pixel value.
pub(crate) fn nearest_neighbor_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
    border: BorderMode,
) -> [f32; C] {
    let iu = (u + 0.5).floor() as isize;
    let iv = (v + 0.5).floor() as isize;

    let mut pixel = [0.0; C];
    if let Some(p) = tap(image, iu, iv, border) {
        for (out, &val) in pixel.iter_mut().zip(p.iter()) {
            *out = val.to_f32();
        }
    }
    pixel
}
