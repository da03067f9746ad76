use cvpipe_image::{Image, ImageDtype};

use super::interpolate::{tap, BorderMode};

/// Kernel for bilinear interpolation
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
/// The interpolated pixel values.
pub(crate) fn bilinear_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
    border: BorderMode,
) -> [f32; C] {
    let u0 = u.floor();
    let v0 = v.floor();

    let frac_u = u - u0;
    let frac_v = v - v0;

    let iu = u0 as isize;
    let iv = v0 as isize;

    let taps = [
        (iu, iv, (1.0 - frac_u) * (1.0 - frac_v)),
        (iu + 1, iv, frac_u * (1.0 - frac_v)),
        (iu, iv + 1, (1.0 - frac_u) * frac_v),
        (iu + 1, iv + 1, frac_u * frac_v),
    ];

    let mut pixel = [0.0; C];
    for (x, y, w) in taps {
        if w == 0.0 {
            continue;
        }
        if let Some(p) = tap(image, x, y, border) {
            for (out, &val) in pixel.iter_mut().zip(p.iter()) {
                *out += val.to_f32() * w;
            }
        }
    }

    pixel
}
