use cvpipe_image::{Image, ImageDtype};

use super::interpolate::{tap, BorderMode};

// the free parameter of the cubic convolution kernel
const A: f32 = -0.75;

fn cubic_weights(t: f32) -> [f32; 4] {
    let w0 = ((A * (t + 1.0) - 5.0 * A) * (t + 1.0) + 8.0 * A) * (t + 1.0) - 4.0 * A;
    let w1 = ((A + 2.0) * t - (A + 3.0)) * t * t + 1.0;
    let w2 = ((A + 2.0) * (1.0 - t) - (A + 3.0)) * (1.0 - t) * (1.0 - t) + 1.0;
    let w3 = 1.0 - w0 - w1 - w2;
    [w0, w1, w2, w3]
}

/// Kernel for bicubic interpolation over a 4x4 neighborhood.
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
/// * `border` - How samples outside the image are read.
pub(crate) fn bicubic_interpolation<T: ImageDtype, const C: usize>(
    image: &Image<T, C>,
    u: f32,
    v: f32,
    border: BorderMode,
) -> [f32; C] {
    let u0 = u.floor();
    let v0 = v.floor();

    let wx = cubic_weights(u - u0);
    let wy = cubic_weights(v - v0);

    let iu = u0 as isize;
    let iv = v0 as isize;

    let mut pixel = [0.0; C];
    for (j, &wyj) in wy.iter().enumerate() {
        let y = iv + j as isize - 1;
        for (i, &wxi) in wx.iter().enumerate() {
            let x = iu + i as isize - 1;
            let w = wxi * wyj;
            if let Some(p) = tap(image, x, y, border) {
                for (out, &val) in pixel.iter_mut().zip(p.iter()) {
                    *out += val.to_f32() * w;
                }
            }
        }
    }

    pixel
}

#[cfg(test)]
mod tests {
    use super::cubic_weights;

    #[test]
    fn test_cubic_weights() {
        let w = cubic_weights(0.0);
        approx::assert_relative_eq!(w[0], 0.0, epsilon = 1e-6);
        approx::assert_relative_eq!(w[1], 1.0, epsilon = 1e-6);
        approx::assert_relative_eq!(w[2], 0.0, epsilon = 1e-6);
        approx::assert_relative_eq!(w[3], 0.0, epsilon = 1e-6);

        let w = cubic_weights(0.5);
        approx::assert_relative_eq!(w.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        approx::assert_relative_eq!(w[1], w[2], epsilon = 1e-6);
    }
}
