//! Rgb and hsv in the 8-bit convention: hue is half the angle in degrees,
//! so it fits `[0, 180)`, while saturation and value span `[0, 255]`.

use crate::{core::check_size, parallel};
use cvpipe_image::{Image, ImageError};

/// Rgb in `[0, 255]` to hsv in the 8-bit convention.
fn to_hsv([r, g, b]: [f32; 3]) -> [f32; 3] {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let chroma = max - min;

    let sector = if chroma == 0.0 {
        0.0
    } else if max == r {
        ((g - b) / chroma).rem_euclid(6.0)
    } else if max == g {
        (b - r) / chroma + 2.0
    } else {
        (r - g) / chroma + 4.0
    };

    let s = if max > 0.0 { 255.0 * chroma / max } else { 0.0 };

    // 60 degrees per sector, halved
    [30.0 * sector, s, max]
}

/// Hsv in the 8-bit convention back to rgb in `[0, 255]`.
fn to_rgb([h, s, v]: [f32; 3]) -> [f32; 3] {
    let chroma = v * s / 255.0;
    let sector = (h / 30.0).rem_euclid(6.0);
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let m = v - chroma;

    let [r, g, b] = match sector as u32 {
        0 => [chroma, x, 0.0],
        1 => [x, chroma, 0.0],
        2 => [0.0, chroma, x],
        3 => [0.0, x, chroma],
        4 => [x, 0.0, chroma],
        _ => [chroma, 0.0, x],
    };

    [r + m, g + m, b + m]
}

fn samples_f32(px: &[u8]) -> [f32; 3] {
    [px[0] as f32, px[1] as f32, px[2] as f32]
}

fn saturate(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

/// Convert a floating point rgb image with samples in `[0, 255]` to hsv.
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::color::hsv_from_rgb;
///
/// let cyan = Image::<f32, 3>::new(ImageSize { width: 1, height: 1 }, vec![0.0, 255.0, 255.0]).unwrap();
/// let mut hsv = Image::<f32, 3>::from_size_val(cyan.size(), 0.0).unwrap();
///
/// hsv_from_rgb(&cyan, &mut hsv).unwrap();
/// assert_eq!(hsv.as_slice(), &[90.0, 255.0, 255.0]);
/// ```
pub fn hsv_from_rgb(src: &Image<f32, 3>, dst: &mut Image<f32, 3>) -> Result<(), ImageError> {
    check_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |rgb, hsv| {
        hsv.copy_from_slice(&to_hsv([rgb[0], rgb[1], rgb[2]]));
    });

    Ok(())
}

/// [`hsv_from_rgb`] for 8-bit images. A hue that rounds up to 180 wraps to 0.
pub fn hsv_from_rgb_u8(src: &Image<u8, 3>, dst: &mut Image<u8, 3>) -> Result<(), ImageError> {
    check_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |rgb, hsv| {
        let [h, s, v] = to_hsv(samples_f32(rgb));
        hsv[0] = saturate(h) % 180;
        hsv[1] = saturate(s);
        hsv[2] = saturate(v);
    });

    Ok(())
}

/// Inverse of [`hsv_from_rgb`].
pub fn rgb_from_hsv(src: &Image<f32, 3>, dst: &mut Image<f32, 3>) -> Result<(), ImageError> {
    check_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |hsv, rgb| {
        rgb.copy_from_slice(&to_rgb([hsv[0], hsv[1], hsv[2]]));
    });

    Ok(())
}

/// Inverse of [`hsv_from_rgb_u8`].
pub fn rgb_from_hsv_u8(src: &Image<u8, 3>, dst: &mut Image<u8, 3>) -> Result<(), ImageError> {
    check_size(src, dst)?;

    parallel::par_iter_rows(src, dst, |hsv, rgb| {
        for (d, v) in rgb.iter_mut().zip(to_rgb(samples_f32(hsv))) {
            *d = saturate(v);
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvpipe_image::ImageSize;

    fn strip<T>(samples: Vec<T>) -> Result<Image<T, 3>, ImageError> {
        let width = samples.len() / 3;
        Image::new(ImageSize { width, height: 1 }, samples)
    }

    #[test]
    fn primaries_and_black() -> Result<(), ImageError> {
        let rgb = strip(vec![255u8, 0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0])?;
        let mut hsv = Image::<u8, 3>::from_size_val(rgb.size(), 0)?;
        hsv_from_rgb_u8(&rgb, &mut hsv)?;

        #[rustfmt::skip]
        assert_eq!(hsv.as_slice(), &[
            0, 255, 255,
            60, 255, 255,
            120, 255, 255,
            0, 0, 0,
        ]);

        let mut back = Image::<u8, 3>::from_size_val(rgb.size(), 7)?;
        rgb_from_hsv_u8(&hsv, &mut back)?;
        assert_eq!(back, rgb);

        Ok(())
    }

    #[test]
    fn hue_wraps_below_180() -> Result<(), ImageError> {
        // a red leaning magenta sits just under 360 degrees
        let rgb = strip(vec![255u8, 0, 1])?;
        let mut hsv = Image::<u8, 3>::from_size_val(rgb.size(), 0)?;
        hsv_from_rgb_u8(&rgb, &mut hsv)?;
        assert_eq!(hsv.as_slice()[0], 0);

        Ok(())
    }

    #[test]
    fn float_round_trip() -> Result<(), ImageError> {
        let rgb = strip(vec![0.0f32, 128.0, 255.0, 255.0, 128.0, 0.0, 30.0, 60.0, 90.0])?;

        let mut hsv = Image::<f32, 3>::from_size_val(rgb.size(), 0.0)?;
        hsv_from_rgb(&rgb, &mut hsv)?;
        assert!(hsv.as_slice().chunks_exact(3).all(|px| px[0] < 180.0));

        let mut back = Image::<f32, 3>::from_size_val(rgb.size(), 0.0)?;
        rgb_from_hsv(&hsv, &mut back)?;
        for (a, b) in back.as_slice().iter().zip(rgb.as_slice()) {
            approx::assert_relative_eq!(a, b, epsilon = 1e-2);
        }

        Ok(())
    }
}
