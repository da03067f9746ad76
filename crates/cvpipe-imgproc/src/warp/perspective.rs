use cvpipe_image::{Image, ImageDtype, ImageError};

use crate::interpolation::{interpolate_pixel, BorderMode, InterpolationMode};
use crate::parallel;

use super::solve_linear_system;

// implement the determinant of a 3x3 matrix
fn determinant3x3(m: &[f32; 9]) -> f32 {
    m[0] * (m[4] * m[8] - m[5] * m[7]) - m[1] * (m[3] * m[8] - m[5] * m[6])
        + m[2] * (m[3] * m[7] - m[4] * m[6])
}

// implement the adjugate of a 3x3 matrix
fn adjugate3x3(m: &[f32; 9]) -> [f32; 9] {
    [
        m[4] * m[8] - m[5] * m[7],
        m[2] * m[7] - m[1] * m[8],
        m[1] * m[5] - m[2] * m[4],
        m[5] * m[6] - m[3] * m[8],
        m[0] * m[8] - m[2] * m[6],
        m[2] * m[3] - m[0] * m[5],
        m[3] * m[7] - m[4] * m[6],
        m[1] * m[6] - m[0] * m[7],
        m[0] * m[4] - m[1] * m[3],
    ]
}

fn inverse_perspective_matrix(m: &[f32; 9]) -> Result<[f32; 9], ImageError> {
    let det = determinant3x3(m);

    if det == 0.0 {
        return Err(ImageError::DegenerateTransform(
            "perspective matrix is singular".to_string(),
        ));
    }

    let adj = adjugate3x3(m);
    let inv_det = 1.0 / det;

    let mut m_inv = [0.0; 9];
    for (inv, &a) in m_inv.iter_mut().zip(adj.iter()) {
        *inv = a * inv_det;
    }

    Ok(m_inv)
}

fn transform_point(x: f32, y: f32, m: &[f32; 9]) -> (f32, f32) {
    let u = m[0] * x + m[1] * y + m[2];
    let v = m[3] * x + m[4] * y + m[5];
    let w = m[6] * x + m[7] * y + m[8];
    (u / w, v / w)
}

/// Computes the homography that maps four source points onto four destination points.
///
/// # Arguments
///
/// * `src` - The four source points (x, y).
/// * `dst` - The four destination points (x, y).
///
/// # Returns
///
/// The 3x3 perspective matrix, row major, normalized so that the last element is 1.
///
/// # Errors
///
/// Returns [`ImageError::DegenerateTransform`] when three of the points are collinear.
pub fn get_perspective_transform(
    src: &[(f32, f32); 4],
    dst: &[(f32, f32); 4],
) -> Result<[f32; 9], ImageError> {
    let mut a = [[0.0f64; 8]; 8];
    let mut b = [0.0f64; 8];

    for (i, (&(x, y), &(u, v))) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y, u, v) = (x as f64, y as f64, u as f64, v as f64);
        a[i] = [x, y, 1.0, 0.0, 0.0, 0.0, -x * u, -y * u];
        a[i + 4] = [0.0, 0.0, 0.0, x, y, 1.0, -x * v, -y * v];
        b[i] = u;
        b[i + 4] = v;
    }

    let h = solve_linear_system(a, b).ok_or_else(|| {
        ImageError::DegenerateTransform("points do not define a homography".to_string())
    })?;

    let mut m = [1.0f32; 9];
    for (dst, &src) in m.iter_mut().zip(h.iter()) {
        *dst = src as f32;
    }

    Ok(m)
}

/// Applies a perspective transformation to an image.
///
/// Every destination pixel is mapped back into the source with the inverse
/// homography. Source samples outside of the image read as zero.
///
/// # Arguments
///
/// * `src` - The input image with shape (height, width, channels).
/// * `dst` - The output image with shape (new_height, new_width, channels).
/// * `m` - The 3x3 perspective transformation matrix mapping source to destination coordinates.
/// * `interpolation` - The interpolation mode to use.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::interpolation::InterpolationMode;
/// use cvpipe_imgproc::warp::warp_perspective;
///
/// let src = Image::<_, 1>::new(
///     ImageSize { width: 2, height: 2 },
///     vec![0.0f32, 1.0, 2.0, 3.0],
/// )
/// .unwrap();
///
/// let m = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
/// let mut dst = Image::<_, 1>::from_size_val(src.size(), 0.0).unwrap();
///
/// warp_perspective(&src, &mut dst, &m, InterpolationMode::Bilinear).unwrap();
/// assert_eq!(dst.as_slice(), src.as_slice());
/// ```
pub fn warp_perspective<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    m: &[f32; 9],
    interpolation: InterpolationMode,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    let m_inv = inverse_perspective_matrix(m)?;

    parallel::par_fill_rows(dst, |r, dst_row| {
        for (c, dst_pixel) in dst_row.chunks_exact_mut(C).enumerate() {
            let (u, v) = transform_point(c as f32, r as f32, &m_inv);
            let pixel = if u.is_finite() && v.is_finite() {
                interpolate_pixel(src, u, v, interpolation, BorderMode::Constant)
            } else {
                [0.0; C]
            };
            for (d, &p) in dst_pixel.iter_mut().zip(pixel.iter()) {
                *d = T::from_f32(p);
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use cvpipe_image::{Image, ImageError, ImageSize};

    use super::InterpolationMode;

    #[test]
    fn inverse_perspective_matrix() -> Result<(), ImageError> {
        let m = [1.0, 0.0, 3.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0];
        let m_inv = super::inverse_perspective_matrix(&m)?;
        assert_eq!(m_inv, [1.0, 0.0, -3.0, 0.0, 0.5, 0.0, 0.0, 0.0, 1.0]);

        let singular = [0.0; 9];
        assert!(super::inverse_perspective_matrix(&singular).is_err());
        Ok(())
    }

    #[test]
    fn get_perspective_transform_square() -> Result<(), ImageError> {
        let src = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let dst = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];

        let m = super::get_perspective_transform(&src, &dst)?;
        let expected = [2.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 1.0];
        for (a, b) in m.iter().zip(expected.iter()) {
            approx::assert_relative_eq!(a, b, epsilon = 1e-5);
        }

        // the four correspondences are reproduced
        let (u, v) = super::transform_point(1.0, 1.0, &m);
        approx::assert_relative_eq!(u, 2.0, epsilon = 1e-5);
        approx::assert_relative_eq!(v, 2.0, epsilon = 1e-5);

        Ok(())
    }

    #[test]
    fn get_perspective_transform_degenerate() {
        let src = [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)];
        let dst = [(0.0, 0.0), (2.0, 0.0), (2.0, 2.0), (0.0, 2.0)];
        assert!(matches!(
            super::get_perspective_transform(&src, &dst),
            Err(ImageError::DegenerateTransform(_))
        ));
    }

    #[test]
    fn warp_perspective_hflip() -> Result<(), ImageError> {
        let image = Image::<_, 1>::new(
            ImageSize {
                width: 3,
                height: 1,
            },
            vec![1u8, 2, 3],
        )?;

        // x' = 2 - x
        let m = [-1.0, 0.0, 2.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];
        let mut flipped = Image::<_, 1>::from_size_val(image.size(), 0u8)?;
        super::warp_perspective(&image, &mut flipped, &m, InterpolationMode::Nearest)?;

        assert_eq!(flipped.as_slice(), &[3, 2, 1]);

        Ok(())
    }
}
