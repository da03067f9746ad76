use cvpipe_image::{Image, ImageDtype, ImageError};

use crate::interpolation::{interpolate_pixel, BorderMode, InterpolationMode};
use crate::parallel;

use super::solve_linear_system;

fn linear_det(m: &[f32; 6]) -> f32 {
    m[0] * m[4] - m[1] * m[3]
}

fn apply(m: &[f32; 6], x: f32, y: f32) -> (f32, f32) {
    (m[0] * x + m[1] * y + m[2], m[3] * x + m[4] * y + m[5])
}

/// Inverse of the 2x3 affine matrix `m`.
///
/// A singular linear part yields an all zero linear part.
pub fn invert_affine_transform(m: &[f32; 6]) -> [f32; 6] {
    let det = linear_det(m);
    let k = if det != 0.0 { det.recip() } else { 0.0 };

    let (a, b) = (m[4] * k, -m[1] * k);
    let (d, e) = (-m[3] * k, m[0] * k);
    let (tx, ty) = (m[2], m[5]);

    [a, b, -(a * tx + b * ty), d, e, -(d * tx + e * ty)]
}

/// Rotation by `angle` degrees around `center`, combined with a uniform `scale`.
///
/// Angles are counter clockwise as seen on screen, with the y axis pointing
/// down. The center is a fixed point of the result.
///
/// ```
/// use cvpipe_imgproc::warp::get_rotation_matrix2d;
///
/// let m = get_rotation_matrix2d((10.0, 20.0), 0.0, 1.0);
/// assert_eq!(m, [1.0, 0.0, 0.0, -0.0, 1.0, 0.0]);
/// ```
pub fn get_rotation_matrix2d(center: (f32, f32), angle: f32, scale: f32) -> [f32; 6] {
    let (sin, cos) = angle.to_radians().sin_cos();
    let (alpha, beta) = (scale * cos, scale * sin);
    let (cx, cy) = center;

    [
        alpha,
        beta,
        (1.0 - alpha) * cx - beta * cy,
        -beta,
        alpha,
        beta * cx + (1.0 - alpha) * cy,
    ]
}

/// The affine matrix taking each of the three `src` points onto the matching
/// `dst` point.
///
/// Collinear source points have no solution and fail with
/// [`ImageError::DegenerateTransform`].
///
/// ```
/// use cvpipe_imgproc::warp::get_affine_transform;
///
/// // a pure scale by two
/// let m = get_affine_transform(
///     &[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)],
///     &[(0.0, 0.0), (2.0, 0.0), (0.0, 2.0)],
/// )
/// .unwrap();
/// assert_eq!(m, [2.0, 0.0, 0.0, 0.0, 2.0, 0.0]);
/// ```
pub fn get_affine_transform(
    src: &[(f32, f32); 3],
    dst: &[(f32, f32); 3],
) -> Result<[f32; 6], ImageError> {
    let a = src.map(|(x, y)| [x as f64, y as f64, 1.0]);
    let xs = dst.map(|(x, _)| x as f64);
    let ys = dst.map(|(_, y)| y as f64);

    let collinear = || ImageError::DegenerateTransform("source points are collinear".to_string());
    let [a0, a1, a2] = solve_linear_system(a, xs).ok_or_else(collinear)?;
    let [b0, b1, b2] = solve_linear_system(a, ys).ok_or_else(collinear)?;

    Ok([a0, a1, a2, b0, b1, b2].map(|v| v as f32))
}

/// Warp `src` into `dst` with the affine matrix `m`.
///
/// Destination pixels whose preimage falls outside of `src` are zero. A matrix
/// with a singular linear part fails with [`ImageError::DegenerateTransform`].
pub fn warp_affine<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    m: &[f32; 6],
    interpolation: InterpolationMode,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if linear_det(m) == 0.0 {
        return Err(ImageError::DegenerateTransform(
            "affine matrix is singular".to_string(),
        ));
    }

    let inv = invert_affine_transform(m);

    parallel::par_fill_rows(dst, |y, row| {
        for (x, px) in row.chunks_exact_mut(C).enumerate() {
            let (u, v) = apply(&inv, x as f32, y as f32);
            let sample = interpolate_pixel(src, u, v, interpolation, BorderMode::Constant);
            px.iter_mut()
                .zip(sample)
                .for_each(|(d, s)| *d = T::from_f32(s));
        }
    });

    Ok(())
}
