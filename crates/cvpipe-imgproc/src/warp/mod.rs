//! Affine and perspective warps, and their estimation from point pairs.
//!
//! Matrices are row major and map source coordinates to destination
//! coordinates. The warps invert them and sample the source once per
//! destination pixel.
//!
//! ```
//! use cvpipe_image::Image;
//! use cvpipe_imgproc::interpolation::InterpolationMode;
//! use cvpipe_imgproc::warp::{get_rotation_matrix2d, warp_affine};
//!
//! let src = Image::<u8, 1>::from_size_val([8, 8].into(), 200).unwrap();
//! let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0).unwrap();
//!
//! let m = get_rotation_matrix2d((3.5, 3.5), 180.0, 1.0);
//! warp_affine(&src, &mut dst, &m, InterpolationMode::Nearest).unwrap();
//! assert_eq!(dst.as_slice(), src.as_slice());
//! ```

mod affine;
mod perspective;

pub use affine::{
    get_affine_transform, get_rotation_matrix2d, invert_affine_transform, warp_affine,
};
pub use perspective::{get_perspective_transform, warp_perspective};

/// Solve `a * x = b` with gaussian elimination and partial pivoting.
///
/// Returns `None` when the system is singular.
pub(crate) fn solve_linear_system<const N: usize>(
    mut a: [[f64; N]; N],
    mut b: [f64; N],
) -> Option<[f64; N]> {
    for col in 0..N {
        // pick the row with the largest pivot
        let pivot = (col..N).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;

        if a[pivot][col].abs() < 1e-10 {
            return None;
        }

        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..N {
            let factor = a[row][col] / a[col][col];
            for k in col..N {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; N];
    for row in (0..N).rev() {
        let sum = (row + 1..N).map(|k| a[row][k] * x[k]).sum::<f64>();
        x[row] = (b[row] - sum) / a[row][row];
    }

    Some(x)
}
