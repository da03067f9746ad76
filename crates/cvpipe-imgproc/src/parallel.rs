//! Row parallel iteration over image buffers.
//!
//! Every helper splits its images into rows and hands the rows to the rayon
//! pool. The images are expected to share a size; rows past the shorter one
//! are left untouched. Zero width images are a no-op.

use rayon::prelude::*;

use cvpipe_image::Image;

/// Visit each pixel of `src` together with the pixel at the same position in `dst`.
///
/// The closure sees the `C1` samples of the source pixel and the `C2` samples of
/// the destination pixel, so it can change the channel count.
pub fn par_iter_rows<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&[T1], &mut [T2]) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
{
    let width = src.cols();
    if width == 0 {
        return;
    }

    let src_rows = src.as_slice().par_chunks_exact(width * C1);
    let dst_rows = dst.as_slice_mut().par_chunks_exact_mut(width * C2);
    src_rows.zip(dst_rows).for_each(|(s, d)| {
        for (sp, dp) in s.chunks_exact(C1).zip(d.chunks_exact_mut(C2)) {
            f(sp, dp);
        }
    });
}

/// Visit each sample of `src` together with the sample at the same offset in `dst`.
pub fn par_iter_rows_val<T1, const C1: usize, T2, const C2: usize>(
    src: &Image<T1, C1>,
    dst: &mut Image<T2, C2>,
    f: impl Fn(&T1, &mut T2) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
{
    let width = src.cols();
    if width == 0 {
        return;
    }

    let src_rows = src.as_slice().par_chunks_exact(width * C1);
    let dst_rows = dst.as_slice_mut().par_chunks_exact_mut(width * C2);
    src_rows
        .zip(dst_rows)
        .for_each(|(s, d)| s.iter().zip(d).for_each(|(a, b)| f(a, b)));
}

/// Like [`par_iter_rows_val`] with a second source read in lockstep.
pub fn par_iter_rows_val_two<T1, const C1: usize, T2, const C2: usize, T3, const C3: usize>(
    lhs: &Image<T1, C1>,
    rhs: &Image<T2, C2>,
    dst: &mut Image<T3, C3>,
    f: impl Fn(&T1, &T2, &mut T3) + Send + Sync,
) where
    T1: Clone + Send + Sync,
    T2: Clone + Send + Sync,
    T3: Clone + Send + Sync,
{
    let width = lhs.cols();
    if width == 0 {
        return;
    }

    let lhs_rows = lhs.as_slice().par_chunks_exact(width * C1);
    let rhs_rows = rhs.as_slice().par_chunks_exact(width * C2);
    let dst_rows = dst.as_slice_mut().par_chunks_exact_mut(width * C3);
    lhs_rows.zip(rhs_rows).zip(dst_rows).for_each(|((a, b), d)| {
        for ((x, y), z) in a.iter().zip(b).zip(d) {
            f(x, y, z);
        }
    });
}

/// Generate every row of `dst` from its row index.
pub fn par_fill_rows<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send + Sync,
{
    let width = dst.cols();
    if width == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(width * C)
        .enumerate()
        .for_each(|(row, samples)| f(row, samples));
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvpipe_image::{ImageError, ImageSize};

    fn square(values: Vec<u8>) -> Result<Image<u8, 1>, ImageError> {
        Image::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            values,
        )
    }

    #[test]
    fn pixels_can_change_channel_count() -> Result<(), ImageError> {
        let src = square(vec![1, 2, 3, 4])?;
        let mut dst = Image::<u8, 2>::from_size_val(src.size(), 0)?;

        par_iter_rows(&src, &mut dst, |s, d| {
            d[0] = s[0];
            d[1] = 10 * s[0];
        });
        assert_eq!(dst.as_slice(), &[1, 10, 2, 20, 3, 30, 4, 40]);

        Ok(())
    }

    #[test]
    fn samples_of_one_and_two_sources() -> Result<(), ImageError> {
        let a = square(vec![1, 2, 3, 4])?;
        let b = square(vec![10, 20, 30, 40])?;
        let mut dst = square(vec![0; 4])?;

        par_iter_rows_val(&a, &mut dst, |s, d| *d = *s * 2);
        assert_eq!(dst.as_slice(), &[2, 4, 6, 8]);

        par_iter_rows_val_two(&a, &b, &mut dst, |x, y, d| *d = y - x);
        assert_eq!(dst.as_slice(), &[9, 18, 27, 36]);

        Ok(())
    }

    #[test]
    fn rows_know_their_index() -> Result<(), ImageError> {
        let mut dst = Image::<usize, 1>::from_size_val(
            ImageSize {
                width: 3,
                height: 2,
            },
            0,
        )?;

        par_fill_rows(&mut dst, |row, samples| samples.fill(row));
        assert_eq!(dst.as_slice(), &[0, 0, 0, 1, 1, 1]);

        Ok(())
    }
}
