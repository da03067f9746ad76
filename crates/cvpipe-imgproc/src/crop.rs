use cvpipe_image::{Image, ImageError};
use rayon::prelude::*;

/// Copy the `dst`-sized window whose top left corner is `(x, y)` out of `src`.
///
/// Fails with [`ImageError::InvalidRegion`] when the window is empty or does
/// not lie fully inside `src`.
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::crop::crop_image;
///
/// #[rustfmt::skip]
/// let board = Image::<u8, 1>::new(ImageSize { width: 3, height: 3 }, vec![
///     1, 2, 3,
///     4, 5, 6,
///     7, 8, 9,
/// ]).unwrap();
///
/// let mut corner = Image::<u8, 1>::from_size_val(ImageSize { width: 2, height: 2 }, 0).unwrap();
/// crop_image(&board, &mut corner, 1, 1).unwrap();
///
/// assert_eq!(corner.as_slice(), &[5, 6, 8, 9]);
/// ```
pub fn crop_image<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    x: usize,
    y: usize,
) -> Result<(), ImageError>
where
    T: Copy + Send + Sync,
{
    let (w, h) = (dst.cols(), dst.rows());
    let fits = w > 0 && h > 0 && x + w <= src.cols() && y + h <= src.rows();
    if !fits {
        return Err(ImageError::InvalidRegion(
            x,
            y,
            w,
            h,
            src.cols(),
            src.rows(),
        ));
    }

    let span = x * C..(x + w) * C;
    src.as_slice()
        .par_chunks_exact(src.cols() * C)
        .skip(y)
        .zip(dst.as_slice_mut().par_chunks_exact_mut(w * C))
        .for_each(|(src_row, dst_row)| dst_row.copy_from_slice(&src_row[span.clone()]));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::crop_image;
    use cvpipe_image::{Image, ImageError, ImageSize};

    #[test]
    fn crop_rgb_window() -> Result<(), ImageError> {
        let samples = (0u8..36).collect::<Vec<_>>();
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 4,
                height: 3,
            },
            samples,
        )?;

        let mut window = Image::<u8, 3>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            0,
        )?;
        crop_image(&image, &mut window, 2, 1)?;

        #[rustfmt::skip]
        assert_eq!(window.as_slice(), &[
            18, 19, 20, 21, 22, 23,
            30, 31, 32, 33, 34, 35,
        ]);

        Ok(())
    }

    #[test]
    fn crop_whole_image() -> Result<(), ImageError> {
        let size = ImageSize {
            width: 3,
            height: 2,
        };
        let image = Image::<u8, 1>::new(size, vec![9, 8, 7, 6, 5, 4])?;
        let mut copy = Image::<u8, 1>::from_size_val(size, 0)?;
        crop_image(&image, &mut copy, 0, 0)?;
        assert_eq!(copy, image);

        Ok(())
    }

    #[test]
    fn crop_outside_the_source() -> Result<(), ImageError> {
        let image = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 4,
                height: 4,
            },
            0,
        )?;
        let mut window = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 3,
                height: 2,
            },
            0,
        )?;

        assert_eq!(
            crop_image(&image, &mut window, 2, 0),
            Err(ImageError::InvalidRegion(2, 0, 3, 2, 4, 4))
        );
        assert_eq!(
            crop_image(&image, &mut window, 0, 3),
            Err(ImageError::InvalidRegion(0, 3, 3, 2, 4, 4))
        );

        Ok(())
    }
}
