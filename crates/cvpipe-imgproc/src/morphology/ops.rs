use rayon::prelude::*;

use cvpipe_image::{Image, ImageDtype, ImageError};

use super::kernels::Kernel;

/// Compound morphological operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphologyOp {
    /// Erosion followed by dilation.
    Open,
    /// Dilation followed by erosion.
    Close,
    /// Dilation minus erosion.
    Gradient,
    /// Source minus its opening.
    TopHat,
    /// Closing minus the source.
    BlackHat,
}

fn check_sizes<T, const C: usize>(src: &Image<T, C>, dst: &Image<T, C>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }
    Ok(())
}

// one pass of a rank filter over the kernel neighborhood, skipping out of bounds pixels
fn rank_filter<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    offsets: &[(isize, isize)],
    pick_max: bool,
) where
    T: ImageDtype,
{
    let width = src.width();
    let height = src.height();
    if width == 0 {
        return;
    }

    dst.as_slice_mut()
        .par_chunks_exact_mut(width * C)
        .enumerate()
        .for_each(|(h, row_chunk)| {
            for w in 0..width {
                for c in 0..C {
                    let mut acc: Option<T> = None;
                    for &(dx, dy) in offsets {
                        let x = w as isize + dx;
                        let y = h as isize + dy;
                        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
                            continue;
                        }
                        let v = src.pixel(x as usize, y as usize)[c];
                        acc = Some(match acc {
                            None => v,
                            Some(a) if pick_max && v > a => v,
                            Some(a) if !pick_max && v < a => v,
                            Some(a) => a,
                        });
                    }
                    row_chunk[w * C + c] = acc.unwrap_or_else(|| src.pixel(w, h)[c]);
                }
            }
        });
}

fn iterate<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    iterations: usize,
    pick_max: bool,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    check_sizes(src, dst)?;

    if kernel.width() == 0 || kernel.height() == 0 {
        return Err(ImageError::InvalidKernelSize(kernel.width(), kernel.height()));
    }

    let offsets = kernel.offsets();

    rank_filter(src, dst, &offsets, pick_max);
    for _ in 1..iterations {
        let prev = dst.clone();
        rank_filter(&prev, dst, &offsets, pick_max);
    }

    Ok(())
}

/// Dilate an image using a [`Kernel`].
///
/// Dilation expands bright regions in the image. Each sample is replaced
/// by the maximum value in the neighborhood defined by the kernel. Pixels
/// outside of the image do not take part.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image (will be overwritten).
/// * `kernel` - The morphological structuring element ([`Kernel`]).
/// * `iterations` - How many times the dilation is applied.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::morphology::{dilate, Kernel, KernelShape};
///
/// let src = Image::<u8, 1>::new(ImageSize { width: 3, height: 1 }, vec![0, 9, 0]).unwrap();
/// let mut dst = Image::<u8, 1>::from_size_val(src.size(), 0).unwrap();
///
/// let kernel = Kernel::new(KernelShape::Box { width: 3, height: 3 });
/// dilate(&src, &mut dst, &kernel, 1).unwrap();
/// assert_eq!(dst.as_slice(), &[9, 9, 9]);
/// ```
pub fn dilate<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    iterations: usize,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    iterate(src, dst, kernel, iterations, true)
}

/// Erode an image using a [`Kernel`].
///
/// Erosion shrinks bright regions in the image. Each sample is replaced
/// by the minimum value in the neighborhood defined by the kernel. Pixels
/// outside of the image do not take part.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image (will be overwritten).
/// * `kernel` - The morphological structuring element ([`Kernel`]).
/// * `iterations` - How many times the erosion is applied.
pub fn erode<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    iterations: usize,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    iterate(src, dst, kernel, iterations, false)
}

/// Open an image: erode, then dilate.
pub fn open<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    iterations: usize,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    let mut eroded = dst.clone();
    erode(src, &mut eroded, kernel, iterations)?;
    dilate(&eroded, dst, kernel, iterations)
}

/// Close an image: dilate, then erode.
pub fn close<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    kernel: &Kernel,
    iterations: usize,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    let mut dilated = dst.clone();
    dilate(src, &mut dilated, kernel, iterations)?;
    erode(&dilated, dst, kernel, iterations)
}

// a - b, saturated to the sample type
fn difference<T, const C: usize>(a: &Image<T, C>, b: &Image<T, C>, dst: &mut Image<T, C>)
where
    T: ImageDtype,
{
    dst.as_slice_mut()
        .par_iter_mut()
        .zip(a.as_slice().par_iter().zip(b.as_slice().par_iter()))
        .for_each(|(d, (&x, &y))| *d = T::from_f32(x.to_f32() - y.to_f32()));
}

/// Apply a compound morphological operation.
///
/// # Arguments
///
/// * `src` - The source image.
/// * `dst` - The destination image (will be overwritten).
/// * `op` - The operation to apply.
/// * `kernel` - The morphological structuring element ([`Kernel`]).
/// * `iterations` - How many times each erosion and dilation is applied.
pub fn morphology_ex<T, const C: usize>(
    src: &Image<T, C>,
    dst: &mut Image<T, C>,
    op: MorphologyOp,
    kernel: &Kernel,
    iterations: usize,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    check_sizes(src, dst)?;

    match op {
        MorphologyOp::Open => open(src, dst, kernel, iterations),
        MorphologyOp::Close => close(src, dst, kernel, iterations),
        MorphologyOp::Gradient => {
            let mut dilated = src.clone();
            let mut eroded = src.clone();
            dilate(src, &mut dilated, kernel, iterations)?;
            erode(src, &mut eroded, kernel, iterations)?;
            difference(&dilated, &eroded, dst);
            Ok(())
        }
        MorphologyOp::TopHat => {
            let mut opened = src.clone();
            open(src, &mut opened, kernel, iterations)?;
            difference(src, &opened, dst);
            Ok(())
        }
        MorphologyOp::BlackHat => {
            let mut closed = src.clone();
            close(src, &mut closed, kernel, iterations)?;
            difference(&closed, src, dst);
            Ok(())
        }
    }
}
