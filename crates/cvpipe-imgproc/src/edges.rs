use rayon::prelude::*;

use cvpipe_image::{Image, ImageDtype, ImageError};

use crate::filter;

// gradient direction quantized to the 4 neighbor axes
#[derive(Clone, Copy)]
enum Direction {
    Horizontal,
    Diagonal,
    Vertical,
    AntiDiagonal,
}

impl Direction {
    fn from_gradient(gx: f32, gy: f32) -> Self {
        // tan(22.5) and tan(67.5)
        const TAN_22: f32 = 0.414_213_57;
        const TAN_67: f32 = 2.414_213_7;

        let ax = gx.abs();
        let ay = gy.abs();
        if ay <= ax * TAN_22 {
            Direction::Horizontal
        } else if ay >= ax * TAN_67 {
            Direction::Vertical
        } else if (gx > 0.0) == (gy > 0.0) {
            Direction::Diagonal
        } else {
            Direction::AntiDiagonal
        }
    }

    // the two neighbors along the gradient, as (dx, dy)
    fn neighbors(self) -> [(isize, isize); 2] {
        match self {
            Direction::Horizontal => [(-1, 0), (1, 0)],
            Direction::Vertical => [(0, -1), (0, 1)],
            Direction::Diagonal => [(-1, -1), (1, 1)],
            Direction::AntiDiagonal => [(1, -1), (-1, 1)],
        }
    }
}

/// Detect edges in a grayscale image with the Canny algorithm.
///
/// The gradient is computed with a sobel operator of the given aperture, thinned
/// with non maximum suppression and linked with hysteresis: pixels with a magnitude
/// above `high_threshold` are edges, and pixels above `low_threshold` are edges when
/// they connect to one.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
/// * `dst` - The output edge map, 255 on edges and 0 elsewhere.
/// * `low_threshold` - The lower hysteresis threshold.
/// * `high_threshold` - The upper hysteresis threshold.
/// * `aperture` - The sobel aperture, 3 or 5.
/// * `l2_gradient` - Use the euclidean norm of the gradient instead of the L1 norm.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::edges::canny;
///
/// let src = Image::<u8, 1>::from_size_val(ImageSize { width: 8, height: 8 }, 50).unwrap();
/// let mut edges = Image::<u8, 1>::from_size_val(src.size(), 0).unwrap();
///
/// canny(&src, &mut edges, 100.0, 200.0, 3, false).unwrap();
/// assert!(edges.as_slice().iter().all(|&v| v == 0));
/// ```
pub fn canny<T>(
    src: &Image<T, 1>,
    dst: &mut Image<u8, 1>,
    low_threshold: f32,
    high_threshold: f32,
    aperture: usize,
    l2_gradient: bool,
) -> Result<(), ImageError>
where
    T: ImageDtype,
{
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }

    if aperture != 3 && aperture != 5 {
        return Err(ImageError::InvalidKernelSize(aperture, aperture));
    }

    let (low, high) = if low_threshold > high_threshold {
        (high_threshold, low_threshold)
    } else {
        (low_threshold, high_threshold)
    };

    let width = src.width();
    let height = src.height();
    if width == 0 || height == 0 {
        return Ok(());
    }

    let src_f32 = src.cast::<f32>()?;
    let mut gx = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    let mut gy = Image::<f32, 1>::from_size_val(src.size(), 0.0)?;
    filter::sobel(&src_f32, &mut gx, 1, 0, aperture)?;
    filter::sobel(&src_f32, &mut gy, 0, 1, aperture)?;

    let magnitude = gx
        .as_slice()
        .iter()
        .zip(gy.as_slice())
        .map(|(&x, &y)| {
            if l2_gradient {
                (x * x + y * y).sqrt()
            } else {
                x.abs() + y.abs()
            }
        })
        .collect::<Vec<f32>>();

    let mag_at = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0.0
        } else {
            magnitude[y as usize * width + x as usize]
        }
    };

    // non maximum suppression, keeping the first of two equal maxima
    let mut suppressed = vec![0.0f32; width * height];
    suppressed
        .par_chunks_exact_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let idx = y * width + x;
                let m = magnitude[idx];
                if m <= low {
                    continue;
                }
                let dir = Direction::from_gradient(gx.as_slice()[idx], gy.as_slice()[idx]);
                let [(dx0, dy0), (dx1, dy1)] = dir.neighbors();
                let m0 = mag_at(x as isize + dx0, y as isize + dy0);
                let m1 = mag_at(x as isize + dx1, y as isize + dy1);
                if m > m0 && m >= m1 {
                    *out = m;
                }
            }
        });

    // hysteresis from the strong pixels
    const NONE: u8 = 0;
    const WEAK: u8 = 1;
    const STRONG: u8 = 2;

    let mut state = vec![NONE; width * height];
    let mut stack = Vec::new();
    for (idx, &m) in suppressed.iter().enumerate() {
        if m > high {
            state[idx] = STRONG;
            stack.push(idx);
        } else if m > low {
            state[idx] = WEAK;
        }
    }

    while let Some(idx) = stack.pop() {
        let x = (idx % width) as isize;
        let y = (idx / width) as isize;
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let nidx = ny as usize * width + nx as usize;
                if state[nidx] == WEAK {
                    state[nidx] = STRONG;
                    stack.push(nidx);
                }
            }
        }
    }

    dst.as_slice_mut()
        .par_iter_mut()
        .zip(state.par_iter())
        .for_each(|(d, &s)| *d = if s == STRONG { 255 } else { 0 });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvpipe_image::ImageSize;

    fn step_image() -> Result<Image<u8, 1>, ImageError> {
        let size = ImageSize {
            width: 10,
            height: 8,
        };
        let data = (0..size.height)
            .flat_map(|_| (0..size.width).map(|x| if x < 5 { 0u8 } else { 255 }))
            .collect();
        Image::new(size, data)
    }

    #[test]
    fn canny_vertical_step() -> Result<(), ImageError> {
        let src = step_image()?;
        let mut edges = Image::<u8, 1>::from_size_val(src.size(), 0)?;
        canny(&src, &mut edges, 100.0, 200.0, 3, false)?;

        for y in 0..src.height() {
            let row = (0..src.width())
                .filter(|&x| edges.pixel(x, y)[0] == 255)
                .collect::<Vec<_>>();
            // a single thin edge next to the step
            assert_eq!(row.len(), 1);
            assert!(row[0] == 4 || row[0] == 5);
        }

        Ok(())
    }

    #[test]
    fn canny_high_threshold_suppresses() -> Result<(), ImageError> {
        let src = step_image()?;
        let mut edges = Image::<u8, 1>::from_size_val(src.size(), 0)?;

        // the step magnitude is 4 * 255
        canny(&src, &mut edges, 2000.0, 3000.0, 3, true)?;
        assert!(edges.as_slice().iter().all(|&v| v == 0));

        Ok(())
    }

    #[test]
    fn canny_invalid_aperture() -> Result<(), ImageError> {
        let src = step_image()?;
        let mut edges = Image::<u8, 1>::from_size_val(src.size(), 0)?;
        assert_eq!(
            canny(&src, &mut edges, 1.0, 2.0, 4, false),
            Err(ImageError::InvalidKernelSize(4, 4))
        );
        Ok(())
    }
}
