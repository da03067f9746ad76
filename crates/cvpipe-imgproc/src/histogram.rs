use rayon::prelude::*;

use cvpipe_image::{Image, ImageDtype, ImageError};

use crate::border::reflect_101;
use crate::parallel;

fn check_bins(num_bins: usize, range: (f32, f32)) -> Result<(), ImageError> {
    if num_bins == 0 {
        return Err(ImageError::InvalidHistogramBins(num_bins));
    }
    if !(range.1 > range.0) {
        return Err(ImageError::InvalidHistogramRange(range.0, range.1));
    }
    Ok(())
}

fn check_mask<T, const C: usize>(
    src: &Image<T, C>,
    mask: Option<&Image<u8, 1>>,
) -> Result<(), ImageError> {
    if let Some(mask) = mask {
        if mask.size() != src.size() {
            return Err(ImageError::InvalidImageSize(
                src.width(),
                src.height(),
                mask.width(),
                mask.height(),
            ));
        }
    }
    Ok(())
}

// the bin of a value in the half open range [lo, hi), if any
#[inline]
fn bin_index(v: f32, range: (f32, f32), num_bins: usize) -> Option<usize> {
    if v < range.0 || v >= range.1 {
        return None;
    }
    let idx = ((v - range.0) * num_bins as f32 / (range.1 - range.0)) as usize;
    Some(idx.min(num_bins - 1))
}

/// Compute the histogram of one channel of an image.
///
/// Samples are counted in `num_bins` uniform bins spanning the half open range
/// `[range.0, range.1)`. Samples outside of the range are ignored, as are pixels
/// where the mask is zero.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `channel` - The channel to count.
/// * `mask` - An optional mask with the size of the image.
/// * `num_bins` - The number of bins of the histogram.
/// * `range` - The range of values covered by the bins.
///
/// # Returns
///
/// A vector of `num_bins` counts.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::histogram::calc_hist;
///
/// let image = Image::<u8, 1>::new(
///   ImageSize {
///     width: 3,
///     height: 3,
///   },
///   vec![0, 2, 4, 128, 130, 132, 254, 255, 255],
/// ).unwrap();
///
/// let histogram = calc_hist(&image, 0, None, 3, (0.0, 256.0)).unwrap();
/// assert_eq!(histogram, vec![3.0, 3.0, 3.0]);
/// ```
pub fn calc_hist<T, const C: usize>(
    src: &Image<T, C>,
    channel: usize,
    mask: Option<&Image<u8, 1>>,
    num_bins: usize,
    range: (f32, f32),
) -> Result<Vec<f32>, ImageError>
where
    T: ImageDtype,
{
    check_bins(num_bins, range)?;
    check_mask(src, mask)?;
    if channel >= C {
        return Err(ImageError::ChannelIndexOutOfBounds(channel, C));
    }

    let width = src.width();
    if width == 0 {
        return Ok(vec![0.0; num_bins]);
    }

    let counts = src
        .as_slice()
        .par_chunks_exact(width * C)
        .enumerate()
        .fold(
            || vec![0usize; num_bins],
            |mut local, (y, row)| {
                for (x, pixel) in row.chunks_exact(C).enumerate() {
                    if let Some(mask) = mask {
                        if mask.pixel(x, y)[0] == 0 {
                            continue;
                        }
                    }
                    if let Some(idx) = bin_index(pixel[channel].to_f32(), range, num_bins) {
                        local[idx] += 1;
                    }
                }
                local
            },
        )
        .reduce(
            || vec![0usize; num_bins],
            |mut a, b| {
                a.iter_mut().zip(b.iter()).for_each(|(x, y)| *x += y);
                a
            },
        );

    Ok(counts.into_iter().map(|c| c as f32).collect())
}

/// Compute the joint histogram of two channels of an image.
///
/// The first channel indexes the rows of the histogram and the second one its
/// columns, so the result holds `num_bins.1 * num_bins.0` counts in row major order.
///
/// # Arguments
///
/// * `src` - The input image.
/// * `channels` - The channels counted along the rows and along the columns.
/// * `num_bins` - The number of bins as (columns, rows).
/// * `range_x` - The range of the column channel.
/// * `range_y` - The range of the row channel.
pub fn calc_hist_2d<T, const C: usize>(
    src: &Image<T, C>,
    channels: (usize, usize),
    num_bins: (usize, usize),
    range_x: (f32, f32),
    range_y: (f32, f32),
) -> Result<Vec<f32>, ImageError>
where
    T: ImageDtype,
{
    check_bins(num_bins.0, range_x)?;
    check_bins(num_bins.1, range_y)?;
    for ch in [channels.0, channels.1] {
        if ch >= C {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, C));
        }
    }

    let (bins_x, bins_y) = num_bins;
    let mut hist = vec![0.0f32; bins_x * bins_y];
    for pixel in src.as_slice().chunks_exact(C) {
        let row = bin_index(pixel[channels.0].to_f32(), range_y, bins_y);
        let col = bin_index(pixel[channels.1].to_f32(), range_x, bins_x);
        if let (Some(row), Some(col)) = (row, col) {
            hist[row * bins_x + col] += 1.0;
        }
    }

    Ok(hist)
}

fn histogram_256(samples: &[u8]) -> [usize; 256] {
    let mut hist = [0usize; 256];
    for &v in samples {
        hist[v as usize] += 1;
    }
    hist
}

/// Equalize the histogram of a grayscale image.
///
/// The intensities are remapped through the normalized cumulative histogram so
/// that they spread over the full `[0, 255]` range. An image with a single
/// intensity is copied unchanged.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
/// * `dst` - The output equalized image.
pub fn equalize_histogram(src: &Image<u8, 1>, dst: &mut Image<u8, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    let hist = histogram_256(src.as_slice());
    let total = src.as_slice().len();

    let Some(first) = hist.iter().position(|&c| c > 0) else {
        return Ok(());
    };

    if hist[first] == total {
        dst.as_slice_mut().copy_from_slice(src.as_slice());
        return Ok(());
    }

    let scale = 255.0 / (total - hist[first]) as f32;
    let mut lut = [0u8; 256];
    let mut sum = 0usize;
    for i in first + 1..256 {
        sum += hist[i];
        lut[i] = u8::from_f32(sum as f32 * scale);
    }

    parallel::par_iter_rows_val(src, dst, |&s, d| *d = lut[s as usize]);

    Ok(())
}

// clip the histogram and spread the excess uniformly over all the bins
fn clip_histogram(hist: &mut [usize; 256], clip: usize) {
    let mut excess = 0usize;
    for h in hist.iter_mut() {
        if *h > clip {
            excess += *h - clip;
            *h = clip;
        }
    }

    let batch = excess / 256;
    let mut residual = excess - batch * 256;
    for h in hist.iter_mut() {
        *h += batch;
    }

    if residual > 0 {
        let step = (256 / residual).max(1);
        let mut i = 0;
        while i < 256 && residual > 0 {
            hist[i] += 1;
            residual -= 1;
            i += step;
        }
    }
}

/// Apply contrast limited adaptive histogram equalization to a grayscale image.
///
/// The image is split in a grid of tiles. Each tile gets its own equalization
/// table built from its histogram clipped at `clip_limit` times the average bin
/// count. Every pixel is mapped by bilinear interpolation between the tables of
/// the four nearest tiles.
///
/// # Arguments
///
/// * `src` - The input grayscale image.
/// * `dst` - The output image.
/// * `clip_limit` - The contrast limit. Zero or less disables the clipping.
/// * `tile_grid` - The number of tiles as (columns, rows). It is clamped to the image
///   size, and reduced when fewer tiles of the resulting size cover the image.
pub fn clahe(
    src: &Image<u8, 1>,
    dst: &mut Image<u8, 1>,
    clip_limit: f32,
    tile_grid: (usize, usize),
) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.width(),
            src.height(),
            dst.width(),
            dst.height(),
        ));
    }

    if tile_grid.0 == 0 || tile_grid.1 == 0 {
        return Err(ImageError::InvalidKernelSize(tile_grid.0, tile_grid.1));
    }

    let width = src.width();
    let height = src.height();
    if width == 0 || height == 0 {
        return Ok(());
    }

    // every tile has the full tile size; the last row and column of tiles
    // read past the image through a mirrored border
    let tile_w = width.div_ceil(tile_grid.0.min(width));
    let tile_h = height.div_ceil(tile_grid.1.min(height));
    let tiles_x = width.div_ceil(tile_w);
    let tiles_y = height.div_ceil(tile_h);
    let area = tile_w * tile_h;

    // one lookup table per tile, in row major tile order
    let luts = (0..tiles_x * tiles_y)
        .into_par_iter()
        .map(|t| {
            let (x0, y0) = ((t % tiles_x) * tile_w, (t / tiles_x) * tile_h);

            let mut hist = [0usize; 256];
            for y in y0..y0 + tile_h {
                let sy = reflect_101(y as isize, height);
                for x in x0..x0 + tile_w {
                    let sx = reflect_101(x as isize, width);
                    hist[src.pixel(sx, sy)[0] as usize] += 1;
                }
            }

            let mut lut = [0u8; 256];
            if clip_limit > 0.0 {
                let clip = ((clip_limit * area as f32 / 256.0) as usize).max(1);
                clip_histogram(&mut hist, clip);
            }

            let scale = 255.0 / area as f32;
            let mut sum = 0usize;
            for (l, &h) in lut.iter_mut().zip(hist.iter()) {
                sum += h;
                *l = u8::from_f32(sum as f32 * scale);
            }
            lut
        })
        .collect::<Vec<_>>();

    let inv_tw = 1.0 / tile_w as f32;
    let inv_th = 1.0 / tile_h as f32;

    parallel::par_fill_rows(dst, |y, row| {
        let tyf = y as f32 * inv_th - 0.5;
        let ty1 = tyf.floor() as isize;
        let ya = tyf - ty1 as f32;
        let ty2 = ((ty1 + 1) as usize).min(tiles_y - 1);
        let ty1 = ty1.max(0) as usize;

        for (x, d) in row.iter_mut().enumerate() {
            let v = src.pixel(x, y)[0] as usize;

            let txf = x as f32 * inv_tw - 0.5;
            let tx1 = txf.floor() as isize;
            let xa = txf - tx1 as f32;
            let tx2 = ((tx1 + 1) as usize).min(tiles_x - 1);
            let tx1 = tx1.max(0) as usize;

            let lut = |tx: usize, ty: usize| luts[ty * tiles_x + tx][v] as f32;

            let top = lut(tx1, ty1) * (1.0 - xa) + lut(tx2, ty1) * xa;
            let bottom = lut(tx1, ty2) * (1.0 - xa) + lut(tx2, ty2) * xa;
            *d = u8::from_f32(top * (1.0 - ya) + bottom * ya);
        }
    });

    Ok(())
}
