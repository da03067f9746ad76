use std::f32::consts::PI;

use cvpipe_image::{Image, ImageDtype, ImageError};

/// A line in polar form, `x * cos(theta) + y * sin(theta) = rho`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarLine {
    /// Signed distance of the line to the origin, in pixels.
    pub rho: f32,
    /// Angle of the line normal, in radians in `[0, pi)`.
    pub theta: f32,
    /// Number of accumulator votes.
    pub votes: u32,
}

impl PolarLine {
    /// Two points on the line, `extent` pixels away on either side of the
    /// point closest to the origin.
    pub fn endpoints(&self, extent: f32) -> ((i64, i64), (i64, i64)) {
        let (a, b) = (self.theta.cos(), self.theta.sin());
        let (x0, y0) = (a * self.rho, b * self.rho);
        (
            (
                (x0 - extent * b).round() as i64,
                (y0 + extent * a).round() as i64,
            ),
            (
                (x0 + extent * b).round() as i64,
                (y0 - extent * a).round() as i64,
            ),
        )
    }
}

/// A line segment between two pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSegment {
    /// The first end point (x, y).
    pub start: (i64, i64),
    /// The last end point (x, y).
    pub end: (i64, i64),
}

impl LineSegment {
    /// The euclidean length of the segment.
    pub fn length(&self) -> f32 {
        let dx = (self.end.0 - self.start.0) as f32;
        let dy = (self.end.1 - self.start.1) as f32;
        (dx * dx + dy * dy).sqrt()
    }
}

/// The most cells a line accumulator may hold, including its padding.
pub const MAX_ACCUMULATOR_CELLS: usize = 1 << 26;

struct Accumulator {
    votes: Vec<u32>,
    num_angle: usize,
    num_rho: usize,
    rho: f32,
    theta: f32,
}

impl Accumulator {
    // the accumulator is padded by one cell on every side for the peak search
    fn index(&self, n: usize, r: usize) -> usize {
        (n + 1) * (self.num_rho + 2) + r + 1
    }

    fn vote<T: ImageDtype>(
        src: &Image<T, 1>,
        rho: f32,
        theta: f32,
    ) -> Result<Self, ImageError> {
        if rho <= 0.0 || theta <= 0.0 {
            return Err(ImageError::DegenerateTransform(format!(
                "invalid hough resolution rho={rho} theta={theta}"
            )));
        }

        let mut num_angle = (PI / theta).round().max(1.0) as usize;
        if num_angle > 1 && (PI - (num_angle - 1) as f32 * theta).abs() < theta / 2.0 {
            num_angle -= 1;
        }
        let num_rho = (((src.width() + src.height()) * 2 + 1) as f32 / rho).round() as usize;

        let cells = (num_angle + 2).checked_mul(num_rho + 2);
        if cells.map_or(true, |cells| cells > MAX_ACCUMULATOR_CELLS) {
            return Err(ImageError::AccumulatorTooLarge(
                num_angle,
                num_rho,
                MAX_ACCUMULATOR_CELLS,
            ));
        }

        let (sin_table, cos_table): (Vec<f32>, Vec<f32>) = (0..num_angle)
            .map(|n| {
                let angle = n as f32 * theta;
                (angle.sin() / rho, angle.cos() / rho)
            })
            .unzip();

        let mut acc = Accumulator {
            votes: vec![0u32; (num_angle + 2) * (num_rho + 2)],
            num_angle,
            num_rho,
            rho,
            theta,
        };

        let zero = T::default();
        let half = (num_rho as isize - 1) / 2;
        for y in 0..src.height() {
            for x in 0..src.width() {
                if src.pixel(x, y)[0] <= zero {
                    continue;
                }
                for n in 0..num_angle {
                    let r = (x as f32 * cos_table[n] + y as f32 * sin_table[n]).round() as isize
                        + half;
                    if r >= 0 && (r as usize) < num_rho {
                        let idx = acc.index(n, r as usize);
                        acc.votes[idx] += 1;
                    }
                }
            }
        }

        Ok(acc)
    }

    fn peaks(&self, threshold: u32) -> Vec<PolarLine> {
        let stride = self.num_rho + 2;
        let mut peaks = Vec::new();
        for n in 0..self.num_angle {
            for r in 0..self.num_rho {
                let base = self.index(n, r);
                let v = self.votes[base];
                if v > threshold
                    && v > self.votes[base - 1]
                    && v >= self.votes[base + 1]
                    && v > self.votes[base - stride]
                    && v >= self.votes[base + stride]
                {
                    peaks.push((base, n, r, v));
                }
            }
        }

        // strongest first, ties in accumulator order
        peaks.sort_by(|a, b| b.3.cmp(&a.3).then(a.0.cmp(&b.0)));

        peaks
            .into_iter()
            .map(|(_, n, r, votes)| PolarLine {
                rho: (r as f32 - (self.num_rho as f32 - 1.0) * 0.5) * self.rho,
                theta: n as f32 * self.theta,
                votes,
            })
            .collect()
    }
}

/// Detect straight lines in a binary edge image with the standard Hough transform.
///
/// Every non zero pixel votes for the `(rho, theta)` cells of the lines passing
/// through it. Cells with more than `threshold` votes that are local maxima
/// among their 4 neighbors are returned, strongest first.
///
/// # Arguments
///
/// * `src` - The input edge image, non zero pixels are edge points.
/// * `rho` - The distance resolution of the accumulator in pixels.
/// * `theta` - The angle resolution of the accumulator in radians.
/// * `threshold` - The minimum number of votes, exclusive.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::hough::hough_lines;
///
/// let mut edges = Image::<u8, 1>::from_size_val(ImageSize { width: 20, height: 20 }, 0).unwrap();
/// for y in 0..20 {
///     edges.set_pixel(7, y, 0, 255).unwrap();
/// }
///
/// let lines = hough_lines(&edges, 1.0, std::f32::consts::PI / 180.0, 15).unwrap();
/// assert_eq!(lines[0].rho.round(), 7.0);
/// assert_eq!(lines[0].theta, 0.0);
/// ```
pub fn hough_lines<T: ImageDtype>(
    src: &Image<T, 1>,
    rho: f32,
    theta: f32,
    threshold: u32,
) -> Result<Vec<PolarLine>, ImageError> {
    let acc = Accumulator::vote(src, rho, theta)?;
    Ok(acc.peaks(threshold))
}

/// Detect line segments in a binary edge image.
///
/// The candidate lines of [`hough_lines`] are walked across the image in vote
/// order. Runs of edge pixels along a line, bridging gaps of at most
/// `max_line_gap` pixels, become segments when they are at least
/// `min_line_length` long. Pixels of an accepted segment do not contribute to
/// later segments.
///
/// # Arguments
///
/// * `src` - The input edge image, non zero pixels are edge points.
/// * `rho` - The distance resolution of the accumulator in pixels.
/// * `theta` - The angle resolution of the accumulator in radians.
/// * `threshold` - The minimum number of votes of a candidate line, exclusive.
/// * `min_line_length` - The minimum length of a segment.
/// * `max_line_gap` - The maximum gap between pixels of the same segment.
pub fn hough_lines_p<T: ImageDtype>(
    src: &Image<T, 1>,
    rho: f32,
    theta: f32,
    threshold: u32,
    min_line_length: f32,
    max_line_gap: usize,
) -> Result<Vec<LineSegment>, ImageError> {
    let lines = hough_lines(src, rho, theta, threshold)?;

    let width = src.width();
    let height = src.height();
    let zero = T::default();
    let mut used = vec![false; width * height];

    let extent = ((width * width + height * height) as f32).sqrt() + 1.0;
    let mut segments = Vec::new();

    for line in lines {
        let (a, b) = (line.theta.cos(), line.theta.sin());
        let (x0, y0) = (a * line.rho, b * line.rho);

        // the pixels visited along the line, in order and without repeats
        let mut path: Vec<(usize, usize)> = Vec::new();
        let steps = (2.0 * extent).ceil() as i64;
        for s in 0..=steps {
            let t = s as f32 - extent;
            let x = (x0 - t * b).round();
            let y = (y0 + t * a).round();
            if x < 0.0 || y < 0.0 || x >= width as f32 || y >= height as f32 {
                continue;
            }
            let p = (x as usize, y as usize);
            if path.last() != Some(&p) {
                path.push(p);
            }
        }

        let mut run: Vec<(usize, usize)> = Vec::new();
        let mut gap = 0usize;
        let mut flush = |run: &mut Vec<(usize, usize)>, used: &mut Vec<bool>| {
            if let (Some(&first), Some(&last)) = (run.first(), run.last()) {
                let segment = LineSegment {
                    start: (first.0 as i64, first.1 as i64),
                    end: (last.0 as i64, last.1 as i64),
                };
                if segment.length() >= min_line_length {
                    for &(x, y) in run.iter() {
                        used[y * width + x] = true;
                    }
                    segments.push(segment);
                }
            }
            run.clear();
        };

        for &(x, y) in path.iter() {
            let on = src.pixel(x, y)[0] > zero && !used[y * width + x];
            if on {
                run.push((x, y));
                gap = 0;
            } else if !run.is_empty() {
                gap += 1;
                if gap > max_line_gap {
                    flush(&mut run, &mut used);
                    gap = 0;
                }
            }
        }
        flush(&mut run, &mut used);
    }

    Ok(segments)
}
