use cvpipe_image::{Image, ImageDtype};

/// Which borders [`find_contours`] returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalMode {
    /// Only the outer borders that are not nested in any other component.
    External,
    /// Every outer and hole border.
    List,
}

/// How the points of a border are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourApproximationMode {
    /// Every border pixel.
    None,
    /// Only the end points of horizontal, vertical and diagonal runs.
    Simple,
}

/// A traced border.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contour {
    /// The border pixels (x, y) in tracing order.
    pub points: Vec<(i32, i32)>,
    /// Whether the border surrounds a hole rather than a component.
    pub is_hole: bool,
    /// Index of the enclosing contour in the returned list, if it was returned.
    pub parent: Option<usize>,
}

// neighbor offsets (dx, dy), counter clockwise on screen starting east
const DIRECTIONS: [(isize, isize); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

fn direction_of(from: (isize, isize), to: (isize, isize)) -> usize {
    let d = (to.0 - from.0, to.1 - from.1);
    DIRECTIONS.iter().position(|&o| o == d).unwrap_or(0)
}

struct LabelGrid {
    data: Vec<i32>,
    stride: usize,
}

impl LabelGrid {
    fn get(&self, p: (isize, isize)) -> i32 {
        self.data[p.1 as usize * self.stride + p.0 as usize]
    }

    fn set(&mut self, p: (isize, isize), v: i32) {
        self.data[p.1 as usize * self.stride + p.0 as usize] = v;
    }
}

// border following from a start pixel, marking the grid with `nbd`
fn follow_border(
    grid: &mut LabelGrid,
    start: (isize, isize),
    from: (isize, isize),
    nbd: i32,
) -> Vec<(isize, isize)> {
    let step = |p: (isize, isize), d: usize| (p.0 + DIRECTIONS[d].0, p.1 + DIRECTIONS[d].1);

    // look clockwise around the start for the first non zero pixel
    let d0 = direction_of(start, from);
    let first = (0..8)
        .map(|k| (d0 + 8 - k) % 8)
        .map(|d| step(start, d))
        .find(|&p| grid.get(p) != 0);

    let Some(first) = first else {
        // isolated pixel
        grid.set(start, -nbd);
        return vec![start];
    };

    let mut points = Vec::new();
    let mut prev = first;
    let mut current = start;

    loop {
        // search counter clockwise, starting after the previous pixel
        let d_prev = direction_of(current, prev);
        let mut east_is_zero = false;
        let mut next = prev;
        for k in 1..=8 {
            let d = (d_prev + k) % 8;
            let p = step(current, d);
            if grid.get(p) != 0 {
                next = p;
                break;
            }
            if d == 0 {
                east_is_zero = true;
            }
        }

        if east_is_zero {
            grid.set(current, -nbd);
        } else if grid.get(current) == 1 {
            grid.set(current, nbd);
        }

        points.push(current);

        if next == start && current == first {
            break;
        }

        prev = current;
        current = next;
    }

    points
}

fn compress_simple(points: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    let n = points.len();
    if n < 3 {
        return points;
    }

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            let d_in = (cur.0 - prev.0, cur.1 - prev.1);
            let d_out = (next.0 - cur.0, next.1 - cur.1);
            d_in != d_out
        })
        .map(|i| points[i])
        .collect()
}

/// Find the borders of the non zero components of a binary image.
///
/// Borders are traced with the Suzuki-Abe border following algorithm on 8-connected
/// components. Outer borders run around components and hole borders around the
/// 4-connected background regions they enclose.
///
/// # Arguments
///
/// * `src` - The input image. Every non zero sample is foreground.
/// * `mode` - Which borders to return.
/// * `approximation` - How the border points are stored.
///
/// # Returns
///
/// The contours in the order their first pixel is met in a raster scan.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::contours::{find_contours, ContourApproximationMode, RetrievalMode};
///
/// let mut img = Image::<u8, 1>::from_size_val(ImageSize { width: 6, height: 6 }, 0).unwrap();
/// for y in 1..5 {
///     for x in 1..5 {
///         img.set_pixel(x, y, 0, 255).unwrap();
///     }
/// }
///
/// let contours = find_contours(&img, RetrievalMode::External, ContourApproximationMode::Simple);
/// assert_eq!(contours.len(), 1);
/// assert_eq!(contours[0].points, vec![(1, 1), (1, 4), (4, 4), (4, 1)]);
/// ```
pub fn find_contours<T: ImageDtype>(
    src: &Image<T, 1>,
    mode: RetrievalMode,
    approximation: ContourApproximationMode,
) -> Vec<Contour> {
    let width = src.width();
    let height = src.height();
    let stride = width + 2;

    // pad the image with a frame of background
    let zero = T::default();
    let mut grid = LabelGrid {
        data: vec![0i32; stride * (height + 2)],
        stride,
    };
    for y in 0..height {
        for x in 0..width {
            if src.pixel(x, y)[0] != zero {
                grid.set((x as isize + 1, y as isize + 1), 1);
            }
        }
    }

    // per border number: (is_hole, parent border number, index in the output)
    let mut borders: Vec<(bool, i32, Option<usize>)> = vec![(true, 0, None), (true, 0, None)];
    let mut contours: Vec<Contour> = Vec::new();
    let mut nbd = 1i32;

    for y in 1..=height as isize {
        let mut lnbd = 1i32;
        for x in 1..=width as isize {
            let v = grid.get((x, y));
            if v == 0 {
                continue;
            }

            let start = if v == 1 && grid.get((x - 1, y)) == 0 {
                Some(((x - 1, y), false))
            } else if v >= 1 && grid.get((x + 1, y)) == 0 {
                if v > 1 {
                    lnbd = v;
                }
                Some(((x + 1, y), true))
            } else {
                None
            };

            if let Some((from, is_hole)) = start {
                nbd += 1;

                let (prev_is_hole, prev_parent, _) = borders[lnbd as usize];
                let parent = if is_hole == prev_is_hole {
                    prev_parent
                } else {
                    lnbd
                };

                let traced = follow_border(&mut grid, (x, y), from, nbd);

                let keep = match mode {
                    RetrievalMode::List => true,
                    RetrievalMode::External => !is_hole && parent == 1,
                };

                let index = if keep {
                    let points = traced
                        .into_iter()
                        .map(|(px, py)| (px as i32 - 1, py as i32 - 1))
                        .collect::<Vec<_>>();
                    let points = match approximation {
                        ContourApproximationMode::None => points,
                        ContourApproximationMode::Simple => compress_simple(points),
                    };
                    let parent_index = match mode {
                        RetrievalMode::List => borders[parent as usize].2,
                        RetrievalMode::External => None,
                    };
                    contours.push(Contour {
                        points,
                        is_hole,
                        parent: parent_index,
                    });
                    Some(contours.len() - 1)
                } else {
                    None
                };

                borders.push((is_hole, parent, index));
            }

            let v = grid.get((x, y));
            if v != 1 {
                lnbd = v.abs();
            }
        }
    }

    contours
}

/// The area enclosed by a polygon, computed with the shoelace formula.
///
/// # Example
///
/// ```
/// use cvpipe_imgproc::contours::contour_area;
///
/// assert_eq!(contour_area(&[(0, 0), (4, 0), (4, 3), (0, 3)]), 12.0);
/// ```
pub fn contour_area(points: &[(i32, i32)]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut area = 0.0f64;
    for i in 0..n {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % n];
        area += x0 as f64 * y1 as f64 - x1 as f64 * y0 as f64;
    }
    area.abs() * 0.5
}

/// The length of a polyline, including the closing edge when `closed`.
pub fn arc_length(points: &[(i32, i32)], closed: bool) -> f64 {
    let n = points.len();
    if n < 2 {
        return 0.0;
    }

    let segment = |a: (i32, i32), b: (i32, i32)| {
        let dx = (b.0 - a.0) as f64;
        let dy = (b.1 - a.1) as f64;
        (dx * dx + dy * dy).sqrt()
    };

    let open = points.windows(2).map(|w| segment(w[0], w[1])).sum::<f64>();
    if closed {
        open + segment(points[n - 1], points[0])
    } else {
        open
    }
}

/// Spatial moments up to the first order of a polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Zeroth order moment, the area.
    pub m00: f64,
    /// First order moment along x.
    pub m10: f64,
    /// First order moment along y.
    pub m01: f64,
}

impl Moments {
    /// The center of mass of the polygon, or `None` for a degenerate polygon.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.m00.abs() < f64::EPSILON {
            None
        } else {
            Some((self.m10 / self.m00, self.m01 / self.m00))
        }
    }
}

/// Compute the spatial moments of the polygon outlined by `points`.
///
/// The moments are normalized so that the area is positive whatever the
/// orientation of the polygon.
pub fn moments(points: &[(i32, i32)]) -> Moments {
    let n = points.len();
    let (mut a00, mut a10, mut a01) = (0.0f64, 0.0f64, 0.0f64);
    for i in 0..n {
        let (x0, y0) = (points[i].0 as f64, points[i].1 as f64);
        let (x1, y1) = (points[(i + 1) % n].0 as f64, points[(i + 1) % n].1 as f64);
        let cross = x0 * y1 - x1 * y0;
        a00 += cross;
        a10 += cross * (x0 + x1);
        a01 += cross * (y0 + y1);
    }

    let sign = if a00 < 0.0 { -1.0 } else { 1.0 };
    Moments {
        m00: sign * a00 / 2.0,
        m10: sign * a10 / 6.0,
        m01: sign * a01 / 6.0,
    }
}

fn point_line_distance(p: (i32, i32), a: (i32, i32), b: (i32, i32)) -> f64 {
    let (px, py) = (p.0 as f64, p.1 as f64);
    let (ax, ay) = (a.0 as f64, a.1 as f64);
    let (bx, by) = (b.0 as f64, b.1 as f64);
    let dx = bx - ax;
    let dy = by - ay;
    if dx == 0.0 && dy == 0.0 {
        let ex = px - ax;
        let ey = py - ay;
        return (ex * ex + ey * ey).sqrt();
    }
    ((px - ax) * dy - (py - ay) * dx).abs() / (dx * dx + dy * dy).sqrt()
}

fn douglas_peucker(points: &[(i32, i32)], epsilon: f64, out: &mut Vec<(i32, i32)>) {
    if points.len() < 2 {
        out.extend_from_slice(points);
        return;
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0f64;
    let mut idx = 0usize;
    for (i, &p) in points.iter().enumerate().take(points.len() - 1).skip(1) {
        let d = point_line_distance(p, first, last);
        if d > max_dist {
            max_dist = d;
            idx = i;
        }
    }

    if max_dist > epsilon && idx > 0 {
        douglas_peucker(&points[..=idx], epsilon, out);
        out.pop();
        douglas_peucker(&points[idx..], epsilon, out);
    } else {
        out.push(first);
        out.push(last);
    }
}

/// Approximate a polyline with fewer vertices using the Douglas-Peucker algorithm.
///
/// # Arguments
///
/// * `points` - The vertices of the polyline.
/// * `epsilon` - The maximum distance between the original curve and its approximation.
/// * `closed` - Whether the polyline is a closed polygon.
pub fn approx_poly_dp(points: &[(i32, i32)], epsilon: f64, closed: bool) -> Vec<(i32, i32)> {
    if points.len() < 3 {
        return points.to_vec();
    }

    if !closed {
        let mut out = Vec::new();
        douglas_peucker(points, epsilon.max(0.0), &mut out);
        out.dedup();
        return out;
    }

    // split the closed curve at the point farthest from the first one
    let start = points[0];
    let far = points
        .iter()
        .enumerate()
        .max_by(|a, b| {
            let da = ((a.1 .0 - start.0).pow(2) + (a.1 .1 - start.1).pow(2)) as f64;
            let db = ((b.1 .0 - start.0).pow(2) + (b.1 .1 - start.1).pow(2)) as f64;
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0);

    if far == 0 {
        return vec![start];
    }

    let mut first_half = Vec::new();
    douglas_peucker(&points[..=far], epsilon.max(0.0), &mut first_half);

    let mut second = points[far..].to_vec();
    second.push(start);
    let mut second_half = Vec::new();
    douglas_peucker(&second, epsilon.max(0.0), &mut second_half);

    // drop the shared far point and the closing start point
    first_half.pop();
    second_half.pop();
    first_half.extend(second_half);
    first_half.dedup();
    first_half
}

/// The bounding box of a set of points as (x, y, width, height).
pub fn bounding_rect(points: &[(i32, i32)]) -> Option<(i32, i32, u32, u32)> {
    let (&(x0, y0), rest) = points.split_first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (x0, y0, x0, y0);
    for &(x, y) in rest {
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    Some((
        min_x,
        min_y,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvpipe_image::{ImageError, ImageSize};

    fn ring() -> Result<Image<u8, 1>, ImageError> {
        // a 5x5 square with a 1 pixel hole in the middle
        let mut img = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 7,
                height: 7,
            },
            0,
        )?;
        for y in 1..6 {
            for x in 1..6 {
                if (x, y) != (3, 3) {
                    img.set_pixel(x, y, 0, 255)?;
                }
            }
        }
        Ok(img)
    }

    #[test]
    fn find_contours_list_with_hole() -> Result<(), ImageError> {
        let img = ring()?;

        let contours = find_contours(&img, RetrievalMode::List, ContourApproximationMode::None);
        assert_eq!(contours.len(), 2);

        assert!(!contours[0].is_hole);
        assert_eq!(contours[0].parent, None);
        assert_eq!(contours[0].points.len(), 16);
        assert_eq!(bounding_rect(&contours[0].points), Some((1, 1, 5, 5)));

        assert!(contours[1].is_hole);
        assert_eq!(contours[1].parent, Some(0));
        assert_eq!(bounding_rect(&contours[1].points), Some((2, 2, 3, 3)));

        let external = find_contours(
            &img,
            RetrievalMode::External,
            ContourApproximationMode::None,
        );
        assert_eq!(external.len(), 1);
        assert_eq!(external[0], contours[0]);

        Ok(())
    }

    #[test]
    fn find_contours_nested_component() -> Result<(), ImageError> {
        let mut img = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 9,
                height: 9,
            },
            0,
        )?;
        for y in 1..8 {
            for x in 1..8 {
                let on_frame = x == 1 || x == 7 || y == 1 || y == 7;
                if on_frame || (x, y) == (4, 4) {
                    img.set_pixel(x, y, 0, 255)?;
                }
            }
        }

        let all = find_contours(&img, RetrievalMode::List, ContourApproximationMode::Simple);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].points, vec![(4, 4)]);
        assert_eq!(all[2].parent, Some(1));

        let external = find_contours(
            &img,
            RetrievalMode::External,
            ContourApproximationMode::Simple,
        );
        assert_eq!(external.len(), 1);
        assert_eq!(external[0].points, vec![(1, 1), (1, 7), (7, 7), (7, 1)]);

        Ok(())
    }

    #[test]
    fn find_contours_empty() -> Result<(), ImageError> {
        let img = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 1,
                height: 1,
            },
            0,
        )?;
        assert!(find_contours(&img, RetrievalMode::List, ContourApproximationMode::None).is_empty());
        Ok(())
    }

    #[test]
    fn contour_features() {
        let square = [(0, 0), (0, 4), (4, 4), (4, 0)];
        assert_eq!(contour_area(&square), 16.0);
        assert_eq!(arc_length(&square, true), 16.0);
        assert_eq!(arc_length(&square, false), 12.0);

        let m = moments(&square);
        assert_eq!(m.m00, 16.0);
        assert_eq!(m.centroid(), Some((2.0, 2.0)));

        assert_eq!(moments(&[(1, 1), (3, 3)]).centroid(), None);
        assert_eq!(bounding_rect(&[]), None);
    }

    #[test]
    fn approx_poly_dp_square() {
        let mut outline = Vec::new();
        for x in 0..4 {
            outline.push((x, 0));
        }
        for y in 0..4 {
            outline.push((4, y));
        }
        for x in (1..=4).rev() {
            outline.push((x, 4));
        }
        for y in (1..=4).rev() {
            outline.push((0, y));
        }

        let approx = approx_poly_dp(&outline, 0.5, true);
        assert_eq!(approx, vec![(0, 0), (4, 0), (4, 4), (0, 4)]);
    }
}
