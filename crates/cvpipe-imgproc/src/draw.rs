use cvpipe_image::Image;

/// Set a pixel's color, ignoring coordinates outside of the image.
#[inline]
fn set_pixel<T: Copy, const C: usize>(img: &mut Image<T, C>, x: i64, y: i64, color: [T; C]) {
    if x >= 0 && x < img.cols() as i64 && y >= 0 && y < img.rows() as i64 {
        img.pixel_mut(x as usize, y as usize).copy_from_slice(&color);
    }
}

/// Draws a line on an image inplace using a standard Bresenham's line algorithm.
///
/// Pixels of the line that fall outside of the image are skipped, so the end
/// points may lie anywhere.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `p0` - The start point of the line as a tuple of (x, y).
/// * `p1` - The end point of the line as a tuple of (x, y).
/// * `color` - The color of the line as an array of `C` elements.
/// * `thickness` - The thickness of the line. Thicker lines stamp a square at every point.
///
/// # Example
///
/// ```
/// use cvpipe_image::{Image, ImageSize};
/// use cvpipe_imgproc::draw::draw_line;
///
/// let mut img = Image::<u8, 1>::from_size_val(ImageSize { width: 3, height: 3 }, 0).unwrap();
/// draw_line(&mut img, (0, 0), (2, 2), [255], 1);
/// assert_eq!(img.as_slice(), &[255, 0, 0, 0, 255, 0, 0, 0, 255]);
/// ```
pub fn draw_line<T: Copy, const C: usize>(
    img: &mut Image<T, C>,
    p0: (i64, i64),
    p1: (i64, i64),
    color: [T; C],
    thickness: usize,
) {
    let (mut x0, mut y0) = p0;
    let (x1, y1) = p1;

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };

    let mut err = dx - dy;

    let half_thickness = thickness.max(1) as i64 / 2;

    loop {
        if half_thickness == 0 {
            set_pixel(img, x0, y0, color);
        } else {
            for i in -half_thickness..=half_thickness {
                for j in -half_thickness..=half_thickness {
                    set_pixel(img, x0 + i, y0 + j, color);
                }
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Draws a polyline on an image inplace.
///
/// # Arguments
///
/// * `img` - The image to draw on.
/// * `points` - The vertices of the polyline as (x, y).
/// * `closed` - Whether to connect the last vertex back to the first.
/// * `color` - The color of the lines.
/// * `thickness` - The thickness of the lines.
pub fn draw_polyline<T: Copy, const C: usize>(
    img: &mut Image<T, C>,
    points: &[(i64, i64)],
    closed: bool,
    color: [T; C],
    thickness: usize,
) {
    match points {
        [] => {}
        [p] => draw_line(img, *p, *p, color, thickness),
        _ => {
            for pair in points.windows(2) {
                draw_line(img, pair[0], pair[1], color, thickness);
            }
            if closed {
                if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                    draw_line(img, last, first, color, thickness);
                }
            }
        }
    }
}
