use cvpipe_image::{ChannelImage, ColorSpace, DynImage, Image, ImageError, ImageSize};
use cvpipe_imgproc::contours::{self, ContourApproximationMode, RetrievalMode};
use cvpipe_imgproc::{draw, edges, hough};

use super::{color3, require_gray, with_dst, GrayView};
use crate::error::{PipelineError, TransformError};
use crate::registry::TransformRegistry;
use crate::schema::{ParamSpec, Params, TransformSpec};

fn drawing_params(spec: TransformSpec, color: [f64; 3]) -> TransformSpec {
    spec.param(ParamSpec::vector("color", 0.0, 255.0, &color))
        .param(ParamSpec::int("thickness", 1, 32, 1))
}

pub(crate) fn register(registry: &mut TransformRegistry) -> Result<(), PipelineError> {
    registry.register(
        "canny",
        canny,
        TransformSpec::new("Detect edges with hysteresis thresholding")
            .param(ParamSpec::float("low", 0.0, 10000.0, 100.0))
            .param(ParamSpec::float("high", 0.0, 10000.0, 200.0))
            .param(ParamSpec::int("aperture", 3, 5, 3).odd())
            .param(ParamSpec::bool("l2_gradient", false)),
    )?;

    registry.register(
        "hough_lines",
        hough_lines,
        drawing_params(
            TransformSpec::new("Detect straight lines in an edge image and draw them")
                .inputs(1, 2)
                .param(ParamSpec::float("rho", 0.1, 100.0, 1.0))
                .param(ParamSpec::float("theta", 0.01, 180.0, 1.0))
                .param(ParamSpec::int("threshold", 1, 1_000_000, 110)),
            [255.0, 0.0, 0.0],
        ),
    )?;

    registry.register(
        "hough_lines_p",
        hough_lines_p,
        drawing_params(
            TransformSpec::new("Detect line segments in an edge image and draw them")
                .inputs(1, 2)
                .param(ParamSpec::float("rho", 0.1, 100.0, 1.0))
                .param(ParamSpec::float("theta", 0.01, 180.0, 1.0))
                .param(ParamSpec::int("threshold", 1, 1_000_000, 80))
                .param(ParamSpec::float("min_line_length", 0.0, 100_000.0, 50.0))
                .param(ParamSpec::int("max_line_gap", 0, 100_000, 10)),
            [0.0, 255.0, 0.0],
        ),
    )?;

    registry.register(
        "find_contours",
        find_contours,
        drawing_params(
            TransformSpec::new("Trace the borders of a binary image and draw them")
                .inputs(1, 2)
                .param(ParamSpec::choice("mode", &["external", "list"], "list"))
                .param(ParamSpec::choice("approx", &["none", "simple"], "simple"))
                .param(ParamSpec::float("epsilon", 0.0, 1.0, 0.0)),
            [0.0, 255.0, 0.0],
        ),
    )?;

    Ok(())
}

fn canny(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let low = params.float("low")?;
    let high = params.float("high")?;
    let aperture = params.usize("aperture")?;
    let l2_gradient = params.bool("l2_gradient")?;

    let image = inputs[0];
    let dst = match require_gray(image, "canny")? {
        GrayView::U8(src) => with_dst(src.size(), |dst| {
            edges::canny(src, dst, low, high, aperture, l2_gradient)
        })?,
        GrayView::F32(src) => with_dst(src.size(), |dst| {
            edges::canny(src, dst, low, high, aperture, l2_gradient)
        })?,
    };

    Ok(DynImage::gray_u8(dst))
}

/// The image detections are drawn on: a copy of the second input or a black RGB image.
fn canvas(
    inputs: &[&DynImage],
    size: ImageSize,
) -> Result<(ChannelImage<u8>, ColorSpace), TransformError> {
    match inputs.get(1) {
        Some(canvas) => {
            if canvas.size() != size {
                return Err(ImageError::InvalidImageSize(
                    size.width,
                    size.height,
                    canvas.width(),
                    canvas.height(),
                )
                .into());
            }
            Ok((canvas.to_u8()?, canvas.color_space()))
        }
        None => Ok((
            ChannelImage::Color(Image::from_size_val(size, 0)?),
            ColorSpace::Rgb,
        )),
    }
}

// the color is given in the channel order of the canvas, gray canvases use its first entry
fn paint(
    canvas: &mut ChannelImage<u8>,
    polylines: &[Vec<(i64, i64)>],
    closed: bool,
    color: [u8; 3],
    thickness: usize,
) {
    for points in polylines {
        match canvas {
            ChannelImage::Mono(img) => {
                draw::draw_polyline(img, points, closed, [color[0]], thickness)
            }
            ChannelImage::Color(img) => draw::draw_polyline(img, points, closed, color, thickness),
        }
    }
}

fn finish_drawing(
    inputs: &[&DynImage],
    size: ImageSize,
    params: &Params,
    polylines: &[Vec<(i64, i64)>],
    closed: bool,
) -> Result<DynImage, TransformError> {
    let (mut canvas, color_space) = canvas(inputs, size)?;
    let color = color3(params.vector::<3>("color")?);
    let thickness = params.usize("thickness")?;

    paint(&mut canvas, polylines, closed, color, thickness);

    Ok(DynImage::from_u8(canvas, color_space)?)
}

fn hough_lines(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let rho = params.float("rho")?;
    let theta = params.float("theta")?.to_radians();
    let threshold = params.int("threshold")? as u32;

    let image = inputs[0];
    let lines = match require_gray(image, "hough_lines")? {
        GrayView::U8(src) => hough::hough_lines(src, rho, theta, threshold)?,
        GrayView::F32(src) => hough::hough_lines(src, rho, theta, threshold)?,
    };
    log::debug!("hough_lines: {} lines", lines.len());

    // long enough to cross the whole image from any point on it
    let extent = (image.width() as f32).hypot(image.height() as f32);
    let polylines = lines
        .iter()
        .map(|line| {
            let (p0, p1) = line.endpoints(extent);
            vec![p0, p1]
        })
        .collect::<Vec<_>>();

    finish_drawing(inputs, image.size(), params, &polylines, false)
}

fn hough_lines_p(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let rho = params.float("rho")?;
    let theta = params.float("theta")?.to_radians();
    let threshold = params.int("threshold")? as u32;
    let min_line_length = params.float("min_line_length")?;
    let max_line_gap = params.usize("max_line_gap")?;

    let image = inputs[0];
    let segments = match require_gray(image, "hough_lines_p")? {
        GrayView::U8(src) => {
            hough::hough_lines_p(src, rho, theta, threshold, min_line_length, max_line_gap)?
        }
        GrayView::F32(src) => {
            hough::hough_lines_p(src, rho, theta, threshold, min_line_length, max_line_gap)?
        }
    };
    log::debug!("hough_lines_p: {} segments", segments.len());

    let polylines = segments
        .iter()
        .map(|segment| vec![segment.start, segment.end])
        .collect::<Vec<_>>();

    finish_drawing(inputs, image.size(), params, &polylines, false)
}

fn find_contours(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let mode = match params.choice("mode")? {
        "external" => RetrievalMode::External,
        _ => RetrievalMode::List,
    };
    let approximation = match params.choice("approx")? {
        "none" => ContourApproximationMode::None,
        _ => ContourApproximationMode::Simple,
    };
    let epsilon = params.float("epsilon")? as f64;

    let image = inputs[0];
    let found = match require_gray(image, "find_contours")? {
        GrayView::U8(src) => contours::find_contours(src, mode, approximation),
        GrayView::F32(src) => contours::find_contours(src, mode, approximation),
    };

    let mut polylines = Vec::with_capacity(found.len());
    for (i, contour) in found.iter().enumerate() {
        let perimeter = contours::arc_length(&contour.points, true);
        let area = contours::contour_area(&contour.points);
        match contours::moments(&contour.points).centroid() {
            Some((cx, cy)) => log::info!(
                "contour {i}: area {area:.1}, perimeter {perimeter:.1}, centroid ({cx:.1}, {cy:.1})"
            ),
            None => log::info!("contour {i}: area {area:.1}, perimeter {perimeter:.1}"),
        }

        let points = if epsilon > 0.0 {
            contours::approx_poly_dp(&contour.points, epsilon * perimeter, true)
        } else {
            contour.points.clone()
        };
        polylines.push(
            points
                .into_iter()
                .map(|(x, y)| (x as i64, y as i64))
                .collect::<Vec<_>>(),
        );
    }

    finish_drawing(inputs, image.size(), params, &polylines, true)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testing::{gray, rgb, run};
    use super::*;

    fn square(size: usize, lo: usize, hi: usize) -> DynImage {
        let data = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if (lo..=hi).contains(&x) && (lo..=hi).contains(&y) {
                    255
                } else {
                    0
                }
            })
            .collect();
        gray(size, size, data)
    }

    #[test]
    fn canny_outputs_binary_u8() -> Result<(), TransformError> {
        let edges = run("canny", &[&square(12, 3, 8)], &[])?;
        let samples = edges.to_u8()?;
        assert!(samples.as_slice().iter().all(|&v| v == 0 || v == 255));
        assert!(samples.as_slice().contains(&255));

        assert!(run("canny", &[&rgb(1, 1, vec![0, 0, 0])], &[]).is_err());
        Ok(())
    }

    #[test]
    fn hough_draws_on_the_canvas() -> Result<(), TransformError> {
        let mut data = vec![0u8; 20 * 20];
        data[10 * 20..11 * 20].iter_mut().for_each(|v| *v = 255);
        let line = gray(20, 20, data);

        let drawn = run("hough_lines", &[&line], &[("threshold", json!(15))])?;
        assert_eq!(drawn.color_space(), ColorSpace::Rgb);
        let samples = drawn.to_u8()?;
        // the red line covers the detected row
        assert_eq!(&samples.as_slice()[(10 * 20 + 5) * 3..][..3], &[255, 0, 0]);

        let canvas = gray(20, 20, vec![0; 400]);
        let drawn = run(
            "hough_lines_p",
            &[&line, &canvas],
            &[("threshold", json!(15)), ("min_line_length", json!(10))],
        )?;
        assert_eq!(drawn.color_space(), ColorSpace::Gray);
        assert_eq!(drawn.to_u8()?.as_slice()[10 * 20 + 5], 0);

        let drawn = run(
            "hough_lines_p",
            &[&line, &canvas],
            &[
                ("threshold", json!(15)),
                ("min_line_length", json!(10)),
                ("color", json!([200, 0, 0])),
            ],
        )?;
        assert_eq!(drawn.to_u8()?.as_slice()[10 * 20 + 5], 200);

        Ok(())
    }

    #[test]
    fn contours_are_drawn() -> Result<(), TransformError> {
        let drawn = run("find_contours", &[&square(10, 2, 6)], &[])?;
        let samples = drawn.to_u8()?;
        // the border of the square is green, its inside stays black
        assert_eq!(&samples.as_slice()[(2 * 10 + 2) * 3..][..3], &[0, 255, 0]);
        assert_eq!(&samples.as_slice()[(4 * 10 + 4) * 3..][..3], &[0, 0, 0]);

        let canvas = gray(3, 3, vec![0; 9]);
        let mismatched = run("find_contours", &[&square(10, 2, 6), &canvas], &[]);
        assert!(mismatched.is_err());

        Ok(())
    }
}
