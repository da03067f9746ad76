use cvpipe_image::{DynImage, ImageSize};
use cvpipe_imgproc::interpolation::InterpolationMode;
use cvpipe_imgproc::{crop, flip, pyramid, resize, warp};

use super::{interpolation_mode, map_pixels, with_dst, INTERPOLATIONS};
use crate::error::{PipelineError, TransformError};
use crate::registry::TransformRegistry;
use crate::schema::{ParamSpec, Params, TransformSpec};

const MAX_SIDE: i64 = 16384;
const MAX_COORD: f64 = 1e5;

// the three point pairs of the classic affine demo
const AFFINE_SRC: [f64; 6] = [50.0, 50.0, 200.0, 50.0, 50.0, 200.0];
const AFFINE_DST: [f64; 6] = [10.0, 100.0, 200.0, 50.0, 100.0, 250.0];

// a skewed sheet flattened to a 300x300 square
const PERSPECTIVE_SRC: [f64; 8] = [56.0, 65.0, 368.0, 52.0, 28.0, 387.0, 389.0, 390.0];
const PERSPECTIVE_DST: [f64; 8] = [0.0, 0.0, 300.0, 0.0, 0.0, 300.0, 300.0, 300.0];

fn output_size_params(spec: TransformSpec, default: (i64, i64)) -> TransformSpec {
    spec.param(ParamSpec::int("width", 0, MAX_SIDE, default.0))
        .param(ParamSpec::int("height", 0, MAX_SIDE, default.1))
}

pub(crate) fn register(registry: &mut TransformRegistry) -> Result<(), PipelineError> {
    registry.register(
        "resize",
        resize,
        TransformSpec::new("Resize by a factor or to an explicit size")
            .param(ParamSpec::float("fx", 0.01, 16.0, 1.0))
            .param(ParamSpec::float("fy", 0.01, 16.0, 1.0))
            .param(ParamSpec::int("width", 0, MAX_SIDE, 0))
            .param(ParamSpec::int("height", 0, MAX_SIDE, 0))
            .param(ParamSpec::choice(
                "mode",
                &["nearest", "linear", "cubic", "area"],
                "linear",
            )),
    )?;

    registry.register(
        "crop",
        crop,
        TransformSpec::new("Cut a rectangular region")
            .param(ParamSpec::int("x", 0, MAX_SIDE, 0))
            .param(ParamSpec::int("y", 0, MAX_SIDE, 0))
            .param(ParamSpec::int("width", 1, MAX_SIDE, 1))
            .param(ParamSpec::int("height", 1, MAX_SIDE, 1)),
    )?;

    registry.register(
        "flip",
        flip,
        TransformSpec::new("Mirror around the vertical axis, the horizontal axis or both")
            .param(ParamSpec::choice(
                "axis",
                &["horizontal", "vertical", "both"],
                "horizontal",
            )),
    )?;

    registry.register(
        "rotate",
        rotate,
        TransformSpec::new("Rotate about the image center keeping the size")
            .param(ParamSpec::float("angle", -360.0, 360.0, 90.0))
            .param(ParamSpec::float("scale", 0.01, 16.0, 1.0))
            .param(ParamSpec::choice("interpolation", INTERPOLATIONS, "linear")),
    )?;

    registry.register(
        "translate",
        translate,
        TransformSpec::new("Shift the image content")
            .param(ParamSpec::float("tx", -MAX_COORD, MAX_COORD, 0.0))
            .param(ParamSpec::float("ty", -MAX_COORD, MAX_COORD, 0.0)),
    )?;

    registry.register(
        "warp_affine",
        warp_affine,
        output_size_params(
            TransformSpec::new("Apply a 2x3 affine matrix").param(ParamSpec::vector(
                "matrix",
                -MAX_COORD,
                MAX_COORD,
                &[1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            )),
            (0, 0),
        )
        .param(ParamSpec::choice("interpolation", INTERPOLATIONS, "linear")),
    )?;

    registry.register(
        "warp_affine_points",
        warp_affine_points,
        output_size_params(
            TransformSpec::new("Apply the affine transform mapping three points onto three others")
                .param(ParamSpec::vector("src", -MAX_COORD, MAX_COORD, &AFFINE_SRC))
                .param(ParamSpec::vector("dst", -MAX_COORD, MAX_COORD, &AFFINE_DST)),
            (0, 0),
        )
        .param(ParamSpec::choice("interpolation", INTERPOLATIONS, "linear")),
    )?;

    registry.register(
        "warp_perspective",
        warp_perspective,
        output_size_params(
            TransformSpec::new("Apply the homography mapping four points onto four others")
                .param(ParamSpec::vector("src", -MAX_COORD, MAX_COORD, &PERSPECTIVE_SRC))
                .param(ParamSpec::vector("dst", -MAX_COORD, MAX_COORD, &PERSPECTIVE_DST)),
            (300, 300),
        )
        .param(ParamSpec::choice("interpolation", INTERPOLATIONS, "linear")),
    )?;

    registry.register(
        "pyr_down",
        pyr_down,
        TransformSpec::new("Blur and halve the image").min_size(2, 2),
    )?;

    registry.register(
        "pyr_up",
        pyr_up,
        output_size_params(TransformSpec::new("Upsample and blur the image"), (0, 0)),
    )?;

    Ok(())
}

// an explicit side wins over the input side
fn output_size(params: &Params, fallback: ImageSize) -> Result<ImageSize, TransformError> {
    let width = params.usize("width")?;
    let height = params.usize("height")?;
    Ok(ImageSize {
        width: if width > 0 { width } else { fallback.width },
        height: if height > 0 { height } else { fallback.height },
    })
}

// derived sizes obey the same bound as explicit ones
fn check_side_limit(size: ImageSize) -> Result<ImageSize, TransformError> {
    let max = MAX_SIDE as usize;
    if size.width > max || size.height > max {
        return Err(TransformError::InvalidArgument(format!(
            "output size {size} exceeds {max}x{max}"
        )));
    }
    Ok(size)
}

fn resize(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let fx = params.float("fx")?;
    let fy = params.float("fy")?;

    let scaled = ImageSize {
        width: ((image.width() as f32 * fx).round() as usize).max(1),
        height: ((image.height() as f32 * fy).round() as usize).max(1),
    };
    let size = check_side_limit(output_size(params, scaled)?)?;

    let mode = params.choice("mode")?;
    if mode == "area" {
        return Ok(map_pixels!(image, |src| with_dst(size, |dst| {
            resize::resize_area(src, dst)
        })?));
    }

    let interpolation = interpolation_mode(mode)?;
    Ok(map_pixels!(image, |src| with_dst(size, |dst| {
        resize::resize_native(src, dst, interpolation)
    })?))
}

fn crop(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let x = params.usize("x")?;
    let y = params.usize("y")?;
    let size = ImageSize {
        width: params.usize("width")?,
        height: params.usize("height")?,
    };

    Ok(map_pixels!(inputs[0], |src| with_dst(size, |dst| {
        crop::crop_image(src, dst, x, y)
    })?))
}

fn flip(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let size = image.size();

    match params.choice("axis")? {
        "horizontal" => Ok(map_pixels!(image, |src| with_dst(size, |dst| {
            flip::horizontal_flip(src, dst)
        })?)),
        "vertical" => Ok(map_pixels!(image, |src| with_dst(size, |dst| {
            flip::vertical_flip(src, dst)
        })?)),
        _ => Ok(map_pixels!(image, |src| {
            let mirrored = with_dst(size, |dst| flip::horizontal_flip(src, dst))?;
            with_dst(size, |dst| flip::vertical_flip(&mirrored, dst))?
        })),
    }
}

fn apply_affine(
    image: &DynImage,
    m: &[f32; 6],
    size: ImageSize,
    interpolation: InterpolationMode,
) -> Result<DynImage, TransformError> {
    Ok(map_pixels!(image, |src| with_dst(size, |dst| {
        warp::warp_affine(src, dst, m, interpolation)
    })?))
}

fn rotate(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let center = (
        (image.width() as f32 - 1.0) / 2.0,
        (image.height() as f32 - 1.0) / 2.0,
    );
    let m = warp::get_rotation_matrix2d(center, params.float("angle")?, params.float("scale")?);
    let interpolation = interpolation_mode(params.choice("interpolation")?)?;

    apply_affine(image, &m, image.size(), interpolation)
}

fn translate(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let m = [1.0, 0.0, params.float("tx")?, 0.0, 1.0, params.float("ty")?];
    apply_affine(image, &m, image.size(), InterpolationMode::Bilinear)
}

fn warp_affine(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let m = params.vector::<6>("matrix")?;
    let size = output_size(params, image.size())?;
    let interpolation = interpolation_mode(params.choice("interpolation")?)?;

    apply_affine(image, &m, size, interpolation)
}

fn warp_affine_points(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let m = warp::get_affine_transform(&params.points::<3>("src")?, &params.points::<3>("dst")?)?;
    let size = output_size(params, image.size())?;
    let interpolation = interpolation_mode(params.choice("interpolation")?)?;

    apply_affine(image, &m, size, interpolation)
}

fn warp_perspective(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let m = warp::get_perspective_transform(
        &params.points::<4>("src")?,
        &params.points::<4>("dst")?,
    )?;
    let size = output_size(params, image.size())?;
    let interpolation = interpolation_mode(params.choice("interpolation")?)?;

    Ok(map_pixels!(image, |src| with_dst(size, |dst| {
        warp::warp_perspective(src, dst, &m, interpolation)
    })?))
}

fn pyr_down(inputs: &[&DynImage], _params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    if image.width() < 2 || image.height() < 2 {
        return Err(TransformError::ImageTooSmall(
            image.width(),
            image.height(),
            2,
            2,
        ));
    }

    let size = pyramid::pyrdown_size(image.size());
    Ok(map_pixels!(image, |src| with_dst(size, |dst| {
        pyramid::pyrdown(src, dst)
    })?))
}

fn pyr_up(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let doubled = ImageSize {
        width: image.width() * 2,
        height: image.height() * 2,
    };
    let size = check_side_limit(output_size(params, doubled)?)?;

    Ok(map_pixels!(image, |src| with_dst(size, |dst| {
        pyramid::pyrup(src, dst)
    })?))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::testing::{gray, run};
    use super::*;

    #[test]
    fn resize_by_factor_and_size() -> Result<(), TransformError> {
        let image = gray(4, 3, (0..12).collect());

        let up = run(
            "resize",
            &[&image],
            &[("fx", json!(2)), ("fy", json!(2)), ("mode", json!("cubic"))],
        )?;
        assert_eq!((up.width(), up.height()), (8, 6));

        let fixed = run(
            "resize",
            &[&image],
            &[("width", json!(5)), ("mode", json!("area"))],
        )?;
        assert_eq!((fixed.width(), fixed.height()), (5, 3));

        Ok(())
    }

    #[test]
    fn derived_sizes_are_bounded() -> Result<(), TransformError> {
        let wide = gray(2000, 1, vec![7; 2000]);

        let res = run("resize", &[&wide], &[("fx", json!(16))]);
        assert!(matches!(res, Err(TransformError::InvalidArgument(_))));

        // an explicit side replaces the scaled one
        let narrow = run("resize", &[&wide], &[("fx", json!(16)), ("width", json!(100))])?;
        assert_eq!((narrow.width(), narrow.height()), (100, 1));

        let wider = gray(8193, 1, vec![7; 8193]);
        let res = run("pyr_up", &[&wider], &[]);
        assert!(matches!(res, Err(TransformError::InvalidArgument(_))));

        Ok(())
    }

    #[test]
    fn crop_and_flip() -> Result<(), TransformError> {
        let image = gray(3, 2, vec![0, 1, 2, 3, 4, 5]);

        let cropped = run(
            "crop",
            &[&image],
            &[
                ("x", json!(1)),
                ("y", json!(0)),
                ("width", json!(2)),
                ("height", json!(2)),
            ],
        )?;
        assert_eq!(cropped.to_u8()?.as_slice(), &[1, 2, 4, 5]);

        assert!(run("crop", &[&image], &[("x", json!(2)), ("width", json!(2))]).is_err());

        let mirrored = run("flip", &[&image], &[])?;
        assert_eq!(mirrored.to_u8()?.as_slice(), &[2, 1, 0, 5, 4, 3]);

        let both = run("flip", &[&image], &[("axis", json!("both"))])?;
        assert_eq!(both.to_u8()?.as_slice(), &[5, 4, 3, 2, 1, 0]);

        Ok(())
    }

    #[test]
    fn rotate_keeps_size() -> Result<(), TransformError> {
        let image = gray(5, 3, vec![10; 15]);
        let rotated = run("rotate", &[&image], &[("angle", json!(0))])?;
        assert_eq!(rotated, image);

        let quarter = run("rotate", &[&image], &[])?;
        assert_eq!(quarter.size(), image.size());

        let shifted = run(
            "translate",
            &[&image],
            &[("tx", json!(2)), ("ty", json!(0))],
        )?;
        assert_eq!(shifted.to_u8()?.as_slice()[..2], [0, 0]);
        assert_eq!(shifted.to_u8()?.as_slice()[2], 10);

        Ok(())
    }

    #[test]
    fn pyramids() -> Result<(), TransformError> {
        let image = gray(5, 3, vec![10; 15]);

        let down = run("pyr_down", &[&image], &[])?;
        assert_eq!((down.width(), down.height()), (3, 2));

        let up = run("pyr_up", &[&down], &[])?;
        assert_eq!((up.width(), up.height()), (6, 4));

        let tiny = gray(1, 1, vec![0]);
        assert!(matches!(
            run("pyr_down", &[&tiny], &[]),
            Err(TransformError::ImageTooSmall(1, 1, 2, 2))
        ));

        Ok(())
    }

    #[test]
    fn warps_with_default_points() -> Result<(), TransformError> {
        let image = gray(8, 8, vec![50; 64]);

        let affine = run("warp_affine_points", &[&image], &[])?;
        assert_eq!(affine.size(), image.size());

        let perspective = run("warp_perspective", &[&image], &[])?;
        assert_eq!((perspective.width(), perspective.height()), (300, 300));

        let singular = run(
            "warp_affine",
            &[&image],
            &[("matrix", json!([0, 0, 0, 0, 0, 0]))],
        );
        assert!(singular.is_err());

        Ok(())
    }
}
