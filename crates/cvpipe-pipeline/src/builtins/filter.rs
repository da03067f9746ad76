use cvpipe_image::{ChannelImage, ColorSpace, DynImage, PixelData};
use cvpipe_imgproc::filter;

use super::{map_pixels, with_dst};
use crate::error::{PipelineError, TransformError};
use crate::registry::TransformRegistry;
use crate::schema::{ParamSpec, Params, TransformSpec};

pub(crate) fn register(registry: &mut TransformRegistry) -> Result<(), PipelineError> {
    registry.register(
        "blur",
        blur,
        TransformSpec::new("Average over a box neighborhood")
            .param(ParamSpec::size("ksize", 1, 255, (3, 3))),
    )?;

    registry.register(
        "gaussian_blur",
        gaussian_blur,
        TransformSpec::new("Smooth with a Gaussian kernel")
            .param(ParamSpec::size("ksize", 1, 255, (5, 5)).odd())
            .param(ParamSpec::float("sigma", 0.0, 100.0, 0.0)),
    )?;

    registry.register(
        "median_blur",
        median_blur,
        TransformSpec::new("Replace every sample by the median of its neighborhood")
            .param(ParamSpec::int("ksize", 3, 15, 5).odd()),
    )?;

    registry.register(
        "bilateral_filter",
        bilateral_filter,
        TransformSpec::new("Smooth while preserving edges")
            .param(ParamSpec::int("diameter", 1, 31, 9))
            .param(ParamSpec::float("sigma_color", 0.0, 1000.0, 24.0))
            .param(ParamSpec::float("sigma_space", 0.0, 1000.0, 35.0)),
    )?;

    registry.register(
        "filter2d",
        filter2d,
        TransformSpec::new("Correlate with a constant kernel")
            .param(ParamSpec::size("ksize", 1, 64, (4, 4)))
            .param(ParamSpec::float("scale", -100.0, 100.0, 0.04)),
    )?;

    registry.register(
        "sobel",
        sobel,
        TransformSpec::new("Image derivative with a Sobel operator, as f32")
            .param(ParamSpec::int("dx", 0, 2, 1))
            .param(ParamSpec::int("dy", 0, 2, 0))
            .param(ParamSpec::int("ksize", 1, 5, 3).odd()),
    )?;

    registry.register(
        "laplacian",
        laplacian,
        TransformSpec::new("Sum of the second derivatives, as f32")
            .param(ParamSpec::int("ksize", 1, 5, 1).odd()),
    )?;

    Ok(())
}

fn blur(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let ksize = params.size("ksize")?;
    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        filter::box_blur(src, dst, ksize)
    })?))
}

fn gaussian_blur(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let ksize = params.size("ksize")?;
    let sigma = params.float("sigma")?;
    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        filter::gaussian_blur(src, dst, ksize, (sigma, sigma))
    })?))
}

fn median_blur(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let ksize = params.usize("ksize")?;
    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        filter::median_blur(src, dst, ksize)
    })?))
}

fn bilateral_filter(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let diameter = params.usize("diameter")?;
    let sigma_color = params.float("sigma_color")?;
    let sigma_space = params.float("sigma_space")?;
    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        filter::bilateral_filter(src, dst, diameter, sigma_color, sigma_space)
    })?))
}

fn filter2d(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let (kw, kh) = params.size("ksize")?;
    let kernel = vec![params.float("scale")?; kw * kh];
    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        filter::filter2d(src, dst, &kernel, (kw, kh))
    })?))
}

// derivatives are signed, so they are always computed on floats
fn float_derivative(
    image: &DynImage,
    op: impl Fn(&ChannelImage<f32>) -> Result<ChannelImage<f32>, TransformError>,
) -> Result<DynImage, TransformError> {
    let derivative = op(&image.to_f32()?)?;
    let color = match image.color_space() {
        // a derivative of HSV samples is no longer HSV
        ColorSpace::Hsv => ColorSpace::Rgb,
        other => other,
    };
    Ok(DynImage::new(PixelData::F32(derivative), color)?)
}

fn sobel(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let dx = params.usize("dx")?;
    let dy = params.usize("dy")?;
    let ksize = params.usize("ksize")?;

    if dx + dy == 0 {
        return Err(TransformError::InvalidArgument(
            "sobel needs dx + dy > 0".to_string(),
        ));
    }

    float_derivative(inputs[0], |src| {
        Ok(match src {
            ChannelImage::Mono(src) => ChannelImage::Mono(with_dst(src.size(), |dst| {
                filter::sobel(src, dst, dx, dy, ksize)
            })?),
            ChannelImage::Color(src) => ChannelImage::Color(with_dst(src.size(), |dst| {
                filter::sobel(src, dst, dx, dy, ksize)
            })?),
        })
    })
}

fn laplacian(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let ksize = params.usize("ksize")?;

    float_derivative(inputs[0], |src| {
        Ok(match src {
            ChannelImage::Mono(src) => ChannelImage::Mono(with_dst(src.size(), |dst| {
                filter::laplacian(src, dst, ksize)
            })?),
            ChannelImage::Color(src) => ChannelImage::Color(with_dst(src.size(), |dst| {
                filter::laplacian(src, dst, ksize)
            })?),
        })
    })
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use cvpipe_image::Depth;
    use serde_json::json;

    use super::super::testing::{gray, run};
    use super::*;

    #[test]
    fn smoothing_keeps_flat_images() -> Result<(), TransformError> {
        let image = gray(6, 5, vec![80; 30]);

        for name in ["blur", "gaussian_blur", "median_blur", "bilateral_filter"] {
            let out = run(name, &[&image], &[])?;
            assert_eq!(out, image, "{name}");
        }

        let spread = run("filter2d", &[&image], &[("ksize", json!([5, 5]))])?;
        assert_eq!(spread.to_u8()?.as_slice()[0], 80);

        Ok(())
    }

    #[test]
    fn derivatives_are_float() -> Result<(), TransformError> {
        let ramp = gray(5, 3, (0..15).map(|i| (i % 5) as u8 * 10).collect());

        let gx = run("sobel", &[&ramp], &[])?;
        assert_eq!(gx.depth(), Depth::F32);
        let gx = gx.to_f32()?;
        assert_relative_eq!(gx.as_slice()[5 + 2], 80.0);

        let gy = run("sobel", &[&ramp], &[("dx", json!(0)), ("dy", json!(1))])?;
        assert_relative_eq!(gy.to_f32()?.as_slice()[5 + 2], 0.0);

        assert!(matches!(
            run("sobel", &[&ramp], &[("dx", json!(0))]),
            Err(TransformError::InvalidArgument(_))
        ));

        let lap = run("laplacian", &[&ramp], &[])?;
        assert_relative_eq!(lap.to_f32()?.as_slice()[5 + 2], 0.0);

        Ok(())
    }
}
