use cvpipe_image::{ChannelImage, DynImage, PixelData};
use cvpipe_imgproc::core as arith;

use super::{map_pixels, require_gray_u8, with_dst};
use crate::error::{PipelineError, TransformError};
use crate::registry::TransformRegistry;
use crate::schema::{ParamSpec, Params, TransformSpec};

/// Apply the same expression to two images holding the same kind of samples,
/// tagging the result with the color space of the first one.
macro_rules! zip_pixels {
    ($a:expr, $b:expr, |$x:ident, $y:ident| $body:expr) => {{
        let (a, b): (&DynImage, &DynImage) = ($a, $b);
        let pixels = match (a.pixels(), b.pixels()) {
            (PixelData::U8(ChannelImage::Mono($x)), PixelData::U8(ChannelImage::Mono($y))) => {
                PixelData::U8(ChannelImage::Mono($body))
            }
            (PixelData::U8(ChannelImage::Color($x)), PixelData::U8(ChannelImage::Color($y))) => {
                PixelData::U8(ChannelImage::Color($body))
            }
            (PixelData::F32(ChannelImage::Mono($x)), PixelData::F32(ChannelImage::Mono($y))) => {
                PixelData::F32(ChannelImage::Mono($body))
            }
            (
                PixelData::F32(ChannelImage::Color($x)),
                PixelData::F32(ChannelImage::Color($y)),
            ) => PixelData::F32(ChannelImage::Color($body)),
            _ => {
                return Err(TransformError::UnsupportedInput(format!(
                    "operands differ: {} {} and {} {}",
                    a.color_space(),
                    a.depth(),
                    b.color_space(),
                    b.depth()
                )))
            }
        };
        DynImage::new(pixels, a.color_space())?
    }};
}

pub(crate) fn register(registry: &mut TransformRegistry) -> Result<(), PipelineError> {
    registry.register(
        "add",
        add,
        TransformSpec::new("Per sample sum, saturated for u8").inputs(2, 2),
    )?;

    registry.register(
        "subtract",
        subtract,
        TransformSpec::new("Per sample difference, saturated for u8").inputs(2, 2),
    )?;

    registry.register(
        "add_weighted",
        add_weighted,
        TransformSpec::new("Blend two images as alpha * a + beta * b + gamma")
            .inputs(2, 2)
            .param(ParamSpec::float("alpha", -100.0, 100.0, 0.5))
            .param(ParamSpec::float("beta", -100.0, 100.0, 0.5))
            .param(ParamSpec::float("gamma", -1000.0, 1000.0, 0.0)),
    )?;

    registry.register(
        "bitwise_and",
        bitwise_and,
        TransformSpec::new("Bitwise and of two u8 images, optionally masked").inputs(2, 3),
    )?;

    registry.register(
        "convert_scale_abs",
        convert_scale_abs,
        TransformSpec::new("Scale, shift and take the absolute value into u8")
            .param(ParamSpec::float("alpha", -1000.0, 1000.0, 1.0))
            .param(ParamSpec::float("beta", -1000.0, 1000.0, 0.0)),
    )?;

    registry.register(
        "normalize",
        normalize,
        TransformSpec::new("Stretch the samples linearly onto [min, max]")
            .param(ParamSpec::float("min", -1e6, 1e6, 0.0))
            .param(ParamSpec::float("max", -1e6, 1e6, 255.0)),
    )?;

    Ok(())
}

fn add(inputs: &[&DynImage], _params: &Params) -> Result<DynImage, TransformError> {
    Ok(zip_pixels!(inputs[0], inputs[1], |a, b| with_dst(a.size(), |dst| {
        arith::add(a, b, dst)
    })?))
}

fn subtract(inputs: &[&DynImage], _params: &Params) -> Result<DynImage, TransformError> {
    Ok(zip_pixels!(inputs[0], inputs[1], |a, b| with_dst(a.size(), |dst| {
        arith::subtract(a, b, dst)
    })?))
}

fn add_weighted(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let alpha = params.float("alpha")?;
    let beta = params.float("beta")?;
    let gamma = params.float("gamma")?;

    Ok(zip_pixels!(inputs[0], inputs[1], |a, b| with_dst(a.size(), |dst| {
        arith::add_weighted(a, alpha, b, beta, gamma, dst)
    })?))
}

fn bitwise_and(inputs: &[&DynImage], _params: &Params) -> Result<DynImage, TransformError> {
    let mask = match inputs.get(2) {
        Some(mask) => Some(require_gray_u8(mask, "the bitwise_and mask")?),
        None => None,
    };

    let (a, b) = (inputs[0], inputs[1]);
    let pixels = match (a.pixels(), b.pixels()) {
        (PixelData::U8(ChannelImage::Mono(x)), PixelData::U8(ChannelImage::Mono(y))) => {
            PixelData::U8(ChannelImage::Mono(with_dst(x.size(), |dst| {
                arith::bitwise_and(x, y, dst, mask)
            })?))
        }
        (PixelData::U8(ChannelImage::Color(x)), PixelData::U8(ChannelImage::Color(y))) => {
            PixelData::U8(ChannelImage::Color(with_dst(x.size(), |dst| {
                arith::bitwise_and(x, y, dst, mask)
            })?))
        }
        _ => {
            return Err(TransformError::UnsupportedInput(
                "bitwise_and takes two u8 images with the same channels".to_string(),
            ))
        }
    };

    Ok(DynImage::new(pixels, a.color_space())?)
}

fn convert_scale_abs(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let alpha = params.float("alpha")?;
    let beta = params.float("beta")?;

    let image = inputs[0];
    let pixels = match image.pixels() {
        PixelData::U8(ChannelImage::Mono(src)) => ChannelImage::Mono(with_dst(src.size(), |dst| {
            arith::convert_scale_abs(src, dst, alpha, beta)
        })?),
        PixelData::U8(ChannelImage::Color(src)) => {
            ChannelImage::Color(with_dst(src.size(), |dst| {
                arith::convert_scale_abs(src, dst, alpha, beta)
            })?)
        }
        PixelData::F32(ChannelImage::Mono(src)) => {
            ChannelImage::Mono(with_dst(src.size(), |dst| {
                arith::convert_scale_abs(src, dst, alpha, beta)
            })?)
        }
        PixelData::F32(ChannelImage::Color(src)) => {
            ChannelImage::Color(with_dst(src.size(), |dst| {
                arith::convert_scale_abs(src, dst, alpha, beta)
            })?)
        }
    };

    Ok(DynImage::from_u8(pixels, image.color_space())?)
}

fn normalize(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let min = params.float("min")?;
    let max = params.float("max")?;
    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        arith::normalize_min_max(src, dst, min, max)
    })?))
}
