use cvpipe_image::{ChannelImage, DynImage, ImageDtype, PixelData};
use cvpipe_imgproc::threshold::{self, AdaptiveMethod, ThresholdType};

use super::{map_pixels, require_gray_u8, with_dst};
use crate::error::{PipelineError, TransformError};
use crate::registry::TransformRegistry;
use crate::schema::{ParamSpec, Params, TransformSpec};

const MODES: &[&str] = &[
    "binary",
    "binary-inverted",
    "truncate",
    "to-zero",
    "to-zero-inverted",
];

pub(crate) fn register(registry: &mut TransformRegistry) -> Result<(), PipelineError> {
    registry.register(
        "threshold",
        threshold,
        TransformSpec::new("Apply a fixed level threshold to every sample")
            .param(ParamSpec::float("value", 0.0, 255.0, 127.0))
            .param(ParamSpec::float("max_value", 0.0, 255.0, 255.0))
            .param(ParamSpec::choice("mode", MODES, "binary")),
    )?;

    registry.register(
        "adaptive_threshold",
        adaptive_threshold,
        TransformSpec::new("Threshold a gray image against its local mean")
            .param(ParamSpec::int("max_value", 0, 255, 255))
            .param(ParamSpec::choice("method", &["mean", "gaussian"], "mean"))
            .param(ParamSpec::choice(
                "mode",
                &["binary", "binary-inverted"],
                "binary",
            ))
            .param(ParamSpec::int("block_size", 3, 255, 11).odd())
            .param(ParamSpec::float("c", -255.0, 255.0, 2.0)),
    )?;

    registry.register(
        "in_range",
        in_range,
        TransformSpec::new("Mask the pixels whose samples lie inside a range")
            .param(ParamSpec::vector("lower", 0.0, 255.0, &[0.0, 0.0, 0.0]))
            .param(ParamSpec::vector("upper", 0.0, 255.0, &[255.0, 255.0, 255.0])),
    )?;

    Ok(())
}

fn threshold_type(name: &str) -> Result<ThresholdType, TransformError> {
    match name {
        "binary" => Ok(ThresholdType::Binary),
        "binary-inverted" => Ok(ThresholdType::BinaryInv),
        "truncate" => Ok(ThresholdType::Trunc),
        "to-zero" => Ok(ThresholdType::ToZero),
        "to-zero-inverted" => Ok(ThresholdType::ToZeroInv),
        other => Err(TransformError::InvalidArgument(format!(
            "unknown threshold mode `{other}`"
        ))),
    }
}

fn threshold(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let value = params.float("value")?;
    let max_value = params.float("max_value")?;
    let mode = threshold_type(params.choice("mode")?)?;

    Ok(map_pixels!(inputs[0], |src| with_dst(src.size(), |dst| {
        threshold::threshold(
            src,
            dst,
            ImageDtype::from_f32(value),
            ImageDtype::from_f32(max_value),
            mode,
        )
    })?))
}

fn adaptive_threshold(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let src = require_gray_u8(inputs[0], "adaptive_threshold")?;

    let max_value = params.int("max_value")? as u8;
    let method = match params.choice("method")? {
        "gaussian" => AdaptiveMethod::Gaussian,
        _ => AdaptiveMethod::Mean,
    };
    let mode = threshold_type(params.choice("mode")?)?;
    let block_size = params.usize("block_size")?;
    let c = params.float("c")?;

    let dst = with_dst(src.size(), |dst| {
        threshold::adaptive_threshold(src, dst, max_value, method, mode, block_size, c)
    })?;

    Ok(DynImage::gray_u8(dst))
}

fn in_range(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let lower = params.vector::<3>("lower")?;
    let upper = params.vector::<3>("upper")?;

    let image = inputs[0];
    let size = image.size();

    // gray images are tested against the first bound only
    let mask = match image.pixels() {
        PixelData::U8(ChannelImage::Mono(src)) => with_dst(size, |dst| {
            threshold::in_range(src, dst, &[u8::from_f32(lower[0])], &[u8::from_f32(upper[0])])
        })?,
        PixelData::U8(ChannelImage::Color(src)) => with_dst(size, |dst| {
            threshold::in_range(src, dst, &lower.map(u8::from_f32), &upper.map(u8::from_f32))
        })?,
        PixelData::F32(ChannelImage::Mono(src)) => with_dst(size, |dst| {
            threshold::in_range(src, dst, &[lower[0]], &[upper[0]])
        })?,
        PixelData::F32(ChannelImage::Color(src)) => {
            with_dst(size, |dst| threshold::in_range(src, dst, &lower, &upper))?
        }
    };

    Ok(DynImage::gray_u8(mask))
}
