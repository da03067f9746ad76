use cvpipe_image::{ChannelImage, ColorSpace, DynImage, Image, ImageDtype, PixelData};
use cvpipe_imgproc::color;
use cvpipe_imgproc::core::{merge3, set_channel as fill_channel};

use super::{map_pixels, with_dst};
use crate::error::{PipelineError, TransformError};
use crate::registry::TransformRegistry;
use crate::schema::{ParamSpec, Params, TransformSpec};

pub(crate) fn register(registry: &mut TransformRegistry) -> Result<(), PipelineError> {
    registry.register(
        "cvt_color",
        cvt_color,
        TransformSpec::new("Convert between gray, RGB, BGR and HSV").param(ParamSpec::choice(
            "to",
            &["gray", "rgb", "bgr", "hsv"],
            "gray",
        )),
    )?;

    registry.register(
        "extract_channel",
        extract_channel,
        TransformSpec::new("Extract one channel as a gray image")
            .param(ParamSpec::int("channel", 0, 2, 0)),
    )?;

    registry.register(
        "merge",
        merge,
        TransformSpec::new("Merge three gray images into a color image")
            .inputs(3, 3)
            .param(ParamSpec::choice("to", &["rgb", "bgr", "hsv"], "bgr")),
    )?;

    registry.register(
        "set_channel",
        set_channel,
        TransformSpec::new("Set one channel of a color image to a constant")
            .param(ParamSpec::int("channel", 0, 2, 0))
            .param(ParamSpec::float("value", 0.0, 255.0, 0.0)),
    )?;

    Ok(())
}

fn parse_color_space(name: &str) -> Result<ColorSpace, TransformError> {
    match name {
        "gray" => Ok(ColorSpace::Gray),
        "rgb" => Ok(ColorSpace::Rgb),
        "bgr" => Ok(ColorSpace::Bgr),
        "hsv" => Ok(ColorSpace::Hsv),
        other => Err(TransformError::InvalidArgument(format!(
            "unknown color space `{other}`"
        ))),
    }
}

// swap the first and last channels, valid in both directions
fn swap_rb<T: ImageDtype>(src: &Image<T, 3>) -> Result<Image<T, 3>, TransformError> {
    with_dst(src.size(), |dst| color::bgr_from_rgb(src, dst))
}

// bring any image to 3 channel RGB of the same depth
fn rgb_pixels(image: &DynImage) -> Result<PixelData, TransformError> {
    let space = image.color_space();
    let pixels = match image.pixels() {
        PixelData::U8(ChannelImage::Mono(src)) => {
            PixelData::U8(ChannelImage::Color(with_dst(src.size(), |dst| {
                color::rgb_from_gray(src, dst)
            })?))
        }
        PixelData::F32(ChannelImage::Mono(src)) => {
            PixelData::F32(ChannelImage::Color(with_dst(src.size(), |dst| {
                color::rgb_from_gray(src, dst)
            })?))
        }
        PixelData::U8(ChannelImage::Color(src)) => PixelData::U8(ChannelImage::Color(match space {
            ColorSpace::Bgr => swap_rb(src)?,
            ColorSpace::Hsv => with_dst(src.size(), |dst| color::rgb_from_hsv_u8(src, dst))?,
            _ => src.clone(),
        })),
        PixelData::F32(ChannelImage::Color(src)) => {
            PixelData::F32(ChannelImage::Color(match space {
                ColorSpace::Bgr => swap_rb(src)?,
                ColorSpace::Hsv => with_dst(src.size(), |dst| color::rgb_from_hsv(src, dst))?,
                _ => src.clone(),
            }))
        }
    };
    Ok(pixels)
}

// convert 3 channel RGB pixels to the requested color space
fn from_rgb(pixels: PixelData, to: ColorSpace) -> Result<DynImage, TransformError> {
    let pixels = match (pixels, to) {
        (pixels, ColorSpace::Rgb) => pixels,
        (PixelData::U8(ChannelImage::Color(src)), ColorSpace::Gray) => PixelData::U8(
            ChannelImage::Mono(with_dst(src.size(), |dst| color::gray_from_rgb_u8(&src, dst))?),
        ),
        (PixelData::F32(ChannelImage::Color(src)), ColorSpace::Gray) => PixelData::F32(
            ChannelImage::Mono(with_dst(src.size(), |dst| color::gray_from_rgb(&src, dst))?),
        ),
        (PixelData::U8(ChannelImage::Color(src)), ColorSpace::Bgr) => {
            PixelData::U8(ChannelImage::Color(swap_rb(&src)?))
        }
        (PixelData::F32(ChannelImage::Color(src)), ColorSpace::Bgr) => {
            PixelData::F32(ChannelImage::Color(swap_rb(&src)?))
        }
        (PixelData::U8(ChannelImage::Color(src)), ColorSpace::Hsv) => PixelData::U8(
            ChannelImage::Color(with_dst(src.size(), |dst| color::hsv_from_rgb_u8(&src, dst))?),
        ),
        (PixelData::F32(ChannelImage::Color(src)), ColorSpace::Hsv) => PixelData::F32(
            ChannelImage::Color(with_dst(src.size(), |dst| color::hsv_from_rgb(&src, dst))?),
        ),
        (_, to) => {
            return Err(TransformError::UnsupportedInput(format!(
                "expected a 3 channel image to convert to {to}"
            )))
        }
    };
    Ok(DynImage::new(pixels, to)?)
}

fn cvt_color(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let to = parse_color_space(params.choice("to")?)?;

    if image.color_space() == to {
        return Ok(image.clone());
    }

    // gray to color only replicates the intensity
    if image.color_space() == ColorSpace::Gray && to != ColorSpace::Hsv {
        let rgb = rgb_pixels(image)?;
        return Ok(DynImage::new(rgb, ColorSpace::Rgb)?.with_color_space(to)?);
    }

    from_rgb(rgb_pixels(image)?, to)
}

fn extract_channel(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let channel = params.usize("channel")?;

    let pixels = match image.pixels() {
        PixelData::U8(ChannelImage::Mono(src)) => {
            PixelData::U8(ChannelImage::Mono(src.channel(channel)?))
        }
        PixelData::U8(ChannelImage::Color(src)) => {
            PixelData::U8(ChannelImage::Mono(src.channel(channel)?))
        }
        PixelData::F32(ChannelImage::Mono(src)) => {
            PixelData::F32(ChannelImage::Mono(src.channel(channel)?))
        }
        PixelData::F32(ChannelImage::Color(src)) => {
            PixelData::F32(ChannelImage::Mono(src.channel(channel)?))
        }
    };

    Ok(DynImage::new(pixels, ColorSpace::Gray)?)
}

fn merge(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let to = parse_color_space(params.choice("to")?)?;

    if inputs.iter().any(|img| img.num_channels() != 1) {
        return Err(TransformError::UnsupportedInput(
            "merge takes three single channel images".to_string(),
        ));
    }

    let size = inputs[0].size();

    let gray_u8: Vec<&Image<u8, 1>> = inputs.iter().filter_map(|img| img.as_gray_u8()).collect();
    let pixels = if let [c0, c1, c2] = gray_u8.as_slice() {
        PixelData::U8(ChannelImage::Color(with_dst(size, |dst| {
            merge3(c0, c1, c2, dst)
        })?))
    } else {
        // mixed depths are merged as floats
        let mut planes = Vec::with_capacity(3);
        for img in inputs {
            match img.to_f32()? {
                ChannelImage::Mono(plane) => planes.push(plane),
                ChannelImage::Color(_) => {
                    return Err(TransformError::UnsupportedInput(
                        "merge takes three single channel images".to_string(),
                    ))
                }
            }
        }
        PixelData::F32(ChannelImage::Color(with_dst(size, |dst| {
            merge3(&planes[0], &planes[1], &planes[2], dst)
        })?))
    };

    Ok(DynImage::new(pixels, to)?)
}

fn set_channel(inputs: &[&DynImage], params: &Params) -> Result<DynImage, TransformError> {
    let image = inputs[0];
    let channel = params.usize("channel")?;
    let value = params.float("value")?;

    if image.num_channels() != 3 {
        return Err(TransformError::UnsupportedInput(format!(
            "set_channel takes a color image, got {}",
            image.color_space()
        )));
    }

    Ok(map_pixels!(image, |src| with_dst(src.size(), |dst| {
        fill_channel(src, dst, channel, ImageDtype::from_f32(value))
    })?))
}
