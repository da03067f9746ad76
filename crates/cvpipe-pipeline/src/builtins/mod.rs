//! The transforms registered by [`TransformRegistry::with_builtins`].
//!
//! Every transform is a plain function from its input images and resolved
//! parameters to a new image. Inputs are never modified.

use cvpipe_image::{ChannelImage, DynImage, Image, ImageDtype, ImageError, ImageSize, PixelData};
use cvpipe_imgproc::interpolation::InterpolationMode;

use crate::error::{PipelineError, TransformError};
use crate::registry::TransformRegistry;

mod arithmetic;
mod color;
mod features;
mod filter;
mod geometry;
mod histogram;
mod morphology;
mod threshold;

/// Apply the same expression to whichever typed image a [`DynImage`] holds,
/// keeping its depth, channel count and color space.
///
/// The expression sees the typed source image bound to the given name and must
/// evaluate to an image of the same sample type and channel count.
macro_rules! map_pixels {
    ($image:expr, |$src:ident| $body:expr) => {{
        let image: &cvpipe_image::DynImage = $image;
        let pixels = match image.pixels() {
            cvpipe_image::PixelData::U8(cvpipe_image::ChannelImage::Mono($src)) => {
                cvpipe_image::PixelData::U8(cvpipe_image::ChannelImage::Mono($body))
            }
            cvpipe_image::PixelData::U8(cvpipe_image::ChannelImage::Color($src)) => {
                cvpipe_image::PixelData::U8(cvpipe_image::ChannelImage::Color($body))
            }
            cvpipe_image::PixelData::F32(cvpipe_image::ChannelImage::Mono($src)) => {
                cvpipe_image::PixelData::F32(cvpipe_image::ChannelImage::Mono($body))
            }
            cvpipe_image::PixelData::F32(cvpipe_image::ChannelImage::Color($src)) => {
                cvpipe_image::PixelData::F32(cvpipe_image::ChannelImage::Color($body))
            }
        };
        cvpipe_image::DynImage::new(pixels, image.color_space())?
    }};
}

pub(crate) use map_pixels;

/// Allocate a zeroed image of the given size and let `op` fill it.
pub(crate) fn with_dst<T, const C: usize, F>(
    size: ImageSize,
    op: F,
) -> Result<Image<T, C>, TransformError>
where
    T: ImageDtype,
    F: FnOnce(&mut Image<T, C>) -> Result<(), ImageError>,
{
    let mut dst = Image::<T, C>::from_size_val(size, T::default())?;
    op(&mut dst)?;
    Ok(dst)
}

/// Get the single channel 8-bit image a transform requires.
pub(crate) fn require_gray_u8<'a>(
    image: &'a DynImage,
    transform: &str,
) -> Result<&'a Image<u8, 1>, TransformError> {
    image.as_gray_u8().ok_or_else(|| {
        TransformError::UnsupportedInput(format!(
            "{transform} takes a single channel u8 image, got {} {}",
            image.color_space(),
            image.depth()
        ))
    })
}

/// Get the single channel samples of an image, as floats when they are not u8.
pub(crate) enum GrayView<'a> {
    U8(&'a Image<u8, 1>),
    F32(&'a Image<f32, 1>),
}

pub(crate) fn require_gray<'a>(
    image: &'a DynImage,
    transform: &str,
) -> Result<GrayView<'a>, TransformError> {
    match image.pixels() {
        PixelData::U8(ChannelImage::Mono(img)) => Ok(GrayView::U8(img)),
        PixelData::F32(ChannelImage::Mono(img)) => Ok(GrayView::F32(img)),
        _ => Err(TransformError::UnsupportedInput(format!(
            "{transform} takes a single channel image, got {}",
            image.color_space()
        ))),
    }
}

/// The interpolation choices shared by the geometric transforms.
pub(crate) const INTERPOLATIONS: &[&str] = &["nearest", "linear", "cubic"];

pub(crate) fn interpolation_mode(name: &str) -> Result<InterpolationMode, TransformError> {
    match name {
        "nearest" => Ok(InterpolationMode::Nearest),
        "linear" => Ok(InterpolationMode::Bilinear),
        "cubic" => Ok(InterpolationMode::Bicubic),
        other => Err(TransformError::InvalidArgument(format!(
            "unknown interpolation `{other}`"
        ))),
    }
}

/// A drawing color given per channel in `[0, 255]`, matched to the canvas channels.
pub(crate) fn color3(values: [f32; 3]) -> [u8; 3] {
    values.map(u8::from_f32)
}

/// Register every built-in transform.
pub(crate) fn register_all(registry: &mut TransformRegistry) -> Result<(), PipelineError> {
    color::register(registry)?;
    threshold::register(registry)?;
    geometry::register(registry)?;
    filter::register(registry)?;
    morphology::register(registry)?;
    features::register(registry)?;
    histogram::register(registry)?;
    arithmetic::register(registry)?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use cvpipe_image::{DynImage, Image, ImageSize};

    use crate::error::TransformError;
    use crate::registry::TransformRegistry;
    use crate::schema::Params;

    /// Run a built-in transform with its default parameters and the given overrides.
    pub fn run(
        name: &str,
        inputs: &[&DynImage],
        overrides: &[(&str, serde_json::Value)],
    ) -> Result<DynImage, TransformError> {
        let registry = TransformRegistry::with_builtins().expect("builtins register");
        let entry = registry.resolve(name).expect("known transform");
        let mut params = Params::new();
        for spec in &entry.spec().params {
            params.insert(&spec.name, spec.default.clone());
        }
        for (key, raw) in overrides {
            let spec = entry.spec().find_param(key).expect("declared parameter");
            params.insert(key, spec.coerce(raw).expect("valid parameter"));
        }
        entry.call(inputs, &params)
    }

    pub fn gray(width: usize, height: usize, data: Vec<u8>) -> DynImage {
        DynImage::gray_u8(Image::new(ImageSize { width, height }, data).expect("gray image"))
    }

    pub fn rgb(width: usize, height: usize, data: Vec<u8>) -> DynImage {
        DynImage::rgb_u8(Image::new(ImageSize { width, height }, data).expect("rgb image"))
    }
}
