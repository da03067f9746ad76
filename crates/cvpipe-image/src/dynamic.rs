use crate::error::ImageError;
use crate::image::{Image, ImageDtype, ImageSize};

/// The numeric type of the samples of a [`DynImage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Depth {
    /// 8-bit unsigned samples.
    U8,
    /// 32-bit floating point samples.
    F32,
}

impl std::fmt::Display for Depth {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Depth::U8 => write!(f, "u8"),
            Depth::F32 => write!(f, "f32"),
        }
    }
}

/// The meaning and order of the channels of a [`DynImage`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Single channel intensity.
    Gray,
    /// Red, green, blue.
    Rgb,
    /// Blue, green, red.
    Bgr,
    /// Hue in [0, 180), saturation and value in [0, 255].
    Hsv,
}

impl ColorSpace {
    /// The number of channels an image in this color space has.
    pub fn num_channels(&self) -> usize {
        match self {
            ColorSpace::Gray => 1,
            ColorSpace::Rgb | ColorSpace::Bgr | ColorSpace::Hsv => 3,
        }
    }
}

impl std::fmt::Display for ColorSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            ColorSpace::Gray => "gray",
            ColorSpace::Rgb => "rgb",
            ColorSpace::Bgr => "bgr",
            ColorSpace::Hsv => "hsv",
        };
        write!(f, "{name}")
    }
}

/// An image with either one or three channels of the same sample type.
#[derive(Clone, Debug, PartialEq)]
pub enum ChannelImage<T> {
    /// Single channel image.
    Mono(Image<T, 1>),
    /// Three channel image.
    Color(Image<T, 3>),
}

impl<T> ChannelImage<T> {
    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        match self {
            ChannelImage::Mono(img) => img.size(),
            ChannelImage::Color(img) => img.size(),
        }
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        match self {
            ChannelImage::Mono(_) => 1,
            ChannelImage::Color(_) => 3,
        }
    }

    /// Get the interleaved samples of the image.
    pub fn as_slice(&self) -> &[T] {
        match self {
            ChannelImage::Mono(img) => img.as_slice(),
            ChannelImage::Color(img) => img.as_slice(),
        }
    }
}

impl<T: ImageDtype> ChannelImage<T> {
    /// Cast the samples to another type, rounding and saturating towards integers.
    pub fn cast<U: ImageDtype>(&self) -> Result<ChannelImage<U>, ImageError> {
        Ok(match self {
            ChannelImage::Mono(img) => ChannelImage::Mono(img.cast()?),
            ChannelImage::Color(img) => ChannelImage::Color(img.cast()?),
        })
    }
}

/// The pixel buffer of a [`DynImage`].
#[derive(Clone, Debug, PartialEq)]
pub enum PixelData {
    /// 8-bit unsigned samples.
    U8(ChannelImage<u8>),
    /// 32-bit floating point samples.
    F32(ChannelImage<f32>),
}

/// A runtime-typed image.
///
/// Carries the sample depth, the number of channels and the channel order, so
/// that operations chosen at runtime can check what they receive. The color
/// space tag always agrees with the number of channels.
///
/// # Examples
///
/// ```
/// use cvpipe_image::{ColorSpace, Depth, DynImage, Image, ImageSize};
///
/// let rgb = Image::<u8, 3>::from_size_val(ImageSize { width: 4, height: 2 }, 0).unwrap();
/// let image = DynImage::rgb_u8(rgb);
///
/// assert_eq!(image.depth(), Depth::U8);
/// assert_eq!(image.color_space(), ColorSpace::Rgb);
/// assert_eq!(image.num_channels(), 3);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DynImage {
    pixels: PixelData,
    color: ColorSpace,
}

impl DynImage {
    /// Create a new image from a pixel buffer and its color space.
    ///
    /// # Errors
    ///
    /// Returns an error when the color space expects a different number of channels.
    pub fn new(pixels: PixelData, color: ColorSpace) -> Result<Self, ImageError> {
        let channels = match &pixels {
            PixelData::U8(img) => img.num_channels(),
            PixelData::F32(img) => img.num_channels(),
        };

        if channels != color.num_channels() {
            return Err(ImageError::ColorSpaceMismatch(color.to_string(), channels));
        }

        Ok(Self { pixels, color })
    }

    /// Create an 8-bit image in the given color space.
    pub fn from_u8(image: ChannelImage<u8>, color: ColorSpace) -> Result<Self, ImageError> {
        Self::new(PixelData::U8(image), color)
    }

    /// Create a floating point image in the given color space.
    pub fn from_f32(image: ChannelImage<f32>, color: ColorSpace) -> Result<Self, ImageError> {
        Self::new(PixelData::F32(image), color)
    }

    /// Wrap an 8-bit grayscale image.
    pub fn gray_u8(image: Image<u8, 1>) -> Self {
        Self {
            pixels: PixelData::U8(ChannelImage::Mono(image)),
            color: ColorSpace::Gray,
        }
    }

    /// Wrap a floating point grayscale image.
    pub fn gray_f32(image: Image<f32, 1>) -> Self {
        Self {
            pixels: PixelData::F32(ChannelImage::Mono(image)),
            color: ColorSpace::Gray,
        }
    }

    /// Wrap an 8-bit RGB image.
    pub fn rgb_u8(image: Image<u8, 3>) -> Self {
        Self {
            pixels: PixelData::U8(ChannelImage::Color(image)),
            color: ColorSpace::Rgb,
        }
    }

    /// Wrap an 8-bit BGR image.
    pub fn bgr_u8(image: Image<u8, 3>) -> Self {
        Self {
            pixels: PixelData::U8(ChannelImage::Color(image)),
            color: ColorSpace::Bgr,
        }
    }

    /// Get the pixel buffer.
    pub fn pixels(&self) -> &PixelData {
        &self.pixels
    }

    /// Consume the image and return the pixel buffer.
    pub fn into_pixels(self) -> PixelData {
        self.pixels
    }

    /// Get the color space tag.
    pub fn color_space(&self) -> ColorSpace {
        self.color
    }

    /// Get the sample depth.
    pub fn depth(&self) -> Depth {
        match self.pixels {
            PixelData::U8(_) => Depth::U8,
            PixelData::F32(_) => Depth::F32,
        }
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        match &self.pixels {
            PixelData::U8(img) => img.size(),
            PixelData::F32(img) => img.size(),
        }
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size().width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size().height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        self.color.num_channels()
    }

    /// Get the samples converted to f32.
    pub fn to_f32(&self) -> Result<ChannelImage<f32>, ImageError> {
        match &self.pixels {
            PixelData::U8(img) => img.cast(),
            PixelData::F32(img) => Ok(img.clone()),
        }
    }

    /// Get the samples converted to u8, rounding and saturating float samples.
    pub fn to_u8(&self) -> Result<ChannelImage<u8>, ImageError> {
        match &self.pixels {
            PixelData::U8(img) => Ok(img.clone()),
            PixelData::F32(img) => img.cast(),
        }
    }

    /// Convert the image to the given depth.
    pub fn into_depth(self, depth: Depth) -> Result<Self, ImageError> {
        if self.depth() == depth {
            return Ok(self);
        }

        let pixels = match depth {
            Depth::U8 => PixelData::U8(self.to_u8()?),
            Depth::F32 => PixelData::F32(self.to_f32()?),
        };

        Ok(Self {
            pixels,
            color: self.color,
        })
    }

    /// Replace the color space tag without touching the samples.
    pub fn with_color_space(self, color: ColorSpace) -> Result<Self, ImageError> {
        Self::new(self.pixels, color)
    }

    /// Borrow the image as an 8-bit grayscale image, if it is one.
    pub fn as_gray_u8(&self) -> Option<&Image<u8, 1>> {
        match &self.pixels {
            PixelData::U8(ChannelImage::Mono(img)) => Some(img),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_space_must_match_channels() -> Result<(), ImageError> {
        let gray = Image::<u8, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            0,
        )?;

        let res = DynImage::from_u8(ChannelImage::Mono(gray.clone()), ColorSpace::Rgb);
        assert_eq!(
            res,
            Err(ImageError::ColorSpaceMismatch("rgb".to_string(), 1))
        );

        let image = DynImage::from_u8(ChannelImage::Mono(gray), ColorSpace::Gray)?;
        assert_eq!(image.num_channels(), 1);
        assert!(image.as_gray_u8().is_some());

        Ok(())
    }

    #[test]
    fn depth_round_trip() -> Result<(), ImageError> {
        let rgb = Image::<u8, 3>::new(
            ImageSize {
                width: 2,
                height: 1,
            },
            vec![0, 10, 20, 200, 250, 255],
        )?;
        let image = DynImage::bgr_u8(rgb);

        let image_f32 = image.clone().into_depth(Depth::F32)?;
        assert_eq!(image_f32.depth(), Depth::F32);
        assert_eq!(image_f32.color_space(), ColorSpace::Bgr);

        let back = image_f32.into_depth(Depth::U8)?;
        assert_eq!(back, image);

        Ok(())
    }
}
