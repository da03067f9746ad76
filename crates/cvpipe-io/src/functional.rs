use std::path::Path;

use cvpipe_image::{ChannelImage, ColorSpace, DynImage, Image, ImageSize};

use crate::error::IoError;

/// The raster formats images can be written in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Portable Network Graphics, lossless.
    Png,
    /// JPEG, lossy.
    Jpeg,
    /// Windows bitmap, lossless.
    Bmp,
    /// Tagged Image File Format, lossless.
    Tiff,
    /// Portable anymap (pgm for gray, ppm for color), lossless.
    Pnm,
}

impl ImageFormat {
    /// The file extension used for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Bmp => "bmp",
            ImageFormat::Tiff => "tiff",
            ImageFormat::Pnm => "pnm",
        }
    }

    /// Guess the format from the extension of a path.
    pub fn from_path(file_path: impl AsRef<Path>) -> Result<Self, IoError> {
        let file_path = file_path.as_ref();
        file_path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .ok_or_else(|| IoError::InvalidFileExtension(file_path.to_path_buf()))
    }

    fn codec(&self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
            ImageFormat::Tiff => image::ImageFormat::Tiff,
            ImageFormat::Pnm => image::ImageFormat::Pnm,
        }
    }
}

impl std::str::FromStr for ImageFormat {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "bmp" => Ok(ImageFormat::Bmp),
            "tif" | "tiff" => Ok(ImageFormat::Tiff),
            "pnm" | "pgm" | "ppm" => Ok(ImageFormat::Pnm),
            other => Err(IoError::UnsupportedImageFormat(other.to_string())),
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

fn decode(file_path: &Path) -> Result<image::DynamicImage, IoError> {
    // verify the file exists
    if !file_path.exists() {
        return Err(IoError::FileDoesNotExist(file_path.to_path_buf()));
    }

    let img = image::ImageReader::open(file_path)?
        .with_guessed_format()?
        .decode()?;

    log::debug!(
        "decoded {} ({}x{}, {:?})",
        file_path.display(),
        img.width(),
        img.height(),
        img.color()
    );

    Ok(img)
}

/// Reads an image from the given file path.
///
/// The method tries to read from any image format supported by the image crate.
/// 8-bit grayscale files stay single channel and every other file is converted
/// to 8-bit RGB.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
///
/// # Returns
///
/// An image tagged [`ColorSpace::Gray`] or [`ColorSpace::Rgb`].
pub fn read_image_any(file_path: impl AsRef<Path>) -> Result<DynImage, IoError> {
    let img = decode(file_path.as_ref())?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    let image = match img.color() {
        image::ColorType::L8 => {
            DynImage::gray_u8(Image::<u8, 1>::new(size, img.into_luma8().into_raw())?)
        }
        _ => DynImage::rgb_u8(Image::<u8, 3>::new(size, img.into_rgb8().into_raw())?),
    };

    Ok(image)
}

/// Reads an image from the given file path as 8-bit grayscale.
///
/// # Arguments
///
/// * `file_path` - The path to a valid image file.
pub fn read_image_gray(file_path: impl AsRef<Path>) -> Result<DynImage, IoError> {
    let img = decode(file_path.as_ref())?;

    let size = ImageSize {
        width: img.width() as usize,
        height: img.height() as usize,
    };

    Ok(DynImage::gray_u8(Image::<u8, 1>::new(
        size,
        img.into_luma8().into_raw(),
    )?))
}

/// Writes an image to the given file path in the given format.
///
/// Float samples are rounded and saturated to 8 bits. BGR images are written
/// in RGB order; HSV images are written with their raw samples.
///
/// # Arguments
///
/// * `file_path` - The path of the file to create.
/// * `image` - The image to write.
/// * `format` - The encoding of the file.
pub fn write_image(
    file_path: impl AsRef<Path>,
    image: &DynImage,
    format: ImageFormat,
) -> Result<(), IoError> {
    let file_path = file_path.as_ref();

    let width = image.width() as u32;
    let height = image.height() as u32;

    let (buf, color) = match image.to_u8()? {
        ChannelImage::Mono(img) => (img.into_vec(), image::ExtendedColorType::L8),
        ChannelImage::Color(img) => {
            let mut buf = img.into_vec();
            if image.color_space() == ColorSpace::Bgr {
                buf.chunks_exact_mut(3).for_each(|px| px.swap(0, 2));
            }
            (buf, image::ExtendedColorType::Rgb8)
        }
    };

    image::save_buffer_with_format(file_path, &buf, width, height, color, format.codec())?;

    log::debug!("wrote {} ({}x{})", file_path.display(), width, height);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cvpipe_image::Depth;

    fn gradient_rgb() -> Result<Image<u8, 3>, IoError> {
        let size = ImageSize {
            width: 4,
            height: 3,
        };
        let data = (0..size.width * size.height * 3)
            .map(|i| (i * 7 % 256) as u8)
            .collect();
        Ok(Image::new(size, data)?)
    }

    #[test]
    fn write_read_png_rgb() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("rgb.png");

        let image = DynImage::rgb_u8(gradient_rgb()?);
        write_image(&file_path, &image, ImageFormat::Png)?;

        let back = read_image_any(&file_path)?;
        assert_eq!(back, image);

        Ok(())
    }

    #[test]
    fn write_read_gray_formats() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let size = ImageSize {
            width: 5,
            height: 2,
        };
        let gray = DynImage::gray_u8(Image::new(size, (0..10).map(|v| v * 25).collect())?);

        for format in [ImageFormat::Png, ImageFormat::Pnm, ImageFormat::Tiff] {
            let file_path = tmp_dir.path().join(format!("gray.{}", format.extension()));
            write_image(&file_path, &gray, format)?;

            let back = read_image_any(&file_path)?;
            assert_eq!(back.color_space(), ColorSpace::Gray);
            assert_eq!(back, gray);
        }

        Ok(())
    }

    #[test]
    fn write_bgr_and_float() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let file_path = tmp_dir.path().join("bgr.png");

        let size = ImageSize {
            width: 1,
            height: 1,
        };
        let bgr = DynImage::bgr_u8(Image::new(size, vec![1, 2, 3])?);
        write_image(&file_path, &bgr, ImageFormat::Png)?;
        let back = read_image_any(&file_path)?;
        assert_eq!(back.to_u8()?.as_slice(), &[3, 2, 1]);

        let float = DynImage::gray_f32(Image::new(size, vec![300.4])?);
        write_image(&file_path, &float, ImageFormat::Png)?;
        let back = read_image_gray(&file_path)?;
        assert_eq!(back.depth(), Depth::U8);
        assert_eq!(back.to_u8()?.as_slice(), &[255]);

        Ok(())
    }

    #[test]
    fn missing_file() {
        let res = read_image_any("/definitely/not/here.png");
        assert!(matches!(res, Err(IoError::FileDoesNotExist(_))));
    }

    #[test]
    fn format_names() -> Result<(), IoError> {
        assert_eq!("JPEG".parse::<ImageFormat>()?, ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_path("a/b.ppm")?, ImageFormat::Pnm);
        assert!(ImageFormat::from_path("a/b").is_err());
        assert!("gif".parse::<ImageFormat>().is_err());
        Ok(())
    }
}
