use std::path::PathBuf;

/// Failures while reading or writing image files.
#[derive(thiserror::Error, Debug)]
pub enum IoError {
    /// Nothing exists at the given path.
    #[error("No such image file: {0}")]
    FileDoesNotExist(PathBuf),

    /// The path has no extension that maps to an [`crate::ImageFormat`].
    #[error("Cannot tell the image format of {0} from its extension")]
    InvalidFileExtension(PathBuf),

    /// A format name that is not one of png, jpeg, bmp, tiff or pnm.
    #[error("Unknown image format `{0}`")]
    UnsupportedImageFormat(String),

    /// The operating system refused a read or a write.
    #[error(transparent)]
    FileError(#[from] std::io::Error),

    /// The decoded buffer could not be wrapped as an image.
    #[error(transparent)]
    ImageCreationError(#[from] cvpipe_image::ImageError),

    /// The codec rejected the file or the pixels.
    #[error("Image codec error: {0}")]
    ImageCodecError(#[from] image::ImageError),
}
