/// An error type for the image and image processing modules.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the sizes of two images do not match.
    #[error("Image size mismatch: {0}x{1} vs {2}x{3}")]
    InvalidImageSize(usize, usize, usize, usize),

    /// Error when a pixel coordinate is outside of the image.
    #[error("Pixel ({0}, {1}) is out of bounds for an image of size {2}x{3}")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when a channel index is not valid.
    #[error("Channel index {0} is out of bounds for an image with {1} channels")]
    ChannelIndexOutOfBounds(usize, usize),

    /// Error when a region does not fit inside the image.
    #[error("Region ({0}, {1}, {2}x{3}) is out of bounds for an image of size {4}x{5}")]
    InvalidRegion(usize, usize, usize, usize, usize, usize),

    /// Error when a kernel size is not supported by an operation.
    #[error("Invalid kernel size {0}x{1}")]
    InvalidKernelSize(usize, usize),

    /// Error when the number of histogram bins is not valid.
    #[error("Invalid number of histogram bins: {0}")]
    InvalidHistogramBins(usize),

    /// Error when the histogram range is empty or reversed.
    #[error("Invalid histogram range [{0}, {1})")]
    InvalidHistogramRange(f32, f32),

    /// Error when the color space tag does not match the number of channels.
    #[error("Color space {0} cannot describe an image with {1} channels")]
    ColorSpaceMismatch(String, usize),

    /// Error when a geometric transform cannot be computed from its inputs.
    #[error("Degenerate transform: {0}")]
    DegenerateTransform(String),

    /// Error when a voting accumulator would exceed the cell limit.
    #[error("Accumulator of {0}x{1} cells exceeds the limit of {2} cells")]
    AccumulatorTooLarge(usize, usize, usize),
}
