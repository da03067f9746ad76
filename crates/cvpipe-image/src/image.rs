use crate::error::ImageError;

/// Width and height of an image in pixels.
///
/// ```
/// use cvpipe_image::ImageSize;
///
/// let size: ImageSize = [640, 480].into();
/// assert_eq!(size, ImageSize { width: 640, height: 480 });
/// assert_eq!(size.to_string(), "640x480");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from([width, height]: [usize; 2]) -> Self {
        ImageSize { width, height }
    }
}

impl From<ImageSize> for [u32; 2] {
    fn from(size: ImageSize) -> Self {
        [size.width as u32, size.height as u32]
    }
}

/// Sample types a pipeline image can hold.
///
/// Every transform computes through `f32`, so a sample type only has to say
/// how it goes to and comes back from it.
pub trait ImageDtype: Copy + Default + PartialOrd + Send + Sync + 'static {
    /// Saturating conversion from `f32`.
    fn from_f32(x: f32) -> Self;

    /// Lossless widening to `f32`.
    fn to_f32(self) -> f32;
}

impl ImageDtype for f32 {
    fn from_f32(x: f32) -> Self {
        x
    }

    fn to_f32(self) -> f32 {
        self
    }
}

impl ImageDtype for u8 {
    fn from_f32(x: f32) -> Self {
        x.round().clamp(0.0, 255.0) as u8
    }

    fn to_f32(self) -> f32 {
        self as f32
    }
}

/// An owned, interleaved image with `CHANNELS` samples per pixel.
///
/// Samples are laid out row by row, and within a row pixel by pixel. The size
/// never changes after construction, which lets the operations in
/// `cvpipe-imgproc` write into a caller provided destination.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Wrap `data` as an image of the given size.
    ///
    /// Fails with [`ImageError::InvalidChannelShape`] unless `data` holds exactly
    /// `width * height * CHANNELS` samples.
    ///
    /// ```
    /// use cvpipe_image::{Image, ImageSize};
    ///
    /// let size = ImageSize { width: 2, height: 1 };
    /// let rgb = Image::<u8, 3>::new(size, vec![255, 0, 0, 0, 0, 255]).unwrap();
    /// assert_eq!(rgb.pixel(1, 0), &[0, 0, 255]);
    ///
    /// assert!(Image::<u8, 3>::new(size, vec![0; 5]).is_err());
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        let expected = size.width * size.height * CHANNELS;
        if data.len() != expected {
            return Err(ImageError::InvalidChannelShape(data.len(), expected));
        }

        Ok(Self { size, data })
    }

    /// An image of the given size with every sample set to `val`.
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        Image::new(size, vec![val; size.width * size.height * CHANNELS])
    }

    /// Size in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Same as [`Image::width`].
    pub fn cols(&self) -> usize {
        self.size.width
    }

    /// Same as [`Image::height`].
    pub fn rows(&self) -> usize {
        self.size.height
    }

    /// Samples per pixel.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// The interleaved samples.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The interleaved samples, mutably.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Give up the image and keep its samples.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Samples of the pixel at `(x, y)`. Panics outside the image.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[T] {
        let start = (y * self.size.width + x) * CHANNELS;
        &self.data[start..start + CHANNELS]
    }

    /// Mutable samples of the pixel at `(x, y)`.
    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [T] {
        let start = (y * self.size.width + x) * CHANNELS;
        &mut self.data[start..start + CHANNELS]
    }

    fn sample_index(&self, x: usize, y: usize, ch: usize) -> Result<usize, ImageError> {
        if x >= self.size.width || y >= self.size.height {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.size.width,
                self.size.height,
            ));
        }
        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }
        Ok((y * self.size.width + x) * CHANNELS + ch)
    }

    /// Checked read of channel `ch` at `(x, y)`.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<&T, ImageError> {
        let i = self.sample_index(x, y, ch)?;
        Ok(&self.data[i])
    }

    /// Checked write of channel `ch` at `(x, y)`.
    pub fn set_pixel(&mut self, x: usize, y: usize, ch: usize, val: T) -> Result<(), ImageError> {
        let i = self.sample_index(x, y, ch)?;
        self.data[i] = val;
        Ok(())
    }

    /// Copy channel `ch` out into a single channel image.
    ///
    /// ```
    /// use cvpipe_image::{Image, ImageSize};
    ///
    /// let hsv = Image::<u8, 3>::new(ImageSize { width: 2, height: 1 }, vec![10, 20, 30, 40, 50, 60]).unwrap();
    /// assert_eq!(hsv.channel(2).unwrap().as_slice(), &[30, 60]);
    /// assert!(hsv.channel(3).is_err());
    /// ```
    pub fn channel(&self, ch: usize) -> Result<Image<T, 1>, ImageError>
    where
        T: Copy,
    {
        if ch >= CHANNELS {
            return Err(ImageError::ChannelIndexOutOfBounds(ch, CHANNELS));
        }

        Ok(Image {
            size: self.size,
            data: self.data.iter().skip(ch).step_by(CHANNELS).copied().collect(),
        })
    }

    /// Sample-wise map into a new image of the same shape.
    pub fn map<U>(&self, f: impl Fn(T) -> U) -> Image<U, CHANNELS>
    where
        T: Copy,
    {
        Image {
            size: self.size,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS>
where
    T: ImageDtype,
{
    /// Multiply every sample by `scale` and convert it to `U`.
    ///
    /// ```
    /// use cvpipe_image::{Image, ImageSize};
    ///
    /// let unit = Image::<f32, 1>::new(ImageSize { width: 3, height: 1 }, vec![0.0, 0.5, 1.0]).unwrap();
    /// let bytes = unit.cast_and_scale::<u8>(255.0).unwrap();
    /// assert_eq!(bytes.as_slice(), &[0, 128, 255]);
    /// ```
    pub fn cast_and_scale<U>(&self, scale: f32) -> Result<Image<U, CHANNELS>, ImageError>
    where
        U: ImageDtype,
    {
        Ok(self.map(|v| U::from_f32(v.to_f32() * scale)))
    }

    /// [`Image::cast_and_scale`] with a scale of one. Conversions to `u8`
    /// round and saturate.
    pub fn cast<U>(&self) -> Result<Image<U, CHANNELS>, ImageError>
    where
        U: ImageDtype,
    {
        self.cast_and_scale(1.0)
    }
}
