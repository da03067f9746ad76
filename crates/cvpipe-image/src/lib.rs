#![deny(missing_docs)]
//! Image types and traits for generating and manipulating images

/// image representation for computer vision purposes.
pub mod image;

/// runtime-typed images carrying depth and channel order.
pub mod dynamic;

/// Error types for the image module.
pub mod error;

pub use crate::dynamic::{ChannelImage, ColorSpace, Depth, DynImage, PixelData};
pub use crate::error::ImageError;
pub use crate::image::{Image, ImageDtype, ImageSize};
