//! Pixel interpolation methods for image transformations.
//!
//! This module provides the sampling kernels used when resampling images during
//! geometric transformations like resizing, rotating or warping.

mod bicubic;
mod bilinear;
mod nearest;

pub(crate) mod interpolate;

pub use interpolate::{interpolate_pixel, BorderMode, InterpolationMode};
