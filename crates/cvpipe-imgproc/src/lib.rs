#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// border extrapolation helpers shared by the filters.
pub(crate) mod border;

/// color transformations module.
pub mod color;

/// contour extraction and contour features.
pub mod contours;

/// per-pixel arithmetic between images.
pub mod core;

/// image cropping module.
pub mod crop;

/// utilities to draw on images.
pub mod draw;

/// edge detection module.
pub mod edges;

/// image filtering module.
pub mod filter;

/// image flipping module.
pub mod flip;

/// compute image histogram module.
pub mod histogram;

/// line detection with the Hough transform.
pub mod hough;

/// utilities for interpolation.
pub mod interpolation;

/// morphological operations module.
pub mod morphology;

/// module containing parallization utilities.
pub mod parallel;

/// Pyramid operations
pub mod pyramid;

/// utility functions for resizing images.
pub mod resize;

/// operations to threshold images.
pub mod threshold;

/// image geometric transformations module.
pub mod warp;
