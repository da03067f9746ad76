//! Morphological image processing operations.

/// Kernel (structuring element) utilities.
mod kernels;
pub use kernels::{box_kernel, cross_kernel, ellipse_kernel, Kernel, KernelShape};

/// Erosion, dilation and the compound operations built on them.
mod ops;
pub use ops::{close, dilate, erode, morphology_ex, open, MorphologyOp};
