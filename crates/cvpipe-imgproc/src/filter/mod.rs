//! Filter operations
//!
//! This module provides linear and non-linear smoothing and derivative filters.

/// Filter kernels
pub mod kernels;

/// Filter operations
mod ops;
pub use ops::*;

/// Separable filter operations
mod separable_filter;
pub use separable_filter::*;

/// Non-linear filters
mod nonlinear;
pub use nonlinear::*;
