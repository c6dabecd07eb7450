//! In-plane volume pyramids for coarse-to-fine depth estimation.
//!
//! A [`Schedule`] lists per-axis shrink factors, coarsest level first. Level
//! volumes are block means of the native volume ([`block_mean`]); the
//! projection axis keeps its native sampling so depths stay comparable
//! across levels.
//!
//! Shrink policy:
//! - Output extent is `max(1, n / f)` per axis.
//! - Trailing samples that do not fill a block are dropped.
//!
//! Depth maps travel back up the pyramid with [`resize_bspline`], a cubic
//! B-spline interpolator with mirror boundaries.

mod downsample;
mod schedule;
mod spline;

pub use downsample::{block_mean, level_volume};
pub use schedule::{Schedule, shrunk_shape};
pub use spline::resize_bspline;
