//! Separable smoothing and windowed statistics filters.
//!
//! Volume filters run line by line along each axis through [`map_lines`], so
//! the same code path serves every projection axis. Depth maps are smoothed
//! with [`gaussian_smooth`], which works on 2D [`vd_core::Image`]s.
//!
//! Windows are given as a radius per volume axis. The `in_plane`
//! constructors zero the radius along the projection axis so neighbouring
//! depths are never mixed.

pub mod conv1d;
pub mod gaussian;
pub mod kernels1d;
pub mod lines;
pub mod median;
pub mod variance;

pub use conv1d::{box_sum_f64, convolve_f32};
pub use gaussian::gaussian_smooth;
pub use kernels1d::GaussianKernel1D;
pub use lines::map_lines;
pub use median::{MedianConfig, windowed_median};
pub use variance::{VarianceConfig, windowed_variance};
