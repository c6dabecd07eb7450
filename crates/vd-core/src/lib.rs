//! Volume and depth-map primitives.
//!
//! ## Layout
//! A [`Volume`] is a dense rank-3 array stored x-fastest. Any of its axes can
//! serve as the projection axis; the remaining two axes, in ascending order,
//! become the `x` and `y` axes of the collapsed 2D [`Image`].
//!
//! ## Columns
//! [`AxisLines`] addresses every 1D line parallel to an axis. Line `l` maps to
//! depth-map pixel `l`, so per-column algorithms can write their result at
//! the same linear index in the output image.
//!
//! ## Border Modes
//! Neighborhood filters choose between clamp (replicate edge), constant fill
//! and reflect-101 behavior.

mod border;
mod error;
mod image;
mod volume;

pub use border::{BorderMode, fetch, map_index, pad_line};
pub use error::Error;
pub use image::{Image, PlaneGeometry};
pub use volume::{Axis, AxisLines, VOLUME_RANK, Volume, VolumeGeometry, depth_map_shape};
