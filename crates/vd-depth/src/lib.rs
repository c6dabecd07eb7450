//! Depth-map estimation from intensity volumes.
//!
//! Core strategy:
//! - Walk each column of the volume along the projection axis.
//! - Pick one depth per column with a tolerance-based peak rule
//!   ([`estimate_depth`]).
//! - Refine coarse-to-fine: coarse levels search the whole axis, finer
//!   levels only a band around the upsampled previous estimate
//!   ([`refine`]).
//!
//! The inverse direction, [`project`], collapses a volume to 2D by reducing
//! each column over a narrow band around its recorded depth.
//!
//! Depth maps are `Image<f32>`. Rounding to a sample index happens only when
//! a band is built: to nearest while refining, truncating while projecting.

mod band;
mod estimate;
mod multiscale;
mod peak;
mod projector;

pub use band::{BandRange, SearchBand, nearest_centre, truncated_centre};
pub use estimate::{BandStats, SearchInit, estimate_depth_map};
pub use multiscale::{LevelReport, MultiscaleConfig, Refined, refine};
pub use peak::{PeakConfig, PeakMode, PeakScan, argmax_first, estimate_depth};
pub use projector::{ProjectionConfig, Reduction, project, wrap_u16};
