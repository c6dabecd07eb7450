//! Umbrella crate for the `volume-depth` workspace.
//!
//! Re-exports the volume primitives and the depth pipeline at the top level.
//! Filters, pyramids and file I/O stay behind their crate names.

pub use vd_core::*;
pub use vd_depth::*;
pub use vd_filter as filter;
pub use vd_io as io;
pub use vd_pyr as pyr;
