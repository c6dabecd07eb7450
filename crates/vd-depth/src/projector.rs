use log::{debug, trace};
use rayon::prelude::*;
use vd_core::{Axis, Error, Image, Volume, depth_map_shape};

use crate::band::{BandRange, SearchBand, truncated_centre};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    #[default]
    Max,
    Average,
}

/// Parameters of the depth-guided projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionConfig {
    pub axis: Axis,
    /// Added to every truncated depth before the band is built.
    pub shift: i32,
    pub range: BandRange,
    pub reduction: Reduction,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            axis: Axis::default(),
            shift: 0,
            range: BandRange::new(1, 1),
            reduction: Reduction::Max,
        }
    }
}

/// Collapses `vol` along the projection axis, reducing each column over a
/// band around its recorded depth.
///
/// The band of a column is `[c - range.high, c + range.low]` with
/// `c = trunc(depth + shift)`, clamped to the axis. The shift is added
/// before truncating, so a fractional depth that the shift carries below
/// zero still centres on sample 0. Results are
/// converted to `u16` by truncation with wrap-around, not saturation.
pub fn project(
    vol: &Volume<f32>,
    depth: &Image<f32>,
    cfg: &ProjectionConfig,
) -> Result<Image<u16>, Error> {
    let [w, h] = depth_map_shape(vol.shape(), cfg.axis);
    if depth.shape() != [w, h] {
        return Err(Error::ShapeMismatch {
            expected: vec![w, h],
            actual: depth.shape().to_vec(),
        });
    }
    debug!(
        "project shape={:?} axis={} shift={} range=({}, {}) reduction={:?}",
        vol.shape(),
        cfg.axis.index(),
        cfg.shift,
        cfg.range.high,
        cfg.range.low,
        cfg.reduction
    );

    let lines = vol.lines(cfg.axis);
    let len = lines.len();
    let mut out = vec![0u16; w * h];

    if w > 0 {
        out.par_chunks_mut(w)
            .enumerate()
            .for_each_init(Vec::new, |buf, (v, row)| {
                for (u, px) in row.iter_mut().enumerate() {
                    let line = v * w + u;
                    let centre = truncated_centre(depth.data()[line], cfg.shift);
                    let Some(band) = SearchBand::around(centre, cfg.range, len) else {
                        trace!("column ({u}, {v}): empty projection axis, output 0");
                        *px = 0;
                        continue;
                    };
                    let samples = lines.gather(vol.data(), line, band.range(), buf);
                    *px = match cfg.reduction {
                        Reduction::Max => wrap_u16(max_sample(samples)),
                        Reduction::Average => truncating_average(samples) as u16,
                    };
                }
            });
    }

    Ok(Image::from_vec(w, h, out)?.with_geometry(vol.geometry().plane(cfg.axis)))
}

/// Converts to `u16` by truncating towards zero and wrapping modulo 2^16.
#[inline]
pub fn wrap_u16(v: f32) -> u16 {
    (v as i64) as u16
}

fn max_sample(samples: &[f32]) -> f32 {
    samples
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, f32::max)
}

/// Integer mean: the running sum is truncated to an integer after every
/// sample and the total is divided with integer division.
fn truncating_average(samples: &[f32]) -> i64 {
    if samples.is_empty() {
        return 0;
    }
    let sum = samples
        .iter()
        .fold(0i64, |acc, &s| (acc as f64 + s as f64) as i64);
    sum / samples.len() as i64
}
