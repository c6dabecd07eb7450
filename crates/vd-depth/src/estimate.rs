use log::trace;
use rayon::prelude::*;
use vd_core::{Axis, Error, Image, Volume, depth_map_shape};

use crate::band::{BandRange, SearchBand, nearest_centre};
use crate::peak::{PeakConfig, estimate_depth};

/// Where each column is searched.
#[derive(Debug, Clone, Copy)]
pub enum SearchInit<'a> {
    /// The whole projection axis.
    Full,
    /// A band around the rounded depth of the same pixel in `map`.
    Around {
        map: &'a Image<f32>,
        range: BandRange,
    },
}

/// Band usage over one depth map estimation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BandStats {
    pub columns: usize,
    /// Columns whose band was cut by the ends of the axis.
    pub clamped: usize,
    pub mean_width: f64,
}

/// Estimates one depth per column of `vol` along `axis`.
///
/// The result has the in-plane shape and geometry of `vol`. Columns are
/// independent; rows of the output are filled in parallel, each worker
/// reusing its own gather buffer.
pub fn estimate_depth_map(
    vol: &Volume<f32>,
    axis: Axis,
    cfg: &PeakConfig,
    init: SearchInit<'_>,
) -> Result<(Image<f32>, BandStats), Error> {
    cfg.validate()?;

    let [w, h] = depth_map_shape(vol.shape(), axis);
    if let SearchInit::Around { map, .. } = init
        && map.shape() != [w, h]
    {
        return Err(Error::ShapeMismatch {
            expected: vec![w, h],
            actual: map.shape().to_vec(),
        });
    }

    let lines = vol.lines(axis);
    let len = lines.len();
    let mut depth = vec![0.0f32; w * h];

    let (clamped, width_sum) = if w == 0 {
        (0, 0)
    } else {
        depth
            .par_chunks_mut(w)
            .enumerate()
            .map_init(Vec::new, |buf, (v, row)| {
                let mut clamped = 0usize;
                let mut width_sum = 0usize;
                for (u, out) in row.iter_mut().enumerate() {
                    let band = match init {
                        SearchInit::Full => SearchBand::full(len),
                        SearchInit::Around { map, range } => {
                            let centre = nearest_centre(map.data()[v * w + u]);
                            let band = SearchBand::around(centre, range, len);
                            if let Some(b) = band
                                && b.len() < range.high + range.low + 1
                            {
                                clamped += 1;
                            }
                            band
                        }
                    };

                    let Some(band) = band else {
                        trace!("column ({u}, {v}): empty projection axis, depth 0");
                        *out = 0.0;
                        continue;
                    };
                    width_sum += band.len();
                    let profile = lines.gather(vol.data(), v * w + u, band.range(), buf);
                    *out = estimate_depth(profile, band.low, cfg) as f32;
                }
                (clamped, width_sum)
            })
            .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1))
    };

    let columns = w * h;
    let stats = BandStats {
        columns,
        clamped,
        mean_width: if columns == 0 {
            0.0
        } else {
            width_sum as f64 / columns as f64
        },
    };

    let map = Image::from_vec(w, h, depth)?.with_geometry(vol.geometry().plane(axis));
    Ok((map, stats))
}
