use log::debug;
use vd_core::{Axis, Error, Image, Volume, depth_map_shape};
use vd_filter::gaussian_smooth;
use vd_pyr::{Schedule, level_volume, resize_bspline};

use crate::band::BandRange;
use crate::estimate::{BandStats, SearchInit, estimate_depth_map};
use crate::peak::{PeakConfig, PeakMode};

/// Parameters of the coarse-to-fine depth refinement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiscaleConfig {
    pub axis: Axis,
    /// Number of pyramid levels, at least 1.
    pub levels: usize,
    /// Variance of the in-plane Gaussian applied to every level's depth map.
    pub sigma: f64,
    pub peak: PeakConfig,
    /// Band searched around the previous level's estimate.
    pub range: BandRange,
}

impl Default for MultiscaleConfig {
    fn default() -> Self {
        Self {
            axis: Axis::default(),
            levels: 3,
            sigma: 1.5,
            peak: PeakConfig {
                mode: PeakMode::MaxOnly,
                tolerance: 0.5,
            },
            range: BandRange::default(),
        }
    }
}

impl MultiscaleConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(Error::InvalidParameter {
                name: "sigma",
                reason: "must be finite and >= 0",
            });
        }
        self.peak.validate()
    }
}

/// What happened at one pyramid level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelReport {
    pub level: usize,
    pub factors: [usize; 3],
    pub shape: [usize; 3],
    pub band: BandStats,
}

#[derive(Debug, Clone)]
pub struct Refined {
    /// Smoothed depth map of the native level.
    pub depth: Image<f32>,
    pub levels: Vec<LevelReport>,
}

/// Coarse-to-fine depth estimation over an in-plane pyramid of `vol`.
///
/// The coarsest level searches the whole projection axis. Every finer level
/// searches only a band around the previous smoothed estimate, upsampled to
/// its own resolution. Levels run strictly one after another.
pub fn refine(vol: &Volume<f32>, cfg: &MultiscaleConfig) -> Result<Refined, Error> {
    cfg.validate()?;
    let schedule = Schedule::from_levels(cfg.levels, cfg.axis)?;

    let mut reports = Vec::with_capacity(schedule.levels());
    let mut previous: Option<Image<f32>> = None;

    for (level, factors) in schedule.iter().enumerate() {
        let level_vol = level_volume(vol, factors);
        let [w, h] = depth_map_shape(level_vol.shape(), cfg.axis);

        let guide = match previous.take() {
            None => None,
            Some(prev) => Some(resize_bspline(&prev, w, h)?),
        };
        let init = match &guide {
            None => SearchInit::Full,
            Some(map) => SearchInit::Around {
                map,
                range: cfg.range,
            },
        };

        let (depth, band) = estimate_depth_map(&level_vol, cfg.axis, &cfg.peak, init)?;
        let smoothed = gaussian_smooth(&depth, [cfg.sigma, cfg.sigma])?;

        debug!(
            "level {level}/{}: factors={factors:?} shape={:?} clamped_bands={} mean_band={:.2}",
            schedule.levels(),
            level_vol.shape(),
            band.clamped,
            band.mean_width
        );
        reports.push(LevelReport {
            level,
            factors,
            shape: level_vol.shape(),
            band,
        });
        previous = Some(smoothed);
    }

    let depth = previous
        .ok_or(Error::InvalidParameter {
            name: "levels",
            reason: "at least one pyramid level is required",
        })?
        .with_geometry(vol.geometry().plane(cfg.axis));

    Ok(Refined {
        depth,
        levels: reports,
    })
}

#[cfg(test)]
mod tests {
    use vd_core::{Axis, Volume, VolumeGeometry};

    use crate::multiscale::{MultiscaleConfig, refine};

    fn plane_at(shape: [usize; 3], depth: usize) -> Volume<f32> {
        let mut vol = Volume::new_fill(shape, 0.0f32);
        let slice = shape[0] * shape[1];
        for v in &mut vol.data_mut()[depth * slice..(depth + 1) * slice] {
            *v = 100.0;
        }
        vol
    }

    #[test]
    fn defaults() {
        let cfg = MultiscaleConfig::default();
        assert_eq!(cfg.levels, 3);
        assert_eq!(cfg.sigma, 1.5);
        assert_eq!(cfg.peak.tolerance, 0.5);
        assert_eq!((cfg.range.high, cfg.range.low), (2, 2));
    }

    #[test]
    fn reports_one_entry_per_level_coarse_first() {
        let vol = plane_at([16, 12, 9], 4);
        let out = refine(&vol, &MultiscaleConfig::default()).expect("refine");

        let shapes: Vec<[usize; 3]> = out.levels.iter().map(|r| r.shape).collect();
        assert_eq!(shapes, vec![[4, 3, 9], [8, 6, 9], [16, 12, 9]]);
        assert_eq!(out.levels[0].band.mean_width, 9.0);
        assert_eq!(out.levels[2].band.mean_width, 5.0);
        assert_eq!(out.depth.shape(), [16, 12]);
    }

    #[test]
    fn plane_is_recovered_at_every_level_count() {
        let vol = plane_at([20, 14, 11], 7);
        for levels in 1..=4 {
            let cfg = MultiscaleConfig {
                levels,
                ..MultiscaleConfig::default()
            };
            let out = refine(&vol, &cfg).expect("refine");
            assert!(
                out.depth.data().iter().all(|&d| (d - 7.0).abs() < 1e-3),
                "levels = {levels}"
            );
        }
    }

    #[test]
    fn output_carries_in_plane_geometry() {
        let geometry = VolumeGeometry {
            spacing: [0.5, 0.75, 3.0],
            origin: [1.0, 2.0, 3.0],
        };
        let vol = plane_at([8, 8, 5], 2).with_geometry(geometry);
        let cfg = MultiscaleConfig {
            axis: Axis::Z,
            ..MultiscaleConfig::default()
        };
        let out = refine(&vol, &cfg).expect("refine");
        assert_eq!(out.depth.geometry().spacing, [0.5, 0.75]);
        assert_eq!(out.depth.geometry().origin, [1.0, 2.0]);
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        let vol = plane_at([4, 4, 3], 1);
        let zero_levels = MultiscaleConfig {
            levels: 0,
            ..MultiscaleConfig::default()
        };
        assert!(refine(&vol, &zero_levels).is_err());

        let negative_sigma = MultiscaleConfig {
            sigma: -1.0,
            ..MultiscaleConfig::default()
        };
        assert!(refine(&vol, &negative_sigma).is_err());
    }
}
