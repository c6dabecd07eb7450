use log::debug;
use rayon::prelude::*;
use vd_core::{Axis, Volume};

/// Neighborhood radius per volume axis for [`windowed_median`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MedianConfig {
    pub radius: [usize; 3],
}

impl MedianConfig {
    /// Square in-plane window of `radius`, no extent along `projection`.
    pub fn in_plane(radius: usize, projection: Axis) -> Self {
        let mut r = [radius; 3];
        r[projection.index()] = 0;
        Self { radius: r }
    }

    pub fn is_identity(&self) -> bool {
        self.radius.iter().all(|&r| r == 0)
    }
}

/// Replaces every voxel by the median of its window. Out-of-volume samples
/// replicate the nearest edge voxel, so every window has an odd number of
/// samples and the median is one of them.
pub fn windowed_median(src: &Volume<f32>, cfg: &MedianConfig) -> Volume<f32> {
    if cfg.is_identity() || src.is_empty() {
        return src.clone();
    }
    debug!(
        "windowed_median shape={:?} radius={:?}",
        src.shape(),
        cfg.radius
    );

    let shape = src.shape();
    let [nx, ny, nz] = shape;
    let r = cfg.radius;
    let window_len: usize = r.iter().map(|&ri| 2 * ri + 1).product();

    let mut out = src.clone();
    out.data_mut().par_chunks_mut(nx * ny).enumerate().for_each_init(
        || Vec::with_capacity(window_len),
        |window, (z, slice)| {
            for y in 0..ny {
                for x in 0..nx {
                    window.clear();
                    for dz in -(r[2] as isize)..=r[2] as isize {
                        let zz = clamp_index(z, dz, nz);
                        for dy in -(r[1] as isize)..=r[1] as isize {
                            let yy = clamp_index(y, dy, ny);
                            let row = (zz * ny + yy) * nx;
                            for dx in -(r[0] as isize)..=r[0] as isize {
                                window.push(src.data()[row + clamp_index(x, dx, nx)]);
                            }
                        }
                    }
                    let mid = window.len() / 2;
                    let (_, m, _) = window.select_nth_unstable_by(mid, f32::total_cmp);
                    slice[y * nx + x] = *m;
                }
            }
        },
    );
    out
}

#[inline]
fn clamp_index(i: usize, d: isize, n: usize) -> usize {
    (i as isize + d).clamp(0, n as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use vd_core::{Axis, Volume};

    use crate::median::{MedianConfig, windowed_median};

    #[test]
    fn removes_isolated_spike() {
        let mut vol = Volume::new_fill([5, 5, 2], 1.0f32);
        let spike = 2 + 5 * 2;
        vol.data_mut()[spike] = 50.0;

        let out = windowed_median(&vol, &MedianConfig::in_plane(1, Axis::Z));
        assert!(out.data().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn zero_radius_is_identity() {
        let vol = Volume::from_vec([3, 1, 1], vec![3.0f32, 1.0, 2.0]).expect("valid");
        let out = windowed_median(&vol, &MedianConfig::in_plane(0, Axis::Z));
        assert_eq!(out, vol);
    }

    #[test]
    fn edges_replicate() {
        // Row [0, 10, 20] with radius 1 along x: the left window is {0, 0, 10}.
        let vol = Volume::from_vec([3, 1, 1], vec![0.0f32, 10.0, 20.0]).expect("valid");
        let cfg = MedianConfig { radius: [1, 0, 0] };
        let out = windowed_median(&vol, &cfg);
        assert_eq!(out.data(), &[0.0, 10.0, 20.0]);
    }

    #[test]
    fn in_plane_window_skips_projection_axis() {
        let vol = Volume::from_vec([1, 1, 3], vec![0.0f32, 9.0, 5.0]).expect("valid");

        // Projecting along x puts z in-plane, so z-neighbours are mixed.
        let out_x = windowed_median(&vol, &MedianConfig::in_plane(1, Axis::X));
        assert_eq!(out_x.data(), &[0.0, 5.0, 5.0]);

        let out_z = windowed_median(&vol, &MedianConfig::in_plane(1, Axis::Z));
        assert_eq!(out_z, vol);
    }
}
