use log::debug;
use rayon::prelude::*;
use vd_core::{Axis, BorderMode, Error, Volume};

use crate::conv1d::box_sum_f64;
use crate::lines::map_lines;

/// Neighborhood radius per volume axis for [`windowed_variance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarianceConfig {
    pub radius: [usize; 3],
}

impl VarianceConfig {
    /// Square in-plane window of `radius`, no extent along `projection`.
    pub fn in_plane(radius: usize, projection: Axis) -> Self {
        let mut r = [radius; 3];
        r[projection.index()] = 0;
        Self { radius: r }
    }
}

impl Default for VarianceConfig {
    fn default() -> Self {
        Self::in_plane(15, Axis::default())
    }
}

/// Replaces every voxel by the variance `E[x²] − E[x]²` of its window.
///
/// Without a mask the window is always full size and out-of-volume samples
/// replicate the nearest edge voxel. With a mask only voxels whose mask value
/// is non-zero contribute, out-of-volume samples never contribute, and a
/// window without contributing voxels yields 0.
pub fn windowed_variance(
    src: &Volume<f32>,
    cfg: &VarianceConfig,
    mask: Option<&Volume<u8>>,
) -> Result<Volume<f32>, Error> {
    if let Some(m) = mask
        && m.shape() != src.shape()
    {
        return Err(Error::ShapeMismatch {
            expected: src.shape().to_vec(),
            actual: m.shape().to_vec(),
        });
    }

    debug!(
        "windowed_variance shape={:?} radius={:?} masked={}",
        src.shape(),
        cfg.radius,
        mask.is_some()
    );

    let out = match mask {
        None => unmasked(src, cfg),
        Some(m) => masked(src, m, cfg),
    };
    Ok(out)
}

fn unmasked(src: &Volume<f32>, cfg: &VarianceConfig) -> Volume<f32> {
    let border = BorderMode::Clamp;
    let s1 = box_all_axes(src.map(|&v| v as f64), cfg, &border);
    let s2 = box_all_axes(src.map(|&v| (v as f64) * (v as f64)), cfg, &border);

    let count: f64 = cfg.radius.iter().map(|&r| (2 * r + 1) as f64).product();
    let mut out = src.map(|_| 0.0f32);
    out.data_mut()
        .par_iter_mut()
        .zip(s1.data().par_iter().zip(s2.data().par_iter()))
        .for_each(|(o, (&sum, &sum_sq))| {
            let mean = sum / count;
            *o = (sum_sq / count - mean * mean) as f32;
        });
    out
}

fn masked(src: &Volume<f32>, mask: &Volume<u8>, cfg: &VarianceConfig) -> Volume<f32> {
    let border = BorderMode::Constant(0.0);
    let weight = |i: usize| if mask.data()[i] != 0 { 1.0f64 } else { 0.0 };

    let mut values = src.map(|&v| v as f64);
    for (i, v) in values.data_mut().iter_mut().enumerate() {
        *v *= weight(i);
    }
    let squares = values.map(|&v| v * v);
    let counts = mask.map(|&m| if m != 0 { 1.0f64 } else { 0.0 });

    let s1 = box_all_axes(values, cfg, &border);
    let s2 = box_all_axes(squares, cfg, &border);
    let n = box_all_axes(counts, cfg, &border);

    let mut out = src.map(|_| 0.0f32);
    out.data_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, o)| {
            let num = n.data()[i];
            // Counts are sums of exact 0/1 values, so < 0.5 means "no sample".
            *o = if num < 0.5 {
                0.0
            } else {
                let mean = s1.data()[i] / num;
                (s2.data()[i] / num - mean * mean) as f32
            };
        });
    out
}

fn box_all_axes(mut vol: Volume<f64>, cfg: &VarianceConfig, border: &BorderMode<f64>) -> Volume<f64> {
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let radius = cfg.radius[axis.index()];
        if radius == 0 {
            continue;
        }
        vol = map_lines(&vol, axis, |line: &[f64], out: &mut [f64], scratch| {
            box_sum_f64(line, radius, border, scratch, out);
        });
    }
    vol
}

#[cfg(test)]
mod tests {
    use vd_core::{Axis, Volume};

    use crate::variance::{VarianceConfig, windowed_variance};

    fn direct_variance(vol: &Volume<f32>, p: [usize; 3], r: [usize; 3]) -> f64 {
        let shape = vol.shape();
        let mut sum = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut n = 0.0f64;
        for dz in -(r[2] as isize)..=r[2] as isize {
            for dy in -(r[1] as isize)..=r[1] as isize {
                for dx in -(r[0] as isize)..=r[0] as isize {
                    let q = [
                        (p[0] as isize + dx).clamp(0, shape[0] as isize - 1) as usize,
                        (p[1] as isize + dy).clamp(0, shape[1] as isize - 1) as usize,
                        (p[2] as isize + dz).clamp(0, shape[2] as isize - 1) as usize,
                    ];
                    let v = *vol.get(q).expect("clamped index") as f64;
                    sum += v;
                    sum_sq += v * v;
                    n += 1.0;
                }
            }
        }
        let mean = sum / n;
        sum_sq / n - mean * mean
    }

    fn noisy_volume(shape: [usize; 3]) -> Volume<f32> {
        let n = shape[0] * shape[1] * shape[2];
        let data = (0..n).map(|i| ((i * 37 + 11) % 23) as f32).collect();
        Volume::from_vec(shape, data).expect("valid volume")
    }

    #[test]
    fn constant_volume_has_zero_variance() {
        let vol = Volume::new_fill([6, 5, 3], 7.0f32);
        let out = windowed_variance(&vol, &VarianceConfig::in_plane(2, Axis::Z), None)
            .expect("variance");
        assert!(out.data().iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn unmasked_matches_direct_window_with_replicated_edges() {
        let vol = noisy_volume([7, 6, 3]);
        let cfg = VarianceConfig::in_plane(2, Axis::Z);
        let out = windowed_variance(&vol, &cfg, None).expect("variance");

        for p in [[0, 0, 0], [3, 2, 1], [6, 5, 2], [1, 5, 0]] {
            let expected = direct_variance(&vol, p, cfg.radius);
            let got = *out.get(p).expect("in bounds") as f64;
            assert!((got - expected).abs() < 1e-3, "p = {p:?}: {got} vs {expected}");
        }
    }

    #[test]
    fn projection_axis_is_not_mixed() {
        // Two z-slices with different constant values: in-plane windows never
        // see the other slice, so the variance stays zero.
        let mut vol = Volume::new_fill([4, 4, 2], 1.0f32);
        for v in &mut vol.data_mut()[16..] {
            *v = 9.0;
        }
        let out = windowed_variance(&vol, &VarianceConfig::in_plane(1, Axis::Z), None)
            .expect("variance");
        assert!(out.data().iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn masked_ignores_excluded_voxels_and_outside() {
        // Row of values [0, 2, 4, 100] with the outlier masked out.
        let vol = Volume::from_vec([4, 1, 1], vec![0.0f32, 2.0, 4.0, 100.0]).expect("valid");
        let mask = Volume::from_vec([4, 1, 1], vec![1u8, 1, 1, 0]).expect("valid");
        let cfg = VarianceConfig { radius: [1, 0, 0] };
        let out = windowed_variance(&vol, &cfg, Some(&mask)).expect("variance");

        // x=0 sees {0, 2}: variance 1. x=2 sees {2, 4}: variance 1.
        assert!((out.data()[0] - 1.0).abs() < 1e-6);
        assert!((out.data()[1] - 8.0 / 3.0).abs() < 1e-5);
        assert!((out.data()[2] - 1.0).abs() < 1e-6);
        // x=3 sees only x=2.
        assert!(out.data()[3].abs() < 1e-6);
    }

    #[test]
    fn fully_masked_window_outputs_zero() {
        let vol = Volume::new_fill([3, 3, 1], 5.0f32);
        let mask = Volume::new_fill([3, 3, 1], 0u8);
        let out = windowed_variance(&vol, &VarianceConfig::in_plane(1, Axis::Z), Some(&mask))
            .expect("variance");
        assert!(out.data().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn mask_shape_must_match() {
        let vol = Volume::new_fill([3, 3, 1], 5.0f32);
        let mask = Volume::new_fill([3, 3, 2], 1u8);
        assert!(windowed_variance(&vol, &VarianceConfig::default(), Some(&mask)).is_err());
    }
}
