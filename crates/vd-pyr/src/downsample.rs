use std::borrow::Cow;

use rayon::prelude::*;
use vd_core::{Volume, VolumeGeometry};

use crate::schedule::shrunk_shape;

/// Block-mean shrink of a volume by an integer factor per axis.
///
/// Output voxel `i` along an axis averages source samples
/// `[i*f, min(i*f + f, n))`. Trailing samples that do not fill a block are
/// dropped, except when `n < f`, where the single output voxel averages the
/// whole axis.
pub fn block_mean(src: &Volume<f32>, factors: [usize; 3]) -> Volume<f32> {
    let shape = src.shape();
    let out_shape = shrunk_shape(shape, factors);
    let block = [0, 1, 2].map(|a| factors[a].max(1).min(shape[a].max(1)));

    let [ox, oy, _] = out_shape;
    let [nx, ny, _] = shape;
    let mut data = vec![0.0f32; out_shape.iter().product()];

    if !data.is_empty() {
        let src_data = src.data();
        data.par_chunks_mut(ox * oy)
            .enumerate()
            .for_each(|(z, slice)| {
                let z0 = z * block[2];
                for y in 0..oy {
                    let y0 = y * block[1];
                    for x in 0..ox {
                        let x0 = x * block[0];
                        let mut sum = 0.0f64;
                        for zz in z0..z0 + block[2] {
                            for yy in y0..y0 + block[1] {
                                let row = (zz * ny + yy) * nx;
                                sum += src_data[row + x0..row + x0 + block[0]]
                                    .iter()
                                    .map(|&v| v as f64)
                                    .sum::<f64>();
                            }
                        }
                        let count = (block[0] * block[1] * block[2]) as f64;
                        slice[y * ox + x] = (sum / count) as f32;
                    }
                }
            });
    }

    let g = src.geometry();
    let mut geometry = VolumeGeometry::default();
    for a in 0..3 {
        let f = block[a] as f64;
        geometry.spacing[a] = g.spacing[a] * f;
        geometry.origin[a] = g.origin[a] + 0.5 * (f - 1.0) * g.spacing[a];
    }

    Volume::from_vec(out_shape, data)
        .expect("shrunk shape matches buffer")
        .with_geometry(geometry)
}

/// Volume of one pyramid level. Factors of 1 on every axis borrow `src`.
pub fn level_volume(src: &Volume<f32>, factors: [usize; 3]) -> Cow<'_, Volume<f32>> {
    if factors.iter().all(|&f| f <= 1) {
        Cow::Borrowed(src)
    } else {
        Cow::Owned(block_mean(src, factors))
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use vd_core::{Volume, VolumeGeometry};

    use crate::downsample::{block_mean, level_volume};

    #[test]
    fn block_mean_on_4x4_known_values() {
        let src = Volume::from_vec(
            [4, 4, 1],
            vec![
                0.0f32, 1.0, 2.0, 3.0, //
                4.0, 5.0, 6.0, 7.0, //
                8.0, 9.0, 10.0, 11.0, //
                12.0, 13.0, 14.0, 15.0, //
            ],
        )
        .expect("valid volume");

        let dst = block_mean(&src, [2, 2, 1]);
        assert_eq!(dst.shape(), [2, 2, 1]);
        assert_eq!(dst.data(), &[2.5, 4.5, 10.5, 12.5]);
    }

    #[test]
    fn odd_extent_drops_trailing_samples() {
        let src = Volume::from_vec(
            [5, 3, 1],
            vec![
                1.0f32, 2.0, 3.0, 4.0, 5.0, //
                6.0, 7.0, 8.0, 9.0, 10.0, //
                11.0, 12.0, 13.0, 14.0, 15.0, //
            ],
        )
        .expect("valid volume");

        let dst = block_mean(&src, [2, 2, 1]);
        assert_eq!(dst.shape(), [2, 1, 1]);
        assert_eq!(dst.data(), &[4.0, 6.0]);
    }

    #[test]
    fn factor_larger_than_axis_averages_whole_axis() {
        let src = Volume::from_vec([3, 1, 2], vec![1.0f32, 2.0, 6.0, 0.0, 0.0, 3.0])
            .expect("valid volume");
        let dst = block_mean(&src, [8, 8, 1]);
        assert_eq!(dst.shape(), [1, 1, 2]);
        assert_eq!(dst.data(), &[3.0, 1.0]);
    }

    #[test]
    fn projection_axis_samples_stay_separate() {
        let src = Volume::from_vec(
            [2, 2, 2],
            vec![1.0f32, 1.0, 1.0, 1.0, 5.0, 5.0, 5.0, 5.0],
        )
        .expect("valid volume");
        let dst = block_mean(&src, [2, 2, 1]);
        assert_eq!(dst.data(), &[1.0, 5.0]);
    }

    #[test]
    fn geometry_follows_block_centres() {
        let geometry = VolumeGeometry {
            spacing: [1.0, 0.5, 2.0],
            origin: [0.0, 0.0, 10.0],
        };
        let src = Volume::new_fill([4, 4, 3], 0.0f32).with_geometry(geometry);
        let dst = block_mean(&src, [2, 2, 1]);
        assert_eq!(dst.geometry().spacing, [2.0, 1.0, 2.0]);
        assert_eq!(dst.geometry().origin, [0.5, 0.25, 10.0]);
    }

    #[test]
    fn native_level_is_borrowed() {
        let src = Volume::new_fill([2, 2, 2], 1.0f32);
        assert!(matches!(level_volume(&src, [1, 1, 1]), Cow::Borrowed(_)));
        assert!(matches!(level_volume(&src, [2, 2, 1]), Cow::Owned(_)));
    }
}
