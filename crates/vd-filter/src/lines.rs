use rayon::prelude::*;
use vd_core::{Axis, Volume};

/// Applies `f` to every line of `src` parallel to `axis`.
///
/// `f(input, output, scratch)` receives one gathered line and the matching
/// output line; `scratch` is a per-worker buffer reused across lines. Lines
/// are independent, so they run in parallel.
pub fn map_lines<T, U, F>(src: &Volume<T>, axis: Axis, f: F) -> Volume<U>
where
    T: Copy + Send + Sync,
    U: Copy + Default + Send + Sync,
    F: Fn(&[T], &mut [U], &mut Vec<T>) + Sync,
{
    let shape = src.shape();
    let lines = src.lines(axis);
    let len = lines.len();

    let mut data = vec![U::default(); src.len()];
    if src.is_empty() {
        return Volume::from_vec(shape, data)
            .expect("shape matches buffer")
            .with_geometry(src.geometry());
    }

    // Line-major scratch: packed[line * len + k] is sample k of `line`.
    let mut packed = vec![U::default(); src.len()];
    packed.par_chunks_mut(len).enumerate().for_each_init(
        || (Vec::new(), Vec::new()),
        |(gathered, scratch), (line, out)| {
            let input = lines.gather(src.data(), line, 0..len, gathered);
            f(input, out, scratch);
        },
    );

    let [a, b] = axis.plane_axes();
    let width = shape[a.index()];
    let slice_len = shape[0] * shape[1];
    data.par_chunks_mut(slice_len)
        .enumerate()
        .for_each(|(z, slice)| {
            for (i, dst) in slice.iter_mut().enumerate() {
                let c = [i % shape[0], i / shape[0], z];
                let line = c[a.index()] + width * c[b.index()];
                *dst = packed[line * len + c[axis.index()]];
            }
        });

    Volume::from_vec(shape, data)
        .expect("shape matches buffer")
        .with_geometry(src.geometry())
}

#[cfg(test)]
mod tests {
    use vd_core::{Axis, Volume};

    use crate::lines::map_lines;

    #[test]
    fn prefix_sum_along_each_axis() {
        let shape = [3, 4, 2];
        let vol = Volume::new_fill(shape, 1u32);

        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let out = map_lines(&vol, axis, |line: &[u32], out: &mut [u32], _| {
                let mut acc = 0;
                for (o, &v) in out.iter_mut().zip(line) {
                    acc += v;
                    *o = acc;
                }
            });

            for z in 0..shape[2] {
                for y in 0..shape[1] {
                    for x in 0..shape[0] {
                        let expected = [x, y, z][axis.index()] as u32 + 1;
                        assert_eq!(out.get([x, y, z]), Some(&expected));
                    }
                }
            }
        }
    }

    #[test]
    fn empty_volume_passes_through() {
        let vol = Volume::<f32>::new_fill([0, 4, 2], 0.0);
        let out = map_lines(&vol, Axis::Z, |_: &[f32], _: &mut [f32], _| {});
        assert_eq!(out.shape(), [0, 4, 2]);
    }
}
