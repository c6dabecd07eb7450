/// Out-of-range policy for neighborhood filters.
///
/// `Clamp` replicates the edge sample (zero-flux Neumann), `Constant` pads
/// with a fixed value and `Reflect101` mirrors without repeating the edge.
#[derive(Debug, Clone, PartialEq)]
pub enum BorderMode<T> {
    Clamp,
    Constant(T),
    Reflect101,
}

/// Maps a possibly out-of-range index into `[0, len)`.
///
/// Returns `None` for `Constant` borders when `i` falls outside, and for
/// empty lines.
pub fn map_index<T>(i: isize, len: usize, mode: &BorderMode<T>) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if i >= 0 && (i as usize) < len {
        return Some(i as usize);
    }

    match mode {
        BorderMode::Constant(_) => None,
        BorderMode::Clamp => Some(if i < 0 { 0 } else { len - 1 }),
        BorderMode::Reflect101 => {
            if len == 1 {
                return Some(0);
            }
            let period = (2 * len - 2) as isize;
            let r = i.rem_euclid(period) as usize;
            Some(if r < len { r } else { period as usize - r })
        }
    }
}

/// Reads `line[i]` under the given border policy.
#[inline]
pub fn fetch<T: Copy>(line: &[T], i: isize, mode: &BorderMode<T>) -> Option<T> {
    match map_index(i, line.len(), mode) {
        Some(idx) => Some(line[idx]),
        None => match mode {
            BorderMode::Constant(c) => Some(*c),
            _ => None,
        },
    }
}

/// Writes `line` extended by `radius` samples on both sides into `out`.
///
/// After the call `out.len() == line.len() + 2 * radius` and `out[radius + i]`
/// is `line[i]`. Empty lines produce an empty buffer.
pub fn pad_line<T: Copy>(line: &[T], radius: usize, mode: &BorderMode<T>, out: &mut Vec<T>) {
    out.clear();
    if line.is_empty() {
        return;
    }
    out.reserve(line.len() + 2 * radius);

    for k in 0..radius {
        let i = k as isize - radius as isize;
        if let Some(v) = fetch(line, i, mode) {
            out.push(v);
        }
    }
    out.extend_from_slice(line);
    for k in 0..radius {
        let i = (line.len() + k) as isize;
        if let Some(v) = fetch(line, i, mode) {
            out.push(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BorderMode, fetch, map_index, pad_line};

    #[test]
    fn clamp_replicates_edges() {
        let mode = BorderMode::<f32>::Clamp;

        assert_eq!(map_index(-3, 5, &mode), Some(0));
        assert_eq!(map_index(0, 5, &mode), Some(0));
        assert_eq!(map_index(4, 5, &mode), Some(4));
        assert_eq!(map_index(17, 5, &mode), Some(4));
        assert_eq!(map_index(0, 0, &mode), None);
    }

    #[test]
    fn reflect101_mirrors_without_repeating_edge() {
        let mode = BorderMode::<f32>::Reflect101;

        for i in -6..=6 {
            assert_eq!(map_index(i, 1, &mode), Some(0));
        }

        let expected = [(-4, 4), (-2, 2), (-1, 1), (0, 0), (4, 4), (5, 3), (7, 1), (8, 0)];
        for (i, idx) in expected {
            assert_eq!(map_index(i, 5, &mode), Some(idx), "i = {i}");
        }
    }

    #[test]
    fn constant_border_reads_fill_value() {
        let line = [3.0f64, 4.0];
        let mode = BorderMode::Constant(0.0);

        assert_eq!(map_index(-1, 2, &mode), None);
        assert_eq!(fetch(&line, -1, &mode), Some(0.0));
        assert_eq!(fetch(&line, 1, &mode), Some(4.0));
        assert_eq!(fetch(&line, 2, &mode), Some(0.0));
    }

    #[test]
    fn pad_line_matches_border_policy() {
        let line = [1u8, 2, 3];
        let mut out = Vec::new();

        pad_line(&line, 2, &BorderMode::Clamp, &mut out);
        assert_eq!(out, vec![1, 1, 1, 2, 3, 3, 3]);

        pad_line(&line, 2, &BorderMode::Constant(9), &mut out);
        assert_eq!(out, vec![9, 9, 1, 2, 3, 9, 9]);

        pad_line(&line, 2, &BorderMode::Reflect101, &mut out);
        assert_eq!(out, vec![3, 2, 1, 2, 3, 2, 1]);
    }
}
