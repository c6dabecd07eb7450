use std::ops::Range;

/// Extent of a band around its centre depth.
///
/// `high` counts samples towards smaller depths, `low` towards larger ones,
/// so the band around centre `c` is `[c - high, c + low]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandRange {
    pub high: usize,
    pub low: usize,
}

impl BandRange {
    pub fn new(high: usize, low: usize) -> Self {
        Self { high, low }
    }
}

impl Default for BandRange {
    fn default() -> Self {
        Self { high: 2, low: 2 }
    }
}

/// Inclusive depth interval `[low, high]` inside an axis of length `len`.
///
/// Always non-empty: `low <= high < len`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBand {
    pub low: usize,
    pub high: usize,
}

impl SearchBand {
    /// Whole axis. `None` for an empty axis.
    pub fn full(len: usize) -> Option<Self> {
        (len > 0).then(|| Self {
            low: 0,
            high: len - 1,
        })
    }

    /// `[centre - range.high, centre + range.low]` clamped to the axis.
    ///
    /// A centre far outside the axis collapses the band onto the nearest end
    /// sample instead of emptying it.
    pub fn around(centre: isize, range: BandRange, len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let last = len as isize - 1;
        let low = centre.saturating_sub_unsigned(range.high).clamp(0, last);
        let high = centre.saturating_add_unsigned(range.low).clamp(0, last);
        Some(Self {
            low: low as usize,
            high: high as usize,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.high - self.low + 1
    }

    pub fn range(&self) -> Range<usize> {
        self.low..self.high + 1
    }
}

/// Band centre for a floating point depth, rounded to the nearest sample.
#[inline]
pub fn nearest_centre(depth: f32) -> isize {
    depth.round() as isize
}

/// Band centre for a floating point depth: `depth + shift`, truncated
/// towards zero after the shift is added.
#[inline]
pub fn truncated_centre(depth: f32, shift: i32) -> isize {
    (depth as f64 + shift as f64) as isize
}

#[cfg(test)]
mod tests {
    use crate::band::{BandRange, SearchBand, nearest_centre, truncated_centre};

    #[test]
    fn band_is_clamped_never_empty() {
        let band = SearchBand::around(100, BandRange::new(2, 2), 10).expect("non-empty axis");
        assert_eq!((band.low, band.high), (9, 9));
        assert_eq!(band.len(), 1);

        let band = SearchBand::around(-50, BandRange::new(2, 2), 10).expect("non-empty axis");
        assert_eq!((band.low, band.high), (0, 0));
    }

    #[test]
    fn asymmetric_range() {
        let band = SearchBand::around(5, BandRange::new(1, 3), 20).expect("non-empty axis");
        assert_eq!(band.range(), 4..9);
    }

    #[test]
    fn full_band_and_empty_axis() {
        assert_eq!(SearchBand::full(4), Some(SearchBand { low: 0, high: 3 }));
        assert_eq!(SearchBand::full(0), None);
        assert_eq!(SearchBand::around(0, BandRange::default(), 0), None);
    }

    #[test]
    fn extreme_centres_do_not_overflow() {
        let band = SearchBand::around(isize::MAX, BandRange::new(0, usize::MAX), 3)
            .expect("non-empty axis");
        assert_eq!((band.low, band.high), (2, 2));
    }

    #[test]
    fn centre_rounding_rules() {
        assert_eq!(nearest_centre(2.5), 3);
        assert_eq!(nearest_centre(2.49), 2);
        assert_eq!(truncated_centre(2.9, 0), 2);
        assert_eq!(truncated_centre(2.9, -3), 0);
        assert_eq!(truncated_centre(0.5, -1), 0);
        assert_eq!(truncated_centre(-0.7, 1), 0);
        assert_eq!(truncated_centre(-1.5, 0), -1);
    }
}
