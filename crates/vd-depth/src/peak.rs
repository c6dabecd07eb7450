use vd_core::Error;

/// Which extremum of a profile becomes the depth estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeakMode {
    /// First maximum of the profile.
    #[default]
    MaxOnly,
    /// First peak confirmed by the tolerance rule.
    FirstPeak,
    /// Last peak confirmed by the tolerance rule.
    LastPeak,
}

impl PeakMode {
    /// Maps the numeric codes used on the command line (`0`, `1`, `2`).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::MaxOnly),
            1 => Some(Self::FirstPeak),
            2 => Some(Self::LastPeak),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::MaxOnly => 0,
            Self::FirstPeak => 1,
            Self::LastPeak => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakConfig {
    pub mode: PeakMode,
    /// Drop below a running maximum (or rise above a running minimum) needed
    /// to confirm it as a peak (or valley).
    pub tolerance: f32,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            mode: PeakMode::MaxOnly,
            tolerance: 0.5,
        }
    }
}

impl PeakConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::InvalidParameter {
                name: "tolerance",
                reason: "must be finite and >= 0",
            });
        }
        Ok(())
    }
}

/// Depth of the most relevant sample of `profile`.
///
/// `profile[i]` lies at depth `first_depth + i`. An empty profile yields
/// `first_depth`.
pub fn estimate_depth(profile: &[f32], first_depth: usize, cfg: &PeakConfig) -> usize {
    let offset = match cfg.mode {
        PeakMode::MaxOnly => argmax_first(profile),
        PeakMode::FirstPeak => PeakScan::new(profile, cfg.tolerance)
            .next()
            .or_else(|| argmax_first(profile)),
        PeakMode::LastPeak => PeakScan::new(profile, cfg.tolerance)
            .last()
            .or_else(|| argmax_first(profile)),
    };
    first_depth + offset.unwrap_or(0)
}

/// Index of the first maximum. NaN samples never win.
pub fn argmax_first(profile: &[f32]) -> Option<usize> {
    let mut it = profile.iter().copied().enumerate();
    let mut best = it.next()?;
    for (i, v) in it {
        if v > best.1 || best.1.is_nan() {
            best = (i, v);
        }
    }
    Some(best.0)
}

/// Hysteresis scan yielding the positions of confirmed peaks in order.
///
/// While seeking a peak, a sample more than `tolerance` below the running
/// maximum confirms the maximum. The running minimum restarts at the peak
/// value and the scan resumes right after the peak. Valleys are confirmed
/// the same way with the roles swapped. Every resume point lies strictly
/// after the previous one, so the scan always terminates.
#[derive(Debug, Clone)]
pub struct PeakScan<'a> {
    profile: &'a [f32],
    tolerance: f32,
    pos: usize,
    max: (usize, f32),
    min: (usize, f32),
    seeking_peak: bool,
}

impl<'a> PeakScan<'a> {
    pub fn new(profile: &'a [f32], tolerance: f32) -> Self {
        Self {
            profile,
            tolerance,
            pos: 0,
            max: (0, f32::NEG_INFINITY),
            min: (0, f32::INFINITY),
            seeking_peak: true,
        }
    }
}

impl Iterator for PeakScan<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while let Some(&v) = self.profile.get(self.pos) {
            if v > self.max.1 {
                self.max = (self.pos, v);
            }
            if v < self.min.1 {
                self.min = (self.pos, v);
            }

            if self.seeking_peak {
                if v < self.max.1 - self.tolerance {
                    let peak = self.max.0;
                    self.min = self.max;
                    self.seeking_peak = false;
                    self.pos = peak + 1;
                    return Some(peak);
                }
            } else if v > self.min.1 + self.tolerance {
                let valley = self.min.0;
                self.max = self.min;
                self.seeking_peak = true;
                self.pos = valley + 1;
                continue;
            }
            self.pos += 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use crate::peak::{PeakConfig, PeakMode, PeakScan, argmax_first, estimate_depth};

    fn cfg(mode: PeakMode, tolerance: f32) -> PeakConfig {
        PeakConfig { mode, tolerance }
    }

    #[test]
    fn max_only_picks_first_maximum() {
        let p = [0.0f32, 5.0, 5.0, 2.0];
        assert_eq!(estimate_depth(&p, 0, &cfg(PeakMode::MaxOnly, 0.0)), 1);
        assert_eq!(estimate_depth(&p, 10, &cfg(PeakMode::MaxOnly, 0.0)), 11);
    }

    #[test]
    fn hysteresis_first_and_last_peak() {
        let p = [0.0f32, 10.0, 0.0, 10.0, 0.0];
        assert_eq!(estimate_depth(&p, 0, &cfg(PeakMode::FirstPeak, 3.0)), 1);
        assert_eq!(estimate_depth(&p, 0, &cfg(PeakMode::LastPeak, 3.0)), 3);
        assert_eq!(PeakScan::new(&p, 3.0).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn small_ripples_within_tolerance_are_ignored() {
        let p = [0.0f32, 4.0, 3.5, 4.2, 3.9, 9.0, 1.0];
        assert_eq!(PeakScan::new(&p, 1.0).collect::<Vec<_>>(), vec![5]);
        assert_eq!(estimate_depth(&p, 0, &cfg(PeakMode::FirstPeak, 1.0)), 5);

        // Zero tolerance sees every strict local maximum.
        assert_eq!(PeakScan::new(&p, 0.0).collect::<Vec<_>>(), vec![1, 3, 5]);
    }

    #[test]
    fn no_confirmed_peak_falls_back_to_maximum() {
        let rising = [1.0f32, 2.0, 3.0, 4.0];
        assert_eq!(estimate_depth(&rising, 2, &cfg(PeakMode::FirstPeak, 0.5)), 5);
        assert_eq!(estimate_depth(&rising, 2, &cfg(PeakMode::LastPeak, 0.5)), 5);
    }

    #[test]
    fn empty_profile_returns_band_start() {
        for mode in [PeakMode::MaxOnly, PeakMode::FirstPeak, PeakMode::LastPeak] {
            assert_eq!(estimate_depth(&[], 7, &cfg(mode, 1.0)), 7);
        }
    }

    #[test]
    fn estimation_is_deterministic() {
        let p: Vec<f32> = (0..64).map(|i| ((i * 13) % 7) as f32).collect();
        let c = cfg(PeakMode::LastPeak, 2.0);
        let first = estimate_depth(&p, 0, &c);
        for _ in 0..10 {
            assert_eq!(estimate_depth(&p, 0, &c), first);
        }
    }

    #[test]
    fn argmax_skips_nan() {
        assert_eq!(argmax_first(&[f32::NAN, 1.0, 3.0, 3.0]), Some(2));
        assert_eq!(argmax_first(&[]), None);
    }

    #[test]
    fn mode_codes_round_trip() {
        for code in 0..3 {
            let mode = PeakMode::from_code(code).expect("known code");
            assert_eq!(mode.code(), code);
        }
        assert_eq!(PeakMode::from_code(3), None);
        assert!(cfg(PeakMode::MaxOnly, -1.0).validate().is_err());
        assert!(cfg(PeakMode::MaxOnly, f32::NAN).validate().is_err());
    }
}
