use vd_core::{Axis, Error};

/// Per-level shrink factors of a coarse-to-fine pyramid.
///
/// Level `k` of an `L`-level schedule shrinks every in-plane axis by
/// `2^(L-1-k)`; the projection axis is never shrunk. Level 0 is the
/// coarsest, the last level is native resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    factors: Vec<[usize; 3]>,
}

impl Schedule {
    pub fn from_levels(levels: usize, axis: Axis) -> Result<Self, Error> {
        if levels == 0 {
            return Err(Error::InvalidParameter {
                name: "levels",
                reason: "at least one pyramid level is required",
            });
        }
        if levels > usize::BITS as usize {
            return Err(Error::InvalidParameter {
                name: "levels",
                reason: "shrink factor overflows",
            });
        }

        let factors = (0..levels)
            .map(|k| {
                let f = 1usize << (levels - 1 - k);
                let mut level = [f; 3];
                level[axis.index()] = 1;
                level
            })
            .collect();

        Ok(Self { factors })
    }

    pub fn levels(&self) -> usize {
        self.factors.len()
    }

    pub fn factors(&self, level: usize) -> [usize; 3] {
        self.factors[level]
    }

    pub fn iter(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.factors.iter().copied()
    }

    /// Volume shape at `level` for a native volume of `shape`.
    pub fn level_shape(&self, level: usize, shape: [usize; 3]) -> [usize; 3] {
        shrunk_shape(shape, self.factors[level])
    }
}

/// Extent after shrinking each axis by its factor. Never drops below 1 for a
/// non-empty axis.
pub fn shrunk_shape(shape: [usize; 3], factors: [usize; 3]) -> [usize; 3] {
    let mut out = shape;
    for (n, &f) in out.iter_mut().zip(factors.iter()) {
        if *n > 0 {
            *n = (*n / f.max(1)).max(1);
        }
    }
    out
}
