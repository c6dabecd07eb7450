use std::ops::Range;

use crate::Error;
use crate::image::PlaneGeometry;

/// Rank of every [`Volume`].
pub const VOLUME_RANK: usize = 3;

/// Index of one of the three volume axes.
///
/// Constructed through [`Axis::new`], so holding an `Axis` means the index is
/// valid for a rank-3 volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Axis(usize);

impl Axis {
    pub const X: Axis = Axis(0);
    pub const Y: Axis = Axis(1);
    pub const Z: Axis = Axis(2);

    pub fn new(axis: usize) -> Result<Self, Error> {
        if axis >= VOLUME_RANK {
            return Err(Error::InvalidProjectionAxis {
                axis,
                rank: VOLUME_RANK,
            });
        }
        Ok(Self(axis))
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// The two remaining axes in ascending order. They become the `x` and `y`
    /// axes of a depth map collapsed along `self`.
    pub fn plane_axes(self) -> [Axis; 2] {
        match self.0 {
            0 => [Axis(1), Axis(2)],
            1 => [Axis(0), Axis(2)],
            _ => [Axis(0), Axis(1)],
        }
    }
}

impl Default for Axis {
    fn default() -> Self {
        Self::Z
    }
}

/// Physical placement of a volume, indexed by axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeGeometry {
    pub spacing: [f64; 3],
    pub origin: [f64; 3],
}

impl Default for VolumeGeometry {
    fn default() -> Self {
        Self {
            spacing: [1.0; 3],
            origin: [0.0; 3],
        }
    }
}

impl VolumeGeometry {
    /// Geometry of the plane left after collapsing `axis`.
    pub fn plane(&self, axis: Axis) -> PlaneGeometry {
        let [a, b] = axis.plane_axes();
        PlaneGeometry {
            spacing: [self.spacing[a.index()], self.spacing[b.index()]],
            origin: [self.origin[a.index()], self.origin[b.index()]],
        }
    }
}

/// Dense rank-3 array, x-fastest: the element at `[x, y, z]` lives at
/// `x + nx * (y + ny * z)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume<T> {
    shape: [usize; 3],
    geometry: VolumeGeometry,
    data: Vec<T>,
}

impl<T> Volume<T> {
    pub fn from_vec(shape: [usize; 3], data: Vec<T>) -> Result<Self, Error> {
        let expected = element_count(shape).ok_or(Error::SizeMismatch {
            expected: usize::MAX,
            actual: data.len(),
        })?;
        if data.len() != expected {
            return Err(Error::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            shape,
            geometry: VolumeGeometry::default(),
            data,
        })
    }

    pub fn with_geometry(mut self, geometry: VolumeGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    pub fn geometry(&self) -> VolumeGeometry {
        self.geometry
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub fn strides(&self) -> [usize; 3] {
        strides(self.shape)
    }

    pub fn get(&self, idx: [usize; 3]) -> Option<&T> {
        if idx.iter().zip(self.shape.iter()).any(|(&i, &n)| i >= n) {
            return None;
        }
        let s = self.strides();
        self.data.get(idx[0] * s[0] + idx[1] * s[1] + idx[2] * s[2])
    }

    /// Line layout for walking the volume along `axis`.
    pub fn lines(&self, axis: Axis) -> AxisLines {
        AxisLines::new(self.shape, axis)
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Volume<U> {
        Volume {
            shape: self.shape,
            geometry: self.geometry,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Volume<T> {
    pub fn new_fill(shape: [usize; 3], value: T) -> Self {
        let len = element_count(shape).expect("volume size overflow");
        Self {
            shape,
            geometry: VolumeGeometry::default(),
            data: vec![value; len],
        }
    }
}

fn element_count(shape: [usize; 3]) -> Option<usize> {
    shape[0].checked_mul(shape[1])?.checked_mul(shape[2])
}

fn strides(shape: [usize; 3]) -> [usize; 3] {
    [1, shape[0], shape[0] * shape[1]]
}

/// In-plane shape `[width, height]` of the depth map obtained by collapsing
/// `axis` of a volume with `volume_shape`.
pub fn depth_map_shape(volume_shape: [usize; 3], axis: Axis) -> [usize; 2] {
    let [a, b] = axis.plane_axes();
    [volume_shape[a.index()], volume_shape[b.index()]]
}

/// Addressing of all 1D lines parallel to one axis.
///
/// Line `l` corresponds to the in-plane position `(l % width, l / width)`,
/// which is exactly the depth-map pixel of that column when the axis is the
/// projection axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisLines {
    len: usize,
    stride: usize,
    plane_dims: [usize; 2],
    plane_strides: [usize; 2],
}

impl AxisLines {
    pub fn new(shape: [usize; 3], axis: Axis) -> Self {
        let s = strides(shape);
        let [a, b] = axis.plane_axes();
        Self {
            len: shape[axis.index()],
            stride: s[axis.index()],
            plane_dims: [shape[a.index()], shape[b.index()]],
            plane_strides: [s[a.index()], s[b.index()]],
        }
    }

    /// Number of samples per line.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// `[width, height]` of the plane the lines are indexed by.
    pub fn plane_dims(&self) -> [usize; 2] {
        self.plane_dims
    }

    pub fn count(&self) -> usize {
        self.plane_dims[0] * self.plane_dims[1]
    }

    /// Offset of the first sample of the line at in-plane position `(u, v)`.
    #[inline]
    pub fn offset_at(&self, u: usize, v: usize) -> usize {
        u * self.plane_strides[0] + v * self.plane_strides[1]
    }

    #[inline]
    pub fn offset(&self, line: usize) -> usize {
        let w = self.plane_dims[0].max(1);
        self.offset_at(line % w, line / w)
    }

    /// Copies samples `range` of line `line` into `buf` and returns them.
    pub fn gather<'a, T: Copy>(
        &self,
        data: &[T],
        line: usize,
        range: Range<usize>,
        buf: &'a mut Vec<T>,
    ) -> &'a [T] {
        debug_assert!(range.end <= self.len, "gather range out of line bounds");
        buf.clear();
        let base = self.offset(line);
        if self.stride == 1 {
            buf.extend_from_slice(&data[base + range.start..base + range.end]);
        } else {
            buf.extend(range.map(|k| data[base + k * self.stride]));
        }
        buf
    }
}
