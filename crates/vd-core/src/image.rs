use crate::Error;

/// Physical placement of a 2D array: per-axis spacing and origin, in the
/// order `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneGeometry {
    pub spacing: [f64; 2],
    pub origin: [f64; 2],
}

impl Default for PlaneGeometry {
    fn default() -> Self {
        Self {
            spacing: [1.0, 1.0],
            origin: [0.0, 0.0],
        }
    }
}

/// Dense row-major 2D array. Depth maps and projections are `Image`s.
#[derive(Debug, Clone, PartialEq)]
pub struct Image<T> {
    width: usize,
    height: usize,
    geometry: PlaneGeometry,
    data: Vec<T>,
}

impl<T> Image<T> {
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self, Error> {
        let expected = width.checked_mul(height).ok_or(Error::SizeMismatch {
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
            width,
            height,
            geometry: PlaneGeometry::default(),
            data,
        })
    }

    pub fn with_geometry(mut self, geometry: PlaneGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `[width, height]`, the in-plane shape used for shape checks.
    pub fn shape(&self) -> [usize; 2] {
        [self.width, self.height]
    }

    pub fn geometry(&self) -> PlaneGeometry {
        self.geometry
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

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row index out of bounds");
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Element-wise conversion that keeps shape and geometry.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Image<U> {
        Image {
            width: self.width,
            height: self.height,
            geometry: self.geometry,
            data: self.data.iter().map(f).collect(),
        }
    }
}

impl<T: Clone> Image<T> {
    pub fn new_fill(width: usize, height: usize, value: T) -> Self {
        let len = width.checked_mul(height).expect("image size overflow");
        Self {
            width,
            height,
            geometry: PlaneGeometry::default(),
            data: vec![value; len],
        }
    }
}
