use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Buffer length does not match the element count implied by the shape.
    SizeMismatch { expected: usize, actual: usize },
    /// Projection axis does not index an axis of the volume.
    InvalidProjectionAxis { axis: usize, rank: usize },
    /// Array rank differs from what the operation requires.
    RankMismatch { expected: usize, actual: usize },
    /// In-plane extent of a depth map differs from the volume it belongs to.
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
    InvalidParameter {
        name: &'static str,
        reason: &'static str,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeMismatch { expected, actual } => {
                write!(f, "size mismatch: expected {expected}, got {actual}")
            }
            Self::InvalidProjectionAxis { axis, rank } => {
                write!(
                    f,
                    "invalid projection axis {axis} for an array of rank {rank}"
                )
            }
            Self::RankMismatch { expected, actual } => {
                write!(f, "rank mismatch: expected {expected}, got {actual}")
            }
            Self::ShapeMismatch { expected, actual } => {
                write!(f, "shape mismatch: expected {expected:?}, got {actual:?}")
            }
            Self::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter `{name}`: {reason}")
            }
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::Error;

    #[test]
    fn display_names_the_offending_values() {
        let err = Error::InvalidProjectionAxis { axis: 3, rank: 3 };
        assert_eq!(
            err.to_string(),
            "invalid projection axis 3 for an array of rank 3"
        );

        let err = Error::ShapeMismatch {
            expected: vec![4, 5],
            actual: vec![5, 4],
        };
        assert_eq!(err.to_string(), "shape mismatch: expected [4, 5], got [5, 4]");
    }
}
