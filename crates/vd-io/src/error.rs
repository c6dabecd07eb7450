use std::fmt;
use std::io;

pub type IoResult<T> = Result<T, IoError>;

#[derive(Debug)]
pub enum IoError {
    Io(io::Error),
    /// Malformed or unsupported MetaImage header.
    Header(String),
    /// File extension or pixel layout this crate does not handle.
    Format(String),
    Image(image::ImageError),
    /// Decoded data violates a shape or rank requirement.
    Data(vd_core::Error),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::Header(msg) => write!(f, "invalid MetaImage header: {msg}"),
            Self::Format(msg) => write!(f, "unsupported format: {msg}"),
            Self::Image(e) => write!(f, "image codec error: {e}"),
            Self::Data(e) => write!(f, "invalid data: {e}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Image(e) => Some(e),
            Self::Data(e) => Some(e),
            Self::Header(_) | Self::Format(_) => None,
        }
    }
}

impl From<io::Error> for IoError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<image::ImageError> for IoError {
    fn from(e: image::ImageError) -> Self {
        Self::Image(e)
    }
}

impl From<vd_core::Error> for IoError {
    fn from(e: vd_core::Error) -> Self {
        Self::Data(e)
    }
}
