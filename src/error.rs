// MIT/Apache2 License

use crate::image::{ImageFormat, LimitExceeded};
use std::{collections::TryReserveError, fmt, io};

/// Sum error type for gdiplus-compat operations.
#[derive(Debug)]
pub enum Error {
    /// A buffer or table could not be allocated.
    OutOfMemory,
    /// An argument was rejected before any state was touched.
    InvalidArgument(InvalidArgument),
    /// The image format is not recognized, or no codec handles it.
    ///
    /// `None` means no magic bytes matched at all.
    UnsupportedFormat(Option<ImageFormat>),
    /// The source ended before the codec had read everything it needed.
    Truncated,
    /// The encoded data is malformed.
    InvalidData(&'static str),
    /// The image exceeds a configured resource limit.
    LimitExceeded(LimitExceeded),
    /// An I/O error occurred while opening or writing a file.
    Io(io::Error),
}

/// Why an argument was rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum InvalidArgument {
    /// A table needs at least two entries.
    TooFewEntries,
    /// Two parallel slices have different lengths.
    LengthMismatch,
    /// A value was NaN.
    NotANumber,
    /// A value fell outside its permitted range.
    OutOfRange,
    /// Table positions do not strictly increase.
    Unordered,
    /// `WrapMode::Clamp` is not valid for linear gradients.
    ClampWrapMode,
    /// The matrix has no inverse.
    SingularMatrix,
    /// The two points of a gradient line coincide, or the rectangle is empty.
    DegenerateGradient,
    /// A stream buffer cannot have a capacity of zero.
    ZeroCapacity,
    /// The pixel format cannot be used for this operation.
    UnsupportedPixelFormat,
    /// An image must have a width and height of at least one pixel.
    EmptyImage,
}

/// Status codes of the flat GDI+ API, with their numeric values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u32)]
pub enum Status {
    Ok = 0,
    GenericError = 1,
    InvalidParameter = 2,
    OutOfMemory = 3,
    ObjectBusy = 4,
    InsufficientBuffer = 5,
    NotImplemented = 6,
    Win32Error = 7,
    WrongState = 8,
    Aborted = 9,
    FileNotFound = 10,
    ValueOverflow = 11,
    AccessDenied = 12,
    UnknownImageFormat = 13,
}

impl Error {
    /// The GDI+ status a flat entry point reports for this error.
    #[inline]
    pub fn status(&self) -> Status {
        match self {
            Self::OutOfMemory => Status::OutOfMemory,
            Self::InvalidArgument(_) => Status::InvalidParameter,
            Self::UnsupportedFormat(None) => Status::UnknownImageFormat,
            Self::UnsupportedFormat(Some(_)) => Status::NotImplemented,
            Self::Truncated | Self::InvalidData(_) => Status::InvalidParameter,
            Self::LimitExceeded(_) => Status::ValueOverflow,
            Self::Io(e) => match e.kind() {
                io::ErrorKind::NotFound => Status::FileNotFound,
                io::ErrorKind::PermissionDenied => Status::AccessDenied,
                _ => Status::GenericError,
            },
        }
    }
}

/// Map a result onto a flat GDI+ status code.
#[inline]
pub fn status_of<T>(result: &Result<T>) -> Status {
    match result {
        Ok(_) => Status::Ok,
        Err(e) => e.status(),
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => f.write_str("Out of memory"),
            Self::InvalidArgument(arg) => write!(f, "Invalid argument: {}", arg),
            Self::UnsupportedFormat(None) => f.write_str("Unrecognized image format"),
            Self::UnsupportedFormat(Some(format)) => {
                write!(f, "No codec available for {:?} images", format)
            }
            Self::Truncated => f.write_str("Image data ended unexpectedly"),
            Self::InvalidData(msg) => write!(f, "Invalid image data: {}", msg),
            Self::LimitExceeded(limit) => fmt::Display::fmt(limit, f),
            Self::Io(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::TooFewEntries => "at least two entries are required",
            Self::LengthMismatch => "slices differ in length",
            Self::NotANumber => "value is NaN",
            Self::OutOfRange => "value is out of range",
            Self::Unordered => "positions must strictly increase",
            Self::ClampWrapMode => "clamp wrap mode is not allowed here",
            Self::SingularMatrix => "matrix is not invertible",
            Self::DegenerateGradient => "gradient has no extent",
            Self::ZeroCapacity => "capacity must be non-zero",
            Self::UnsupportedPixelFormat => "pixel format is not supported",
            Self::EmptyImage => "image has no pixels",
        })
    }
}

impl From<InvalidArgument> for Error {
    #[inline]
    fn from(arg: InvalidArgument) -> Self {
        Self::InvalidArgument(arg)
    }
}

impl From<LimitExceeded> for Error {
    #[inline]
    fn from(limit: LimitExceeded) -> Self {
        Self::LimitExceeded(limit)
    }
}

impl From<TryReserveError> for Error {
    #[inline]
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof => Self::Truncated,
            io::ErrorKind::OutOfMemory => Self::OutOfMemory,
            _ => Self::Io(e),
        }
    }
}

/// Convenience result type.
pub type Result<T = ()> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(Error::OutOfMemory.status(), Status::OutOfMemory);
        assert_eq!(
            Error::InvalidArgument(InvalidArgument::SingularMatrix).status(),
            Status::InvalidParameter
        );
        assert_eq!(
            Error::UnsupportedFormat(None).status(),
            Status::UnknownImageFormat
        );
        assert_eq!(
            Error::UnsupportedFormat(Some(ImageFormat::Png)).status(),
            Status::NotImplemented
        );
        assert_eq!(Status::UnknownImageFormat as u32, 13);

        let missing = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert_eq!(Error::from(missing).status(), Status::FileNotFound);
    }

    #[test]
    fn test_eof_becomes_truncated() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "short");
        assert!(matches!(Error::from(eof), Error::Truncated));
        assert_eq!(status_of(&Ok::<_, Error>(())), Status::Ok);
    }
}
