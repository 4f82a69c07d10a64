use std::fmt::{Debug, Display, Error, Formatter};

// Error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    // Image
    InvalidImage,

    // Geometry
    SingularMatrix,
    PointAtInfinity,
    CastingFailed,

    // Symbol
    SymbolNotFound,
    InvalidVersion,
    InvalidInfo,
    InvalidFormatInfo,
    InvalidVersionInfo,

    // Payload
    TooManyError,
    InvalidMode(u8),
    CorruptDataSegment,
    InvalidCharacterEncoding,
}

impl Display for QRError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        let msg = match *self {
            Self::InvalidImage => "Image could not be loaded",
            Self::SingularMatrix => "Cannot compute homography",
            Self::PointAtInfinity => "Projected point is at infinity",
            Self::CastingFailed => "Numeric cast out of range",
            Self::SymbolNotFound => "Symbol not found",
            Self::InvalidVersion => "Invalid version",
            Self::InvalidInfo => "Invalid info",
            Self::InvalidFormatInfo => "Invalid format info detected",
            Self::InvalidVersionInfo => "Invalid version info detected",
            Self::TooManyError => "Too many errors to correct successfully",
            Self::InvalidMode(m) => return write!(f, "Invalid segment mode {m:#06b}"),
            Self::CorruptDataSegment => "Corrupt data segment",
            Self::InvalidCharacterEncoding => "Invalid character encoding",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for QRError {}

pub type QRResult<T> = Result<T, QRError>;
