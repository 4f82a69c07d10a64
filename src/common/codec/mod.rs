mod decoder;

pub use decoder::*;

use crate::common::utils::{QRError, QRResult};

// Mode
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Mode {
    Terminator = 0b0000,
    Numeric = 0b0001,
    Alphanumeric = 0b0010,
    StructuredAppend = 0b0011,
    Byte = 0b0100,
    Fnc1First = 0b0101,
    Eci = 0b0111,
    Kanji = 0b1000,
    Fnc1Second = 0b1001,
}

impl Mode {
    pub fn from_bits(bits: u32) -> QRResult<Self> {
        match bits {
            0b0000 => Ok(Self::Terminator),
            0b0001 => Ok(Self::Numeric),
            0b0010 => Ok(Self::Alphanumeric),
            0b0011 => Ok(Self::StructuredAppend),
            0b0100 => Ok(Self::Byte),
            0b0101 => Ok(Self::Fnc1First),
            0b0111 => Ok(Self::Eci),
            0b1000 => Ok(Self::Kanji),
            0b1001 => Ok(Self::Fnc1Second),
            _ => Err(QRError::InvalidMode(bits as u8)),
        }
    }
}

#[cfg(test)]
mod mode_tests {
    use test_case::test_case;

    use super::Mode;
    use crate::common::utils::QRError;

    #[test_case(0b0001, Mode::Numeric)]
    #[test_case(0b0010, Mode::Alphanumeric)]
    #[test_case(0b0100, Mode::Byte)]
    #[test_case(0b0111, Mode::Eci)]
    #[test_case(0b1000, Mode::Kanji)]
    #[test_case(0b1001, Mode::Fnc1Second)]
    fn test_from_bits(bits: u32, exp: Mode) {
        assert_eq!(Mode::from_bits(bits), Ok(exp));
    }

    #[test]
    fn test_invalid_mode() {
        assert_eq!(Mode::from_bits(0b0110), Err(QRError::InvalidMode(6)));
        assert_eq!(Mode::from_bits(0b1111), Err(QRError::InvalidMode(15)));
    }
}
