use num_traits::ToPrimitive;

use super::{QRError, QRResult};

pub fn f64_to_i32(num: f64) -> QRResult<i32> {
    num.to_i32().ok_or(QRError::CastingFailed)
}

pub fn f64_to_u32(num: f64) -> QRResult<u32> {
    num.to_u32().ok_or(QRError::CastingFailed)
}

#[cfg(test)]
mod cast_tests {
    use super::{f64_to_i32, f64_to_u32};
    use crate::common::utils::QRError;

    #[test]
    fn test_f64_to_i32() {
        assert_eq!(f64_to_i32(-12.9), Ok(-12));
        assert_eq!(f64_to_i32(1e12), Err(QRError::CastingFailed));
        assert_eq!(f64_to_i32(f64::NAN), Err(QRError::CastingFailed));
    }

    #[test]
    fn test_f64_to_u32() {
        assert_eq!(f64_to_u32(7.2), Ok(7));
        assert_eq!(f64_to_u32(-1.0), Err(QRError::CastingFailed));
    }
}
