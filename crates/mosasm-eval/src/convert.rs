//! Integer coercion.
//!
//! Operators that work on integers accept any double in the combined
//! signed/unsigned 32-bit range. Values above `i32::MAX` are taken as
//! unsigned and reinterpreted, so `&FFFFFFFF` coerces to -1 and bitwise
//! identities hold across the full 32-bit pattern space.

use mosasm_util::ErrorKind;

/// Coerce a double to a 32-bit integer.
///
/// Accepts `[i32::MIN, u32::MAX]`; truncation is toward zero. Values in
/// `(i32::MAX, u32::MAX]` wrap through the unsigned representation.
///
/// # Errors
///
/// `OutOfIntegerRange` when the value (including NaN) lies outside the
/// accepted range.
pub fn double_to_int(value: f64) -> Result<i32, ErrorKind> {
    if value >= i32::MIN as f64 && value <= i32::MAX as f64 {
        Ok(value as i32)
    } else if value > i32::MAX as f64 && value <= u32::MAX as f64 {
        Ok((value as u32) as i32)
    } else {
        Err(ErrorKind::OutOfIntegerRange)
    }
}

/// Coerce a double to an unsigned 32-bit integer.
///
/// Same acceptance range as [`double_to_int`]; negative inputs wrap to
/// their unsigned bit pattern.
pub fn double_to_uint(value: f64) -> Result<u32, ErrorKind> {
    double_to_int(value).map(|v| v as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_values() {
        assert_eq!(double_to_int(0.0), Ok(0));
        assert_eq!(double_to_int(42.0), Ok(42));
        assert_eq!(double_to_int(-42.0), Ok(-42));
    }

    #[test]
    fn test_truncation_is_toward_zero() {
        assert_eq!(double_to_int(2.9), Ok(2));
        assert_eq!(double_to_int(-2.9), Ok(-2));
        assert_eq!(double_to_int(-0.5), Ok(0));
    }

    #[test]
    fn test_signed_bounds() {
        assert_eq!(double_to_int(i32::MIN as f64), Ok(i32::MIN));
        assert_eq!(double_to_int(i32::MAX as f64), Ok(i32::MAX));
    }

    #[test]
    fn test_unsigned_range_wraps() {
        assert_eq!(double_to_int(4294967295.0), Ok(-1));
        assert_eq!(double_to_int(2147483648.0), Ok(i32::MIN));
        assert_eq!(double_to_int(4278190080.0), Ok(-16777216));
    }

    #[test]
    fn test_out_of_range() {
        assert_eq!(
            double_to_int(4294967296.0),
            Err(ErrorKind::OutOfIntegerRange)
        );
        assert_eq!(
            double_to_int(-2147483649.0),
            Err(ErrorKind::OutOfIntegerRange)
        );
        assert_eq!(double_to_int(f64::NAN), Err(ErrorKind::OutOfIntegerRange));
        assert_eq!(
            double_to_int(f64::INFINITY),
            Err(ErrorKind::OutOfIntegerRange)
        );
    }

    #[test]
    fn test_uint() {
        assert_eq!(double_to_uint(4294967295.0), Ok(u32::MAX));
        assert_eq!(double_to_uint(-1.0), Ok(u32::MAX));
        assert_eq!(double_to_uint(256.0), Ok(256));
    }
}
