//! Canonical number formatting.
//!
//! `STR$` and diagnostics both print doubles through this one function so
//! every number in the assembler renders the same way.

/// Format a double the way the assembler prints numbers everywhere.
///
/// Integral values within +/-1e15 print with no decimal point; everything
/// else uses the shortest representation that parses back to the same
/// double, so `EVAL(STR$(x))` recovers `x` exactly.
///
/// # Examples
///
/// ```
/// use mosasm_util::fmt::format_number;
///
/// assert_eq!(format_number(42.0), "42");
/// assert_eq!(format_number(-3.0), "-3");
/// assert_eq!(format_number(3.25), "3.25");
/// ```
pub fn format_number(value: f64) -> String {
    if value == value.trunc() && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_have_no_point() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(7.0), "7");
        assert_eq!(format_number(-120.0), "-120");
        assert_eq!(format_number(65536.0), "65536");
    }

    #[test]
    fn test_fractions_print_shortest() {
        assert_eq!(format_number(3.14), "3.14");
        assert_eq!(format_number(-0.5), "-0.5");
    }

    #[test]
    fn test_large_values_fall_back_to_float_form() {
        let text = format_number(1e21);
        assert_eq!(text.parse::<f64>().ok(), Some(1e21));
    }

    #[test]
    fn test_round_trip() {
        for &x in &[0.1, 1.0 / 3.0, 123.456, -9876.00321, 2.0f64.powi(40)] {
            let text = format_number(x);
            assert_eq!(text.parse::<f64>().ok(), Some(x), "failed for {}", text);
        }
    }
}
