//! Real-number formatting.

/// Maximum number of fractional digits written for a real.
pub const REAL_PRECISION: usize = 6;

/// Format a real without exponent notation.
///
/// Trailing zeros (and a trailing decimal point) are trimmed, negative zero
/// is written as `0`, and non-finite values collapse to `0` since the syntax
/// has no representation for them.
///
/// ```
/// use folio_util::number::format_real;
///
/// assert_eq!(format_real(1.5), "1.5");
/// assert_eq!(format_real(612.0), "612");
/// assert_eq!(format_real(0.000_000_1), "0");
/// assert_eq!(format_real(-2.25), "-2.25");
/// ```
pub fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let mut text = format!("{:.*}", REAL_PRECISION, value);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text == "-0" || text.is_empty() {
        return "0".to_string();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_integral_reals() {
        assert_eq!(format_real(0.0), "0");
        assert_eq!(format_real(-0.0), "0");
        assert_eq!(format_real(792.0), "792");
    }

    #[test]
    fn test_rounding() {
        assert_eq!(format_real(1.0 / 3.0), "0.333333");
        assert_eq!(format_real(-0.000_000_4), "0");
    }

    #[test]
    fn test_non_finite() {
        assert_eq!(format_real(f64::NAN), "0");
        assert_eq!(format_real(f64::INFINITY), "0");
    }

    proptest! {
        #[test]
        fn formatted_reals_never_use_exponents(v in -1.0e12f64..1.0e12f64) {
            let text = format_real(v);
            prop_assert!(!text.contains('e') && !text.contains('E'));
            let parsed: f64 = text.parse().unwrap();
            prop_assert!((parsed - v).abs() <= 1e-6 + v.abs() * 1e-12);
        }
    }
}
