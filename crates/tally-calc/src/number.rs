//! Decimal parsing, formatting and the arithmetic helpers that need care.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use num_traits::Zero;

/// Significant digits kept for quotients that do not terminate.
pub(crate) const DIVISION_PRECISION: u64 = 32;

/// Parse display text as a decimal.
///
/// Accepts an optional leading `-`, digits and at most one `.`; a trailing
/// `.` (a number mid-entry such as `"5."`) is allowed. Anything else,
/// including the non-finite sentinels, is rejected.
pub(crate) fn parse_display(text: &str) -> Option<BigDecimal> {
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let mut seen_dot = false;
    let mut seen_digit = false;
    for c in unsigned.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => return None,
        }
    }
    if !seen_digit {
        return None;
    }

    let trimmed = text.strip_suffix('.').unwrap_or(text);
    BigDecimal::from_str(trimmed).ok()
}

/// Render a decimal as plain text.
///
/// Never uses exponent notation, drops trailing fractional zeros (so a
/// whole number has no `.0`), and renders any zero as unsigned `"0"`.
pub fn format_decimal(value: &BigDecimal) -> String {
    if value.is_zero() {
        return "0".to_string();
    }

    let (int, scale) = value.normalized().as_bigint_and_exponent();
    let digits = int.magnitude().to_string();

    let mut out = String::with_capacity(digits.len() + 3);
    if int.sign() == Sign::Minus {
        out.push('-');
    }

    if scale <= 0 {
        out.push_str(&digits);
        out.extend(std::iter::repeat_n('0', scale.unsigned_abs() as usize));
    } else {
        let scale = scale as usize;
        if digits.len() > scale {
            let (whole, frac) = digits.split_at(digits.len() - scale);
            out.push_str(whole);
            out.push('.');
            out.push_str(frac);
        } else {
            out.push_str("0.");
            out.extend(std::iter::repeat_n('0', scale - digits.len()));
            out.push_str(&digits);
        }
    }
    out
}

/// `a / b` rounded to [`DIVISION_PRECISION`] significant digits.
///
/// The caller guarantees `b` is non-zero.
pub(crate) fn divide(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    (a / b).with_prec(DIVISION_PRECISION)
}

/// Floored remainder `a - b * floor(a / b)`, computed exactly.
///
/// Both operands are brought to a common scale so the quotient's floor is
/// an integer division; the result takes the sign of `b`. The caller
/// guarantees `b` is non-zero.
pub(crate) fn floored_rem(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    let scale = a.as_bigint_and_exponent().1.max(b.as_bigint_and_exponent().1);
    let (a_int, _) = a.with_scale(scale).as_bigint_and_exponent();
    let (b_int, _) = b.with_scale(scale).as_bigint_and_exponent();

    let mut rem: BigInt = &a_int % &b_int;
    if !rem.is_zero() && rem.sign() != b_int.sign() {
        rem += &b_int;
    }
    BigDecimal::new(rem, scale)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn test_parse_accepts_entry_forms() {
        assert_eq!(parse_display("0"), Some(dec("0")));
        assert_eq!(parse_display("5."), Some(dec("5")));
        assert_eq!(parse_display("-0."), Some(dec("0")));
        assert_eq!(parse_display("-12.75"), Some(dec("-12.75")));
    }

    #[test]
    fn test_parse_rejects_sentinels_and_junk() {
        for text in ["NaN", "Inf", "+Inf", "-Inf", "", "-", ".", "1.2.3", "1e5", "+3"] {
            assert_eq!(parse_display(text), None, "{text:?} should not parse");
        }
    }

    #[test]
    fn test_format_trims_trailing_zeros() {
        assert_eq!(format_decimal(&dec("12.0")), "12");
        assert_eq!(format_decimal(&dec("12.500")), "12.5");
        assert_eq!(format_decimal(&dec("0.050")), "0.05");
        assert_eq!(format_decimal(&dec("-3.10")), "-3.1");
    }

    #[test]
    fn test_format_never_uses_exponent() {
        assert_eq!(format_decimal(&dec("1E+3")), "1000");
        assert_eq!(format_decimal(&dec("1E-4")), "0.0001");
    }

    #[test]
    fn test_format_zero_is_unsigned() {
        assert_eq!(format_decimal(&dec("-0")), "0");
        assert_eq!(format_decimal(&dec("-0.000")), "0");
    }

    #[test]
    fn test_floored_rem_follows_divisor_sign() {
        assert_eq!(floored_rem(&dec("7"), &dec("2")), dec("1"));
        assert_eq!(floored_rem(&dec("-7"), &dec("2")), dec("1"));
        assert_eq!(floored_rem(&dec("7"), &dec("-2")), dec("-1"));
        assert_eq!(floored_rem(&dec("-7"), &dec("-2")), dec("-1"));
        assert_eq!(floored_rem(&dec("5.5"), &dec("2")), dec("1.5"));
        assert_eq!(floored_rem(&dec("6"), &dec("3")), dec("0"));
    }

    #[test]
    fn test_divide_bounds_precision() {
        let third = format_decimal(&divide(&dec("1"), &dec("3")));
        assert!(third.starts_with("0.3333"));
        assert!(third.len() <= DIVISION_PRECISION as usize + 2);
        assert_eq!(format_decimal(&divide(&dec("10"), &dec("4"))), "2.5");
    }
}
