//! Number rendering for regenerated words.

use super::config::FormatConfig;

/// Renders `value` the way `[format]` asks for.
///
/// Rounds to `decimal_places`, then optionally drops trailing fractional
/// zeros (and a bare trailing point) and the `0` before the point of values
/// below one. The separator is always `.`, and a value that rounds to zero is
/// written without a sign.
pub fn format_number(value: f64, fmt: &FormatConfig) -> String {
    let rounded = format!("{:.*}", fmt.decimal_places as usize, value);
    let (negative, digits) = match rounded.strip_prefix('-') {
        Some(rest) if rest.bytes().any(|b| b.is_ascii_digit() && b != b'0') => (true, rest),
        Some(rest) => (false, rest),
        None => (false, rounded.as_str()),
    };

    let mut digits = digits;
    if fmt.strip_trailing_zeros && digits.contains('.') {
        digits = digits.trim_end_matches('0').trim_end_matches('.');
    }
    if fmt.leading_zero_suppression && digits.starts_with("0.") {
        digits = &digits[1..];
    }

    if negative {
        format!("-{digits}")
    } else {
        digits.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(decimal_places: u32, strip: bool, suppress: bool) -> FormatConfig {
        FormatConfig {
            decimal_places,
            strip_trailing_zeros: strip,
            leading_zero_suppression: suppress,
        }
    }

    // -------------------------------------------------------------------------
    // Rounding
    // -------------------------------------------------------------------------

    #[test]
    fn rounds_to_configured_places() {
        assert_eq!(format_number(1.23456, &fmt(3, false, false)), "1.235");
        assert_eq!(format_number(-12.5, &fmt(3, false, false)), "-12.500");
        assert_eq!(format_number(3.7, &fmt(0, false, false)), "4");
    }

    #[test]
    fn default_config_gives_short_numbers() {
        let f = FormatConfig::default();
        assert_eq!(format_number(10.0, &f), "10");
        assert_eq!(format_number(1234.5, &f), "1234.5");
        assert_eq!(format_number(-0.25, &f), "-0.25");
    }

    // -------------------------------------------------------------------------
    // Signed zero
    // -------------------------------------------------------------------------

    #[test]
    fn zero_never_carries_a_sign() {
        assert_eq!(format_number(-0.0, &fmt(3, false, false)), "0.000");
        assert_eq!(format_number(-0.0001, &fmt(3, true, false)), "0");
        assert_eq!(format_number(-1e-12, &fmt(3, true, true)), "0");
    }

    #[test]
    fn small_negative_value_keeps_its_sign() {
        assert_eq!(format_number(-0.001, &fmt(3, true, false)), "-0.001");
    }

    // -------------------------------------------------------------------------
    // Trimming
    // -------------------------------------------------------------------------

    #[test]
    fn stripping_removes_the_point_of_whole_numbers() {
        assert_eq!(format_number(3.0, &fmt(3, true, false)), "3");
        assert_eq!(format_number(1.5, &fmt(3, false, false)), "1.500");
    }

    #[test]
    fn leading_zero_suppression_keeps_the_sign() {
        assert_eq!(format_number(-0.5, &fmt(3, false, true)), "-.500");
        assert_eq!(format_number(0.5, &fmt(3, true, true)), ".5");
        assert_eq!(format_number(10.5, &fmt(3, true, true)), "10.5");
    }

    #[test]
    fn two_places_round_half_up_past_the_binary_error() {
        assert_eq!(format_number(10.005_1, &fmt(2, true, false)), "10.01");
        assert_eq!(format_number(500.0, &fmt(2, true, false)), "500");
    }
}
