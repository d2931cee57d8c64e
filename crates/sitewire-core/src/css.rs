#![forbid(unsafe_code)]

//! CSS length helpers.
//!
//! Custom properties arrive as raw computed text (`" 88px"`), so parsing
//! follows the browser's `parseFloat` rules: the longest numeric prefix wins
//! and trailing garbage is ignored. Output uses the shortest decimal form so
//! values read back identically.

/// Parse a positive pixel length such as `"88px"` or `" 56.5px "`.
///
/// Returns `None` when the value does not end in `px`, has no numeric
/// prefix, or is not a finite number greater than zero.
///
/// ```
/// use sitewire_core::css::parse_px;
/// assert_eq!(parse_px("88px"), Some(88.0));
/// assert_eq!(parse_px(" 12.5px "), Some(12.5));
/// assert_eq!(parse_px("3rem"), None);
/// assert_eq!(parse_px("0px"), None);
/// ```
pub fn parse_px(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.ends_with("px") {
        return None;
    }
    leading_number(trimmed).filter(|n| n.is_finite() && *n > 0.0)
}

/// Longest numeric prefix of `s`, `parseFloat`-style.
fn leading_number(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let mut frac_end = end + 1;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - (end + 1);
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Format a pixel value, e.g. `88px` or `56.5px`. Negative zero prints as `0px`.
pub fn format_px(value: f64) -> String {
    format!("{}px", normalize_zero(value))
}

/// Horizontal translation transform for a track offset.
pub fn translate_x(offset: f64) -> String {
    format!("translateX({})", format_px(offset))
}

#[inline]
fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_plain_and_fractional() {
        assert_eq!(parse_px("88px"), Some(88.0));
        assert_eq!(parse_px("56.5px"), Some(56.5));
        assert_eq!(parse_px(".5px"), Some(0.5));
        assert_eq!(parse_px("5.px"), Some(5.0));
        assert_eq!(parse_px("1e2px"), Some(100.0));
    }

    #[test]
    fn numeric_prefix_wins() {
        // parseFloat("12abcpx") === 12
        assert_eq!(parse_px("12abcpx"), Some(12.0));
        // Dangling exponent is not part of the number.
        assert_eq!(parse_px("3epx"), Some(3.0));
    }

    #[test]
    fn rejects_invalid() {
        assert_eq!(parse_px(""), None);
        assert_eq!(parse_px("   "), None);
        assert_eq!(parse_px("88"), None);
        assert_eq!(parse_px("px"), None);
        assert_eq!(parse_px("-4px"), None);
        assert_eq!(parse_px("0px"), None);
        assert_eq!(parse_px("abcpx"), None);
        assert_eq!(parse_px(".px"), None);
        assert_eq!(parse_px("4em"), None);
    }

    #[test]
    fn formats_shortest() {
        assert_eq!(format_px(88.0), "88px");
        assert_eq!(format_px(56.5), "56.5px");
        assert_eq!(format_px(-0.0), "0px");
    }

    #[test]
    fn translate_has_no_negative_zero() {
        assert_eq!(translate_x(-0.0), "translateX(0px)");
        assert_eq!(translate_x(-640.0), "translateX(-640px)");
    }

    proptest! {
        #[test]
        fn formatted_lengths_parse_back(v in 0.001f64..10_000.0) {
            prop_assert_eq!(parse_px(&format_px(v)), Some(v));
        }

        #[test]
        fn never_panics(s in ".*") {
            let _ = parse_px(&s);
        }
    }
}
