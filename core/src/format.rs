//! KPI and chart label formatting.
//!
//! Rounding is half-to-even throughout, so 72.5 shows as "72%" and 73.5 as "74%".

/// Percent tile value: rounded integer with a `%` suffix, `"0%"` for missing input.
pub fn fmt_pct(value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{}%", round_int(v)),
        None => "0%".to_string(),
    }
}

/// Plain rounded integer (`1234`, no separators), `"0"` for non-finite input.
pub fn fmt_int(value: f64) -> String {
    if value.is_finite() {
        round_int(value).to_string()
    } else {
        "0".to_string()
    }
}

/// Fixed decimals with thousands separators on the integer part.
pub fn fmt_decimal(value: f64, places: usize) -> String {
    if !value.is_finite() {
        return fmt_decimal(0.0, places);
    }
    let text = format!("{:.*}", places, value.abs());
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text.as_str(), None),
    };
    let sign = if value < 0.0 && text.chars().any(|c| c.is_ascii_digit() && c != '0') {
        "-"
    } else {
        ""
    };
    match frac_part {
        Some(frac) => format!("{sign}{}.{frac}", group_thousands(int_part)),
        None => format!("{sign}{}", group_thousands(int_part)),
    }
}

/// Half-to-even rounding to an integer, saturating at the i64 range.
pub fn round_int(value: f64) -> i64 {
    value.round_ties_even() as i64
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_rounds_to_integer() {
        assert_eq!(fmt_pct(Some(72.4)), "72%");
        assert_eq!(fmt_pct(Some(72.6)), "73%");
        assert_eq!(fmt_pct(Some(0.0)), "0%");
        assert_eq!(fmt_pct(Some(100.0)), "100%");
    }

    #[test]
    fn percent_ties_round_to_even() {
        assert_eq!(fmt_pct(Some(72.5)), "72%");
        assert_eq!(fmt_pct(Some(73.5)), "74%");
    }

    #[test]
    fn percent_of_missing_or_non_numeric_is_zero() {
        assert_eq!(fmt_pct(None), "0%");
        assert_eq!(fmt_pct(Some(f64::NAN)), "0%");
        assert_eq!(fmt_pct(Some(f64::INFINITY)), "0%");
    }

    #[test]
    fn tile_counts_are_plain_integers() {
        assert_eq!(fmt_int(0.0), "0");
        assert_eq!(fmt_int(999.4), "999");
        assert_eq!(fmt_int(1234.0), "1234");
        assert_eq!(fmt_int(1234567.4), "1234567");
        assert_eq!(fmt_int(2.5), "2");
        assert_eq!(fmt_int(-1234.0), "-1234");
        assert_eq!(fmt_int(f64::NAN), "0");
    }

    #[test]
    fn decimals_are_grouped() {
        assert_eq!(fmt_decimal(1234.567, 2), "1,234.57");
        assert_eq!(fmt_decimal(12.0, 1), "12.0");
        assert_eq!(fmt_decimal(1234567.0, 0), "1,234,567");
        assert_eq!(fmt_decimal(-0.001, 1), "0.0");
        assert_eq!(fmt_decimal(-2500.26, 1), "-2,500.3");
        assert_eq!(fmt_decimal(f64::NAN, 2), "0.00");
    }
}
