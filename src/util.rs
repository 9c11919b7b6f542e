// Utility helpers for parsing and basic statistics.
//
// The parsers here return `Option` and never fail loudly; callers decide
// whether an unparsable cell is an error (strict fields) or simply absent
// (permissive fields).
use chrono::NaiveDate;
use num_format::{Locale, ToFormattedString};

/// Parse locale-formatted decimal text such as `"1234,56"`.
///
/// - Trims whitespace; empty input yields `None`.
/// - Every `decimal_separator` is rewritten to `.` before parsing, so
///   thousands separators are not supported (`"1.234,56"` is rejected).
/// - Non-finite results (`inf`, `NaN`) are rejected.
pub fn parse_decimal(s: &str, decimal_separator: char) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let v = if decimal_separator == '.' {
        s.parse::<f64>().ok()?
    } else {
        s.replace(decimal_separator, ".").parse::<f64>().ok()?
    };
    v.is_finite().then_some(v)
}

pub fn parse_i64(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

/// Strict date parsing: only `fmt` is tried.
pub fn parse_date(s: &str, fmt: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(s, fmt).ok()
}

/// Interpret a yes/no style token. Numbers are true when non-zero.
pub fn parse_flag(s: &str) -> Option<bool> {
    let s = s.trim().to_lowercase();
    match s.as_str() {
        "true" | "t" | "sim" | "s" | "yes" | "y" | "verdadeiro" => Some(true),
        "false" | "f" | "não" | "nao" | "n" | "no" | "falso" => Some(false),
        _ => s.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v != 0.0),
    }
}

pub fn average(v: &[f64]) -> f64 {
    // Standard arithmetic mean; returns 0 for an empty slice to avoid NaNs.
    if v.is_empty() {
        return 0.0;
    }
    let sum: f64 = v.iter().copied().sum();
    sum / v.len() as f64
}

/// Sample standard deviation (n - 1 denominator). `None` below two values.
pub fn std_dev(v: &[f64]) -> Option<f64> {
    if v.len() < 2 {
        return None;
    }
    let mean = average(v);
    let ss: f64 = v.iter().map(|x| (x - mean).powi(2)).sum();
    Some((ss / (v.len() - 1) as f64).sqrt())
}

/// Quantile `q` in `[0, 1]` of an ascending slice, linearly interpolated
/// between the closest ranks.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals plus thousands separators, e.g. `1,234,567.89`.
    if !n.is_finite() {
        return n.to_string();
    }
    let s = format!("{:.*}", decimals, n.abs());
    // No sign when the value rounds to zero.
    let neg = n < 0.0 && s.bytes().any(|b| (b'1'..=b'9').contains(&b));
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

/// Like [`format_number`] but renders an absent value as `-`.
pub fn format_opt(n: Option<f64>, decimals: usize) -> String {
    n.map(|v| format_number(v, decimals)).unwrap_or_else(|| "-".to_string())
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (e.g. `9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_comma() {
        assert_eq!(parse_decimal("1234,56", ','), Some(1234.56));
        assert_eq!(parse_decimal(" -12,5 ", ','), Some(-12.5));
        assert_eq!(parse_decimal("7", ','), Some(7.0));
    }

    #[test]
    fn decimal_rejects_garbage_and_non_finite() {
        assert_eq!(parse_decimal("abc", ','), None);
        assert_eq!(parse_decimal("", ','), None);
        assert_eq!(parse_decimal("1.234,56", ','), None);
        assert_eq!(parse_decimal("inf", ','), None);
        assert_eq!(parse_decimal("NaN", ','), None);
    }

    #[test]
    fn decimal_period_separator() {
        assert_eq!(parse_decimal("3.25", '.'), Some(3.25));
    }

    #[test]
    fn date_is_strict() {
        let d = parse_date("15/03/2024", "%d/%m/%Y").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(parse_date("2024-03-15", "%d/%m/%Y"), None);
        assert_eq!(parse_date("31/02/2024", "%d/%m/%Y"), None);
    }

    #[test]
    fn flags() {
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("não"), Some(false));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("1.0"), Some(true));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn quantiles_interpolate() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile_sorted(&v, 0.0), Some(1.0));
        assert_eq!(quantile_sorted(&v, 0.5), Some(2.5));
        assert_eq!(quantile_sorted(&v, 0.25), Some(1.75));
        assert_eq!(quantile_sorted(&v, 1.0), Some(4.0));
        assert_eq!(quantile_sorted(&[], 0.5), None);
    }

    #[test]
    fn std_dev_sample() {
        let sd = std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.138089935).abs() < 1e-6);
        assert_eq!(std_dev(&[1.0]), None);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-1234.5, 2), "-1,234.50");
        assert_eq!(format_number(12.0, 0), "12");
        assert_eq!(format_number(-0.001, 2), "0.00");
        assert_eq!(format_opt(None, 2), "-");
        assert_eq!(format_int(9855usize), "9,855");
    }
}
