use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::record::Value;

pub const YES: &str = "✔ Yes";
pub const NO: &str = "✘ No";
pub const NULL_CELL: &str = "∅";

/// Display text of a single cell. Only affects rendering, the record keeps
/// its raw value.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => NULL_CELL.to_string(),
        Value::Bool(true) => YES.to_string(),
        Value::Bool(false) => NO.to_string(),
        Value::Number(n) => format_number(*n),
        Value::Text(s) => match parse_date(s) {
            Some(date) => date.format("%-m/%-d/%Y").to_string(),
            None => s.replace("\r\n", " ↵ ").replace('\n', " ↵ "),
        },
    }
}

/// Thousands separated with at most three fraction digits: 1234567.891 -> "1,234,567.891"
pub fn format_number(n: f64) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let fixed = format!("{:.3}", n.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let negative = n < 0.0 && (int_part != "0" || !frac_part.is_empty());
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

/// The store serialises spreadsheet dates as ISO 8601 strings.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() < 10 || !s.as_bytes()[0].is_ascii_digit() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans_render_as_glyphs() {
        assert_eq!(format_cell(&Value::Bool(true)), "✔ Yes");
        assert_eq!(format_cell(&Value::Bool(false)), "✘ No");
    }

    #[test]
    fn numbers_get_thousand_separators() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(999.0), "999");
        assert_eq!(format_number(1000.0), "1,000");
        assert_eq!(format_number(1234567.891), "1,234,567.891");
        assert_eq!(format_number(-45000.5), "-45,000.5");
        assert_eq!(format_number(2.0 / 3.0), "0.667");
        assert_eq!(format_number(-0.0001), "0");
    }

    #[test]
    fn iso_dates_render_as_dates() {
        assert_eq!(format_cell(&Value::Text("2024-01-15T00:00:00".into())), "1/15/2024");
        assert_eq!(format_cell(&Value::Text("2023-12-03".into())), "12/3/2023");
        assert_eq!(format_cell(&Value::Text("2023-12-03T10:30:00+02:00".into())), "12/3/2023");
    }

    #[test]
    fn other_text_is_kept() {
        assert_eq!(format_cell(&Value::Text("Engineering".into())), "Engineering");
        assert_eq!(format_cell(&Value::Text("2024".into())), "2024");
        assert_eq!(format_cell(&Value::Text("a\nb".into())), "a ↵ b");
        assert_eq!(format_cell(&Value::Null), "∅");
    }
}
