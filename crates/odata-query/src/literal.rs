//! Literal rendering
//!
//! `render_scalar` is the default scalar-to-text rule. `render_literal` is
//! what the compiler uses: it only differs for dates, which the protocol
//! wants as `datetime'...'` literals.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::ast::Value;

/// Render a literal value for a query parameter
pub fn render_literal(value: &Value) -> String {
    match value {
        Value::Date(d) => format!("\"datetime'{}'\"", iso_string(d)),
        other => render_scalar(other),
    }
}

/// Default scalar rendering: numbers, booleans, null and quoted strings
pub fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(n) => render_float(*n),
        Value::String(s) => format!("\"{}\"", s.replace('"', "\"\"")),
        Value::Date(d) => format!("\"{}\"", iso_string(d)),
    }
}

/// `2024-01-31T12:00:00.000Z`, millisecond precision, always UTC
pub fn iso_string(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn render_float(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        // f64's Display already drops the fraction of integral values
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn scalars() {
        assert_eq!(render_literal(&Value::Null), "null");
        assert_eq!(render_literal(&Value::Bool(false)), "false");
        assert_eq!(render_literal(&Value::Int(-42)), "-42");
        assert_eq!(render_literal(&Value::Float(2.5)), "2.5");
        assert_eq!(render_literal(&Value::Float(3.0)), "3");
        assert_eq!(render_literal(&Value::Float(f64::INFINITY)), "Infinity");
    }

    #[test]
    fn strings_are_quoted_and_escaped() {
        assert_eq!(render_literal(&Value::from("abc")), r#""abc""#);
        assert_eq!(render_literal(&Value::from(r#"say "hi""#)), r#""say ""hi""""#);
    }

    #[test]
    fn dates_use_datetime_literal() {
        let date = Utc.with_ymd_and_hms(2019, 3, 7, 8, 9, 10).unwrap();
        assert_eq!(
            render_literal(&Value::Date(date)),
            r#""datetime'2019-03-07T08:09:10.000Z'""#
        );
        assert_eq!(render_scalar(&Value::Date(date)), r#""2019-03-07T08:09:10.000Z""#);
    }
}
