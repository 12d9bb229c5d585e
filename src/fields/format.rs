//! Generic scalar formatter used for every field without a dedicated handler.

use serde_json::{Number, Value};

/// Outcome of formatting one raw value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    /// Raw value was null.
    Null,
    /// Object or array: cannot be rendered generically, field is dropped.
    Nested,
}

/// Formats a raw value. `numeric` fields get thousands grouping: integers
/// with no decimals, everything else with exactly two.
pub fn format_scalar(value: &Value, numeric: bool) -> Scalar {
    match value {
        Value::Null => Scalar::Null,
        Value::Object(_) | Value::Array(_) => Scalar::Nested,
        Value::Bool(b) => Scalar::Text(b.to_string()),
        Value::Number(n) if numeric => Scalar::Text(format_number(n)),
        Value::Number(n) => Scalar::Text(plain_number(n)),
        Value::String(s) if numeric => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Scalar::Text(group_decimal(f)),
            _ => Scalar::Text(s.clone()),
        },
        Value::String(s) => Scalar::Text(s.clone()),
    }
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return group_integer(i.unsigned_abs(), i < 0);
    }
    if let Some(u) = n.as_u64() {
        return group_integer(u, false);
    }
    n.as_f64().map(group_decimal).unwrap_or_else(|| n.to_string())
}

/// Integral floats print without a fractional part (`2.0` → `2`).
pub fn plain_number(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        _ => n.to_string(),
    }
}

pub fn group_integer(value: u64, negative: bool) -> String {
    let grouped = group_digits(&value.to_string());
    if negative { format!("-{}", grouped) } else { grouped }
}

/// `1234.5` → `1,234.50`.
pub fn group_decimal(value: f64) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));
    let sign = if value < 0.0 && rounded != "0.00" { "-" } else { "" };
    format!("{}{}.{}", sign, group_digits(whole), frac)
}

fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    grouped
}
