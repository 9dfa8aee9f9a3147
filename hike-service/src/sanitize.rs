//! Normalization applied to raw submission values before bounds checks

use serde_json::Value;

/// Trimmed view of a text field.
pub fn trim_text(value: &str) -> &str {
    value.trim()
}

/// Coerce a JSON number, or a string holding one, into a finite `f64`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Coerce a JSON number, or a string holding one, into an integer.
/// Integral floats such as `2020.0` are accepted; fractional values are not.
/// Integral floats beyond the `i64` range saturate, so bounds checks still apply.
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 {
        // `as` saturates at the i64 bounds
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(trim_text("  Acme Corp \n"), "Acme Corp");
        assert_eq!(trim_text("\t"), "");
    }

    #[test]
    fn coerces_numbers_and_numeric_strings() {
        assert_eq!(coerce_f64(&json!(1200000.5)), Some(1200000.5));
        assert_eq!(coerce_f64(&json!(" 42 ")), Some(42.0));
        assert_eq!(coerce_f64(&json!("1e3")), Some(1000.0));
    }

    #[test]
    fn refuses_non_finite_and_non_numeric() {
        assert_eq!(coerce_f64(&json!("NaN")), None);
        assert_eq!(coerce_f64(&json!("inf")), None);
        assert_eq!(coerce_f64(&json!("twelve")), None);
        assert_eq!(coerce_f64(&json!(true)), None);
        assert_eq!(coerce_f64(&json!([1])), None);
    }

    #[test]
    fn integers_must_be_integral() {
        assert_eq!(coerce_i64(&json!(2024)), Some(2024));
        assert_eq!(coerce_i64(&json!(2024.0)), Some(2024));
        assert_eq!(coerce_i64(&json!("2024")), Some(2024));
        assert_eq!(coerce_i64(&json!(2024.5)), None);
        assert_eq!(coerce_i64(&json!("2024.5")), None);
        assert_eq!(coerce_i64(&json!("NaN")), None);
    }

    #[test]
    fn huge_integral_values_saturate() {
        assert_eq!(coerce_i64(&json!(1e19)), Some(i64::MAX));
        assert_eq!(coerce_i64(&json!(-1e19)), Some(i64::MIN));
        assert_eq!(coerce_i64(&json!("99999999999999999999")), Some(i64::MAX));
        assert_eq!(coerce_i64(&json!("1e400")), None);
    }
}
