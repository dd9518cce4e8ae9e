//! Plain-text forms of scalar JSON values.
//!
//! The XML renderer and the value route both go through [`canonical_number`]
//! so a number reads the same whichever way it is imported.

use std::iter;

use serde_json::{Number, Value};

use super::{NotScalarError, ValueType};

/// Returns the text of a single String, Number or Bool value.
///
/// Strings come back unquoted and unescaped. Null, Array and Object fail with
/// [`NotScalarError`].
pub fn stringify(value: &Value) -> Result<String, NotScalarError> {
    match value {
        Value::String(s) => Ok(s.to_owned()),
        Value::Number(n) => Ok(canonical_number(n)),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(NotScalarError {
            found: value.value_type(),
        }),
    }
}

/// Integers print as-is, floats in their shortest round-trip form with any
/// exponent written out as plain decimal digits.
pub fn canonical_number(n: &Number) -> String {
    let text = n.to_string();
    if n.is_f64() {
        expand_exponent(&text)
    } else {
        text
    }
}

fn expand_exponent(text: &str) -> String {
    let Some(e_pos) = text.find(|c: char| c == 'e' || c == 'E') else {
        return text.to_owned();
    };
    let Ok(exponent) = text[e_pos + 1..].parse::<i64>() else {
        return text.to_owned();
    };
    let mantissa = &text[..e_pos];
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{int_part}{frac_part}");
    let point = int_part.len() as i64 + exponent;

    let mut out = String::from(sign);
    if point <= 0 {
        out.push_str("0.");
        out.extend(iter::repeat('0').take(point.unsigned_abs() as usize));
        out.push_str(&digits);
    } else if point as usize >= digits.len() {
        out.push_str(&digits);
        out.extend(iter::repeat('0').take(point as usize - digits.len()));
    } else {
        let (whole, fraction) = digits.split_at(point as usize);
        out.push_str(whole);
        out.push('.');
        out.push_str(fraction);
    }
    out
}
