//! Binding values and their canonical string form
//!
//! Editors propose values of many shapes. [`BindingValue::from_json`]
//! classifies them once into an explicit variant, and
//! [`BindingValue::normalize`] turns each variant into the string that is
//! stored in the metadata map.

use crate::rich_text::RichText;
use serde_json::Value;

/// Scalar value with a canonical string form
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Plain string, stored unchanged
    Text(String),
    /// Integral number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Boolean, stored as `true` / `false`
    Bool(bool),
}

impl Scalar {
    /// Classify a JSON scalar, `None` for null, arrays and objects
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Self::Text(s.clone())),
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => Some(match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            }),
            _ => None,
        }
    }

    /// Canonical string form
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => canonical_float(*f),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// Number-to-string in ECMAScript form
///
/// Uses the shortest digits that round-trip, switching to exponent notation
/// below `1e-6` and from `1e21`.
fn canonical_float(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };

    let digits: String = mantissa.chars().filter(char::is_ascii_digit).collect();
    let len = i32::try_from(digits.len()).unwrap_or(i32::MAX);
    // Position of the decimal point relative to the start of `digits`
    let point = exponent + 1;

    let mut out = String::with_capacity(digits.len() + 8);
    if value < 0.0 {
        out.push('-');
    }

    if len <= point && point <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat('0').take(usize::try_from(point - len).unwrap_or(0)));
    } else if 0 < point && point <= 21 {
        let (int, frac) = digits.split_at(usize::try_from(point).unwrap_or(0));
        out.push_str(int);
        out.push('.');
        out.push_str(frac);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take(usize::try_from(-point).unwrap_or(0)));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if exponent < 0 { '-' } else { '+' });
        out.push_str(&exponent.unsigned_abs().to_string());
    }
    out
}

/// Value proposed by the editor for a binding
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BindingValue {
    /// No value supplied; the binding is left untouched
    #[default]
    Undefined,
    /// Explicit null, clears the field
    Null,
    /// String, number or boolean
    Scalar(Scalar),
    /// Formatted text, stored as markup
    RichText(RichText),
    /// Object carrying a scalar `value` or `text` field
    TextObject(Scalar),
    /// Anything else, clears the field
    Unsupported,
}

impl BindingValue {
    /// Classify an optional JSON value
    ///
    /// Objects are checked in order: rich text (`text` + `formats` array),
    /// then a scalar `value` field, then a scalar `text` field.
    #[must_use]
    pub fn from_json(value: Option<&Value>) -> Self {
        let Some(value) = value else {
            return Self::Undefined;
        };

        match value {
            Value::Null => Self::Null,
            Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                Scalar::from_json(value).map_or(Self::Unsupported, Self::Scalar)
            }
            Value::Object(map) => {
                if let Some(rich) = RichText::from_json(value) {
                    return Self::RichText(rich);
                }
                map.get("value")
                    .and_then(Scalar::from_json)
                    .or_else(|| map.get("text").and_then(Scalar::from_json))
                    .map_or(Self::Unsupported, Self::TextObject)
            }
            Value::Array(_) => Self::Unsupported,
        }
    }

    /// Check if the binding should be left untouched
    #[inline]
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// String to store, `None` when nothing should be queued
    #[must_use]
    pub fn normalize(&self) -> Option<String> {
        match self {
            Self::Undefined => None,
            Self::Null | Self::Unsupported => Some(String::new()),
            Self::Scalar(scalar) | Self::TextObject(scalar) => Some(scalar.to_canonical_string()),
            Self::RichText(rich) => Some(rich.to_html()),
        }
    }
}

impl From<&str> for BindingValue {
    fn from(value: &str) -> Self {
        Self::Scalar(Scalar::Text(value.to_owned()))
    }
}

impl From<String> for BindingValue {
    fn from(value: String) -> Self {
        Self::Scalar(Scalar::Text(value))
    }
}

impl From<i64> for BindingValue {
    fn from(value: i64) -> Self {
        Self::Scalar(Scalar::Int(value))
    }
}

impl From<f64> for BindingValue {
    fn from(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }
}

impl From<bool> for BindingValue {
    fn from(value: bool) -> Self {
        Self::Scalar(Scalar::Bool(value))
    }
}

impl From<RichText> for BindingValue {
    fn from(value: RichText) -> Self {
        Self::RichText(value)
    }
}

/// Render a stored metadata value for display in a bound field
///
/// Absent and null values render as the empty string. Scalars use their
/// canonical form, rich text renders as markup and any other array or object
/// renders as its JSON text.
#[must_use]
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(value @ (Value::Array(_) | Value::Object(_))) => {
            RichText::from_json(value).map_or_else(|| value.to_string(), |rich| rich.to_html())
        }
        Some(value) => Scalar::from_json(value)
            .map(|scalar| scalar.to_canonical_string())
            .unwrap_or_default(),
    }
}
