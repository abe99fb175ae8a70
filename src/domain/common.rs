//! Shared traits and amount coercion for the budget domain.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Exposes the stable string identifier of a stored entity.
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Finds an entity by id in a slice.
pub fn find_by_id<'a, T: Identifiable>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

/// Coerces user-supplied amounts: anything non-finite becomes zero.
pub fn coerce_amount(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Parses free-form amount text, falling back to zero.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' '))
        .collect();
    cleaned.parse::<f64>().map(coerce_amount).unwrap_or(0.0)
}

/// Deserializes an amount that may be absent, `null`, a string, or garbage.
pub fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64().map(coerce_amount).unwrap_or(0.0),
        Some(Value::String(text)) => parse_amount(&text),
        Some(Value::Bool(flag)) => {
            if flag {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    })
}

/// Deserializes a string field that may be missing, `null`, or another JSON type.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => text,
        _ => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default, deserialize_with = "lenient_amount")]
        amount: f64,
    }

    fn amount_of(json: &str) -> f64 {
        serde_json::from_str::<Holder>(json).unwrap().amount
    }

    #[test]
    fn coerces_amount_shapes() {
        assert_eq!(amount_of(r#"{"amount": 1200}"#), 1200.0);
        assert_eq!(amount_of(r#"{"amount": "3,000,000"}"#), 3_000_000.0);
        assert_eq!(amount_of(r#"{"amount": "abc"}"#), 0.0);
        assert_eq!(amount_of(r#"{"amount": null}"#), 0.0);
        assert_eq!(amount_of(r#"{}"#), 0.0);
    }

    #[test]
    fn parse_amount_rejects_non_finite() {
        assert_eq!(parse_amount("inf"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
        assert_eq!(parse_amount(" 42.5 "), 42.5);
    }
}
