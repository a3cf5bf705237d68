//! Lenient field decoders for BuildingInfo payloads, where identifiers and
//! amounts arrive either as JSON strings or as numbers.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    String(String),
    Number(serde_json::Number),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::String(s) => s.trim().to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// Required id that may be a string or a number (`"123"` or `123`).
pub mod string_or_number {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Scalar::deserialize(deserializer)?.into_string();
        if value.is_empty() {
            return Err(serde::de::Error::custom("identifier must not be empty"));
        }
        Ok(value)
    }
}

/// Optional scalar; `null`, blank strings and non-scalars decode to `None`.
pub mod opt_string_or_number {
    use super::*;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| scalar_to_string(&v)))
    }
}

/// Renders a JSON scalar as a trimmed string, `None` for blanks and containers.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "string_or_number::deserialize")]
        id: String,
        #[serde(default, deserialize_with = "opt_string_or_number::deserialize")]
        value: Option<String>,
    }

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let row: Row = serde_json::from_value(json!({ "id": 4521 })).unwrap();
        assert_eq!(row.id, "4521");
        let row: Row = serde_json::from_value(json!({ "id": " 77 " })).unwrap();
        assert_eq!(row.id, "77");
        assert!(serde_json::from_value::<Row>(json!({ "id": "" })).is_err());
    }

    #[test]
    fn test_optional_blank_is_none() {
        let row: Row = serde_json::from_value(json!({ "id": 1, "value": "  " })).unwrap();
        assert_eq!(row.value, None);
        let row: Row = serde_json::from_value(json!({ "id": 1, "value": null })).unwrap();
        assert_eq!(row.value, None);
        let row: Row = serde_json::from_value(json!({ "id": 1, "value": 2500000 })).unwrap();
        assert_eq!(row.value.as_deref(), Some("2500000"));
        let row: Row = serde_json::from_value(json!({ "id": 1 })).unwrap();
        assert_eq!(row.value, None);
    }
}
