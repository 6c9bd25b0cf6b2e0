//! Normalization for JSON-typed columns.
//!
//! Depending on driver and column type, a JSON-typed column can surface as
//! raw text, raw bytes, or an already-decoded value. Instead of duck-typed
//! branching at every call site, the adapter funnels everything through
//! [`normalize`], which either decodes or passes the original through
//! untouched. Unparseable data never fails a read; the typed helpers below
//! degrade to an empty default instead.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::RecipeIngredient;

/// Raw driver output for a JSON-typed column. Closed set: anything else is
/// a driver we do not support.
#[derive(Debug, Clone, PartialEq)]
pub enum RawJson {
    Text(String),
    Bytes(Vec<u8>),
    Value(Value),
}

/// Outcome of normalizing a raw column value.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonField {
    Decoded(Value),
    /// Input that was not valid JSON, returned unchanged.
    PassThrough(RawJson),
}

impl JsonField {
    pub fn into_decoded(self) -> Option<Value> {
        match self {
            JsonField::Decoded(v) => Some(v),
            JsonField::PassThrough(_) => None,
        }
    }
}

pub fn normalize(raw: RawJson) -> JsonField {
    match raw {
        RawJson::Value(v) => JsonField::Decoded(v),
        RawJson::Text(s) => match serde_json::from_str(&s) {
            Ok(v) => JsonField::Decoded(v),
            Err(_) => JsonField::PassThrough(RawJson::Text(s)),
        },
        RawJson::Bytes(b) => match serde_json::from_slice(&b) {
            Ok(v) => JsonField::Decoded(v),
            Err(_) => JsonField::PassThrough(RawJson::Bytes(b)),
        },
    }
}

fn decode_or_default<T: DeserializeOwned + Default>(value: Value) -> T {
    normalize(RawJson::Value(value))
        .into_decoded()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Decode a JSONB column holding a string array (`tags`, `images`).
pub fn string_list(value: Value) -> Vec<String> {
    decode_or_default(value)
}

/// Decode a JSONB column holding an id array (`recipe_ids`).
pub fn id_list(value: Value) -> Vec<i32> {
    decode_or_default(value)
}

/// Decode a recipe's `ingredients` JSONB column.
pub fn ingredient_list(value: Value) -> Vec<RecipeIngredient> {
    decode_or_default(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_predecoded_value() {
        let field = normalize(RawJson::Value(json!(["a", "b"])));
        assert_eq!(field, JsonField::Decoded(json!(["a", "b"])));
    }

    #[test]
    fn test_normalize_raw_text() {
        let field = normalize(RawJson::Text(r#"["gin","tonic"]"#.to_string()));
        assert_eq!(field, JsonField::Decoded(json!(["gin", "tonic"])));
    }

    #[test]
    fn test_normalize_raw_bytes() {
        let field = normalize(RawJson::Bytes(br#"{"a":1}"#.to_vec()));
        assert_eq!(field, JsonField::Decoded(json!({"a": 1})));
    }

    #[test]
    fn test_unparseable_text_passes_through() {
        let field = normalize(RawJson::Text("not json".to_string()));
        assert_eq!(
            field,
            JsonField::PassThrough(RawJson::Text("not json".to_string()))
        );
        assert_eq!(field.into_decoded(), None);
    }

    #[test]
    fn test_unparseable_bytes_pass_through() {
        let field = normalize(RawJson::Bytes(vec![0xff, 0xfe]));
        assert_eq!(field, JsonField::PassThrough(RawJson::Bytes(vec![0xff, 0xfe])));
    }

    #[test]
    fn test_string_list_decodes_array() {
        assert_eq!(
            string_list(json!(["sweet", "citrus"])),
            vec!["sweet".to_string(), "citrus".to_string()]
        );
    }

    #[test]
    fn test_string_list_wrong_shape_degrades_to_empty() {
        assert!(string_list(json!({"not": "a list"})).is_empty());
        assert!(string_list(json!(null)).is_empty());
    }

    #[test]
    fn test_id_list() {
        assert_eq!(id_list(json!([3, 1, 7])), vec![3, 1, 7]);
    }

    #[test]
    fn test_ingredient_list_fills_defaults() {
        let list = ingredient_list(json!([
            {"name": "Gin", "amount": "2", "units": "oz"},
            {"name": "Lime juice", "amount": 0.75, "units": "oz", "optional": true}
        ]));
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].name, "Gin");
        assert!(!list[0].optional);
        assert!(list[1].optional);
    }

    #[test]
    fn test_ingredient_list_missing_name_degrades_to_empty() {
        assert!(ingredient_list(json!([{"amount": "2"}])).is_empty());
    }
}
