//! Entity types exchanged with the external store.
//!
//! Everything that comes back from a query is normalized here, at the
//! ingestion boundary: the entity key may arrive as `key` or `entityKey`,
//! the payload as raw bytes, a string or structured JSON, and attributes as
//! either an array of `{key, value}` pairs or a plain mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Binary payload of an entity, in whichever shape the store returned it.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Text(String),
    Json(Value),
}

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Payload {
    /// Interpret a wire value as a payload.
    ///
    /// `0x`-prefixed hex strings and arrays of byte values become `Bytes`,
    /// other strings stay `Text`, anything else is already-structured JSON.
    pub fn from_wire(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(text) => {
                if let Some(stripped) = text.strip_prefix("0x") {
                    if let Ok(bytes) = hex::decode(stripped) {
                        return Some(Payload::Bytes(bytes));
                    }
                }
                Some(Payload::Text(text))
            }
            Value::Array(items) if !items.is_empty() => {
                let bytes: Option<Vec<u8>> = items
                    .iter()
                    .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                    .collect();
                match bytes {
                    Some(bytes) => Some(Payload::Bytes(bytes)),
                    None => Some(Payload::Json(Value::Array(items))),
                }
            }
            other => Some(Payload::Json(other)),
        }
    }

    /// Decode the payload as a JSON object.
    ///
    /// Documents that parse but are not objects yield an empty map, the
    /// same as reading a field off a non-object.
    pub fn decode_object(&self) -> Result<Map<String, Value>, PayloadError> {
        let document = match self {
            Payload::Bytes(bytes) => serde_json::from_str(std::str::from_utf8(bytes)?)?,
            Payload::Text(text) => serde_json::from_str(text)?,
            Payload::Json(value) => value.clone(),
        };
        Ok(match document {
            Value::Object(map) => map,
            _ => Map::new(),
        })
    }
}

/// A single attribute as written to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Attribute set normalized into a single mapping.
///
/// Values are stored as strings. Falsy wire values (`null`, `false`, `0`,
/// empty string) normalize to the empty string, which lookups treat as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawAttributes")]
pub struct Attributes(HashMap<String, String>);

impl Attributes {
    /// Look up a non-empty attribute value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Whether the attribute `key` equals `value` exactly.
    pub fn matches(&self, key: &str, value: &str) -> bool {
        self.0.get(key).map(String::as_str) == Some(value)
    }
}

impl FromIterator<Attribute> for Attributes {
    /// The first occurrence of a key wins, as with a linear pair search.
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        let mut map = HashMap::new();
        for attribute in iter {
            map.entry(attribute.key).or_insert(attribute.value);
        }
        Attributes(map)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawAttributes {
    Pairs(Vec<RawAttribute>),
    Map(Map<String, Value>),
    /// Any other shape carries no usable attributes.
    Other(Value),
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    key: String,
    #[serde(default)]
    value: Value,
}

impl From<RawAttributes> for Attributes {
    fn from(raw: RawAttributes) -> Self {
        match raw {
            RawAttributes::Pairs(pairs) => pairs
                .into_iter()
                .map(|pair| Attribute::new(pair.key, loose_string(&pair.value)))
                .collect(),
            RawAttributes::Map(map) => map
                .into_iter()
                .map(|(key, value)| Attribute::new(key, loose_string(&value)))
                .collect(),
            RawAttributes::Other(_) => Attributes::default(),
        }
    }
}

/// Stringify a JSON value, mapping falsy values to the empty string.
pub(crate) fn loose_string(value: &Value) -> String {
    match value {
        Value::Null | Value::Bool(false) => String::new(),
        Value::Bool(true) => "true".to_string(),
        Value::String(text) => text.clone(),
        Value::Number(number) => {
            if number.as_f64() == Some(0.0) {
                String::new()
            } else {
                number.to_string()
            }
        }
        other => other.to_string(),
    }
}

/// An entity read back from the store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawEntity")]
pub struct Entity {
    /// Store-assigned key, empty when the store returned none.
    pub key: String,
    pub payload: Option<Payload>,
    pub attributes: Attributes,
    /// Literal transaction hash field, present on some store responses.
    pub tx_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntity {
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    entity_key: Option<String>,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    attributes: Option<RawAttributes>,
    #[serde(default)]
    tx_hash: Option<String>,
}

impl From<RawEntity> for Entity {
    fn from(raw: RawEntity) -> Self {
        let key = raw
            .key
            .filter(|key| !key.is_empty())
            .or(raw.entity_key)
            .unwrap_or_default();
        Entity {
            key,
            payload: Payload::from_wire(raw.payload),
            attributes: raw.attributes.map(Attributes::from).unwrap_or_default(),
            tx_hash: raw.tx_hash.filter(|hash| !hash.is_empty()),
        }
    }
}

/// Equality-filtered query, bounded by a result limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityQuery {
    pub filters: Vec<Attribute>,
    pub limit: usize,
    pub with_payload: bool,
    pub with_attributes: bool,
}

impl EntityQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            filters: Vec::new(),
            limit,
            with_payload: true,
            with_attributes: true,
        }
    }

    pub fn where_eq(mut self, key: &str, value: &str) -> Self {
        self.filters.push(Attribute::new(key, value));
        self
    }

    /// Value of the equality filter on `key`, if any.
    pub fn filter_value(&self, key: &str) -> Option<&str> {
        self.filters
            .iter()
            .find(|filter| filter.key == key)
            .map(|filter| filter.value.as_str())
    }
}

/// Request to create a new entity.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateEntity {
    pub payload: Vec<u8>,
    pub content_type: String,
    pub attributes: Vec<Attribute>,
    /// Expiration, in seconds from creation.
    pub expires_in: u64,
}

/// Identifiers the store assigns to a freshly created entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedEntity {
    #[serde(alias = "key")]
    pub entity_key: String,
    #[serde(alias = "hash", default)]
    pub tx_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attributes_from_pairs_and_map_agree() {
        let pairs: Entity = serde_json::from_value(json!({
            "key": "0x01",
            "attributes": [
                {"key": "wallet", "value": "0xabc"},
                {"key": "count", "value": 3}
            ]
        }))
        .unwrap();
        let map: Entity = serde_json::from_value(json!({
            "entityKey": "0x01",
            "attributes": {"wallet": "0xabc", "count": 3}
        }))
        .unwrap();

        assert_eq!(pairs.key, "0x01");
        assert_eq!(pairs.attributes, map.attributes);
        assert_eq!(pairs.attributes.get("wallet"), Some("0xabc"));
        assert_eq!(pairs.attributes.get("count"), Some("3"));
    }

    #[test]
    fn test_falsy_attribute_values_are_absent() {
        let entity: Entity = serde_json::from_value(json!({
            "key": "k",
            "attributes": {"a": null, "b": false, "c": 0, "d": ""}
        }))
        .unwrap();

        for key in ["a", "b", "c", "d"] {
            assert_eq!(entity.attributes.get(key), None, "attribute {key}");
        }
    }

    #[test]
    fn test_first_duplicate_pair_wins() {
        let entity: Entity = serde_json::from_value(json!({
            "key": "k",
            "attributes": [
                {"key": "type", "value": "first"},
                {"key": "type", "value": "second"}
            ]
        }))
        .unwrap();

        assert_eq!(entity.attributes.get("type"), Some("first"));
    }

    #[test]
    fn test_unexpected_attribute_shape_is_empty() {
        for attributes in [json!("oops"), json!(42), json!([{"value": "no key"}])] {
            let entity: Entity = serde_json::from_value(json!({
                "key": "0x02",
                "attributes": attributes
            }))
            .unwrap();

            assert_eq!(entity.key, "0x02");
            assert_eq!(entity.attributes, Attributes::default());
        }
    }

    #[test]
    fn test_payload_shapes_decode_to_same_object() {
        let expected = json!({"text": "hi"});
        let shapes = [
            Payload::Bytes(br#"{"text":"hi"}"#.to_vec()),
            Payload::Text(r#"{"text":"hi"}"#.to_string()),
            Payload::Json(expected.clone()),
        ];

        for shape in shapes {
            let decoded = shape.decode_object().unwrap();
            assert_eq!(Value::Object(decoded), expected);
        }
    }

    #[test]
    fn test_payload_from_wire() {
        let hex_payload = format!("0x{}", hex::encode(br#"{"a":1}"#));
        assert_eq!(
            Payload::from_wire(Value::String(hex_payload)),
            Some(Payload::Bytes(br#"{"a":1}"#.to_vec()))
        );
        assert_eq!(
            Payload::from_wire(json!([123, 125])),
            Some(Payload::Bytes(b"{}".to_vec()))
        );
        assert_eq!(
            Payload::from_wire(json!("plain")),
            Some(Payload::Text("plain".to_string()))
        );
        assert_eq!(Payload::from_wire(Value::Null), None);
    }

    #[test]
    fn test_invalid_payload_reports_error() {
        assert!(Payload::Bytes(vec![0xff, 0xfe]).decode_object().is_err());
        assert!(Payload::Text("not json".to_string()).decode_object().is_err());
        assert!(Payload::Text("\"a string\"".to_string())
            .decode_object()
            .unwrap()
            .is_empty());
    }
}
