//! Field resolution through ordered fallback chains.
//!
//! A display field may live in the decoded payload, in the attribute set, or
//! nowhere. Each field declares its sources in priority order; the first one
//! holding a truthy value wins, otherwise the chain's default applies.

use serde_json::{Map, Value};

use crate::store::entity::loose_string;
use crate::store::Attributes;

/// Read-only view of a primary entity during record assembly.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    pub key: &'a str,
    pub payload: &'a Map<String, Value>,
    pub attributes: &'a Attributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    Payload(&'static str),
    Attribute(&'static str),
}

impl FieldSource {
    fn extract(self, view: &EntityView<'_>) -> Option<String> {
        match self {
            FieldSource::Payload(name) => view
                .payload
                .get(name)
                .map(loose_string)
                .filter(|value| !value.is_empty()),
            FieldSource::Attribute(name) => view.attributes.get(name).map(str::to_string),
        }
    }
}

/// Ordered sources for one field plus the value used when all are empty.
#[derive(Debug, Clone, Copy)]
pub struct FieldChain {
    sources: &'static [FieldSource],
    default: &'static str,
}

impl FieldChain {
    pub const fn new(sources: &'static [FieldSource], default: &'static str) -> Self {
        Self { sources, default }
    }

    pub fn resolve(&self, view: &EntityView<'_>) -> String {
        self.sources
            .iter()
            .find_map(|source| source.extract(view))
            .unwrap_or_else(|| self.default.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Attribute;
    use serde_json::json;

    const NAME: FieldChain = FieldChain::new(
        &[FieldSource::Payload("name"), FieldSource::Attribute("name")],
        "Anonymous",
    );

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_payload_wins_over_attribute() {
        let payload = payload(json!({"name": "Ada"}));
        let attributes: Attributes = vec![Attribute::new("name", "Grace")].into_iter().collect();
        let view = EntityView {
            key: "k",
            payload: &payload,
            attributes: &attributes,
        };

        assert_eq!(NAME.resolve(&view), "Ada");
    }

    #[test]
    fn test_falls_through_empty_values() {
        let payload = payload(json!({"name": ""}));
        let attributes: Attributes = vec![Attribute::new("name", "Grace")].into_iter().collect();
        let view = EntityView {
            key: "k",
            payload: &payload,
            attributes: &attributes,
        };

        assert_eq!(NAME.resolve(&view), "Grace");
    }

    #[test]
    fn test_default_when_nothing_matches() {
        let payload = payload(json!({"name": null}));
        let attributes = Attributes::default();
        let view = EntityView {
            key: "k",
            payload: &payload,
            attributes: &attributes,
        };

        assert_eq!(NAME.resolve(&view), "Anonymous");
    }
}
