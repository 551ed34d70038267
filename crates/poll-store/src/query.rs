//! Selector queries.
//!
//! A [`Selector`] is a conjunction of exact-match field predicates. Its
//! query-string form is the familiar `{"selector": {...}}` document; only
//! plain field names mapped to scalar values are accepted. Operators (`$or`,
//! `$gt`, ...), nested objects and extra top-level clauses are rejected
//! rather than silently ignored.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};

/// Conjunctive exact-match selector over top-level record fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selector {
    fields: BTreeMap<String, Value>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate `field == value`. A repeated field replaces the
    /// earlier value.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// An empty selector matches every JSON object.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns `true` if `document` is an object satisfying every predicate.
    pub fn matches(&self, document: &Value) -> bool {
        let Some(object) = document.as_object() else {
            return false;
        };
        self.fields
            .iter()
            .all(|(field, expected)| object.get(field) == Some(expected))
    }

    /// Render as a `{"selector": {...}}` query string.
    pub fn to_query_string(&self) -> String {
        let selector: Map<String, Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let mut root = Map::new();
        root.insert("selector".into(), Value::Object(selector));
        Value::Object(root).to_string()
    }

    /// Parse a query string, rejecting anything beyond exact-match fields.
    pub fn parse(query: &str) -> StoreResult<Self> {
        let root: Value = serde_json::from_str(query)
            .map_err(|e| StoreError::InvalidQuery(format!("not valid JSON: {e}")))?;
        let Value::Object(mut root) = root else {
            return Err(StoreError::InvalidQuery("query must be a JSON object".into()));
        };

        let selector = root
            .remove("selector")
            .ok_or_else(|| StoreError::InvalidQuery("missing \"selector\" clause".into()))?;
        if let Some(extra) = root.keys().next() {
            return Err(StoreError::InvalidQuery(format!(
                "unsupported clause {extra:?}"
            )));
        }
        let Value::Object(selector) = selector else {
            return Err(StoreError::InvalidQuery("\"selector\" must be an object".into()));
        };

        let mut fields = BTreeMap::new();
        for (field, value) in selector {
            if field.starts_with('$') {
                return Err(StoreError::InvalidQuery(format!(
                    "operator {field:?} is not supported"
                )));
            }
            if value.is_object() || value.is_array() {
                return Err(StoreError::InvalidQuery(format!(
                    "field {field:?} must match a scalar value"
                )));
            }
            fields.insert(field, value);
        }
        Ok(Self { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn matches_requires_every_field() {
        let selector = Selector::new()
            .with("docType", "asset")
            .with("pollTableID", "P1");
        assert!(selector.matches(&json!({"docType": "asset", "pollTableID": "P1", "x": 1})));
        assert!(!selector.matches(&json!({"docType": "asset", "pollTableID": "P2"})));
        assert!(!selector.matches(&json!({"pollTableID": "P1"})));
        assert!(!selector.matches(&json!("P1")));
    }

    #[test]
    fn match_is_type_exact() {
        let selector = Selector::new().with("pollTableID", "5");
        assert!(!selector.matches(&json!({"pollTableID": 5})));
    }

    #[test]
    fn query_string_round_trips() {
        let selector = Selector::new()
            .with("transactionType", "vote")
            .with("userID", "U2");
        let query = selector.to_query_string();
        assert_eq!(
            query,
            r#"{"selector":{"transactionType":"vote","userID":"U2"}}"#
        );
        assert_eq!(Selector::parse(&query).unwrap(), selector);
    }

    #[test]
    fn operators_and_nested_values_are_rejected() {
        for query in [
            r#"{"selector":{"$or":[{"a":1}]}}"#,
            r#"{"selector":{"a":{"$gt":1}}}"#,
            r#"{"selector":{"a":1},"limit":5}"#,
            r#"{"a":1}"#,
            r#"[]"#,
            "not json",
        ] {
            assert!(
                matches!(Selector::parse(query), Err(StoreError::InvalidQuery(_))),
                "accepted {query}"
            );
        }
    }

    #[test]
    fn empty_selector_matches_any_object() {
        let selector = Selector::parse(r#"{"selector":{}}"#).unwrap();
        assert!(selector.is_empty());
        assert!(selector.matches(&json!({"anything": true})));
    }
}
