//! Composite keys for secondary indexes.
//!
//! A composite key encodes `(object_type, attributes...)` into one ordinary
//! state key so that a prefix range scan returns every entry sharing leading
//! attributes. The layout is
//!
//! ```text
//! \0 object_type \0 attr_1 \0 attr_2 \0 ... attr_n \0
//! ```
//!
//! - The leading `\0` keeps composite keys out of the simple-key space.
//! - Components must be non-empty (object type) and must not contain `\0`
//!   or `U+10FFFF`; the latter is the exclusive upper bound of range scans.

use crate::error::{StoreError, StoreResult};

/// Separator and namespace marker.
const DELIMITER: char = '\u{0}';

/// Largest scalar value; appended to a prefix to form the range end.
const MAX_UNICODE_RUNE: char = char::MAX;

/// Returns `true` if `key` lives in the composite key namespace.
pub fn is_composite_key(key: &str) -> bool {
    key.starts_with(DELIMITER)
}

/// Build a composite key from an object type and attribute values.
pub fn create_composite_key(object_type: &str, attributes: &[&str]) -> StoreResult<String> {
    if object_type.is_empty() {
        return Err(StoreError::InvalidCompositeKey {
            reason: "object type must not be empty".into(),
        });
    }
    validate_component(object_type)?;

    let mut key = String::with_capacity(
        2 + object_type.len() + attributes.iter().map(|a| a.len() + 1).sum::<usize>(),
    );
    key.push(DELIMITER);
    key.push_str(object_type);
    key.push(DELIMITER);
    for attribute in attributes {
        validate_component(attribute)?;
        key.push_str(attribute);
        key.push(DELIMITER);
    }
    Ok(key)
}

/// Split a composite key into its object type and attributes.
pub fn split_composite_key(key: &str) -> StoreResult<(String, Vec<String>)> {
    let body = key
        .strip_prefix(DELIMITER)
        .ok_or_else(|| StoreError::InvalidCompositeKey {
            reason: "missing namespace marker".into(),
        })?;
    let body = body
        .strip_suffix(DELIMITER)
        .ok_or_else(|| StoreError::InvalidCompositeKey {
            reason: "missing trailing delimiter".into(),
        })?;

    let mut components = body.split(DELIMITER).map(str::to_string);
    let object_type = components
        .next()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| StoreError::InvalidCompositeKey {
            reason: "object type must not be empty".into(),
        })?;
    Ok((object_type, components.collect()))
}

/// Half-open key range `[start, end)` covering every composite key whose
/// leading attributes equal `attributes`.
pub fn partial_key_range(object_type: &str, attributes: &[&str]) -> StoreResult<(String, String)> {
    let start = create_composite_key(object_type, attributes)?;
    let mut end = start.clone();
    end.push(MAX_UNICODE_RUNE);
    Ok((start, end))
}

fn validate_component(component: &str) -> StoreResult<()> {
    if let Some(bad) = component
        .chars()
        .find(|c| *c == DELIMITER || *c == MAX_UNICODE_RUNE)
    {
        return Err(StoreError::InvalidCompositeKey {
            reason: format!("component {component:?} contains reserved character {bad:?}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_index_convention() {
        let key = create_composite_key("poll~id", &["P1", "A1"]).unwrap();
        assert_eq!(key, "\u{0}poll~id\u{0}P1\u{0}A1\u{0}");
        assert!(is_composite_key(&key));
        assert!(!is_composite_key("A1"));
    }

    #[test]
    fn split_recovers_components() {
        let key = create_composite_key("poll~id", &["P1", "A1"]).unwrap();
        let (object_type, attributes) = split_composite_key(&key).unwrap();
        assert_eq!(object_type, "poll~id");
        assert_eq!(attributes, vec!["P1", "A1"]);
    }

    #[test]
    fn split_handles_key_without_attributes() {
        let key = create_composite_key("poll~id", &[]).unwrap();
        let (object_type, attributes) = split_composite_key(&key).unwrap();
        assert_eq!(object_type, "poll~id");
        assert!(attributes.is_empty());
    }

    #[test]
    fn reserved_characters_are_rejected() {
        assert!(create_composite_key("poll~id", &["P\u{0}1"]).is_err());
        assert!(create_composite_key("poll~id", &["P\u{10FFFF}"]).is_err());
        assert!(create_composite_key("", &["P1"]).is_err());
    }

    #[test]
    fn split_rejects_simple_keys() {
        assert!(matches!(
            split_composite_key("A1"),
            Err(StoreError::InvalidCompositeKey { .. })
        ));
    }

    #[test]
    fn partial_range_covers_only_matching_prefix() {
        let (start, end) = partial_key_range("poll~id", &["P1"]).unwrap();
        let inside = create_composite_key("poll~id", &["P1", "zzz"]).unwrap();
        let sibling = create_composite_key("poll~id", &["P10", "A1"]).unwrap();
        assert!(start <= inside && inside < end);
        // "P10" shares the textual prefix "P1" but not the attribute.
        assert!(!(start <= sibling && sibling < end));
    }
}
