//! Field deserializers for loosely typed vendor payloads.
//!
//! Each helper yields `None` (or an empty list) for a value of unexpected
//! type instead of failing the enclosing struct. Use them with
//! `#[serde(default, deserialize_with = "...")]` so absent fields default too.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Identifier given as a number or a non-blank string.
pub fn id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(id_from_value(Value::deserialize(deserializer)?))
}

pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(value) => Some(value),
        Value::Number(value) => Some(value.to_string()),
        _ => None,
    })
}

/// Integer given as a number (fractions truncated) or a numeric string.
pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(integer_from_value(&Value::deserialize(deserializer)?))
}

/// List of strings; non-string entries are skipped.
pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => values
            .into_iter()
            .filter_map(|value| match value {
                Value::String(value) => Some(value),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Optional nested object; a value of another shape becomes `None`.
pub fn object<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

/// List of objects; entries that are not objects are skipped.
pub fn objects<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(values) => values
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect(),
        _ => Vec::new(),
    })
}

fn id_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_owned()),
        Value::Number(_) => integer_from_value(&value).map(|id| id.to_string()),
        _ => None,
    }
}

fn integer_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|value| value.is_finite())
                .map(|value| value.trunc() as i64)
        }),
        Value::String(value) => value.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "id")]
        id: Option<String>,
        #[serde(default, deserialize_with = "integer")]
        count: Option<i64>,
        #[serde(default, deserialize_with = "string")]
        name: Option<String>,
        #[serde(default, deserialize_with = "strings")]
        tags: Vec<String>,
        #[serde(default, deserialize_with = "objects")]
        children: Vec<Probe>,
    }

    fn probe(json: &str) -> Probe {
        serde_json::from_str(json).expect("lenient decode never fails on shape")
    }

    #[test]
    fn ids_accept_numbers_and_strings() {
        assert_eq!(probe(r#"{"id":1234}"#).id.as_deref(), Some("1234"));
        assert_eq!(probe(r#"{"id":"ab-9"}"#).id.as_deref(), Some("ab-9"));
        assert_eq!(probe(r#"{"id":1.0e3}"#).id.as_deref(), Some("1000"));
        assert_eq!(probe(r#"{"id":true}"#).id, None);
        assert_eq!(probe(r#"{"id":"  "}"#).id, None);
    }

    #[test]
    fn wrong_types_degrade_to_none() {
        let decoded = probe(r#"{"count":"x","name":{"nested":1},"tags":"red"}"#);
        assert_eq!(decoded.count, None);
        assert_eq!(decoded.name, None);
        assert!(decoded.tags.is_empty());
    }

    #[test]
    fn absent_and_null_fields_default() {
        let decoded = probe(r#"{"id":null}"#);
        assert_eq!(decoded.id, None);
        assert_eq!(decoded.count, None);
        assert!(decoded.children.is_empty());
    }

    #[test]
    fn non_object_list_entries_are_skipped() {
        let decoded = probe(r#"{"children":[{"id":1},"junk",7,{"id":"2"}],"tags":["a",3,"b"]}"#);
        let ids: Vec<_> = decoded
            .children
            .iter()
            .filter_map(|child| child.id.as_deref())
            .collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(decoded.tags, vec!["a", "b"]);
    }

    #[test]
    fn numeric_strings_parse_as_integers() {
        assert_eq!(probe(r#"{"count":" 42 "}"#).count, Some(42));
        assert_eq!(probe(r#"{"count":12.9}"#).count, Some(12));
    }
}
