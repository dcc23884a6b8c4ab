//! Dotted paths into JSON documents.
//!
//! Segments are separated by `.`, a literal dot is written as `\.`. Numeric
//! segments index arrays, and `-1` or the array length appends when setting.
//! Setting past the end of an array is an error.

use crate::error::CoreError;
use serde_json::{Map, Value as JsonValue};

pub fn parse_path(path: &str) -> Result<Vec<String>, CoreError> {
    if path.is_empty() {
        return Err(path_error(path, "path is empty"));
    }

    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => current.push(escaped),
                None => current.push('\\'),
            },
            '.' => segments.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    segments.push(current);

    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(path_error(path, "empty path segment"));
    }
    Ok(segments)
}

pub fn get<'a>(document: &'a JsonValue, path: &str) -> Result<Option<&'a JsonValue>, CoreError> {
    let segments = parse_path(path)?;
    let mut node = document;
    for segment in &segments {
        let next = match node {
            JsonValue::Object(map) => map.get(segment),
            JsonValue::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get(idx)),
            _ => None,
        };
        match next {
            Some(next) => node = next,
            None => return Ok(None),
        }
    }
    Ok(Some(node))
}

pub fn exists(document: &JsonValue, path: &str) -> Result<bool, CoreError> {
    Ok(get(document, path)?.is_some())
}

/// Sets `value` at `path`, creating intermediate objects and replacing
/// scalars that stand in the way.
pub fn set(document: &mut JsonValue, path: &str, value: JsonValue) -> Result<(), CoreError> {
    let segments = parse_path(path)?;
    set_segments(document, &segments, value, path)
}

fn set_segments(
    node: &mut JsonValue,
    segments: &[String],
    value: JsonValue,
    path: &str,
) -> Result<(), CoreError> {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => {
            *node = value;
            return Ok(());
        }
    };

    if !node.is_object() && !node.is_array() {
        *node = JsonValue::Object(Map::new());
    }

    match node {
        JsonValue::Object(map) => {
            let child = map
                .entry(head.clone())
                .or_insert_with(|| JsonValue::Object(Map::new()));
            set_segments(child, rest, value, path)
        }
        JsonValue::Array(items) => {
            let idx = if head == "-1" {
                items.push(JsonValue::Null);
                items.len() - 1
            } else {
                head.parse::<usize>()
                    .map_err(|_| path_error(path, format!("\"{}\" is not an array index", head)))?
            };
            if idx == items.len() {
                items.push(JsonValue::Null);
            }
            match items.get_mut(idx) {
                Some(item) => set_segments(item, rest, value, path),
                None => Err(path_error(
                    path,
                    format!(
                        "index {} is out of range for array of length {}",
                        idx,
                        items.len()
                    ),
                )),
            }
        }
        _ => Err(path_error(path, "cannot descend into scalar")),
    }
}

/// Removes the value at `path`. Returns whether something was removed.
pub fn delete(document: &mut JsonValue, path: &str) -> Result<bool, CoreError> {
    let segments = parse_path(path)?;
    let (last, parents) = match segments.split_last() {
        Some(split) => split,
        None => return Ok(false),
    };

    let mut node = document;
    for segment in parents {
        let next = match node {
            JsonValue::Object(map) => map.get_mut(segment),
            JsonValue::Array(items) => match segment.parse::<usize>() {
                Ok(idx) => items.get_mut(idx),
                Err(_) => None,
            },
            _ => None,
        };
        match next {
            Some(next) => node = next,
            None => return Ok(false),
        }
    }

    match node {
        JsonValue::Object(map) => {
            if !map.contains_key(last) {
                return Ok(false);
            }
            *map = std::mem::take(map)
                .into_iter()
                .filter(|(key, _)| key != last)
                .collect();
            Ok(true)
        }
        JsonValue::Array(items) => match last.parse::<usize>() {
            Ok(idx) if idx < items.len() => {
                items.remove(idx);
                Ok(true)
            }
            _ => Ok(false),
        },
        _ => Ok(false),
    }
}

fn path_error(path: &str, reason: impl ToString) -> CoreError {
    CoreError::JsonPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_path_with_escaped_dot() {
        assert_eq!(
            parse_path(r"a.b\.c.0").unwrap(),
            vec!["a".to_string(), "b.c".to_string(), "0".to_string()]
        );
        assert!(parse_path("").is_err());
        assert!(parse_path("a..b").is_err());
    }

    #[test]
    fn test_get() {
        let document = json!({"a": {"b": [10, {"c": true}]}});
        assert_eq!(get(&document, "a.b.0").unwrap(), Some(&json!(10)));
        assert_eq!(get(&document, "a.b.1.c").unwrap(), Some(&json!(true)));
        assert_eq!(get(&document, "a.x").unwrap(), None);
        assert_eq!(get(&document, "a.b.x").unwrap(), None);
    }

    #[test]
    fn test_set_creates_intermediate_objects() {
        let mut document = json!({});
        set(&mut document, "a.b", json!(1)).unwrap();
        assert_eq!(document, json!({"a": {"b": 1}}));

        let mut scalar = json!(123);
        set(&mut scalar, "name", json!("x")).unwrap();
        assert_eq!(scalar, json!({"name": "x"}));
    }

    #[test]
    fn test_set_array_index_and_append() {
        let mut document = json!({"items": [1, 2]});
        set(&mut document, "items.0", json!(5)).unwrap();
        set(&mut document, "items.-1", json!(3)).unwrap();
        assert_eq!(document, json!({"items": [5, 2, 3]}));
        assert!(set(&mut document, "items.x", json!(1)).is_err());
    }

    #[test]
    fn test_set_rejects_index_past_the_end() {
        let mut document = json!({"items": [1]});
        set(&mut document, "items.1", json!(2)).unwrap();
        assert_eq!(document, json!({"items": [1, 2]}));

        for path in ["items.3", "items.1000000000", "items.18446744073709551615"] {
            assert!(matches!(
                set(&mut document, path, json!(0)),
                Err(CoreError::JsonPath { .. })
            ));
        }
        assert_eq!(document, json!({"items": [1, 2]}));
    }

    #[test]
    fn test_delete_keeps_key_order() {
        let mut document = json!({"a": 1, "b": 2, "c": 3});
        assert!(delete(&mut document, "a").unwrap());
        assert!(!delete(&mut document, "missing.key").unwrap());
        assert_eq!(document.to_string(), r#"{"b":2,"c":3}"#);
    }
}
