use crate::{
    error::CoreError,
    model::{Column, Table},
    value::{Value, DATE_FORMAT, NULL_MARKER, TIMESTAMP_FORMAT},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

const TYPE_ALIASES: &[(&str, &str)] = &[
    ("bigint", "int8"),
    ("boolean", "bool"),
    ("character", "bpchar"),
    ("character varying", "varchar"),
    ("decimal", "numeric"),
    ("double precision", "float8"),
    ("int", "int4"),
    ("integer", "int4"),
    ("real", "float4"),
    ("smallint", "int2"),
    ("timestamp without time zone", "timestamp"),
    ("timestamp with time zone", "timestamptz"),
];

/// Normalizes a declared type name, e.g. `character varying(64)` becomes `varchar`.
pub fn canonical_type_name(type_name: &str) -> String {
    let lowered = type_name.trim().to_lowercase();
    let base = match lowered.find('(') {
        Some(pos) => {
            let suffix = lowered[pos..]
                .find(')')
                .map(|end| lowered[pos + end + 1..].trim().to_string())
                .unwrap_or_default();
            format!("{} {}", lowered[..pos].trim(), suffix)
                .trim()
                .to_string()
        }
        None => lowered,
    };

    TYPE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == base)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(base)
}

/// Encodes and decodes column values of one table.
pub trait TableDriver: Send + Sync {
    fn table(&self) -> &Table;

    fn encode_value_by_type_name(&self, type_name: &str, value: &Value)
        -> Result<Vec<u8>, CoreError>;

    fn decode_value_by_type_name(&self, type_name: &str, data: &[u8]) -> Result<Value, CoreError>;

    fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.table().column_by_name(name)
    }

    fn column_by_idx(&self, idx: usize) -> Option<&Column> {
        self.table().column_by_idx(idx)
    }

    fn encode_value_by_column_idx(&self, idx: usize, value: &Value) -> Result<Vec<u8>, CoreError> {
        let column = self
            .column_by_idx(idx)
            .ok_or(CoreError::UnknownColumnIdx(idx))?;
        self.encode_value_by_type_name(&column.type_name, value)
    }

    fn decode_value_by_column_idx(&self, idx: usize, data: &[u8]) -> Result<Value, CoreError> {
        let column = self
            .column_by_idx(idx)
            .ok_or(CoreError::UnknownColumnIdx(idx))?;
        self.decode_value_by_type_name(&column.type_name, data)
    }

    fn encode_value_by_column_name(&self, name: &str, value: &Value) -> Result<Vec<u8>, CoreError> {
        let column = self
            .column_by_name(name)
            .ok_or_else(|| CoreError::UnknownColumn(name.to_string()))?;
        self.encode_value_by_type_name(&column.type_name, value)
    }

    fn decode_value_by_column_name(&self, name: &str, data: &[u8]) -> Result<Value, CoreError> {
        let column = self
            .column_by_name(name)
            .ok_or_else(|| CoreError::UnknownColumn(name.to_string()))?;
        self.decode_value_by_type_name(&column.type_name, data)
    }
}

/// Driver for the PostgreSQL text representation of the common scalar types.
#[derive(Debug, Clone)]
pub struct TextDriver {
    table: Table,
}

impl TextDriver {
    pub fn new(table: Table) -> Self {
        Self { table }
    }
}

impl TableDriver for TextDriver {
    fn table(&self) -> &Table {
        &self.table
    }

    fn encode_value_by_type_name(
        &self,
        type_name: &str,
        value: &Value,
    ) -> Result<Vec<u8>, CoreError> {
        if value.is_null() {
            return Ok(NULL_MARKER.as_bytes().to_vec());
        }

        let canonical = canonical_type_name(type_name);
        let encoded = match canonical.as_str() {
            "text" | "varchar" | "char" | "bpchar" | "citext" | "name" => value.to_string(),
            "uuid" => {
                let text = value.to_string();
                check_uuid(&text).map_err(|reason| CoreError::encode(&canonical, value, reason))?;
                text
            }
            "int2" => encode_int(&canonical, value, i16::MIN as i64, i16::MAX as i64)?,
            "int4" => encode_int(&canonical, value, i32::MIN as i64, i32::MAX as i64)?,
            "int8" => encode_int(&canonical, value, i64::MIN, i64::MAX)?,
            "float4" | "float8" | "numeric" => encode_float(&canonical, value)?,
            "bool" => match value {
                Value::Bool(true) => "t".to_string(),
                Value::Bool(false) => "f".to_string(),
                Value::Text(text) => match parse_bool(text) {
                    Some(true) => "t".to_string(),
                    Some(false) => "f".to_string(),
                    None => return Err(CoreError::encode(&canonical, value, "not a boolean")),
                },
                _ => return Err(CoreError::encode(&canonical, value, "not a boolean")),
            },
            "date" => match value {
                Value::Date(date) => date.format(DATE_FORMAT).to_string(),
                Value::Timestamp(timestamp) => timestamp.date().format(DATE_FORMAT).to_string(),
                Value::Text(text) => parse_date(text)
                    .map_err(|reason| CoreError::encode(&canonical, value, reason))?
                    .format(DATE_FORMAT)
                    .to_string(),
                _ => return Err(CoreError::encode(&canonical, value, "not a date")),
            },
            "timestamp" | "timestamptz" => {
                let timestamp = match value {
                    Value::Timestamp(timestamp) => *timestamp,
                    Value::Date(date) => date.and_hms_opt(0, 0, 0).unwrap_or_default(),
                    Value::Text(text) => parse_timestamp(text)
                        .map_err(|reason| CoreError::encode(&canonical, value, reason))?,
                    _ => return Err(CoreError::encode(&canonical, value, "not a timestamp")),
                };
                let mut text = timestamp.format(TIMESTAMP_FORMAT).to_string();
                if canonical == "timestamptz" {
                    text.push_str("+00");
                }
                text
            }
            "json" | "jsonb" => match value {
                Value::Text(text) => {
                    serde_json::from_str::<serde_json::Value>(text)?;
                    text.clone()
                }
                other => other.to_json().to_string(),
            },
            _ => return Err(CoreError::UnsupportedType(type_name.to_string())),
        };

        Ok(encoded.into_bytes())
    }

    fn decode_value_by_type_name(&self, type_name: &str, data: &[u8]) -> Result<Value, CoreError> {
        let canonical = canonical_type_name(type_name);
        let text = std::str::from_utf8(data)?;

        let value = match canonical.as_str() {
            "text" | "varchar" | "char" | "bpchar" | "citext" | "name" => {
                Value::Text(text.to_string())
            }
            "uuid" => {
                check_uuid(text).map_err(|reason| CoreError::decode(&canonical, data, reason))?;
                Value::Text(text.to_lowercase())
            }
            "int2" => Value::Int(
                text.trim()
                    .parse::<i16>()
                    .map_err(|err| CoreError::decode(&canonical, data, err))? as i64,
            ),
            "int4" => Value::Int(
                text.trim()
                    .parse::<i32>()
                    .map_err(|err| CoreError::decode(&canonical, data, err))? as i64,
            ),
            "int8" => Value::Int(
                text.trim()
                    .parse::<i64>()
                    .map_err(|err| CoreError::decode(&canonical, data, err))?,
            ),
            "float4" | "float8" | "numeric" => Value::Float(
                parse_float(text).map_err(|reason| CoreError::decode(&canonical, data, reason))?,
            ),
            "bool" => Value::Bool(
                parse_bool(text)
                    .ok_or_else(|| CoreError::decode(&canonical, data, "not a boolean"))?,
            ),
            "date" => Value::Date(
                parse_date(text).map_err(|reason| CoreError::decode(&canonical, data, reason))?,
            ),
            "timestamp" | "timestamptz" => Value::Timestamp(
                parse_timestamp(text)
                    .map_err(|reason| CoreError::decode(&canonical, data, reason))?,
            ),
            "json" | "jsonb" => Value::Json(
                serde_json::from_str(text)
                    .map_err(|err| CoreError::decode(&canonical, data, err))?,
            ),
            _ => return Err(CoreError::UnsupportedType(type_name.to_string())),
        };

        Ok(value)
    }
}

fn encode_int(type_name: &str, value: &Value, min: i64, max: i64) -> Result<String, CoreError> {
    let number = match value {
        Value::Int(number) => *number,
        Value::Float(number) if number.fract() == 0.0 => *number as i64,
        Value::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|err| CoreError::encode(type_name, value, err))?,
        _ => return Err(CoreError::encode(type_name, value, "not an integer")),
    };

    if number < min || number > max {
        return Err(CoreError::encode(type_name, value, "value out of range"));
    }

    Ok(number.to_string())
}

fn encode_float(type_name: &str, value: &Value) -> Result<String, CoreError> {
    match value {
        Value::Int(number) => Ok(number.to_string()),
        Value::Float(number) => Ok(number.to_string()),
        Value::Text(text) => parse_float(text)
            .map(|number| number.to_string())
            .map_err(|reason| CoreError::encode(type_name, value, reason)),
        _ => Err(CoreError::encode(type_name, value, "not a number")),
    }
}

fn parse_float(text: &str) -> Result<f64, String> {
    match text.trim() {
        "NaN" => Ok(f64::NAN),
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        other => other.parse::<f64>().map_err(|err| err.to_string()),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_lowercase().as_str() {
        "t" | "true" | "1" | "y" | "yes" | "on" => Some(true),
        "f" | "false" | "0" | "n" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|err| err.to_string())
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime, String> {
    let text = text.trim();
    for format in ["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"] {
        if let Ok(timestamp) = DateTime::parse_from_str(text, format) {
            return Ok(timestamp.with_timezone(&Utc).naive_utc());
        }
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(text) {
        return Ok(timestamp.with_timezone(&Utc).naive_utc());
    }
    for format in [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(timestamp);
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map(|date| date.and_hms_opt(0, 0, 0).unwrap_or_default())
        .map_err(|_| format!("cannot parse \"{}\" as timestamp", text))
}

fn check_uuid(text: &str) -> Result<(), &'static str> {
    let groups: Vec<&str> = text.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    if groups.len() != lengths.len() {
        return Err("expected 5 hyphen separated groups");
    }
    for (group, length) in groups.iter().zip(lengths.iter()) {
        if group.len() != *length || !group.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err("invalid uuid group");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn driver() -> TextDriver {
        TextDriver::new(
            Table::new("public", "test")
                .add_column("id", "integer")
                .add_column("created_at", "timestamp without time zone")
                .add_column("doc", "jsonb"),
        )
    }

    #[test]
    fn test_canonical_type_name() {
        assert_eq!(canonical_type_name("character varying(255)"), "varchar");
        assert_eq!(canonical_type_name("INTEGER"), "int4");
        assert_eq!(canonical_type_name("numeric(10,2)"), "numeric");
        assert_eq!(
            canonical_type_name("timestamp(3) with time zone"),
            "timestamptz"
        );
        assert_eq!(canonical_type_name("text"), "text");
    }

    #[test]
    fn test_decode_by_column() {
        let driver = driver();
        assert_eq!(
            driver.decode_value_by_column_name("id", b"42").unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            driver.decode_value_by_column_name("doc", br#"{"a":1}"#).unwrap(),
            Value::Json(json!({"a": 1}))
        );

        let expected = NaiveDate::from_ymd_opt(2023, 6, 25)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(
            driver
                .decode_value_by_column_idx(1, b"2023-06-25 00:00:00")
                .unwrap(),
            Value::Timestamp(expected)
        );
    }

    #[test]
    fn test_int_range_is_checked() {
        let driver = driver();
        assert!(driver.decode_value_by_type_name("int2", b"40000").is_err());
        assert!(driver
            .encode_value_by_type_name("smallint", &Value::Int(40000))
            .is_err());
        assert_eq!(
            driver
                .encode_value_by_type_name("int4", &Value::Float(3.0))
                .unwrap(),
            b"3".to_vec()
        );
    }

    #[test]
    fn test_timestamptz_is_normalized_to_utc() {
        let driver = driver();
        let value = driver
            .decode_value_by_type_name("timestamptz", b"2023-06-25 12:00:00+02")
            .unwrap();
        assert_eq!(
            driver
                .encode_value_by_type_name("timestamptz", &value)
                .unwrap(),
            b"2023-06-25 10:00:00+00".to_vec()
        );
    }

    #[test]
    fn test_unsupported_type() {
        let driver = driver();
        assert!(matches!(
            driver.decode_value_by_type_name("tsvector", b"a"),
            Err(CoreError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_unknown_column() {
        let driver = driver();
        assert!(matches!(
            driver.encode_value_by_column_name("missing", &Value::Int(1)),
            Err(CoreError::UnknownColumn(_))
        ));
    }
}
