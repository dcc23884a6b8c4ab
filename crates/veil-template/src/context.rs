//! Record contexts exposed to templates.
//!
//! [`ReadableRecord`] offers value lookup and type encoding only. Mutation of
//! the row is confined to [`WritableRecord`], which only [`RecordContext`]
//! implements.

use crate::error::TemplateError;
use veil_core::{ColumnRawValue, Recorder, Value};

/// Resolves `.Member args...` calls made by a template.
pub trait Scope {
    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, TemplateError>;
}

pub trait ReadableRecord {
    fn recorder(&self) -> &dyn Recorder;

    fn get_column_type(&self, name: &str) -> Result<Value, TemplateError> {
        let column = self
            .recorder()
            .table_driver()
            .column_by_name(name)
            .ok_or_else(|| veil_core::CoreError::UnknownColumn(name.to_string()))?;
        Ok(Value::Text(column.type_name.clone()))
    }

    fn get_column_value(&self, name: &str) -> Result<Value, TemplateError> {
        Ok(self.recorder().get_column_value_by_name(name)?)
    }

    fn get_raw_column_value(&self, name: &str) -> Result<Value, TemplateError> {
        let raw = self.recorder().get_raw_column_value_by_name(name)?;
        if raw.is_null {
            return Ok(Value::Null);
        }
        Ok(Value::Text(raw.as_str()?.to_string()))
    }

    fn encode_value_by_column(&self, name: &str, value: &Value) -> Result<Value, TemplateError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let data = self
            .recorder()
            .table_driver()
            .encode_value_by_column_name(name, value)?;
        Ok(Value::Text(String::from_utf8_lossy(&data).into_owned()))
    }

    fn decode_value_by_column(&self, name: &str, value: &Value) -> Result<Value, TemplateError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(text) => Ok(self
                .recorder()
                .table_driver()
                .decode_value_by_column_name(name, text.as_bytes())?),
            other => Err(TemplateError::call(
                "DecodeValueByColumn",
                format!("expected raw string value, got {}", other.type_label()),
            )),
        }
    }

    fn encode_value_by_type(&self, type_name: &str, value: &Value) -> Result<Value, TemplateError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let data = self
            .recorder()
            .table_driver()
            .encode_value_by_type_name(type_name, value)?;
        Ok(Value::Text(String::from_utf8_lossy(&data).into_owned()))
    }

    fn decode_value_by_type(&self, type_name: &str, value: &Value) -> Result<Value, TemplateError> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Text(text) => Ok(self
                .recorder()
                .table_driver()
                .decode_value_by_type_name(type_name, text.as_bytes())?),
            other => Err(TemplateError::call(
                "DecodeValueByType",
                format!("expected raw string value, got {}", other.type_label()),
            )),
        }
    }
}

pub trait WritableRecord: ReadableRecord {
    fn recorder_mut(&mut self) -> &mut dyn Recorder;

    fn set_column_value(&mut self, name: &str, value: &Value) -> Result<Value, TemplateError> {
        self.recorder_mut().set_column_value_by_name(name, value)?;
        Ok(Value::Bool(true))
    }

    fn set_raw_column_value(&mut self, name: &str, value: &Value) -> Result<Value, TemplateError> {
        let raw = match value {
            Value::Null => ColumnRawValue::null(),
            Value::Text(text) => ColumnRawValue::new(text.as_bytes()),
            other => {
                return Err(TemplateError::call(
                    "SetRawColumnValue",
                    format!(
                        "raw value must be a string or null, got {}",
                        other.type_label()
                    ),
                ))
            }
        };
        self.recorder_mut().set_raw_column_value_by_name(name, raw)?;
        Ok(Value::Bool(true))
    }
}

/// Read-only view of the current row.
pub struct RecordContextReadOnly<'r> {
    record: &'r dyn Recorder,
}

impl<'r> RecordContextReadOnly<'r> {
    pub fn new(record: &'r dyn Recorder) -> Self {
        Self { record }
    }
}

impl<'r> ReadableRecord for RecordContextReadOnly<'r> {
    fn recorder(&self) -> &dyn Recorder {
        self.record
    }
}

impl<'r> Scope for RecordContextReadOnly<'r> {
    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
        call_readable(self, name, &args)
            .unwrap_or_else(|| Err(TemplateError::UnknownMember(name.to_string())))
    }
}

/// Read-write view of the current row.
pub struct RecordContext<'r> {
    record: &'r mut dyn Recorder,
}

impl<'r> RecordContext<'r> {
    pub fn new(record: &'r mut dyn Recorder) -> Self {
        Self { record }
    }
}

impl<'r> ReadableRecord for RecordContext<'r> {
    fn recorder(&self) -> &dyn Recorder {
        &*self.record
    }
}

impl<'r> WritableRecord for RecordContext<'r> {
    fn recorder_mut(&mut self) -> &mut dyn Recorder {
        &mut *self.record
    }
}

impl<'r> Scope for RecordContext<'r> {
    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
        if let Some(result) = call_writable(self, name, &args) {
            return result;
        }
        call_readable(self, name, &args)
            .unwrap_or_else(|| Err(TemplateError::UnknownMember(name.to_string())))
    }
}

pub(crate) fn expect_args(name: &str, args: &[Value], want: usize) -> Result<(), TemplateError> {
    if args.len() != want {
        return Err(TemplateError::Arity {
            name: name.to_string(),
            want: want.to_string(),
            got: args.len(),
        });
    }
    Ok(())
}

fn string_arg<'a>(name: &str, value: &'a Value) -> Result<&'a str, TemplateError> {
    value.as_str().ok_or_else(|| {
        TemplateError::call(
            name,
            format!("expected string argument, got {}", value.type_label()),
        )
    })
}

/// Dispatches the read-only record members. Returns `None` for unknown members.
pub fn call_readable<R: ReadableRecord + ?Sized>(
    record: &R,
    name: &str,
    args: &[Value],
) -> Option<Result<Value, TemplateError>> {
    let result = match name {
        "GetColumnType" => expect_args(name, args, 1)
            .and_then(|_| string_arg(name, &args[0]))
            .and_then(|column| record.get_column_type(column)),
        "GetColumnValue" => expect_args(name, args, 1)
            .and_then(|_| string_arg(name, &args[0]))
            .and_then(|column| record.get_column_value(column)),
        "GetRawColumnValue" => expect_args(name, args, 1)
            .and_then(|_| string_arg(name, &args[0]))
            .and_then(|column| record.get_raw_column_value(column)),
        "EncodeValueByColumn" => expect_args(name, args, 2)
            .and_then(|_| string_arg(name, &args[0]))
            .and_then(|column| record.encode_value_by_column(column, &args[1])),
        "DecodeValueByColumn" => expect_args(name, args, 2)
            .and_then(|_| string_arg(name, &args[0]))
            .and_then(|column| record.decode_value_by_column(column, &args[1])),
        "EncodeValueByType" => expect_args(name, args, 2)
            .and_then(|_| string_arg(name, &args[0]))
            .and_then(|type_name| record.encode_value_by_type(type_name, &args[1])),
        "DecodeValueByType" => expect_args(name, args, 2)
            .and_then(|_| string_arg(name, &args[0]))
            .and_then(|type_name| record.decode_value_by_type(type_name, &args[1])),
        _ => return None,
    };
    Some(result)
}

/// Dispatches the mutating record members. Returns `None` for unknown members.
pub fn call_writable<W: WritableRecord + ?Sized>(
    record: &mut W,
    name: &str,
    args: &[Value],
) -> Option<Result<Value, TemplateError>> {
    let result = match name {
        "SetColumnValue" => expect_args(name, args, 2)
            .and_then(|_| string_arg(name, &args[0]))
            .and_then(|column| record.set_column_value(column, &args[1])),
        "SetRawColumnValue" => expect_args(name, args, 2)
            .and_then(|_| string_arg(name, &args[0]))
            .and_then(|column| record.set_raw_column_value(column, &args[1])),
        _ => return None,
    };
    Some(result)
}
