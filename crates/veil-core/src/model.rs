use crate::{driver::canonical_type_name, error::CoreError};
use serde::{Deserialize, Serialize};

/// Raw column value as it travels through the pipeline.
///
/// When `is_null` is set the data is ignored by every consumer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRawValue {
    pub data: Vec<u8>,
    pub is_null: bool,
}

impl ColumnRawValue {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            is_null: false,
        }
    }

    pub fn null() -> Self {
        Self {
            data: Vec::new(),
            is_null: true,
        }
    }

    pub fn as_str(&self) -> Result<&str, CoreError> {
        Ok(std::str::from_utf8(&self.data)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub idx: usize,
    pub name: String,
    pub type_name: String,
    #[serde(default)]
    pub type_oid: u32,
    #[serde(default)]
    pub not_null: bool,
    #[serde(default = "default_length")]
    pub length: i32,
}

fn default_length() -> i32 {
    -1
}

impl Column {
    pub fn new(idx: usize, name: &str, type_name: &str) -> Self {
        Self {
            idx,
            name: name.to_string(),
            type_name: type_name.to_string(),
            type_oid: type_oid_for_name(type_name),
            not_null: false,
            length: -1,
        }
    }

    pub fn set_not_null(mut self, not_null: bool) -> Self {
        self.not_null = not_null;
        self
    }

    pub fn set_length(mut self, length: i32) -> Self {
        self.length = length;
        self
    }

    pub fn canonical_type_name(&self) -> String {
        canonical_type_name(&self.type_name)
    }
}

fn type_oid_for_name(type_name: &str) -> u32 {
    match canonical_type_name(type_name).as_str() {
        "bool" => 16,
        "char" => 18,
        "name" => 19,
        "int8" => 20,
        "int2" => 21,
        "int4" => 23,
        "text" => 25,
        "json" => 114,
        "float4" => 700,
        "float8" => 701,
        "bpchar" => 1042,
        "varchar" => 1043,
        "date" => 1082,
        "timestamp" => 1114,
        "timestamptz" => 1184,
        "numeric" => 1700,
        "uuid" => 2950,
        "jsonb" => 3802,
        _ => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub schema: String,
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    pub fn new(schema: &str, name: &str) -> Self {
        Self {
            schema: schema.to_string(),
            name: name.to_string(),
            columns: Vec::new(),
        }
    }

    pub fn add_column(mut self, name: &str, type_name: &str) -> Self {
        let idx = self.columns.len();
        self.columns.push(Column::new(idx, name, type_name));
        self
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn column_by_idx(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}
