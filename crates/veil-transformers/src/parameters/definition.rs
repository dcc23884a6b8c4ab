use crate::validation::ValidationCollector;
use serde::Serialize;
use std::fmt;
use veil_core::{canonical_type_name, Column};

/// Checks a raw parameter value before it is scanned. Problems are reported
/// through the collector.
pub type RawValueValidator = fn(&str, &mut ValidationCollector);

#[derive(Debug, Clone, Default, Serialize)]
pub struct ColumnProperties {
    /// Canonical type names the column may have. Empty allows any type.
    pub allowed_types: Vec<String>,
    /// Whether the transformer writes the column.
    pub affected: bool,
}

impl ColumnProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_allowed_types(mut self, types: &[&str]) -> Self {
        self.allowed_types = types.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn set_affected(mut self, affected: bool) -> Self {
        self.affected = affected;
        self
    }

    pub fn is_allowed(&self, column: &Column) -> bool {
        is_type_allowed(&self.allowed_types, column)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DynamicModeProperties {
    pub column_types: Vec<String>,
}

impl DynamicModeProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_column_types(mut self, types: &[&str]) -> Self {
        self.column_types = types.iter().map(|name| name.to_string()).collect();
        self
    }

    pub fn is_allowed(&self, column: &Column) -> bool {
        is_type_allowed(&self.column_types, column)
    }
}

fn is_type_allowed(allowed: &[String], column: &Column) -> bool {
    let type_name = column.canonical_type_name();
    allowed.is_empty()
        || allowed
            .iter()
            .any(|allowed| canonical_type_name(allowed) == type_name)
}

#[derive(Clone, Serialize)]
pub struct ParameterDefinition {
    pub name: String,
    pub description: String,
    pub required: bool,
    pub default_value: Option<String>,
    pub column_properties: Option<ColumnProperties>,
    pub allowed_values: Vec<String>,
    pub dynamic_mode: Option<DynamicModeProperties>,
    #[serde(skip)]
    pub raw_value_validator: Option<RawValueValidator>,
}

impl ParameterDefinition {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            required: false,
            default_value: None,
            column_properties: None,
            allowed_values: Vec::new(),
            dynamic_mode: None,
            raw_value_validator: None,
        }
    }

    pub fn set_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn set_default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn set_column_properties(mut self, properties: ColumnProperties) -> Self {
        self.column_properties = Some(properties);
        self
    }

    pub fn set_allowed_values(mut self, values: &[&str]) -> Self {
        self.allowed_values = values.iter().map(|value| value.to_string()).collect();
        self
    }

    pub fn set_dynamic_mode(mut self, properties: DynamicModeProperties) -> Self {
        self.dynamic_mode = Some(properties);
        self
    }

    pub fn set_raw_value_validator(mut self, validator: RawValueValidator) -> Self {
        self.raw_value_validator = Some(validator);
        self
    }

    pub fn is_column(&self) -> bool {
        self.column_properties.is_some()
    }

    pub fn is_affected_column(&self) -> bool {
        self.column_properties
            .as_ref()
            .map(|properties| properties.affected)
            .unwrap_or(false)
    }
}

impl fmt::Debug for ParameterDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDefinition")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("default_value", &self.default_value)
            .field("column_properties", &self.column_properties)
            .field("allowed_values", &self.allowed_values)
            .field("dynamic_mode", &self.dynamic_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_types_use_canonical_names() {
        let properties = ColumnProperties::new().set_allowed_types(&["text", "varchar"]);
        assert!(properties.is_allowed(&Column::new(0, "a", "character varying(64)")));
        assert!(!properties.is_allowed(&Column::new(0, "a", "integer")));
        assert!(ColumnProperties::new().is_allowed(&Column::new(0, "a", "integer")));
    }
}
