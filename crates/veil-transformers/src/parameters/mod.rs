mod common;
mod definition;

pub use common::{column_definition, engine_definition, keep_null_definition, validate_definition};
pub use definition::{
    ColumnProperties, DynamicModeProperties, ParameterDefinition, RawValueValidator,
};

use crate::{
    error::TransformerError,
    validation::{ValidationCollector, ValidationWarning},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use veil_core::{Column, Recorder, TableDriver, Value};

/// Per-row parameter source: another column of the same table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DynamicParameterValue {
    pub column: String,
    #[serde(default)]
    pub default: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StaticParameter {
    definition: ParameterDefinition,
    raw_value: Option<String>,
    column: Option<Column>,
}

#[derive(Debug, Clone)]
pub struct DynamicParameter {
    definition: ParameterDefinition,
    value: DynamicParameterValue,
    column: Column,
}

#[derive(Debug, Clone)]
pub enum Parameter {
    Static(StaticParameter),
    Dynamic(DynamicParameter),
}

impl Parameter {
    pub fn definition(&self) -> &ParameterDefinition {
        match self {
            Parameter::Static(parameter) => &parameter.definition,
            Parameter::Dynamic(parameter) => &parameter.definition,
        }
    }

    pub fn name(&self) -> &str {
        &self.definition().name
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Parameter::Dynamic(_))
    }

    /// The bound column of a column parameter, or the source column of a
    /// dynamic parameter.
    pub fn column(&self) -> Option<&Column> {
        match self {
            Parameter::Static(parameter) => parameter.column.as_ref(),
            Parameter::Dynamic(parameter) => Some(&parameter.column),
        }
    }

    /// Raw text of the parameter. Dynamic parameters need the current row.
    pub fn raw_value(
        &self,
        record: Option<&dyn Recorder>,
    ) -> Result<Option<String>, TransformerError> {
        match self {
            Parameter::Static(parameter) => Ok(parameter.raw_value.clone()),
            Parameter::Dynamic(parameter) => {
                let record = record.ok_or_else(|| TransformerError::Scan {
                    parameter: parameter.definition.name.clone(),
                    reason: "dynamic parameter is only available while transforming a row"
                        .to_string(),
                })?;
                let raw = record.get_raw_column_value_by_idx(parameter.column.idx)?;
                if raw.is_null {
                    return Ok(parameter
                        .value
                        .default
                        .clone()
                        .or_else(|| parameter.definition.default_value.clone()));
                }
                Ok(Some(raw.as_str()?.to_string()))
            }
        }
    }

    pub fn is_empty(&self, record: Option<&dyn Recorder>) -> Result<bool, TransformerError> {
        Ok(self.raw_value(record)?.is_none())
    }

    /// Scans the parameter. A non-NULL dynamic source is decoded with its
    /// column type first, so a `bool` column reading `t` scans as `true`.
    pub fn scan<T: DeserializeOwned>(
        &self,
        record: Option<&dyn Recorder>,
    ) -> Result<Option<T>, TransformerError> {
        if let (Parameter::Dynamic(parameter), Some(record)) = (self, record) {
            let value = record.get_column_value_by_idx(parameter.column.idx)?;
            if !value.is_null() {
                return scan_value(&value)
                    .map(Some)
                    .map_err(|reason| self.scan_error(reason));
            }
        }

        match self.raw_value(record)? {
            None => Ok(None),
            Some(raw) => scan_raw(&raw)
                .map(Some)
                .map_err(|reason| self.scan_error(reason)),
        }
    }

    fn scan_error(&self, reason: String) -> TransformerError {
        TransformerError::Scan {
            parameter: self.name().to_string(),
            reason,
        }
    }
}

/// Coerces a raw parameter value. The text is taken as a string first, then
/// parsed as JSON, so `"32"` scans as an integer and `data` as a string.
pub fn scan_raw<T: DeserializeOwned>(raw: &str) -> Result<T, String> {
    if let Ok(value) = serde_json::from_value::<T>(JsonValue::String(raw.to_string())) {
        return Ok(value);
    }
    serde_json::from_str::<T>(raw).map_err(|err| err.to_string())
}

fn scan_value<T: DeserializeOwned>(value: &Value) -> Result<T, String> {
    match value.as_str() {
        Some(text) => scan_raw(text),
        None => serde_json::from_value::<T>(value.to_json()).map_err(|err| err.to_string()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Parameters {
    parameters: BTreeMap<String, Parameter>,
}

impl Parameters {
    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.parameters.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters.values()
    }

    fn lookup(&self, name: &str) -> Result<&Parameter, TransformerError> {
        self.parameters.get(name).ok_or_else(|| {
            TransformerError::Other(anyhow::anyhow!("parameter \"{}\" is not defined", name))
        })
    }

    fn scan_checked<T: DeserializeOwned>(
        &self,
        name: &str,
        collector: &mut ValidationCollector,
    ) -> Result<Option<T>, TransformerError> {
        match self.lookup(name)?.scan::<T>(None) {
            Ok(value) => Ok(value),
            Err(err) => {
                collector.add(
                    ValidationWarning::error("error scanning parameter")
                        .add_meta("ParameterName", name)
                        .set_error(&err),
                );
                Err(TransformerError::FatalValidation)
            }
        }
    }

    pub fn get_parameter_value<T: DeserializeOwned>(
        &self,
        name: &str,
        collector: &mut ValidationCollector,
    ) -> Result<T, TransformerError> {
        match self.scan_checked(name, collector)? {
            Some(value) => Ok(value),
            None => {
                collector.add(
                    ValidationWarning::error("parameter value is empty")
                        .add_meta("ParameterName", name),
                );
                Err(TransformerError::FatalValidation)
            }
        }
    }

    pub fn get_parameter_value_with_default<T: DeserializeOwned>(
        &self,
        name: &str,
        default: T,
        collector: &mut ValidationCollector,
    ) -> Result<T, TransformerError> {
        Ok(self.scan_checked(name, collector)?.unwrap_or(default))
    }

    /// Name and metadata of the column bound to a column parameter.
    pub fn get_column_parameter_value(
        &self,
        name: &str,
        collector: &mut ValidationCollector,
    ) -> Result<(String, Column), TransformerError> {
        match self.lookup(name)? {
            Parameter::Static(StaticParameter {
                column: Some(column),
                ..
            }) => Ok((column.name.clone(), column.clone())),
            _ => {
                collector.add(
                    ValidationWarning::error("column parameter is not set")
                        .add_meta("ParameterName", name),
                );
                Err(TransformerError::FatalValidation)
            }
        }
    }

    /// Reads a parameter for the current row. A NULL dynamic source with no
    /// default is an error.
    pub fn get_dynamic_parameter_value<T: DeserializeOwned>(
        &self,
        name: &str,
        record: &dyn Recorder,
    ) -> Result<T, TransformerError> {
        self.lookup(name)?
            .scan::<T>(Some(record))?
            .ok_or_else(|| TransformerError::Scan {
                parameter: name.to_string(),
                reason: "value is null and default is not set".to_string(),
            })
    }
}

fn fail_on_fatal(collector: &ValidationCollector) -> Result<(), TransformerError> {
    if collector.is_fatal() {
        return Err(TransformerError::FatalValidation);
    }
    Ok(())
}

/// Resolves user supplied values against parameter definitions.
///
/// Runs the required, unknown, dynamic-support, column and remaining
/// parameter checks in that order, stopping after the first stage that
/// produced a fatal finding.
pub fn init_parameters(
    driver: &dyn TableDriver,
    definitions: &[ParameterDefinition],
    static_values: &HashMap<String, String>,
    dynamic_values: &HashMap<String, DynamicParameterValue>,
    collector: &mut ValidationCollector,
) -> Result<Parameters, TransformerError> {
    for definition in definitions.iter().filter(|definition| definition.required) {
        if !static_values.contains_key(&definition.name)
            && !dynamic_values.contains_key(&definition.name)
        {
            collector.add(
                ValidationWarning::error("parameter is required")
                    .add_meta("ParameterName", definition.name.as_str()),
            );
        }
    }
    fail_on_fatal(collector)?;

    let is_known = |name: &str| definitions.iter().any(|definition| definition.name == name);
    for name in static_values.keys().chain(dynamic_values.keys()) {
        if !is_known(name) {
            collector.add(
                ValidationWarning::error("received unknown parameter")
                    .add_meta("ParameterName", name.as_str()),
            );
        }
    }
    for name in static_values.keys() {
        if dynamic_values.contains_key(name) {
            collector.add(
                ValidationWarning::error("parameter value must be either static or dynamic")
                    .add_meta("ParameterName", name.as_str()),
            );
        }
    }
    fail_on_fatal(collector)?;

    for definition in definitions
        .iter()
        .filter(|definition| dynamic_values.contains_key(&definition.name))
    {
        if definition.is_column() {
            collector.add(
                ValidationWarning::error("column parameter cannot work in dynamic mode")
                    .add_meta("ParameterName", definition.name.as_str()),
            );
        } else if definition.dynamic_mode.is_none() {
            collector.add(
                ValidationWarning::error("parameter does not support dynamic mode")
                    .add_meta("ParameterName", definition.name.as_str()),
            );
        }
    }
    fail_on_fatal(collector)?;

    let mut parameters = BTreeMap::new();

    for definition in definitions.iter().filter(|definition| definition.is_column()) {
        let mut scoped = collector.with_meta("ParameterName", definition.name.as_str());
        let parameter = init_static(
            driver,
            definition,
            static_values.get(&definition.name),
            &mut scoped,
        );
        collector.extend(scoped);
        parameters.insert(definition.name.clone(), Parameter::Static(parameter));
    }
    fail_on_fatal(collector)?;

    for definition in definitions.iter().filter(|definition| !definition.is_column()) {
        let mut scoped = collector.with_meta("ParameterName", definition.name.as_str());
        let parameter = match dynamic_values.get(&definition.name) {
            Some(value) => {
                init_dynamic(driver, definition, value, &mut scoped).map(Parameter::Dynamic)
            }
            None => Some(Parameter::Static(init_static(
                driver,
                definition,
                static_values.get(&definition.name),
                &mut scoped,
            ))),
        };
        collector.extend(scoped);
        if let Some(parameter) = parameter {
            parameters.insert(definition.name.clone(), parameter);
        }
    }
    fail_on_fatal(collector)?;

    debug!(
        table = %driver.table().qualified_name(),
        parameters = parameters.len(),
        "parameters initialized"
    );
    Ok(Parameters { parameters })
}

fn init_static(
    driver: &dyn TableDriver,
    definition: &ParameterDefinition,
    raw_value: Option<&String>,
    collector: &mut ValidationCollector,
) -> StaticParameter {
    let mut parameter = StaticParameter {
        definition: definition.clone(),
        raw_value: raw_value.cloned().or_else(|| definition.default_value.clone()),
        column: None,
    };
    let raw = match &parameter.raw_value {
        Some(raw) => raw.clone(),
        None => return parameter,
    };

    if let Some(validator) = definition.raw_value_validator {
        validator(&raw, collector);
    }

    if let Some(properties) = &definition.column_properties {
        match driver.column_by_name(&raw) {
            None => collector.add(
                ValidationWarning::error("column does not exist")
                    .add_meta("ColumnName", raw.as_str()),
            ),
            Some(column) if !properties.is_allowed(column) => collector.add(
                ValidationWarning::error("unsupported column type")
                    .add_meta("ColumnName", raw.as_str())
                    .add_meta("ColumnType", column.type_name.as_str())
                    .add_meta("AllowedTypes", properties.allowed_types.clone()),
            ),
            Some(column) => parameter.column = Some(column.clone()),
        }
    }

    if !definition.allowed_values.is_empty() && !definition.allowed_values.contains(&raw) {
        collector.add(
            ValidationWarning::error("unknown parameter value")
                .add_meta("ParameterValue", raw.as_str())
                .add_meta("AllowedValues", definition.allowed_values.clone()),
        );
    }

    parameter
}

fn init_dynamic(
    driver: &dyn TableDriver,
    definition: &ParameterDefinition,
    value: &DynamicParameterValue,
    collector: &mut ValidationCollector,
) -> Option<DynamicParameter> {
    if value.column.is_empty() {
        collector.add(
            ValidationWarning::error("received empty \"column\" parameter")
                .add_meta("DynamicParameterSetting", "column"),
        );
        return None;
    }

    let column = match driver.column_by_name(&value.column) {
        Some(column) => column.clone(),
        None => {
            collector.add(
                ValidationWarning::error("column does not exist")
                    .add_meta("DynamicParameterSetting", "column")
                    .add_meta("ColumnName", value.column.as_str()),
            );
            return None;
        }
    };

    if let Some(properties) = &definition.dynamic_mode {
        if !properties.is_allowed(&column) {
            collector.add(
                ValidationWarning::error("unsupported column type")
                    .add_meta("ColumnName", column.name.as_str())
                    .add_meta("ColumnType", column.type_name.as_str())
                    .add_meta("AllowedTypes", properties.column_types.clone()),
            );
            return None;
        }
    }

    if let (Some(default), Some(validator)) = (&value.default, definition.raw_value_validator) {
        validator(default, collector);
    }

    Some(DynamicParameter {
        definition: definition.clone(),
        value: value.clone(),
        column,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Severity;
    use std::sync::Arc;
    use veil_core::{ColumnRawValue, Record, Table, TextDriver};

    fn driver() -> TextDriver {
        TextDriver::new(
            Table::new("public", "users")
                .add_column("id", "int4")
                .add_column("email", "text")
                .add_column("ratio", "float8")
                .add_column("active", "bool"),
        )
    }

    fn definitions() -> Vec<ParameterDefinition> {
        vec![
            ParameterDefinition::new("column", "column to mask")
                .set_required(true)
                .set_column_properties(
                    ColumnProperties::new()
                        .set_allowed_types(&["text", "varchar"])
                        .set_affected(true),
                ),
            ParameterDefinition::new("mode", "mode")
                .set_default_value("fast")
                .set_allowed_values(&["fast", "slow"]),
            ParameterDefinition::new("ratio", "noise ratio")
                .set_default_value("0.5")
                .set_dynamic_mode(DynamicModeProperties::new().set_column_types(&["float8"])),
            ParameterDefinition::new("domains", "domains"),
            ParameterDefinition::new("strict", "strict")
                .set_default_value("false")
                .set_dynamic_mode(DynamicModeProperties::new().set_column_types(&["bool"])),
        ]
    }

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn init(
        static_values: HashMap<String, String>,
        dynamic_values: HashMap<String, DynamicParameterValue>,
    ) -> (Result<Parameters, TransformerError>, ValidationCollector) {
        let mut collector = ValidationCollector::new();
        let result = init_parameters(
            &driver(),
            &definitions(),
            &static_values,
            &dynamic_values,
            &mut collector,
        );
        (result, collector)
    }

    fn first_finding(collector: &ValidationCollector) -> &ValidationWarning {
        collector.warnings().first().unwrap()
    }

    #[test]
    fn test_scan_raw() {
        assert_eq!(scan_raw::<i64>("32").unwrap(), 32);
        assert_eq!(scan_raw::<bool>("true").unwrap(), true);
        assert_eq!(scan_raw::<String>("32").unwrap(), "32");
        assert_eq!(scan_raw::<String>("data").unwrap(), "data");
        assert_eq!(
            scan_raw::<Vec<String>>(r#"["a","b"]"#).unwrap(),
            vec!["a".to_string(), "b".to_string()]
        );
        assert!(scan_raw::<i64>("not-a-number").is_err());
    }

    #[test]
    fn test_init_with_defaults() {
        let (result, collector) = init(values(&[("column", "email")]), HashMap::new());
        let parameters = result.unwrap();
        assert!(!collector.has_warnings());

        let mut collector = ValidationCollector::new();
        let (name, column) = parameters
            .get_column_parameter_value("column", &mut collector)
            .unwrap();
        assert_eq!(name, "email");
        assert_eq!(column.idx, 1);
        assert_eq!(
            parameters
                .get_parameter_value::<String>("mode", &mut collector)
                .unwrap(),
            "fast"
        );
        assert_eq!(
            parameters
                .get_parameter_value::<f64>("ratio", &mut collector)
                .unwrap(),
            0.5
        );
        assert_eq!(
            parameters
                .get_parameter_value_with_default::<Vec<String>>(
                    "domains",
                    Vec::new(),
                    &mut collector
                )
                .unwrap(),
            Vec::<String>::new()
        );
        assert!(parameters
            .get_parameter_value::<Vec<String>>("domains", &mut collector)
            .is_err());
        assert_eq!(first_finding(&collector).msg, "parameter value is empty");
    }

    #[test]
    fn test_required_parameter() {
        let (result, collector) = init(HashMap::new(), HashMap::new());
        assert!(matches!(result, Err(TransformerError::FatalValidation)));
        let finding = first_finding(&collector);
        assert_eq!(finding.msg, "parameter is required");
        assert_eq!(finding.meta["ParameterName"], "column");
    }

    #[test]
    fn test_unknown_parameter() {
        let (result, collector) =
            init(values(&[("column", "email"), ("colour", "red")]), HashMap::new());
        assert!(result.is_err());
        let finding = first_finding(&collector);
        assert_eq!(finding.msg, "received unknown parameter");
        assert_eq!(finding.meta["ParameterName"], "colour");
    }

    #[test]
    fn test_unknown_column() {
        let (result, collector) = init(values(&[("column", "phone")]), HashMap::new());
        assert!(result.is_err());
        let finding = first_finding(&collector);
        assert_eq!(finding.msg, "column does not exist");
        assert_eq!(finding.meta["ParameterName"], "column");
        assert_eq!(finding.meta["ColumnName"], "phone");
    }

    #[test]
    fn test_unsupported_column_type() {
        let (result, collector) = init(values(&[("column", "id")]), HashMap::new());
        assert!(result.is_err());
        let finding = first_finding(&collector);
        assert_eq!(finding.msg, "unsupported column type");
        assert_eq!(finding.meta["ParameterName"], "column");
        assert_eq!(finding.meta["AllowedTypes"], serde_json::json!(["text", "varchar"]));
    }

    #[test]
    fn test_unknown_parameter_value() {
        let (result, collector) =
            init(values(&[("column", "email"), ("mode", "medium")]), HashMap::new());
        assert!(result.is_err());
        let finding = first_finding(&collector);
        assert_eq!(finding.msg, "unknown parameter value");
        assert_eq!(finding.severity, Severity::Error);
        assert_eq!(finding.meta["ParameterName"], "mode");
    }

    #[test]
    fn test_dynamic_mode_not_supported() {
        let dynamic = HashMap::from([(
            "mode".to_string(),
            DynamicParameterValue {
                column: "email".to_string(),
                default: None,
            },
        )]);
        let (result, collector) = init(values(&[("column", "email")]), dynamic);
        assert!(result.is_err());
        assert_eq!(
            first_finding(&collector).msg,
            "parameter does not support dynamic mode"
        );
    }

    #[test]
    fn test_static_and_dynamic_conflict() {
        let dynamic = HashMap::from([(
            "ratio".to_string(),
            DynamicParameterValue {
                column: "ratio".to_string(),
                default: None,
            },
        )]);
        let (result, collector) =
            init(values(&[("column", "email"), ("ratio", "0.1")]), dynamic);
        assert!(result.is_err());
        assert_eq!(
            first_finding(&collector).msg,
            "parameter value must be either static or dynamic"
        );
    }

    #[test]
    fn test_dynamic_parameter_reads_row() {
        let dynamic = HashMap::from([(
            "ratio".to_string(),
            DynamicParameterValue {
                column: "ratio".to_string(),
                default: Some("0.9".to_string()),
            },
        )]);
        let (result, _) = init(values(&[("column", "email")]), dynamic);
        let parameters = result.unwrap();
        assert!(parameters.get("ratio").unwrap().is_dynamic());

        let mut record = Record::new(Arc::new(driver()));
        record
            .set_row(vec![
                ColumnRawValue::new("1"),
                ColumnRawValue::new("a@b.com"),
                ColumnRawValue::new("0.25"),
                ColumnRawValue::new("t"),
            ])
            .unwrap();
        assert_eq!(
            parameters
                .get_dynamic_parameter_value::<f64>("ratio", &record)
                .unwrap(),
            0.25
        );

        record
            .set_raw_column_value_by_idx(2, ColumnRawValue::null())
            .unwrap();
        assert_eq!(
            parameters
                .get_dynamic_parameter_value::<f64>("ratio", &record)
                .unwrap(),
            0.9
        );

        let mut collector = ValidationCollector::new();
        assert!(parameters
            .get_parameter_value::<f64>("ratio", &mut collector)
            .is_err());
        assert_eq!(first_finding(&collector).msg, "error scanning parameter");
    }

    #[test]
    fn test_dynamic_parameter_column_type() {
        let dynamic = HashMap::from([(
            "ratio".to_string(),
            DynamicParameterValue {
                column: "email".to_string(),
                default: None,
            },
        )]);
        let (result, collector) = init(values(&[("column", "email")]), dynamic);
        assert!(result.is_err());
        assert_eq!(first_finding(&collector).msg, "unsupported column type");
    }

    #[test]
    fn test_dynamic_parameter_decodes_column_type() {
        let dynamic = HashMap::from([(
            "strict".to_string(),
            DynamicParameterValue {
                column: "active".to_string(),
                default: None,
            },
        )]);
        let (result, collector) = init(values(&[("column", "email")]), dynamic);
        assert!(!collector.has_warnings());
        let parameters = result.unwrap();

        let mut record = Record::new(Arc::new(driver()));
        record
            .set_row(vec![
                ColumnRawValue::new("1"),
                ColumnRawValue::new("a@b.com"),
                ColumnRawValue::new("0.25"),
                ColumnRawValue::new("t"),
            ])
            .unwrap();
        assert!(parameters
            .get_dynamic_parameter_value::<bool>("strict", &record)
            .unwrap());

        record
            .set_raw_column_value_by_idx(3, ColumnRawValue::null())
            .unwrap();
        assert!(!parameters
            .get_dynamic_parameter_value::<bool>("strict", &record)
            .unwrap());
    }
}
