use super::{compile_template, Transformer};
use crate::{
    definition::TransformerDefinition,
    error::TransformerError,
    generators::GeneratorSettings,
    parameters::{column_definition, keep_null_definition, ParameterDefinition, Parameters},
    validation::ValidationCollector,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::{collections::BTreeMap, fmt, sync::Arc};
use tracing::debug;
use veil_core::{jsonpath, ColumnRawValue, Recorder, TableDriver, Value};
use veil_template::{
    context::call_readable, RecordContextReadOnly, Scope, Template, TemplateError,
    TemplateRuntime,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Set,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Set => f.write_str("set"),
            OperationKind::Delete => f.write_str("delete"),
        }
    }
}

/// One entry of the `operations` parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationConfig {
    pub operation: OperationKind,
    pub path: String,
    #[serde(default)]
    pub value: JsonValue,
    #[serde(default)]
    pub value_template: Option<String>,
    #[serde(default)]
    pub error_not_exist: bool,
    #[serde(default)]
    pub skip_not_exist: bool,
}

struct Operation {
    kind: OperationKind,
    path: String,
    value: JsonValue,
    value_template: Option<Template>,
    error_not_exist: bool,
    skip_not_exist: bool,
}

impl Operation {
    fn apply(
        &self,
        document: &mut JsonValue,
        record: &dyn Recorder,
        runtime: &mut TemplateRuntime,
        buf: &mut Vec<u8>,
    ) -> Result<(), TransformerError> {
        if !jsonpath::exists(document, &self.path)? {
            if self.error_not_exist {
                return Err(TransformerError::PathNotExist(self.path.clone()));
            }
            if self.skip_not_exist {
                return Ok(());
            }
        }

        match self.kind {
            OperationKind::Set => {
                let value = match &self.value_template {
                    Some(template) => {
                        buf.clear();
                        let original = jsonpath::get(document, &self.path)?;
                        let mut scope = JsonScope {
                            record: RecordContextReadOnly::new(record),
                            path: &self.path,
                            original,
                        };
                        template
                            .execute(&mut scope, runtime, buf)
                            .map_err(TransformerError::TemplateExecution)?;
                        serde_json::from_slice(buf)?
                    }
                    None => self.value.clone(),
                };
                jsonpath::set(document, &self.path, value)?;
            }
            OperationKind::Delete => {
                jsonpath::delete(document, &self.path)?;
            }
        }
        Ok(())
    }
}

pub fn definition() -> TransformerDefinition {
    TransformerDefinition::new(
        "Json",
        "Apply set and delete operations to a JSON document",
        new_json_transformer,
    )
    .add_parameter(column_definition("column name", &["json", "jsonb", "text"]))
    .add_parameter(
        ParameterDefinition::new(
            "operations",
            "JSON list of {operation, path, value, value_template, error_not_exist, skip_not_exist}",
        )
        .set_required(true),
    )
    .add_parameter(
        ParameterDefinition::new(
            "skip_invalid_json",
            "leave values that are not valid JSON unchanged instead of failing",
        )
        .set_default_value("false"),
    )
    .add_parameter(keep_null_definition(true))
}

fn new_json_transformer(
    _driver: Arc<dyn TableDriver>,
    parameters: &Parameters,
    _settings: &GeneratorSettings,
    collector: &mut ValidationCollector,
) -> Result<Box<dyn Transformer>, TransformerError> {
    let (column_name, column) = parameters.get_column_parameter_value("column", collector)?;
    let configs: Vec<OperationConfig> = parameters.get_parameter_value("operations", collector)?;
    let skip_invalid_json: bool = parameters.get_parameter_value("skip_invalid_json", collector)?;
    let keep_null: bool = parameters.get_parameter_value("keep_null", collector)?;

    let mut operations = Vec::with_capacity(configs.len());
    for (index, config) in configs.into_iter().enumerate() {
        let value_template = match &config.value_template {
            Some(source) => Some(compile_template(
                &format!("op[{}]", index),
                source,
                format!(
                    "error parsing template op[{}] with path \"{}\"",
                    index, config.path
                ),
                collector,
            )?),
            None => None,
        };
        operations.push(Operation {
            kind: config.operation,
            path: config.path,
            value: config.value,
            value_template,
            error_not_exist: config.error_not_exist,
            skip_not_exist: config.skip_not_exist,
        });
    }

    debug!(
        column = %column_name,
        operations = operations.len(),
        "json transformer configured"
    );

    Ok(Box::new(JsonTransformer {
        affected_columns: BTreeMap::from([(column.idx, column_name.clone())]),
        column_name,
        column_idx: column.idx,
        operations,
        skip_invalid_json,
        keep_null,
        runtime: TemplateRuntime::new(),
        buf: Vec::new(),
    }))
}

pub struct JsonTransformer {
    column_name: String,
    column_idx: usize,
    affected_columns: BTreeMap<usize, String>,
    operations: Vec<Operation>,
    skip_invalid_json: bool,
    keep_null: bool,
    runtime: TemplateRuntime,
    buf: Vec<u8>,
}

impl Transformer for JsonTransformer {
    fn affected_columns(&self) -> &BTreeMap<usize, String> {
        &self.affected_columns
    }

    fn transform(&mut self, record: &mut dyn Recorder) -> Result<(), TransformerError> {
        let raw = record.get_raw_column_value_by_idx(self.column_idx)?;
        if raw.is_null && self.keep_null {
            return Ok(());
        }

        let mut document: JsonValue = match serde_json::from_slice(&raw.data) {
            Ok(document) => document,
            Err(err) if self.skip_invalid_json => {
                debug!(column = %self.column_name, error = %err, "skipping invalid json");
                return Ok(());
            }
            Err(_) => return Err(TransformerError::InvalidJson),
        };

        for (index, operation) in self.operations.iter().enumerate() {
            operation
                .apply(&mut document, &*record, &mut self.runtime, &mut self.buf)
                .map_err(|source| TransformerError::JsonOperation {
                    index,
                    operation: operation.kind.to_string(),
                    path: operation.path.clone(),
                    source: Box::new(source),
                })?;
        }

        record.set_raw_column_value_by_idx(
            self.column_idx,
            ColumnRawValue::new(serde_json::to_vec(&document)?),
        )?;
        Ok(())
    }
}

/// Template scope of a `set` operation: the value at the operation path plus
/// the read-only record methods.
struct JsonScope<'a> {
    record: RecordContextReadOnly<'a>,
    path: &'a str,
    original: Option<&'a JsonValue>,
}

impl Scope for JsonScope<'_> {
    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
        match (name, args.is_empty()) {
            ("GetPath", true) => Ok(Value::Text(self.path.to_string())),
            ("GetOriginalValue", true) => Ok(self
                .original
                .map(|value| Value::from_json(value.clone()))
                .unwrap_or(Value::Json(JsonValue::Null))),
            ("GetRawOriginalValue", true) => Ok(self
                .original
                .map(|value| Value::Text(value.to_string()))
                .unwrap_or(Value::Null)),
            ("OriginalValueExists", true) => Ok(Value::Bool(self.original.is_some())),
            _ => call_readable(&self.record, name, &args)
                .unwrap_or_else(|| Err(TemplateError::UnknownMember(name.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use serde_json::json;

    fn transformer(operations: JsonValue, extra: &[(&str, &str)]) -> Box<dyn Transformer> {
        let operations = operations.to_string();
        let mut pairs = vec![("column", "doc"), ("operations", operations.as_str())];
        pairs.extend_from_slice(extra);
        let (result, collector) = testing::instance(&definition(), &pairs);
        assert!(!collector.has_warnings(), "{:?}", collector.warnings());
        result.unwrap()
    }

    fn run(transformer: &mut Box<dyn Transformer>, doc: Option<&str>) -> Result<Option<JsonValue>, TransformerError> {
        let driver = testing::users_driver();
        let mut record = testing::record(
            &driver,
            &[Some("1"), Some("a@b.com"), doc, Some("2023-06-15 12:30:00"), Some("t")],
        );
        transformer.transform(&mut record)?;
        Ok(testing::raw(&record, 2).map(|text| serde_json::from_str(&text).unwrap()))
    }

    #[test]
    fn test_operations_apply_in_order() {
        let mut forward = transformer(
            json!([
                { "operation": "set", "path": "a.b", "value": 1 },
                { "operation": "delete", "path": "a.b" }
            ]),
            &[],
        );
        assert_eq!(run(&mut forward, Some("{}")).unwrap(), Some(json!({ "a": {} })));

        let mut reverse = transformer(
            json!([
                { "operation": "delete", "path": "a.b" },
                { "operation": "set", "path": "a.b", "value": 1 }
            ]),
            &[],
        );
        assert_eq!(
            run(&mut reverse, Some("{}")).unwrap(),
            Some(json!({ "a": { "b": 1 } }))
        );
    }

    #[test]
    fn test_set_literal_values() {
        let mut transformer = transformer(
            json!([
                { "operation": "set", "path": "name", "value": "bob" },
                { "operation": "set", "path": "tags", "value": ["x", "y"] },
                { "operation": "set", "path": "tags.-1", "value": "z" },
                { "operation": "set", "path": "meta", "value": null }
            ]),
            &[],
        );
        assert_eq!(
            run(&mut transformer, Some(r#"{"name":"alice"}"#)).unwrap(),
            Some(json!({ "name": "bob", "tags": ["x", "y", "z"], "meta": null }))
        );
    }

    #[test]
    fn test_untouched_numbers_keep_their_text() {
        let mut transformer = transformer(
            json!([
                { "operation": "set", "path": "a", "value": 2 },
                { "operation": "set", "path": "rate", "value_template": "1.10" }
            ]),
            &[],
        );
        let driver = testing::users_driver();
        let mut record = testing::record(
            &driver,
            &[
                Some("1"),
                None,
                Some(r#"{"id":12345678901234567890123,"price":1.10,"a":1}"#),
                None,
                None,
            ],
        );
        transformer.transform(&mut record).unwrap();
        assert_eq!(
            testing::raw(&record, 2),
            Some(r#"{"id":12345678901234567890123,"price":1.10,"a":2,"rate":1.10}"#.to_string())
        );
    }

    #[test]
    fn test_index_out_of_range_is_a_row_error() {
        let mut transformer = transformer(
            json!([{ "operation": "set", "path": "items.18446744073709551615", "value": 1 }]),
            &[],
        );
        let err = run(&mut transformer, Some(r#"{"items":[1]}"#)).unwrap_err();
        assert!(matches!(err, TransformerError::JsonOperation { index: 0, .. }));
    }

    #[test]
    fn test_invalid_json() {
        let operations = json!([{ "operation": "delete", "path": "a" }]);

        let mut strict = transformer(operations.clone(), &[]);
        assert!(matches!(
            run(&mut strict, Some("{")),
            Err(TransformerError::InvalidJson)
        ));

        let mut lenient = transformer(operations, &[("skip_invalid_json", "true")]);
        let driver = testing::users_driver();
        let mut record = testing::record(
            &driver,
            &[Some("1"), None, Some("{"), None, None],
        );
        lenient.transform(&mut record).unwrap();
        assert_eq!(testing::raw(&record, 2), Some("{".to_string()));
    }

    #[test]
    fn test_keep_null_skips_operations() {
        // The template fails whenever it runs.
        let operations = json!([
            { "operation": "set", "path": "a", "value_template": r#"{{ .GetColumnValue "missing" }}"# }
        ]);

        let mut kept = transformer(operations.clone(), &[]);
        assert_eq!(run(&mut kept, None).unwrap(), None);
        assert!(matches!(
            run(&mut kept, Some("{}")),
            Err(TransformerError::JsonOperation { index: 0, .. })
        ));

        let mut replaced = transformer(operations, &[("keep_null", "false")]);
        assert!(matches!(
            run(&mut replaced, None),
            Err(TransformerError::InvalidJson)
        ));
    }

    #[test]
    fn test_missing_path_flags() {
        let mut erroring = transformer(
            json!([{ "operation": "delete", "path": "missing", "error_not_exist": true }]),
            &[],
        );
        let err = run(&mut erroring, Some("{}")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cannot apply \"delete\" operation[0] with path missing: value by path \"missing\" does not exist"
        );

        let mut skipping = transformer(
            json!([{ "operation": "set", "path": "missing", "value": 1, "skip_not_exist": true }]),
            &[],
        );
        assert_eq!(run(&mut skipping, Some("{}")).unwrap(), Some(json!({})));
    }

    #[test]
    fn test_value_template() {
        let mut transformer = transformer(
            json!([
                {
                    "operation": "set",
                    "path": "created_at",
                    "value_template": "{{- .GetOriginalValue | .DecodeValueByType \"timestamp\" | noiseDatePgInterval \"1 year 6 mon 1 day\" | .EncodeValueByType \"timestamp\" | toJsonRawValue -}}"
                },
                {
                    "operation": "set",
                    "path": "source",
                    "value_template": "{{ if .OriginalValueExists }}1{{ else }}\"{{ .GetPath }}-{{ .GetColumnValue \"id\" }}\"{{ end }}"
                }
            ]),
            &[],
        );
        let document = run(
            &mut transformer,
            Some(r#"{"created_at":"2023-06-15 00:00:00"}"#),
        )
        .unwrap()
        .unwrap();

        let created_at = document["created_at"].as_str().unwrap();
        let created_at = veil_core::parse_timestamp(created_at).unwrap();
        let original = veil_core::parse_timestamp("2023-06-15 00:00:00").unwrap();
        assert!(created_at >= veil_core::parse_timestamp("2021-12-14 00:00:00").unwrap());
        assert!(created_at <= veil_core::parse_timestamp("2024-12-16 00:00:00").unwrap());
        assert_ne!(created_at, original);
        assert_eq!(document["source"], json!("source-1"));
    }

    #[test]
    fn test_template_must_render_json() {
        let mut transformer = transformer(
            json!([{ "operation": "set", "path": "a", "value_template": "not json" }]),
            &[],
        );
        assert!(matches!(
            run(&mut transformer, Some("{}")),
            Err(TransformerError::JsonOperation { index: 0, .. })
        ));
    }

    #[test]
    fn test_template_compile_error() {
        let operations = json!([{ "operation": "set", "path": "a", "value_template": "{{ nope }}" }])
            .to_string();
        let (result, _) =
            testing::instance(&definition(), &[("column", "doc"), ("operations", operations.as_str())]);
        match result {
            Err(err) => assert!(err
                .to_string()
                .starts_with("error parsing template op[0] with path \"a\"")),
            Ok(_) => panic!("expected compile error"),
        }
    }

    #[test]
    fn test_operations_are_required() {
        let (result, collector) = testing::instance(&definition(), &[("column", "doc")]);
        assert!(result.is_err());
        assert_eq!(collector.warnings()[0].msg, "parameter is required");
    }
}
