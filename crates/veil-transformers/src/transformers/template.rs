use super::{compile_template, Transformer};
use crate::{
    definition::TransformerDefinition,
    error::TransformerError,
    generators::GeneratorSettings,
    parameters::{
        keep_null_definition, validate_definition, ColumnProperties, ParameterDefinition,
        Parameters,
    },
    validation::ValidationCollector,
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;
use veil_core::{Column, ColumnRawValue, Recorder, TableDriver, Value, NULL_MARKER};
use veil_template::{
    ReadableRecord, RecordContext, Scope, Template, TemplateError, TemplateRuntime,
};

pub fn definition() -> TransformerDefinition {
    TransformerDefinition::new(
        "Template",
        "Replace a column value with the output of a template",
        new_template_transformer,
    )
    .add_parameter(
        ParameterDefinition::new("column", "column name")
            .set_required(true)
            .set_column_properties(ColumnProperties::new().set_affected(true)),
    )
    .add_parameter(
        ParameterDefinition::new(
            "template",
            "template source; rendering exactly \\N sets the column to NULL",
        )
        .set_required(true),
    )
    .add_parameter(validate_definition(
        "decode the rendered value with the column type before writing it",
    ))
    .add_parameter(keep_null_definition(false))
}

fn new_template_transformer(
    _driver: Arc<dyn TableDriver>,
    parameters: &Parameters,
    _settings: &GeneratorSettings,
    collector: &mut ValidationCollector,
) -> Result<Box<dyn Transformer>, TransformerError> {
    let (column_name, column) = parameters.get_column_parameter_value("column", collector)?;
    let source: String = parameters.get_parameter_value("template", collector)?;
    let template = compile_template(
        "template",
        &source,
        "error parsing template".to_string(),
        collector,
    )?;
    let validate: bool = parameters.get_parameter_value("validate", collector)?;
    let keep_null: bool = parameters.get_parameter_value("keep_null", collector)?;

    debug!(column = %column_name, validate, "template transformer configured");

    Ok(Box::new(TemplateTransformer {
        affected_columns: BTreeMap::from([(column.idx, column_name)]),
        column,
        template,
        validate,
        keep_null,
        runtime: TemplateRuntime::new(),
        buf: Vec::new(),
    }))
}

pub struct TemplateTransformer {
    column: Column,
    affected_columns: BTreeMap<usize, String>,
    template: Template,
    validate: bool,
    keep_null: bool,
    runtime: TemplateRuntime,
    buf: Vec<u8>,
}

impl Transformer for TemplateTransformer {
    fn affected_columns(&self) -> &BTreeMap<usize, String> {
        &self.affected_columns
    }

    fn transform(&mut self, record: &mut dyn Recorder) -> Result<(), TransformerError> {
        if record.get_raw_column_value_by_idx(self.column.idx)?.is_null && self.keep_null {
            return Ok(());
        }

        self.buf.clear();
        {
            let mut scope = ColumnScope {
                record: RecordContext::new(&mut *record),
                column: &self.column,
            };
            self.template
                .execute(&mut scope, &mut self.runtime, &mut self.buf)
                .map_err(TransformerError::TemplateExecution)?;
        }

        let value = if self.buf == NULL_MARKER.as_bytes() {
            ColumnRawValue::null()
        } else {
            if self.validate {
                record
                    .table_driver()
                    .decode_value_by_column_idx(self.column.idx, &self.buf)
                    .map_err(|err| TransformerError::TypeValidation {
                        column: self.column.name.clone(),
                        reason: err.to_string(),
                    })?;
            }
            ColumnRawValue::new(self.buf.clone())
        };

        record.set_raw_column_value_by_idx(self.column.idx, value)?;
        Ok(())
    }
}

/// Template scope bound to the transformed column, on top of the read-write
/// record methods.
struct ColumnScope<'a> {
    record: RecordContext<'a>,
    column: &'a Column,
}

impl ColumnScope<'_> {
    fn call_column(&mut self, name: &str, args: &[Value]) -> Option<Result<Value, TemplateError>> {
        let column = &self.column.name;
        let result = match (name, args) {
            ("GetColumnType", []) => Ok(Value::Text(self.column.type_name.clone())),
            ("GetValue", []) => self.record.get_column_value(column),
            ("GetRawValue", []) => self.record.get_raw_column_value(column),
            ("EncodeValue", [value]) => self.record.encode_value_by_column(column, value),
            ("DecodeValue", [value]) => self.record.decode_value_by_column(column, value),
            _ => return None,
        };
        Some(result)
    }
}

impl Scope for ColumnScope<'_> {
    fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
        if let Some(result) = self.call_column(name, &args) {
            return result;
        }
        self.record.call(name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    fn transformer(pairs: &[(&str, &str)]) -> Box<dyn Transformer> {
        let (result, collector) = testing::instance(&definition(), pairs);
        assert!(!collector.has_warnings(), "{:?}", collector.warnings());
        result.unwrap()
    }

    #[test]
    fn test_renders_into_column() {
        let mut transformer = transformer(&[
            ("column", "title"),
            ("template", r#"{{ .GetValue | upper }}-{{ .GetColumnValue "id" }}"#),
        ]);
        let mut record = testing::users_record(Some("a@b.com"));
        transformer.transform(&mut record).unwrap();
        assert_eq!(testing::raw(&record, 4), Some("HELLO-1".to_string()));
    }

    #[test]
    fn test_null_marker() {
        let mut transformer = transformer(&[("column", "title"), ("template", "{{ null }}")]);
        let mut record = testing::users_record(Some("a@b.com"));
        transformer.transform(&mut record).unwrap();
        let raw = veil_core::Recorder::get_raw_column_value_by_idx(&record, 4).unwrap();
        assert_eq!(raw, &ColumnRawValue::null());
    }

    #[test]
    fn test_nulls_are_templated_by_default() {
        let mut transformer = transformer(&[
            ("column", "email"),
            ("template", "{{ if isNull .GetValue }}none{{ else }}some{{ end }}"),
        ]);
        let mut record = testing::users_record(None);
        transformer.transform(&mut record).unwrap();
        assert_eq!(testing::raw(&record, 1), Some("none".to_string()));

        let mut keeping = self::transformer(&[
            ("column", "email"),
            ("template", "some"),
            ("keep_null", "true"),
        ]);
        let mut record = testing::users_record(None);
        keeping.transform(&mut record).unwrap();
        assert_eq!(testing::raw(&record, 1), None);
    }

    #[test]
    fn test_validate_rejects_bad_value() {
        let mut transformer = transformer(&[
            ("column", "id"),
            ("template", "not a number"),
            ("validate", "true"),
        ]);
        let mut record = testing::users_record(Some("a@b.com"));
        assert!(matches!(
            transformer.transform(&mut record),
            Err(TransformerError::TypeValidation { .. })
        ));
        assert_eq!(testing::raw(&record, 0), Some("1".to_string()));

        let mut transformer = self::transformer(&[
            ("column", "id"),
            ("template", "{{ .GetValue | noiseInt 0.5 }}"),
            ("validate", "true"),
        ]);
        transformer.transform(&mut record).unwrap();
    }

    #[test]
    fn test_timestamp_round_trip() {
        let mut transformer = transformer(&[
            ("column", "created_at"),
            (
                "template",
                r#"{{ .GetValue | truncateDate "day" | .EncodeValue }}"#,
            ),
            ("validate", "true"),
        ]);
        let mut record = testing::users_record(Some("a@b.com"));
        transformer.transform(&mut record).unwrap();
        assert_eq!(
            testing::raw(&record, 3),
            Some("2023-06-15 00:00:00".to_string())
        );
    }

    #[test]
    fn test_can_write_other_columns() {
        let mut transformer = transformer(&[
            ("column", "title"),
            (
                "template",
                r#"{{ $ok := .SetColumnValue "id" 7 }}{{ .GetColumnType }}"#,
            ),
        ]);
        let mut record = testing::users_record(Some("a@b.com"));
        transformer.transform(&mut record).unwrap();
        assert_eq!(testing::raw(&record, 0), Some("7".to_string()));
        assert_eq!(testing::raw(&record, 4), Some("varchar".to_string()));
    }

    #[test]
    fn test_template_is_required() {
        let (result, collector) = testing::instance(&definition(), &[("column", "title")]);
        assert!(result.is_err());
        assert_eq!(collector.warnings()[0].meta["ParameterName"], "template");
    }
}
