use super::{compile_template, Transformer};
use crate::{
    definition::TransformerDefinition,
    error::TransformerError,
    generators::GeneratorSettings,
    parameters::{ParameterDefinition, Parameters},
    validation::{ValidationCollector, ValidationWarning},
};
use std::{collections::BTreeMap, sync::Arc};
use tracing::debug;
use veil_core::{Recorder, TableDriver};
use veil_template::{RecordContext, Template, TemplateRuntime};

pub fn definition() -> TransformerDefinition {
    TransformerDefinition::new(
        "TemplateRecord",
        "Run a template that rewrites the row through SetColumnValue",
        new_template_record_transformer,
    )
    .add_parameter(
        ParameterDefinition::new("template", "template source; its output is discarded")
            .set_required(true),
    )
    .add_parameter(
        ParameterDefinition::new("columns", "JSON list of the columns the template writes")
            .set_default_value("[]"),
    )
}

fn new_template_record_transformer(
    driver: Arc<dyn TableDriver>,
    parameters: &Parameters,
    _settings: &GeneratorSettings,
    collector: &mut ValidationCollector,
) -> Result<Box<dyn Transformer>, TransformerError> {
    let source: String = parameters.get_parameter_value("template", collector)?;
    let columns: Vec<String> = parameters.get_parameter_value("columns", collector)?;

    let mut affected_columns = BTreeMap::new();
    for name in columns {
        match driver.column_by_name(&name) {
            Some(column) => {
                affected_columns.insert(column.idx, name);
            }
            None => collector.add(
                ValidationWarning::error("column does not exist")
                    .add_meta("ParameterName", "columns")
                    .add_meta("ColumnName", name),
            ),
        }
    }
    if collector.is_fatal() {
        return Err(TransformerError::FatalValidation);
    }

    let template = compile_template(
        "template",
        &source,
        "error parsing template".to_string(),
        collector,
    )?;

    debug!(columns = affected_columns.len(), "template record transformer configured");

    Ok(Box::new(TemplateRecordTransformer {
        affected_columns,
        template,
        runtime: TemplateRuntime::new(),
        buf: Vec::new(),
    }))
}

pub struct TemplateRecordTransformer {
    affected_columns: BTreeMap<usize, String>,
    template: Template,
    runtime: TemplateRuntime,
    buf: Vec<u8>,
}

impl Transformer for TemplateRecordTransformer {
    fn affected_columns(&self) -> &BTreeMap<usize, String> {
        &self.affected_columns
    }

    fn transform(&mut self, record: &mut dyn Recorder) -> Result<(), TransformerError> {
        self.buf.clear();
        let mut scope = RecordContext::new(record);
        self.template
            .execute(&mut scope, &mut self.runtime, &mut self.buf)
            .map_err(TransformerError::TemplateExecution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn test_rewrites_several_columns() {
        let (result, collector) = testing::instance(
            &definition(),
            &[
                (
                    "template",
                    r#"
                    {{- $id := .GetColumnValue "id" -}}
                    {{- $_ := .SetColumnValue "title" (printfLike $id) -}}
                    "#,
                ),
                ("columns", r#"["title"]"#),
            ],
        );
        assert!(matches!(result, Err(TransformerError::TemplateCompile { .. })));
        assert!(collector.is_fatal());

        let (result, _) = testing::instance(
            &definition(),
            &[
                (
                    "template",
                    r#"
                    {{- $id := .GetColumnValue "id" -}}
                    {{- $_ := .SetColumnValue "id" (randomInt 100 200) -}}
                    {{- $_ = .SetRawColumnValue "title" (toString $id) -}}
                    {{- $_ = .SetColumnValue "email" null -}}
                    "#,
                ),
                ("columns", r#"["id", "title", "email"]"#),
            ],
        );
        let mut transformer = result.unwrap();
        assert_eq!(transformer.affected_columns().len(), 3);

        let mut record = testing::users_record(Some("a@b.com"));
        transformer.transform(&mut record).unwrap();

        let id: i64 = testing::raw(&record, 0).unwrap().parse().unwrap();
        assert!((100..=200).contains(&id));
        assert_eq!(testing::raw(&record, 4), Some("1".to_string()));
        assert_eq!(testing::raw(&record, 1), None);
    }

    #[test]
    fn test_unknown_column() {
        let (result, collector) = testing::instance(
            &definition(),
            &[("template", "x"), ("columns", r#"["phone"]"#)],
        );
        assert!(matches!(result, Err(TransformerError::FatalValidation)));
        assert_eq!(collector.warnings()[0].meta["ColumnName"], "phone");
    }
}
