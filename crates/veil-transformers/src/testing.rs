use crate::{
    definition::TransformerDefinition, error::TransformerError, generators::GeneratorSettings,
    transformers::Transformer, validation::ValidationCollector,
};
use std::{collections::HashMap, sync::Arc};
use veil_core::{ColumnRawValue, Record, Recorder, Table, TableDriver, TextDriver};

pub fn users_driver() -> Arc<dyn TableDriver> {
    Arc::new(TextDriver::new(
        Table::new("public", "users")
            .add_column("id", "int4")
            .add_column("email", "text")
            .add_column("doc", "jsonb")
            .add_column("created_at", "timestamp")
            .add_column("title", "varchar"),
    ))
}

pub fn record(driver: &Arc<dyn TableDriver>, row: &[Option<&str>]) -> Record {
    let mut record = Record::new(driver.clone());
    record
        .set_row(
            row.iter()
                .map(|value| match value {
                    Some(value) => ColumnRawValue::new(*value),
                    None => ColumnRawValue::null(),
                })
                .collect(),
        )
        .unwrap();
    record
}

pub fn users_record(email: Option<&str>) -> Record {
    record(
        &users_driver(),
        &[
            Some("1"),
            email,
            Some(r#"{"name":"alice","created_at":"2023-06-15 00:00:00"}"#),
            Some("2023-06-15 12:30:00"),
            Some("hello"),
        ],
    )
}

pub fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

pub fn instance(
    definition: &TransformerDefinition,
    pairs: &[(&str, &str)],
) -> (
    Result<Box<dyn Transformer>, TransformerError>,
    ValidationCollector,
) {
    let mut collector = ValidationCollector::new();
    let result = definition.instance(
        users_driver(),
        &params(pairs),
        &HashMap::new(),
        &GeneratorSettings::default(),
        &mut collector,
    );
    (result, collector)
}

pub fn raw(record: &Record, idx: usize) -> Option<String> {
    let raw = record.get_raw_column_value_by_idx(idx).unwrap();
    if raw.is_null {
        None
    } else {
        Some(raw.as_str().unwrap().to_string())
    }
}
