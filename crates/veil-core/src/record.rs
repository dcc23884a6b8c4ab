use crate::{driver::TableDriver, error::CoreError, model::ColumnRawValue, value::Value};
use std::sync::Arc;

/// Mutable view over the row that is currently being transformed.
pub trait Recorder {
    fn table_driver(&self) -> &dyn TableDriver;

    fn get_raw_column_value_by_idx(&self, idx: usize) -> Result<&ColumnRawValue, CoreError>;

    fn set_raw_column_value_by_idx(
        &mut self,
        idx: usize,
        value: ColumnRawValue,
    ) -> Result<(), CoreError>;

    fn get_raw_column_value_by_name(&self, name: &str) -> Result<&ColumnRawValue, CoreError> {
        let idx = column_idx(self.table_driver(), name)?;
        self.get_raw_column_value_by_idx(idx)
    }

    fn set_raw_column_value_by_name(
        &mut self,
        name: &str,
        value: ColumnRawValue,
    ) -> Result<(), CoreError> {
        let idx = column_idx(self.table_driver(), name)?;
        self.set_raw_column_value_by_idx(idx, value)
    }

    fn get_column_value_by_idx(&self, idx: usize) -> Result<Value, CoreError> {
        let raw = self.get_raw_column_value_by_idx(idx)?;
        if raw.is_null {
            return Ok(Value::Null);
        }
        self.table_driver().decode_value_by_column_idx(idx, &raw.data)
    }

    fn get_column_value_by_name(&self, name: &str) -> Result<Value, CoreError> {
        let idx = column_idx(self.table_driver(), name)?;
        self.get_column_value_by_idx(idx)
    }

    fn set_column_value_by_name(&mut self, name: &str, value: &Value) -> Result<(), CoreError> {
        let idx = column_idx(self.table_driver(), name)?;
        let raw = if value.is_null() {
            ColumnRawValue::null()
        } else {
            ColumnRawValue::new(self.table_driver().encode_value_by_column_idx(idx, value)?)
        };
        self.set_raw_column_value_by_idx(idx, raw)
    }
}

fn column_idx(driver: &dyn TableDriver, name: &str) -> Result<usize, CoreError> {
    driver
        .column_by_name(name)
        .map(|column| column.idx)
        .ok_or_else(|| CoreError::UnknownColumn(name.to_string()))
}

/// A row held in memory as raw values, one per table column.
pub struct Record {
    driver: Arc<dyn TableDriver>,
    values: Vec<ColumnRawValue>,
}

impl Record {
    pub fn new(driver: Arc<dyn TableDriver>) -> Self {
        let values = vec![ColumnRawValue::null(); driver.table().columns.len()];
        Self { driver, values }
    }

    pub fn set_row(&mut self, values: Vec<ColumnRawValue>) -> Result<(), CoreError> {
        let expected = self.driver.table().columns.len();
        if values.len() != expected {
            return Err(CoreError::RowLength {
                expected,
                actual: values.len(),
            });
        }
        self.values = values;
        Ok(())
    }

    pub fn values(&self) -> &[ColumnRawValue] {
        &self.values
    }

    pub fn into_values(self) -> Vec<ColumnRawValue> {
        self.values
    }
}

impl Recorder for Record {
    fn table_driver(&self) -> &dyn TableDriver {
        self.driver.as_ref()
    }

    fn get_raw_column_value_by_idx(&self, idx: usize) -> Result<&ColumnRawValue, CoreError> {
        self.values
            .get(idx)
            .ok_or(CoreError::UnknownColumnIdx(idx))
    }

    fn set_raw_column_value_by_idx(
        &mut self,
        idx: usize,
        value: ColumnRawValue,
    ) -> Result<(), CoreError> {
        let slot = self
            .values
            .get_mut(idx)
            .ok_or(CoreError::UnknownColumnIdx(idx))?;
        *slot = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{driver::TextDriver, model::Table};

    fn record() -> Record {
        let driver = TextDriver::new(
            Table::new("public", "users")
                .add_column("id", "int4")
                .add_column("name", "text"),
        );
        let mut record = Record::new(Arc::new(driver));
        record
            .set_row(vec![ColumnRawValue::new("1"), ColumnRawValue::null()])
            .unwrap();
        record
    }

    #[test]
    fn test_get_column_value() {
        let record = record();
        assert_eq!(record.get_column_value_by_name("id").unwrap(), Value::Int(1));
        assert_eq!(record.get_column_value_by_name("name").unwrap(), Value::Null);
    }

    #[test]
    fn test_set_column_value_encodes_through_driver() {
        let mut record = record();
        record
            .set_column_value_by_name("id", &Value::Int(7))
            .unwrap();
        record
            .set_column_value_by_name("name", &Value::Text("bob".to_string()))
            .unwrap();

        assert_eq!(record.values()[0], ColumnRawValue::new("7"));
        assert_eq!(record.values()[1], ColumnRawValue::new("bob"));

        record.set_column_value_by_name("name", &Value::Null).unwrap();
        assert!(record.values()[1].is_null);
    }

    #[test]
    fn test_row_length_is_checked() {
        let mut record = record();
        assert!(matches!(
            record.set_row(vec![ColumnRawValue::null()]),
            Err(CoreError::RowLength {
                expected: 2,
                actual: 1
            })
        ));
    }
}
