use ::config::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::{collections::BTreeMap, collections::HashMap, path::Path, sync::Arc};
use veil_core::{Table, TableDriver, TextDriver};
use veil_transformers::{parameters::DynamicParameterValue, GeneratorSettings, TransformerConfig};

/// Overrides the `salt` key of the config file.
pub const SALT_ENV: &str = "VEIL_GLOBAL_SALT";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    #[serde(default = "default_schema")]
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnConfig>,
}

fn default_schema() -> String {
    String::from("public")
}

impl TableConfig {
    pub fn driver(&self) -> Arc<dyn TableDriver> {
        let table = self
            .columns
            .iter()
            .fold(Table::new(&self.schema, &self.name), |table, column| {
                table.add_column(&column.name, &column.type_name)
            });
        Arc::new(TextDriver::new(table))
    }
}

/// A `[[transformers]]` entry as written in the file. Parameter values may be
/// any TOML value; non-strings are passed on as JSON text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformerEntry {
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, JsonValue>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub dynamic_params: HashMap<String, DynamicParameterValue>,
}

impl From<TransformerEntry> for TransformerConfig {
    fn from(entry: TransformerEntry) -> Self {
        Self {
            name: entry.name,
            params: entry
                .params
                .into_iter()
                .map(|(key, value)| match value {
                    JsonValue::String(text) => (key, text),
                    other => (key, other.to_string()),
                })
                .collect(),
            dynamic_params: entry.dynamic_params,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
    pub table: TableConfig,
    #[serde(default)]
    pub transformers: Vec<TransformerEntry>,
}

impl ApplicationConfig {
    pub fn generator_settings(&self) -> GeneratorSettings {
        match &self.salt {
            Some(salt) => GeneratorSettings::new(salt.as_bytes().to_vec()),
            None => GeneratorSettings::default(),
        }
    }

    pub fn transformer_configs(&self) -> Vec<TransformerConfig> {
        self.transformers.iter().cloned().map(Into::into).collect()
    }
}

pub fn load_config(path: &Path) -> Result<ApplicationConfig, ConfigError> {
    let mut s = config::Config::default();
    s.merge(config::File::from(path))?;
    if let Ok(salt) = std::env::var(SALT_ENV) {
        s.set("salt", salt)?;
    }
    s.try_into()
}
