use crate::{
    definition::TransformerDefinition,
    error::TransformerError,
    transformers::{email, json, template, template_record},
};
use anyhow::anyhow;
use std::collections::BTreeMap;

/// Transformer definitions by name.
#[derive(Clone, Default)]
pub struct TransformerRegistry {
    definitions: BTreeMap<String, TransformerDefinition>,
}

impl TransformerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: TransformerDefinition) -> Result<(), TransformerError> {
        let name = definition.name().to_string();
        if self.definitions.contains_key(&name) {
            return Err(anyhow!("transformer \"{}\" is already registered", name).into());
        }
        self.definitions.insert(name, definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TransformerDefinition> {
        self.definitions.get(name)
    }

    pub fn definitions(&self) -> impl Iterator<Item = &TransformerDefinition> {
        self.definitions.values()
    }
}

/// Registry holding every built-in transformer.
pub fn default_registry() -> TransformerRegistry {
    let definitions = [
        email::definition(),
        json::definition(),
        template::definition(),
        template_record::definition(),
    ];
    TransformerRegistry {
        definitions: definitions
            .into_iter()
            .map(|definition| (definition.name().to_string(), definition))
            .collect(),
    }
}
