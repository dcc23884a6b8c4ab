use crate::{
    error::TransformerError,
    generators::GeneratorSettings,
    parameters::{init_parameters, DynamicParameterValue, ParameterDefinition, Parameters},
    transformers::Transformer,
    validation::ValidationCollector,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::debug;
use veil_core::TableDriver;

#[derive(Debug, Clone, Serialize)]
pub struct TransformerProperties {
    pub name: String,
    pub description: String,
}

pub type NewTransformerFn = fn(
    Arc<dyn TableDriver>,
    &Parameters,
    &GeneratorSettings,
    &mut ValidationCollector,
) -> Result<Box<dyn Transformer>, TransformerError>;

/// A named transformer kind: its parameter schema plus a constructor.
#[derive(Clone)]
pub struct TransformerDefinition {
    pub properties: TransformerProperties,
    pub new: NewTransformerFn,
    pub parameters: Vec<ParameterDefinition>,
}

impl TransformerDefinition {
    pub fn new(name: &str, description: &str, new: NewTransformerFn) -> Self {
        Self {
            properties: TransformerProperties {
                name: name.to_string(),
                description: description.to_string(),
            },
            new,
            parameters: Vec::new(),
        }
    }

    pub fn add_parameter(mut self, parameter: ParameterDefinition) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn name(&self) -> &str {
        &self.properties.name
    }

    /// Resolves the parameters and builds an instance. No instance is
    /// returned when any fatal finding was collected, even if the constructor
    /// itself succeeded.
    pub fn instance(
        &self,
        driver: Arc<dyn TableDriver>,
        static_values: &HashMap<String, String>,
        dynamic_values: &HashMap<String, DynamicParameterValue>,
        settings: &GeneratorSettings,
        collector: &mut ValidationCollector,
    ) -> Result<Box<dyn Transformer>, TransformerError> {
        let mut scoped = collector.with_meta("TransformerName", self.name());

        let result = init_parameters(
            driver.as_ref(),
            &self.parameters,
            static_values,
            dynamic_values,
            &mut scoped,
        )
        .and_then(|parameters| (self.new)(driver.clone(), &parameters, settings, &mut scoped));

        let fatal = scoped.is_fatal();
        collector.extend(scoped);

        match result {
            Ok(_) if fatal => Err(TransformerError::FatalValidation),
            Ok(transformer) => {
                debug!(
                    transformer = self.name(),
                    table = %driver.table().qualified_name(),
                    "transformer instance created"
                );
                Ok(transformer)
            }
            Err(err) => Err(err),
        }
    }
}
