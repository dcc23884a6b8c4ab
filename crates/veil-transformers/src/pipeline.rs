use crate::{
    error::TransformerError,
    generators::GeneratorSettings,
    parameters::DynamicParameterValue,
    registry::TransformerRegistry,
    transformers::Transformer,
    validation::{ValidationCollector, ValidationWarning},
};
use itertools::Itertools;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::{debug, info};
use veil_core::{Recorder, TableDriver};

/// One `[[transformers]]` entry of a table configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    pub name: String,
    pub params: HashMap<String, String>,
    pub dynamic_params: HashMap<String, DynamicParameterValue>,
}

struct PipelineStage {
    name: String,
    transformer: Box<dyn Transformer>,
}

/// The transformers of one table, applied to every row in declaration order.
pub struct Pipeline {
    driver: Arc<dyn TableDriver>,
    stages: Vec<PipelineStage>,
}

impl Pipeline {
    /// Builds every configured transformer. Findings of all transformers are
    /// collected before failing, so one call reports every problem.
    pub fn new(
        registry: &TransformerRegistry,
        driver: Arc<dyn TableDriver>,
        configs: &[TransformerConfig],
        settings: &GeneratorSettings,
        collector: &mut ValidationCollector,
    ) -> Result<Self, TransformerError> {
        let mut stages = Vec::with_capacity(configs.len());

        for (position, config) in configs.iter().enumerate() {
            let definition = match registry.get(&config.name) {
                Some(definition) => definition,
                None => {
                    collector.add(
                        ValidationWarning::error("unknown transformer")
                            .add_meta("TransformerName", config.name.as_str())
                            .add_meta("TransformerPosition", position),
                    );
                    continue;
                }
            };

            let reported = collector.warnings().len();
            match definition.instance(
                driver.clone(),
                &config.params,
                &config.dynamic_params,
                settings,
                collector,
            ) {
                Ok(transformer) => stages.push(PipelineStage {
                    name: config.name.clone(),
                    transformer,
                }),
                Err(TransformerError::FatalValidation) => {}
                Err(err) => {
                    debug!(
                        transformer = %config.name,
                        error = %err,
                        "transformer construction failed"
                    );
                    if collector.warnings().len() == reported {
                        collector.add(
                            ValidationWarning::error("unable to initialize transformer")
                                .add_meta("TransformerName", config.name.as_str())
                                .set_error(&err),
                        );
                    }
                }
            }
        }

        check_affected_columns(&stages, collector);

        if collector.is_fatal() {
            return Err(TransformerError::FatalValidation);
        }

        info!(
            table = %driver.table().qualified_name(),
            transformers = %stages.iter().map(|stage| stage.name.as_str()).join(", "),
            "pipeline ready"
        );

        Ok(Self { driver, stages })
    }

    pub fn table_driver(&self) -> &Arc<dyn TableDriver> {
        &self.driver
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn init(&mut self) -> Result<(), TransformerError> {
        for stage in self.stages.iter_mut() {
            stage
                .transformer
                .init()
                .map_err(|err| wrap(&stage.name, err))?;
        }
        Ok(())
    }

    /// Applies each transformer to the row. The first error stops the row.
    pub fn transform(&mut self, record: &mut dyn Recorder) -> Result<(), TransformerError> {
        for stage in self.stages.iter_mut() {
            stage
                .transformer
                .transform(record)
                .map_err(|err| wrap(&stage.name, err))?;
        }
        Ok(())
    }

    pub fn done(&mut self) -> Result<(), TransformerError> {
        for stage in self.stages.iter_mut() {
            stage
                .transformer
                .done()
                .map_err(|err| wrap(&stage.name, err))?;
        }
        Ok(())
    }
}

fn wrap(name: &str, err: TransformerError) -> TransformerError {
    TransformerError::Transformer {
        name: name.to_string(),
        source: Box::new(err),
    }
}

fn check_affected_columns(stages: &[PipelineStage], collector: &mut ValidationCollector) {
    let mut owners: BTreeMap<usize, (&str, Vec<&str>)> = BTreeMap::new();
    for stage in stages {
        for (idx, column) in stage.transformer.affected_columns() {
            owners
                .entry(*idx)
                .or_insert_with(|| (column.as_str(), Vec::new()))
                .1
                .push(stage.name.as_str());
        }
    }

    for (column, names) in owners.into_values() {
        if names.len() > 1 {
            collector.add(
                ValidationWarning::error("column is affected by more than one transformer")
                    .add_meta("ColumnName", column)
                    .add_meta("TransformerNames", names.iter().join(", ")),
            );
        }
    }
}
