pub mod inspect;
pub mod mask;
pub mod validate;

use crate::config::{load_config, ApplicationConfig};
use anyhow::Result;
use clap::ArgMatches;
use std::path::Path;
use veil_transformers::{default_registry, Pipeline, TransformerError, ValidationCollector};

fn load(matches: &ArgMatches) -> Result<ApplicationConfig> {
    let config_file_path = Path::new(
        matches
            .value_of("config")
            .expect("Missing value for 'config' argument"),
    );

    let config_file_path = std::env::current_dir()?.join(config_file_path);
    Ok(load_config(&config_file_path)?)
}

/// Builds the pipeline of the configured table. Findings are collected even
/// when construction fails.
fn build_pipeline(
    config: &ApplicationConfig,
    collector: &mut ValidationCollector,
) -> Result<Pipeline, TransformerError> {
    Pipeline::new(
        &default_registry(),
        config.table.driver(),
        &config.transformer_configs(),
        &config.generator_settings(),
        collector,
    )
}
