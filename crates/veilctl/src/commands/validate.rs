use anyhow::{bail, Result};
use clap::ArgMatches;
use tracing::info;
use veil_transformers::ValidationCollector;

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::load(matches)?;

    let mut collector = ValidationCollector::new();
    let result = super::build_pipeline(&config, &mut collector);

    println!("{}", serde_json::to_string_pretty(collector.warnings())?);

    match result {
        Ok(pipeline) => {
            info!(
                table = %config.table.name,
                transformers = pipeline.len(),
                "configuration is valid"
            );
            Ok(())
        }
        Err(err) => bail!("configuration is invalid: {}", err),
    }
}
