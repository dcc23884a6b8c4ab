use crate::config::TransformerEntry;
use anyhow::{anyhow, Result};
use clap::ArgMatches;
use serde_json::{json, Value as JsonValue};
use veil_transformers::{default_registry, TransformerDefinition};

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let registry = default_registry();

    match matches.value_of("transformer") {
        Some(name) => {
            let definition = registry
                .get(name)
                .ok_or_else(|| anyhow!("unknown transformer \"{}\"", name))?;
            print!("{}", stanza(definition)?);
        }
        None => {
            let catalog: Vec<JsonValue> = registry.definitions().map(describe).collect();
            println!("{}", serde_json::to_string_pretty(&catalog)?);
        }
    }

    Ok(())
}

fn describe(definition: &TransformerDefinition) -> JsonValue {
    json!({
        "properties": definition.properties,
        "parameters": definition.parameters,
    })
}

/// A `[[transformers]]` block with every parameter that has a default or is
/// required. Required parameters without a default are left empty.
fn stanza(definition: &TransformerDefinition) -> Result<String> {
    #[derive(serde::Serialize)]
    struct Stanza {
        transformers: Vec<TransformerEntry>,
    }

    let params = definition
        .parameters
        .iter()
        .filter(|parameter| parameter.required || parameter.default_value.is_some())
        .map(|parameter| {
            let value = parameter.default_value.clone().unwrap_or_default();
            (parameter.name.clone(), JsonValue::String(value))
        })
        .collect();

    let entry = TransformerEntry {
        name: definition.name().to_string(),
        params,
        ..Default::default()
    };

    Ok(toml::to_string(&Stanza {
        transformers: vec![entry],
    })?)
}
