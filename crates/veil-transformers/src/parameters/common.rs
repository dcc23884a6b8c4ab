use super::{ColumnProperties, ParameterDefinition};

pub fn column_definition(description: &str, allowed_types: &[&str]) -> ParameterDefinition {
    ParameterDefinition::new("column", description)
        .set_required(true)
        .set_column_properties(
            ColumnProperties::new()
                .set_allowed_types(allowed_types)
                .set_affected(true),
        )
}

pub fn keep_null_definition(default: bool) -> ParameterDefinition {
    ParameterDefinition::new("keep_null", "do not replace NULL values")
        .set_default_value(if default { "true" } else { "false" })
}

pub fn validate_definition(description: &str) -> ParameterDefinition {
    ParameterDefinition::new("validate", description).set_default_value("false")
}

pub fn engine_definition() -> ParameterDefinition {
    ParameterDefinition::new(
        "engine",
        "generator engine: random, or deterministic (alias hash) to derive values from the original one",
    )
    .set_default_value("random")
    .set_allowed_values(&["random", "deterministic", "hash"])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generators::Engine;

    #[test]
    fn test_engine_allowed_values_parse() {
        let definition = engine_definition();
        assert_eq!(definition.allowed_values.len(), 3);
        for value in &definition.allowed_values {
            assert!(value.parse::<Engine>().is_ok(), "{}", value);
        }
    }
}
