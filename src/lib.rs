//! Masking engine: transformers that rewrite table rows in place.
//!
//! The building blocks live in their own crates and are re-exported here.

pub use veil_core::{
    decode_copy_row, encode_copy_row, Column, ColumnRawValue, Record, Recorder, Table,
    TableDriver, TextDriver, Value,
};
pub use veil_template::Template;
pub use veil_transformers::{
    default_registry, DynamicParameterValue, Pipeline, Transformer, TransformerConfig, TransformerError,
    GeneratorSettings, TransformerRegistry, ValidationCollector, ValidationWarning,
};
