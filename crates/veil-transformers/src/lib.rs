mod definition;
mod error;
pub mod generators;
pub mod parameters;
mod pipeline;
mod registry;
#[cfg(test)]
mod testing;
pub mod transformers;
pub mod validation;

pub use crate::definition::{NewTransformerFn, TransformerDefinition, TransformerProperties};
pub use crate::error::{GeneratorError, TransformerError};
pub use crate::generators::{Engine, Generator, GeneratorSettings};
pub use crate::parameters::DynamicParameterValue;
pub use crate::pipeline::{Pipeline, TransformerConfig};
pub use crate::registry::{default_registry, TransformerRegistry};
pub use crate::transformers::Transformer;
pub use crate::validation::{Severity, ValidationCollector, ValidationWarning};
