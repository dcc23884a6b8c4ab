pub(crate) mod email;
pub(crate) mod json;
pub(crate) mod template;
pub(crate) mod template_record;

pub use email::{RandomEmailTransformer, DEFAULT_EMAIL_DOMAINS};
pub use json::{JsonTransformer, OperationConfig, OperationKind};
pub use template::TemplateTransformer;
pub use template_record::TemplateRecordTransformer;

use crate::{
    error::TransformerError,
    parameters::Parameters,
    validation::{ValidationCollector, ValidationWarning},
};
use std::collections::BTreeMap;
use veil_core::Recorder;
use veil_template::Template;

/// A configured column transformer.
///
/// `transform` takes `&mut self`: an instance reuses scratch buffers between
/// rows and must process rows one at a time.
pub trait Transformer: Send {
    /// Column index to column name of every column this instance writes.
    fn affected_columns(&self) -> &BTreeMap<usize, String>;

    fn init(&mut self) -> Result<(), TransformerError> {
        Ok(())
    }

    fn transform(&mut self, record: &mut dyn Recorder) -> Result<(), TransformerError>;

    fn done(&mut self) -> Result<(), TransformerError> {
        Ok(())
    }
}

fn compile_template(
    name: &str,
    source: &str,
    context: String,
    collector: &mut ValidationCollector,
) -> Result<Template, TransformerError> {
    Template::parse(name, source).map_err(|err| {
        collector.add(
            ValidationWarning::error("unable to compile template")
                .add_meta("TemplateName", name)
                .set_error(&err),
        );
        TransformerError::TemplateCompile {
            context,
            source: err,
        }
    })
}

/// Compiles a template parameter. An empty or unset parameter yields `None`.
fn template_parameter(
    parameters: &Parameters,
    name: &str,
    collector: &mut ValidationCollector,
) -> Result<Option<Template>, TransformerError> {
    let source: String =
        parameters.get_parameter_value_with_default(name, String::new(), collector)?;
    if source.is_empty() {
        return Ok(None);
    }
    compile_template(
        name,
        &source,
        format!("error parsing \"{}\" template", name),
        collector,
    )
    .map(Some)
}
