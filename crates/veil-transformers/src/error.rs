use thiserror::Error;
use veil_core::CoreError;
use veil_template::TemplateError;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("generator size must be at least {min} bytes, got {size}")]
    SizeTooSmall { size: usize, min: usize },

    #[error("expected at least 8 bytes to build u64, got {0}")]
    NotEnoughBytes(usize),

    #[error("invalid engine value \"{0}\"")]
    UnknownEngine(String),
}

#[derive(Error, Debug)]
pub enum TransformerError {
    #[error("error scanning parameter \"{parameter}\": {reason}")]
    Scan { parameter: String, reason: String },

    #[error(transparent)]
    Generate(#[from] GeneratorError),

    #[error("error executing template: {0}")]
    TemplateExecution(#[source] TemplateError),

    #[error("value of column \"{column}\" failed type validation: {reason}")]
    TypeValidation { column: String, reason: String },

    #[error("invalid json data")]
    InvalidJson,

    #[error("unable to parse email")]
    InvalidEmail,

    #[error("generated email is invalid")]
    GeneratedEmailInvalid,

    #[error("fatal validation error")]
    FatalValidation,

    #[error("{context}: {source}")]
    TemplateCompile {
        context: String,
        #[source]
        source: TemplateError,
    },

    #[error("cannot apply \"{operation}\" operation[{index}] with path {path}: {source}")]
    JsonOperation {
        index: usize,
        operation: String,
        path: String,
        #[source]
        source: Box<TransformerError>,
    },

    #[error("value by path \"{0}\" does not exist")]
    PathNotExist(String),

    #[error("transformer \"{name}\" failed: {source}")]
    Transformer {
        name: String,
        #[source]
        source: Box<TransformerError>,
    },

    #[error(transparent)]
    Record(#[from] CoreError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
