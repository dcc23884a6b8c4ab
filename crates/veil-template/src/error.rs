use thiserror::Error;
use veil_core::CoreError;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("function \"{0}\" not defined")]
    UnknownFunction(String),

    #[error("can't evaluate field {0}")]
    UnknownMember(String),

    #[error("undefined variable \"${0}\"")]
    UndefinedVariable(String),

    #[error("wrong number of args for {name}: want {want} got {got}")]
    Arity {
        name: String,
        want: String,
        got: usize,
    },

    #[error("error calling {name}: {reason}")]
    Call { name: String, reason: String },
}

impl TemplateError {
    pub fn call(name: &str, reason: impl ToString) -> Self {
        TemplateError::Call {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn syntax(reason: impl ToString) -> Self {
        TemplateError::Syntax(reason.to_string())
    }
}
