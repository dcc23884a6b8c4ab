use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),

    #[error("column \"{0}\" does not exist")]
    UnknownColumn(String),

    #[error("column with index {0} does not exist")]
    UnknownColumnIdx(usize),

    #[error("unsupported type \"{0}\"")]
    UnsupportedType(String),

    #[error("cannot decode \"{value}\" as {type_name}: {reason}")]
    Decode {
        type_name: String,
        value: String,
        reason: String,
    },

    #[error("cannot encode {value} as {type_name}: {reason}")]
    Encode {
        type_name: String,
        value: String,
        reason: String,
    },

    #[error("expected {expected} values in row, got {actual}")]
    RowLength { expected: usize, actual: usize },

    #[error("invalid json path \"{path}\": {reason}")]
    JsonPath { path: String, reason: String },
}

impl CoreError {
    pub(crate) fn decode(type_name: &str, data: &[u8], reason: impl ToString) -> Self {
        CoreError::Decode {
            type_name: type_name.to_string(),
            value: String::from_utf8_lossy(data).into_owned(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn encode(type_name: &str, value: impl ToString, reason: impl ToString) -> Self {
        CoreError::Encode {
            type_name: type_name.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
