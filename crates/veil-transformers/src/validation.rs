//! Structured configuration findings.
//!
//! Findings are collected rather than returned one at a time so a single
//! validation pass can report every problem of a pipeline definition.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::{collections::BTreeMap, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationWarning {
    pub severity: Severity,
    pub msg: String,
    pub meta: BTreeMap<String, JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationWarning {
    pub fn new(severity: Severity, msg: &str) -> Self {
        Self {
            severity,
            msg: msg.to_string(),
            meta: BTreeMap::new(),
            error: None,
        }
    }

    pub fn error(msg: &str) -> Self {
        Self::new(Severity::Error, msg)
    }

    pub fn warning(msg: &str) -> Self {
        Self::new(Severity::Warning, msg)
    }

    pub fn add_meta(mut self, key: &str, value: impl Into<JsonValue>) -> Self {
        self.meta.insert(key.to_string(), value.into());
        self
    }

    pub fn set_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.msg)?;
        for (key, value) in &self.meta {
            write!(f, " {}={}", key, value)?;
        }
        if let Some(error) = &self.error {
            write!(f, " ({})", error)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ValidationCollector {
    warnings: Vec<ValidationWarning>,
    meta: BTreeMap<String, JsonValue>,
}

impl ValidationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty collector whose findings are tagged with `key`, on top of this
    /// collector's own tags. Merge it back with [`ValidationCollector::extend`].
    pub fn with_meta(&self, key: &str, value: impl Into<JsonValue>) -> Self {
        let mut meta = self.meta.clone();
        meta.insert(key.to_string(), value.into());
        Self {
            warnings: Vec::new(),
            meta,
        }
    }

    pub fn add(&mut self, mut warning: ValidationWarning) {
        for (key, value) in &self.meta {
            warning
                .meta
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        self.warnings.push(warning);
    }

    pub fn extend(&mut self, other: ValidationCollector) {
        self.warnings.extend(other.warnings);
    }

    pub fn is_fatal(&self) -> bool {
        self.warnings.iter().any(ValidationWarning::is_fatal)
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<ValidationWarning> {
        self.warnings
    }
}
