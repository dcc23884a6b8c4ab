mod ast;
pub mod context;
mod error;
pub mod functions;
mod interpreter;
pub mod interval;
mod lexer;
mod parser;
mod runtime;

use crate::{ast::Node, interpreter::Execution, lexer::tokenize, parser::Parser};
use tracing::trace;

pub use crate::context::{
    ReadableRecord, RecordContext, RecordContextReadOnly, Scope, WritableRecord,
};
pub use crate::error::TemplateError;
pub use crate::functions::{function_names, is_true};
pub use crate::runtime::TemplateRuntime;

/// A compiled template.
///
/// Functions are resolved at parse time, so an unknown function name is a
/// compile error rather than an execution error.
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    root: Vec<Node>,
}

impl Template {
    pub fn parse(name: &str, source: &str) -> Result<Self, TemplateError> {
        let tokens = tokenize(source)?;
        trace!(template = name, tokens = tokens.len(), "parsing template");
        let root = Parser::new(tokens).parse()?;
        Ok(Self {
            name: name.to_string(),
            root,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renders the template into `out`. `out` is not cleared first.
    pub fn execute(
        &self,
        scope: &mut dyn Scope,
        runtime: &mut TemplateRuntime,
        out: &mut Vec<u8>,
    ) -> Result<(), TemplateError> {
        Execution::new(scope, runtime).walk(&self.root, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::Value;

    struct Values;

    impl Scope for Values {
        fn call(&mut self, name: &str, args: Vec<Value>) -> Result<Value, TemplateError> {
            match name {
                "Name" => Ok(Value::Text("  Alice  ".to_string())),
                "Age" => Ok(Value::Int(42)),
                "Nothing" => Ok(Value::Null),
                "Echo" => Ok(args.into_iter().next().unwrap_or(Value::Null)),
                _ => Err(TemplateError::UnknownMember(name.to_string())),
            }
        }
    }

    fn render(source: &str) -> Result<String, TemplateError> {
        let template = Template::parse("test", source)?;
        let mut out = Vec::new();
        template.execute(&mut Values, &mut TemplateRuntime::with_seed(1), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(render("hello").unwrap(), "hello");
    }

    #[test]
    fn test_trim_markers() {
        assert_eq!(render("a  {{- .Age -}}  b").unwrap(), "a42b");
    }

    #[test]
    fn test_pipeline_passes_last_argument() {
        assert_eq!(render("{{ .Name | trim | upper }}").unwrap(), "ALICE");
        assert_eq!(render(r#"{{ "abcdef" | trunc 2 }}"#).unwrap(), "ab");
        assert_eq!(render(r#"{{ .Echo "x" }}"#).unwrap(), "x");
    }

    #[test]
    fn test_null_renders_marker() {
        assert_eq!(render("{{ .Nothing }}").unwrap(), "\\N");
        assert_eq!(render("{{ null }}").unwrap(), "\\N");
    }

    #[test]
    fn test_if_else() {
        assert_eq!(
            render("{{ if gt .Age 40 }}old{{ else }}young{{ end }}").unwrap(),
            "old"
        );
        assert_eq!(
            render("{{ if .Nothing }}a{{ else if eq .Age 42 }}b{{ end }}").unwrap(),
            "b"
        );
        assert_eq!(render("{{ if .Nothing }}a{{ end }}").unwrap(), "");
    }

    #[test]
    fn test_variables() {
        assert_eq!(
            render("{{ $x := .Age }}{{ $x = add }}").unwrap_err().to_string(),
            "function \"add\" not defined"
        );
        assert_eq!(render("{{ $x := .Age }}{{ $x }}").unwrap(), "42");
        assert_eq!(render(r#"{{ $x := "a" }}{{ $x = "b" }}{{ $x }}"#).unwrap(), "b");
        assert!(matches!(
            render("{{ if true }}{{ $y := 1 }}{{ end }}{{ $y }}"),
            Err(TemplateError::UndefinedVariable(name)) if name == "y"
        ));
    }

    #[test]
    fn test_parenthesized_pipeline() {
        assert_eq!(render("{{ upper (trim .Name) }}").unwrap(), "ALICE");
    }

    #[test]
    fn test_unknown_member() {
        assert!(matches!(
            render("{{ .Missing }}"),
            Err(TemplateError::UnknownMember(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_non_function_with_arguments() {
        assert!(render("{{ 1 2 }}").is_err());
    }
}
