use crate::{
    ast::{Command, Node, Operand, Pipeline},
    context::Scope,
    error::TemplateError,
    functions::is_true,
    runtime::TemplateRuntime,
};
use std::io::Write;
use veil_core::Value;

pub struct Execution<'a> {
    scope: &'a mut dyn Scope,
    runtime: &'a mut TemplateRuntime,
    variables: Vec<(String, Value)>,
}

impl<'a> Execution<'a> {
    pub fn new(scope: &'a mut dyn Scope, runtime: &'a mut TemplateRuntime) -> Self {
        Self {
            scope,
            runtime,
            variables: Vec::new(),
        }
    }

    pub fn walk(&mut self, nodes: &[Node], out: &mut Vec<u8>) -> Result<(), TemplateError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.extend_from_slice(text.as_bytes()),
                Node::Action(pipeline) => {
                    let value = self.eval_pipeline(pipeline)?;
                    if pipeline.declaration.is_none() {
                        // Writing into a Vec cannot fail.
                        let _ = write!(out, "{}", value);
                    }
                }
                Node::If(node) => {
                    let mark = self.variables.len();
                    let mut taken = false;
                    for (condition, body) in &node.branches {
                        if is_true(&self.eval_pipeline(condition)?) {
                            self.walk(body, out)?;
                            taken = true;
                            break;
                        }
                    }
                    if !taken {
                        self.walk(&node.otherwise, out)?;
                    }
                    self.variables.truncate(mark);
                }
            }
        }
        Ok(())
    }

    fn eval_pipeline(&mut self, pipeline: &Pipeline) -> Result<Value, TemplateError> {
        let mut piped: Option<Value> = None;
        for command in &pipeline.commands {
            piped = Some(self.eval_command(command, piped.take())?);
        }
        let value = piped.unwrap_or(Value::Null);

        if let Some(declaration) = &pipeline.declaration {
            if declaration.define {
                self.variables
                    .push((declaration.variable.clone(), value.clone()));
            } else {
                let slot = self
                    .variables
                    .iter_mut()
                    .rev()
                    .find(|(name, _)| *name == declaration.variable)
                    .ok_or_else(|| TemplateError::UndefinedVariable(declaration.variable.clone()))?;
                slot.1 = value.clone();
            }
        }
        Ok(value)
    }

    fn eval_command(
        &mut self,
        command: &Command,
        piped: Option<Value>,
    ) -> Result<Value, TemplateError> {
        let (head, rest) = match command.operands.split_first() {
            Some(split) => split,
            None => return Err(TemplateError::syntax("empty command")),
        };

        match head {
            Operand::Function { function, .. } => {
                let args = self.eval_args(rest, piped)?;
                function(self.runtime, args)
            }
            Operand::Method(name) => {
                let args = self.eval_args(rest, piped)?;
                self.scope.call(name, args)
            }
            other => {
                if !rest.is_empty() || piped.is_some() {
                    return Err(TemplateError::syntax(format!(
                        "can't give argument to non-function {:?}",
                        other
                    )));
                }
                self.eval_operand(other)
            }
        }
    }

    fn eval_args(
        &mut self,
        operands: &[Operand],
        piped: Option<Value>,
    ) -> Result<Vec<Value>, TemplateError> {
        let mut args = Vec::with_capacity(operands.len() + 1);
        for operand in operands {
            args.push(self.eval_operand(operand)?);
        }
        if let Some(value) = piped {
            args.push(value);
        }
        Ok(args)
    }

    fn eval_operand(&mut self, operand: &Operand) -> Result<Value, TemplateError> {
        match operand {
            Operand::Literal(value) => Ok(value.clone()),
            Operand::Function { function, .. } => function(self.runtime, Vec::new()),
            Operand::Method(name) => self.scope.call(name, Vec::new()),
            Operand::Variable(name) => self
                .variables
                .iter()
                .rev()
                .find(|(variable, _)| variable == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| TemplateError::UndefinedVariable(name.clone())),
            Operand::Pipeline(pipeline) => self.eval_pipeline(pipeline),
        }
    }
}
