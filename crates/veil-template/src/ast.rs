use crate::functions::TemplateFunction;
use std::fmt;
use veil_core::Value;

#[derive(Debug, Clone)]
pub enum Node {
    Text(String),
    Action(Pipeline),
    If(IfNode),
}

#[derive(Debug, Clone)]
pub struct IfNode {
    pub branches: Vec<(Pipeline, Vec<Node>)>,
    pub otherwise: Vec<Node>,
}

#[derive(Debug, Clone)]
pub struct Declaration {
    pub variable: String,
    pub define: bool,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    pub declaration: Option<Declaration>,
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone)]
pub struct Command {
    pub operands: Vec<Operand>,
}

#[derive(Clone)]
pub enum Operand {
    Literal(Value),
    Function {
        name: String,
        function: TemplateFunction,
    },
    Method(String),
    Variable(String),
    Pipeline(Box<Pipeline>),
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Operand::Function { name, .. } => f.debug_tuple("Function").field(name).finish(),
            Operand::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Operand::Variable(name) => f.debug_tuple("Variable").field(name).finish(),
            Operand::Pipeline(pipeline) => f.debug_tuple("Pipeline").field(pipeline).finish(),
        }
    }
}
