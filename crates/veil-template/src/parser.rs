use crate::{
    ast::{Command, Declaration, IfNode, Node, Operand, Pipeline},
    error::TemplateError,
    functions,
    lexer::Token,
};
use veil_core::Value;

enum Stop {
    Eof,
    Else(Option<Pipeline>),
    End,
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Vec<Node>, TemplateError> {
        let (nodes, stop) = self.parse_list()?;
        match stop {
            Stop::Eof => Ok(nodes),
            Stop::Else(_) => Err(TemplateError::syntax("unexpected {{else}}")),
            Stop::End => Err(TemplateError::syntax("unexpected {{end}}")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), TemplateError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(TemplateError::syntax(format!(
                "expected {:?}, found {:?}",
                expected, token
            ))),
            None => Err(TemplateError::syntax(format!(
                "expected {:?}, found end of template",
                expected
            ))),
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Identifier(name)) if name == keyword)
    }

    fn parse_list(&mut self) -> Result<(Vec<Node>, Stop), TemplateError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.next() {
            match token {
                Token::Text(text) => nodes.push(Node::Text(text)),
                Token::ActionStart => {
                    if self.is_keyword("if") {
                        self.pos += 1;
                        nodes.push(Node::If(self.parse_if()?));
                    } else if self.is_keyword("else") {
                        self.pos += 1;
                        if self.is_keyword("if") {
                            self.pos += 1;
                            let condition = self.parse_pipeline()?;
                            self.expect(Token::ActionEnd)?;
                            return Ok((nodes, Stop::Else(Some(condition))));
                        }
                        self.expect(Token::ActionEnd)?;
                        return Ok((nodes, Stop::Else(None)));
                    } else if self.is_keyword("end") {
                        self.pos += 1;
                        self.expect(Token::ActionEnd)?;
                        return Ok((nodes, Stop::End));
                    } else {
                        let pipeline = self.parse_pipeline()?;
                        self.expect(Token::ActionEnd)?;
                        nodes.push(Node::Action(pipeline));
                    }
                }
                other => {
                    return Err(TemplateError::syntax(format!(
                        "unexpected {:?} outside of action",
                        other
                    )))
                }
            }
        }

        Ok((nodes, Stop::Eof))
    }

    fn parse_if(&mut self) -> Result<IfNode, TemplateError> {
        let mut condition = self.parse_pipeline()?;
        self.expect(Token::ActionEnd)?;

        let mut branches = Vec::new();
        loop {
            let (body, stop) = self.parse_list()?;
            branches.push((condition, body));
            match stop {
                Stop::Else(Some(next)) => condition = next,
                Stop::Else(None) => {
                    let (otherwise, stop) = self.parse_list()?;
                    return match stop {
                        Stop::End => Ok(IfNode {
                            branches,
                            otherwise,
                        }),
                        _ => Err(TemplateError::syntax("expected {{end}} after {{else}}")),
                    };
                }
                Stop::End => {
                    return Ok(IfNode {
                        branches,
                        otherwise: Vec::new(),
                    })
                }
                Stop::Eof => return Err(TemplateError::syntax("unexpected EOF in {{if}}")),
            }
        }
    }

    fn parse_pipeline(&mut self) -> Result<Pipeline, TemplateError> {
        let declaration = match (self.peek(), self.peek_at(1)) {
            (Some(Token::Variable(name)), Some(Token::Declare)) => Some(Declaration {
                variable: name.clone(),
                define: true,
            }),
            (Some(Token::Variable(name)), Some(Token::Assign)) => Some(Declaration {
                variable: name.clone(),
                define: false,
            }),
            _ => None,
        };
        if declaration.is_some() {
            self.pos += 2;
        }

        let mut commands = vec![self.parse_command()?];
        while let Some(Token::Pipe) = self.peek() {
            self.pos += 1;
            commands.push(self.parse_command()?);
        }

        Ok(Pipeline {
            declaration,
            commands,
        })
    }

    fn parse_command(&mut self) -> Result<Command, TemplateError> {
        let mut operands = Vec::new();

        loop {
            match self.peek() {
                None | Some(Token::ActionEnd) | Some(Token::Pipe) | Some(Token::RightParen) => {
                    break
                }
                _ => operands.push(self.parse_operand()?),
            }
        }

        if operands.is_empty() {
            return Err(TemplateError::syntax("missing command"));
        }
        Ok(Command { operands })
    }

    fn parse_operand(&mut self) -> Result<Operand, TemplateError> {
        let operand = match self.next() {
            Some(Token::String(value)) => Operand::Literal(Value::Text(value)),
            Some(Token::Int(value)) => Operand::Literal(Value::Int(value)),
            Some(Token::Float(value)) => Operand::Literal(Value::Float(value)),
            Some(Token::Field(name)) => Operand::Method(name),
            Some(Token::Variable(name)) => Operand::Variable(name),
            Some(Token::Identifier(name)) => match name.as_str() {
                "true" => Operand::Literal(Value::Bool(true)),
                "false" => Operand::Literal(Value::Bool(false)),
                "nil" => Operand::Literal(Value::Json(serde_json::Value::Null)),
                _ => {
                    let function = functions::lookup(&name)
                        .ok_or_else(|| TemplateError::UnknownFunction(name.clone()))?;
                    Operand::Function { name, function }
                }
            },
            Some(Token::LeftParen) => {
                let pipeline = self.parse_pipeline()?;
                self.expect(Token::RightParen)?;
                Operand::Pipeline(Box::new(pipeline))
            }
            Some(other) => {
                return Err(TemplateError::syntax(format!(
                    "unexpected {:?} in operand",
                    other
                )))
            }
            None => return Err(TemplateError::syntax("unexpected end of template")),
        };
        Ok(operand)
    }
}
