use crate::error::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String),
    ActionStart,
    ActionEnd,
    Identifier(String),
    Field(String),
    Variable(String),
    String(String),
    Int(i64),
    Float(f64),
    Pipe,
    LeftParen,
    RightParen,
    Declare,
    Assign,
}

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";

pub fn tokenize(source: &str) -> Result<Vec<Token>, TemplateError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut trim_next_text = false;

    loop {
        let pos = match rest.find(LEFT_DELIM) {
            Some(pos) => pos,
            None => {
                let text = if trim_next_text { rest.trim_start() } else { rest };
                if !text.is_empty() {
                    tokens.push(Token::Text(text.to_string()));
                }
                return Ok(tokens);
            }
        };

        let after = &rest[pos + LEFT_DELIM.len()..];
        let left_trim = after.starts_with('-')
            && after[1..].starts_with(|c: char| c.is_ascii_whitespace());

        let mut text = &rest[..pos];
        if trim_next_text {
            text = text.trim_start();
        }
        if left_trim {
            text = text.trim_end();
        }
        if !text.is_empty() {
            tokens.push(Token::Text(text.to_string()));
        }

        let body_start = if left_trim { &after[1..] } else { after };
        let (body, right_trim, remaining) = split_action(body_start)?;
        let body = body.trim();

        if body.starts_with("/*") {
            if !body.ends_with("*/") {
                return Err(TemplateError::syntax("unclosed comment"));
            }
        } else {
            tokens.push(Token::ActionStart);
            lex_action(body, &mut tokens)?;
            tokens.push(Token::ActionEnd);
        }

        trim_next_text = right_trim;
        rest = remaining;
    }
}

/// Returns the action body, whether it ends with a trim marker, and the remaining source.
fn split_action(source: &str) -> Result<(&str, bool, &str), TemplateError> {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, c) in source.char_indices() {
        if let Some(open) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' && open == '"' {
                escaped = true;
            } else if c == open {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '`' => quote = Some(c),
            '}' if source[idx..].starts_with(RIGHT_DELIM) => {
                let body = &source[..idx];
                let remaining = &source[idx + RIGHT_DELIM.len()..];
                let right_trim = body.ends_with('-')
                    && body[..body.len() - 1].ends_with(|c: char| c.is_ascii_whitespace());
                if right_trim {
                    return Ok((&body[..body.len() - 1], true, remaining));
                }
                return Ok((body, false, remaining));
            }
            _ => {}
        }
    }

    Err(TemplateError::syntax("unclosed action"))
}

fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn lex_action(body: &str, tokens: &mut Vec<Token>) -> Result<(), TemplateError> {
    let chars: Vec<char> = body.chars().collect();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        match c {
            c if c.is_whitespace() => pos += 1,
            '|' => {
                tokens.push(Token::Pipe);
                pos += 1;
            }
            '(' => {
                tokens.push(Token::LeftParen);
                pos += 1;
            }
            ')' => {
                tokens.push(Token::RightParen);
                pos += 1;
            }
            ':' if chars.get(pos + 1) == Some(&'=') => {
                tokens.push(Token::Declare);
                pos += 2;
            }
            '=' => {
                tokens.push(Token::Assign);
                pos += 1;
            }
            '"' => {
                let mut value = String::new();
                pos += 1;
                loop {
                    match chars.get(pos) {
                        Some('"') => break,
                        Some('\\') => {
                            let escaped = match chars.get(pos + 1) {
                                Some('n') => '\n',
                                Some('t') => '\t',
                                Some('r') => '\r',
                                Some('\\') => '\\',
                                Some('"') => '"',
                                Some(other) => {
                                    return Err(TemplateError::syntax(format!(
                                        "unknown escape sequence \\{}",
                                        other
                                    )))
                                }
                                None => return Err(TemplateError::syntax("unterminated string")),
                            };
                            value.push(escaped);
                            pos += 2;
                        }
                        Some(other) => {
                            value.push(*other);
                            pos += 1;
                        }
                        None => return Err(TemplateError::syntax("unterminated string")),
                    }
                }
                tokens.push(Token::String(value));
                pos += 1;
            }
            '`' => {
                let start = pos + 1;
                let end = chars[start..]
                    .iter()
                    .position(|c| *c == '`')
                    .map(|offset| start + offset)
                    .ok_or_else(|| TemplateError::syntax("unterminated raw string"))?;
                tokens.push(Token::String(chars[start..end].iter().collect()));
                pos = end + 1;
            }
            '.' => {
                let start = pos + 1;
                let mut end = start;
                while end < chars.len() && is_identifier_char(chars[end]) {
                    end += 1;
                }
                if end == start {
                    return Err(TemplateError::syntax("bare \".\" is not supported"));
                }
                tokens.push(Token::Field(chars[start..end].iter().collect()));
                pos = end;
            }
            '$' => {
                let start = pos + 1;
                let mut end = start;
                while end < chars.len() && is_identifier_char(chars[end]) {
                    end += 1;
                }
                tokens.push(Token::Variable(chars[start..end].iter().collect()));
                pos = end;
            }
            c if c.is_ascii_digit()
                || ((c == '-' || c == '+')
                    && chars.get(pos + 1).map_or(false, |next| next.is_ascii_digit())) =>
            {
                let start = pos;
                let mut end = pos + 1;
                while end < chars.len() {
                    let current = chars[end];
                    let exponent_sign =
                        (current == '-' || current == '+') && matches!(chars[end - 1], 'e' | 'E');
                    if current.is_ascii_digit()
                        || current == '.'
                        || current == 'e'
                        || current == 'E'
                        || exponent_sign
                    {
                        end += 1;
                    } else {
                        break;
                    }
                }
                let literal: String = chars[start..end].iter().collect();
                if literal.contains(|c: char| c == '.' || c == 'e' || c == 'E') {
                    let value = literal.parse::<f64>().map_err(|_| {
                        TemplateError::syntax(format!("bad number syntax: {}", literal))
                    })?;
                    tokens.push(Token::Float(value));
                } else {
                    let value = literal.parse::<i64>().map_err(|_| {
                        TemplateError::syntax(format!("bad number syntax: {}", literal))
                    })?;
                    tokens.push(Token::Int(value));
                }
                pos = end;
            }
            c if c.is_alphabetic() || c == '_' => {
                let start = pos;
                let mut end = pos;
                while end < chars.len() && is_identifier_char(chars[end]) {
                    end += 1;
                }
                tokens.push(Token::Identifier(chars[start..end].iter().collect()));
                pos = end;
            }
            other => {
                return Err(TemplateError::syntax(format!(
                    "unexpected \"{}\" in action",
                    other
                )))
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_action() {
        let tokens = tokenize("hello {{ .Name | upper }}!").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("hello ".to_string()),
                Token::ActionStart,
                Token::Field("Name".to_string()),
                Token::Pipe,
                Token::Identifier("upper".to_string()),
                Token::ActionEnd,
                Token::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_trim_markers() {
        let tokens = tokenize("a  \n{{- 1 -}}\n  b").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("a".to_string()),
                Token::ActionStart,
                Token::Int(1),
                Token::ActionEnd,
                Token::Text("b".to_string()),
            ]
        );
    }

    #[test]
    fn test_negative_number_is_not_trim_marker() {
        let tokens = tokenize("{{-1}}").unwrap();
        assert_eq!(
            tokens,
            vec![Token::ActionStart, Token::Int(-1), Token::ActionEnd]
        );
    }

    #[test]
    fn test_strings_may_contain_delimiters() {
        let tokens = tokenize(r#"{{ "}}" }}{{ `raw\n` }}"#).unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::ActionStart,
                Token::String("}}".to_string()),
                Token::ActionEnd,
                Token::ActionStart,
                Token::String("raw\\n".to_string()),
                Token::ActionEnd,
            ]
        );
    }

    #[test]
    fn test_variables_and_declaration() {
        let tokens = tokenize("{{ $x := 1.5 }}").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::ActionStart,
                Token::Variable("x".to_string()),
                Token::Declare,
                Token::Float(1.5),
                Token::ActionEnd,
            ]
        );
    }

    #[test]
    fn test_comment_is_skipped() {
        let tokens = tokenize("a{{/* note */}}b").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Text("a".to_string()), Token::Text("b".to_string())]
        );
    }

    #[test]
    fn test_unclosed_action() {
        assert!(tokenize("{{ .Name").is_err());
    }
}
