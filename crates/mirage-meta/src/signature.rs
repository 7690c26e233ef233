//! Tag body parsers for `@method`, `@property-read` and `@var`
//!
//! Uses a logos lexer over the tag body. Type expressions are returned as
//! raw text; resolving them is done by [`DataType::parse`](crate::DataType::parse)
//! once the scope of the declaring class is known.

use logos::Logos;
use thiserror::Error;

/// Error produced by the tag body parsers
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// A parameter declares a default value
    #[error("parameter ${parameter} of {method}() declares a default value")]
    DefaultValue {
        /// Method name
        method: String,
        /// Parameter name
        parameter: String,
    },

    /// The body does not follow the expected shape
    #[error("{0}")]
    Invalid(String),
}

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum SigToken {
    #[token("static")]
    Static,

    #[regex(r"\\?[a-zA-Z_][a-zA-Z0-9_]*(\\[a-zA-Z_][a-zA-Z0-9_]*)*")]
    Name,

    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_]*")]
    Variable,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token("=")]
    Equals,

    #[token("|")]
    Pipe,

    #[token("?")]
    Question,

    #[token("&")]
    Ampersand,

    #[token("...")]
    Ellipsis,

    #[token("[]")]
    ArraySuffix,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("=>")]
    Arrow,

    #[regex(r"-?[0-9]+(\.[0-9]+)?")]
    Number,

    #[regex(r#""([^"\\]|\\.)*""#)]
    #[regex(r"'([^'\\]|\\.)*'")]
    Str,
}

impl SigToken {
    fn starts_type(&self) -> bool {
        matches!(self, SigToken::Static | SigToken::Name | SigToken::Question)
    }

    fn is_type_part(&self) -> bool {
        matches!(
            self,
            SigToken::Static
                | SigToken::Name
                | SigToken::Pipe
                | SigToken::Question
                | SigToken::ArraySuffix
        )
    }
}

/// Parsed `@method` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    /// Method name
    pub name: String,
    /// Whether the method is declared `static`
    pub is_static: bool,
    /// Raw return type, `None` when none is declared
    pub return_type: Option<String>,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterSignature>,
}

/// Parsed method parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterSignature {
    /// Parameter name without `$`
    pub name: String,
    /// Raw type, `None` when untyped
    pub type_expr: Option<String>,
}

/// Parsed `@property-read` body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySignature {
    /// Property name without `$`
    pub name: String,
    /// Raw type, `None` when untyped
    pub type_expr: Option<String>,
}

type Lexed<'s> = (SigToken, &'s str);

/// Parse the body of a `@method` tag.
///
/// Shape: `[static] [ReturnType] name([Type] $param, ...) [description]`.
/// Anything after the closing parenthesis is ignored.
pub fn parse_method(body: &str) -> Result<MethodSignature, SignatureError> {
    let mut lexer = SigToken::lexer(body);
    let mut head: Vec<Lexed<'_>> = Vec::new();
    let mut params: Vec<Lexed<'_>> = Vec::new();
    let mut depth = 0usize;
    let mut closed = false;
    let mut lex_failed = false;

    while let Some(token) = lexer.next() {
        let Ok(token) = token else {
            lex_failed = true;
            break;
        };
        let slice = lexer.slice();

        if depth == 0 {
            if token == SigToken::LParen {
                depth = 1;
            } else {
                head.push((token, slice));
            }
            continue;
        }

        match token {
            SigToken::LParen => depth += 1,
            SigToken::RParen => {
                depth -= 1;
                if depth == 0 {
                    closed = true;
                    break;
                }
            }
            _ => {}
        }
        params.push((token, slice));
    }

    let (name, prefix) = match head.split_last() {
        Some(((SigToken::Name, name), prefix)) => (name.to_string(), prefix),
        _ => {
            return Err(SignatureError::Invalid(format!(
                "expected a method name followed by `(` in \"{}\"",
                body
            )))
        }
    };

    // A default value is reported even when its literal trips the lexer.
    if let Some(parameter) = default_value_parameter(&params) {
        return Err(SignatureError::DefaultValue {
            method: name,
            parameter,
        });
    }
    if lex_failed {
        return Err(SignatureError::Invalid(format!(
            "unexpected character in \"{}\"",
            body
        )));
    }
    if !closed {
        return Err(SignatureError::Invalid(format!(
            "missing `)` in declaration of {}()",
            name
        )));
    }

    // `static` is the modifier only when a type follows it; otherwise it
    // starts the return type (`static`, `static|null`, `static[]`).
    let (is_static, return_type) = match prefix {
        [] => (false, None),
        [(SigToken::Static, _), rest @ ..]
            if matches!(rest.first(), Some((next, _)) if next.starts_type()) =>
        {
            (true, Some(type_text(rest, &name)?))
        }
        rest => (false, Some(type_text(rest, &name)?)),
    };

    let mut parameters = Vec::new();
    if !params.is_empty() {
        for segment in params.split(|(token, _)| *token == SigToken::Comma) {
            parameters.push(parse_parameter(segment, &name)?);
        }
    }

    Ok(MethodSignature {
        name,
        is_static,
        return_type,
        parameters,
    })
}

/// Parse the body of a `@property-read` tag: `[Type] $name [description]`.
pub fn parse_property_read(body: &str) -> Result<PropertySignature, SignatureError> {
    let mut lexer = SigToken::lexer(body);
    let mut type_tokens: Vec<Lexed<'_>> = Vec::new();

    while let Some(token) = lexer.next() {
        match token {
            Ok(SigToken::Variable) => {
                let type_expr = if type_tokens.is_empty() {
                    None
                } else {
                    Some(type_text(&type_tokens, "property")?)
                };
                return Ok(PropertySignature {
                    name: lexer.slice()[1..].to_string(),
                    type_expr,
                });
            }
            Ok(token) if token.is_type_part() => type_tokens.push((token, lexer.slice())),
            _ => break,
        }
    }

    Err(SignatureError::Invalid(format!(
        "expected `[Type] $name` in \"{}\"",
        body
    )))
}

/// Type named by a `@var` body, `None` when the body is empty.
pub fn parse_var(body: &str) -> Option<&str> {
    body.split_whitespace().next().filter(|word| !word.starts_with('$'))
}

fn parse_parameter(segment: &[Lexed<'_>], method: &str) -> Result<ParameterSignature, SignatureError> {
    if segment.iter().any(|(token, _)| *token == SigToken::Ellipsis) {
        return Err(SignatureError::Invalid(format!(
            "variadic parameters are not supported in {}()",
            method
        )));
    }

    let tokens: Vec<Lexed<'_>> = segment
        .iter()
        .filter(|(token, _)| *token != SigToken::Ampersand)
        .cloned()
        .collect();

    match tokens.split_last() {
        Some(((SigToken::Variable, variable), type_tokens)) => {
            let type_expr = if type_tokens.is_empty() {
                None
            } else {
                Some(type_text(type_tokens, method)?)
            };
            Ok(ParameterSignature {
                name: variable[1..].to_string(),
                type_expr,
            })
        }
        _ => Err(SignatureError::Invalid(format!(
            "malformed parameter list in {}()",
            method
        ))),
    }
}

fn default_value_parameter(params: &[Lexed<'_>]) -> Option<String> {
    let mut last_variable = None;
    for (token, slice) in params {
        match token {
            SigToken::Variable => last_variable = Some(&slice[1..]),
            SigToken::Equals => return Some(last_variable.unwrap_or_default().to_string()),
            _ => {}
        }
    }
    None
}

fn type_text(tokens: &[Lexed<'_>], context: &str) -> Result<String, SignatureError> {
    let mut text = String::new();
    for (token, slice) in tokens {
        if !token.is_type_part() {
            return Err(SignatureError::Invalid(format!(
                "unexpected `{}` in type of {}",
                slice, context
            )));
        }
        text.push_str(slice);
    }
    Ok(text)
}
