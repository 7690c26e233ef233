//! Example expressions
//!
//! Fields may carry an `@example` tag whose body produces a default value
//! for fixture builders. Only a restricted literal grammar is accepted:
//!
//! ```text
//! null | true | false
//! 42 | -7 | 3.14 | 1e3
//! 'single' | "double"
//! [a, b] | array(a, b) | ['key' => value, ...]
//! new ClassName() | new ClassName
//! ClassName::class
//! ```
//!
//! An optional trailing `;` is accepted. Class names are resolved against
//! the scope of the class declaring the field.

use std::collections::BTreeMap;

use logos::Logos;
use mirage_sdk::{Reflector, Value};

use crate::error::ExampleError;
use crate::types::TypeScope;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum ExToken {
    #[token("null", ignore(ascii_case))]
    Null,

    #[token("true", ignore(ascii_case))]
    True,

    #[token("false", ignore(ascii_case))]
    False,

    #[token("new", ignore(ascii_case))]
    New,

    #[token("array", ignore(ascii_case))]
    Array,

    #[regex(r"\\?[a-zA-Z_][a-zA-Z0-9_]*(\\[a-zA-Z_][a-zA-Z0-9_]*)*", |lex| lex.slice().to_string())]
    Name(String),

    #[regex(r"[0-9]+", parse_int)]
    Int(i64),

    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", parse_float)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", parse_float)]
    Float(f64),

    #[regex(r#""([^"\\]|\\.)*""#, parse_double_quoted)]
    #[regex(r"'([^'\\]|\\.)*'", parse_single_quoted)]
    Str(String),

    #[token("-")]
    Minus,

    #[token("::")]
    DoubleColon,

    #[token("=>")]
    Arrow,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token(",")]
    Comma,

    #[token(";")]
    Semicolon,
}

fn parse_int(lex: &mut logos::Lexer<ExToken>) -> Option<i64> {
    lex.slice().parse().ok()
}

fn parse_float(lex: &mut logos::Lexer<ExToken>) -> Option<f64> {
    lex.slice().parse().ok()
}

fn parse_single_quoted(lex: &mut logos::Lexer<ExToken>) -> Option<String> {
    let s = lex.slice();
    let inner = &s[1..s.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&next)) if next == '\\' || next == '\'' => {
                result.push(next);
                chars.next();
            }
            _ => result.push(c),
        }
    }
    Some(result)
}

fn parse_double_quoted(lex: &mut logos::Lexer<ExToken>) -> Option<String> {
    let s = lex.slice();
    let inner = &s[1..s.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('r') => result.push('\r'),
            Some('t') => result.push('\t'),
            Some('0') => result.push('\0'),
            Some(escaped @ ('\\' | '"' | '$')) => result.push(escaped),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }
    Some(result)
}

/// Parsed example expression with class names already resolved
#[derive(Debug, Clone, PartialEq)]
pub enum Example {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Integer literal
    Int(i64),
    /// Float literal
    Float(f64),
    /// String literal
    String(String),
    /// `[a, b]`
    List(Vec<Example>),
    /// `['k' => v]`; unkeyed entries get the next integer key
    Map(Vec<(String, Example)>),
    /// `new ClassName()`
    New(String),
    /// `ClassName::class`
    ClassName(String),
}

impl Example {
    /// Parse an example expression in the scope of the declaring class
    pub fn parse(expression: &str, scope: &TypeScope<'_>) -> Result<Example, ExampleError> {
        let mut tokens = Vec::new();
        let mut lexer = ExToken::lexer(expression);
        while let Some(token) = lexer.next() {
            match token {
                Ok(token) => tokens.push(token),
                Err(()) => {
                    return Err(ExampleError::Syntax {
                        expression: expression.to_string(),
                        message: format!("unexpected `{}`", lexer.slice()),
                    })
                }
            }
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            expression,
            scope,
        };
        let example = parser.parse_expression()?;
        parser.eat(&ExToken::Semicolon);
        if parser.pos < parser.tokens.len() {
            return Err(parser.error("trailing input after expression"));
        }
        Ok(example)
    }

    /// Produce a fresh runtime value
    pub fn evaluate(&self, reflector: &dyn Reflector) -> Result<Value, ExampleError> {
        let value = match self {
            Example::Null => Value::Null,
            Example::Bool(b) => Value::Bool(*b),
            Example::Int(i) => Value::Int(*i),
            Example::Float(x) => Value::Float(*x),
            Example::String(s) => Value::String(s.clone()),
            Example::List(items) => Value::List(
                items
                    .iter()
                    .map(|item| item.evaluate(reflector))
                    .collect::<Result<_, _>>()?,
            ),
            Example::Map(entries) => {
                let mut map = BTreeMap::new();
                for (key, item) in entries {
                    map.insert(key.clone(), item.evaluate(reflector)?);
                }
                Value::Map(map)
            }
            Example::New(class) => Value::Object(reflector.allocate(class)?),
            Example::ClassName(class) => Value::String(class.clone()),
        };
        Ok(value)
    }
}

/// Parse and evaluate an example expression in one step
pub fn evaluate(
    expression: &str,
    scope: &TypeScope<'_>,
    reflector: &dyn Reflector,
) -> Result<Value, ExampleError> {
    Example::parse(expression, scope)?.evaluate(reflector)
}

struct Parser<'a, 's> {
    tokens: Vec<ExToken>,
    pos: usize,
    expression: &'a str,
    scope: &'a TypeScope<'s>,
}

impl<'a, 's> Parser<'a, 's> {
    fn peek(&self) -> Option<&ExToken> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<ExToken> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &ExToken) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: ExToken, what: &str) -> Result<(), ExampleError> {
        if self.eat(&expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected {}", what)))
        }
    }

    fn error(&self, message: &str) -> ExampleError {
        ExampleError::Syntax {
            expression: self.expression.to_string(),
            message: message.to_string(),
        }
    }

    fn parse_expression(&mut self) -> Result<Example, ExampleError> {
        match self.advance() {
            Some(ExToken::Null) => Ok(Example::Null),
            Some(ExToken::True) => Ok(Example::Bool(true)),
            Some(ExToken::False) => Ok(Example::Bool(false)),
            Some(ExToken::Int(i)) => Ok(Example::Int(i)),
            Some(ExToken::Float(x)) => Ok(Example::Float(x)),
            Some(ExToken::Str(s)) => Ok(Example::String(s)),
            Some(ExToken::Minus) => match self.advance() {
                Some(ExToken::Int(i)) => Ok(Example::Int(-i)),
                Some(ExToken::Float(x)) => Ok(Example::Float(-x)),
                _ => Err(self.error("expected a number after `-`")),
            },
            Some(ExToken::LBracket) => self.parse_array(ExToken::RBracket),
            Some(ExToken::Array) => {
                self.expect(ExToken::LParen, "`(` after `array`")?;
                self.parse_array(ExToken::RParen)
            }
            Some(ExToken::New) => self.parse_new(),
            Some(ExToken::Name(name)) => {
                self.expect(ExToken::DoubleColon, "`::class` after class name")?;
                match self.advance() {
                    Some(ExToken::Name(member)) if member.eq_ignore_ascii_case("class") => {
                        Ok(Example::ClassName(self.scope.resolve_class(&name)))
                    }
                    _ => Err(self.error("only `::class` constants are supported")),
                }
            }
            Some(_) => Err(self.error("unsupported expression")),
            None => Err(self.error("empty expression")),
        }
    }

    fn parse_array(&mut self, close: ExToken) -> Result<Example, ExampleError> {
        let mut entries: Vec<(Option<String>, Example)> = Vec::new();

        while !self.eat(&close) {
            let first = self.parse_expression()?;
            if self.eat(&ExToken::Arrow) {
                let key = match first {
                    Example::String(s) => s,
                    Example::Int(i) => i.to_string(),
                    _ => return Err(self.error("array keys must be strings or integers")),
                };
                let value = self.parse_expression()?;
                entries.push((Some(key), value));
            } else {
                entries.push((None, first));
            }

            if !self.eat(&ExToken::Comma) {
                self.expect(close.clone(), "`,` or end of array")?;
                break;
            }
        }

        if entries.iter().all(|(key, _)| key.is_none()) {
            return Ok(Example::List(entries.into_iter().map(|(_, item)| item).collect()));
        }

        // `None` once the largest integer key has been used.
        let mut next_index = Some(0i64);
        let mut map: Vec<(String, Example)> = Vec::with_capacity(entries.len());
        for (key, item) in entries {
            let key = match key {
                Some(key) => {
                    if let Ok(index) = key.parse::<i64>() {
                        next_index = match (next_index, index.checked_add(1)) {
                            (Some(next), Some(after)) => Some(next.max(after)),
                            _ => None,
                        };
                    }
                    key
                }
                None => {
                    let index = next_index.ok_or_else(|| self.error("array index out of range"))?;
                    next_index = index.checked_add(1);
                    index.to_string()
                }
            };
            match map.iter_mut().find(|(existing, _)| *existing == key) {
                Some(entry) => entry.1 = item,
                None => map.push((key, item)),
            }
        }
        Ok(Example::Map(map))
    }

    fn parse_new(&mut self) -> Result<Example, ExampleError> {
        let name = match self.advance() {
            Some(ExToken::Name(name)) => name,
            _ => return Err(self.error("expected a class name after `new`")),
        };
        let class = self.scope.resolve_class(&name);

        if self.eat(&ExToken::LParen) && !self.eat(&ExToken::RParen) {
            return Err(ExampleError::ConstructorArguments { class });
        }
        Ok(Example::New(class))
    }
}
