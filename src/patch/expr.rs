//! Expression language for edit transforms.
//!
//! Expressions are tiny, trusted and side-effect free. `value` names the
//! current value of the edited key (null when the key is absent); an
//! expression that evaluates to null deletes the key.
//!
//! ```text
//! expr     := primary ("or" primary)*
//! primary  := "value" | "delete" | "null" | "None" | "true" | "false"
//!           | string | integer | real
//!           | "[" [expr ("," expr)* [","]] "]"
//!           | "{" [string ":" expr ("," string ":" expr)* [","]] "}"
//!           | function "(" expr ")"
//!           | "(" expr ")"
//! function := "list" | "bool" | "argv" | "int" | "str" | "env"
//! ```
//!
//! Every function propagates a null argument as null.

use crate::argv::program_arguments;
use crate::document::{NativeNode, Node};
use crate::list::{normalize, Normalized};
use crate::patch::edit::{Outcome, Transform};
use crate::patch::errors::{EvalError, ExprError};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// A parsed expression, ready to evaluate against any number of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    root: Expr,
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Value,
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Array(Vec<Expr>),
    Dictionary(Vec<(String, Expr)>),
    Call(Function, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Function {
    List,
    Bool,
    Argv,
    Int,
    Str,
    Env,
}

impl Function {
    fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "list" => Function::List,
            "bool" => Function::Bool,
            "argv" => Function::Argv,
            "int" => Function::Int,
            "str" => Function::Str,
            "env" => Function::Env,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Function::List => "list",
            Function::Bool => "bool",
            Function::Argv => "argv",
            Function::Int => "int",
            Function::Str => "str",
            Function::Env => "env",
        }
    }
}

impl Expression {
    pub fn parse(input: &str) -> Result<Self, ExprError> {
        let tokens = tokenize(input)?;
        let mut parser = Parser {
            input,
            tokens,
            pos: 0,
        };
        let root = parser.expr()?;
        if let Some((offset, token)) = parser.tokens.get(parser.pos) {
            return Err(parser.error_at(*offset, format!("unexpected {token}")));
        }
        Ok(Self {
            source: input.to_string(),
            root,
        })
    }

    /// The expression every unpaired key gets: remove the key.
    pub fn delete() -> Self {
        Self {
            source: "delete".to_string(),
            root: Expr::Null,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against `current`; `None` means null.
    pub fn evaluate(&self, current: Option<NativeNode>) -> Result<Option<NativeNode>, EvalError> {
        eval(&self.root, &current)
    }
}

impl Transform for Expression {
    fn apply(&self, current: Option<NativeNode>) -> Result<Outcome, EvalError> {
        self.evaluate(current).map(Outcome::from)
    }
}

impl FromStr for Expression {
    type Err = ExprError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn eval(expr: &Expr, current: &Option<NativeNode>) -> Result<Option<NativeNode>, EvalError> {
    Ok(match expr {
        Expr::Value => current.clone(),
        Expr::Null => None,
        Expr::Text(text) => Some(Node::Text(OsString::from(text))),
        Expr::Integer(n) => Some(Node::from(*n)),
        Expr::Real(r) => Some(Node::Real(*r)),
        Expr::Boolean(b) => Some(Node::Boolean(*b)),
        Expr::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(eval(item, current)?.ok_or(EvalError::NullInContainer("array"))?);
            }
            Some(Node::Array(out))
        }
        Expr::Dictionary(entries) => {
            let mut out = BTreeMap::new();
            for (key, item) in entries {
                let item = eval(item, current)?.ok_or(EvalError::NullInContainer("dictionary"))?;
                out.insert(OsString::from(key), item);
            }
            Some(Node::Dictionary(out))
        }
        Expr::Or(left, right) => match eval(left, current)? {
            Some(node) => Some(node),
            None => eval(right, current)?,
        },
        Expr::Call(function, arg) => match eval(arg, current)? {
            Some(arg) => call(*function, arg)?,
            None => None,
        },
    })
}

fn call(function: Function, arg: NativeNode) -> Result<Option<NativeNode>, EvalError> {
    match function {
        Function::List => {
            let raw = match arg {
                Node::Text(raw) => raw,
                other => return Err(mismatch(function, "text", &other)),
            };
            Ok(normalize(utf8(function, &raw)?).map(|normalized| match normalized {
                Normalized::One(token) => Node::Text(token.into()),
                Normalized::Many(tokens) => Node::Array(
                    tokens
                        .into_iter()
                        .map(|token| Node::Text(token.into()))
                        .collect(),
                ),
            }))
        }
        Function::Bool => {
            let truth = match arg {
                Node::Boolean(b) => b,
                Node::Integer(n) => n.as_signed().map_or(true, |n| n != 0),
                Node::Text(raw) => parse_truth(utf8(function, &raw)?)?,
                other => return Err(mismatch(function, "text, boolean or integer", &other)),
            };
            Ok(Some(Node::Boolean(truth)))
        }
        Function::Argv => {
            let path = match arg {
                Node::Text(path) => path,
                other => return Err(mismatch(function, "text", &other)),
            };
            let argv = program_arguments(Path::new(&path))?;
            Ok(Some(Node::Array(
                argv.into_iter().map(|a| Node::Text(a.into())).collect(),
            )))
        }
        Function::Int => {
            let n = match arg {
                Node::Integer(n) => return Ok(Some(Node::Integer(n))),
                Node::Boolean(b) => i64::from(b),
                Node::Real(r) => real_to_integer(r)?,
                Node::Text(raw) => {
                    let text = utf8(function, &raw)?;
                    text.trim()
                        .parse::<i64>()
                        .map_err(|_| EvalError::InvalidInteger(text.to_string()))?
                }
                other => {
                    return Err(mismatch(function, "text, integer, real or boolean", &other))
                }
            };
            Ok(Some(Node::from(n)))
        }
        Function::Str => {
            let text = match arg {
                Node::Text(raw) => return Ok(Some(Node::Text(raw))),
                Node::Integer(n) => integer_text(&n),
                Node::Real(r) => r.to_string(),
                Node::Boolean(b) => b.to_string(),
                other => {
                    return Err(mismatch(function, "text, integer, real or boolean", &other))
                }
            };
            Ok(Some(Node::Text(text.into())))
        }
        Function::Env => {
            let name = match arg {
                Node::Text(name) => name,
                other => return Err(mismatch(function, "text", &other)),
            };
            Ok(lookup_env(&name).map(Node::Text))
        }
    }
}

fn lookup_env(name: &OsStr) -> Option<OsString> {
    if name.is_empty() {
        return None;
    }
    std::env::var_os(name)
}

fn utf8(function: Function, raw: &OsStr) -> Result<&str, EvalError> {
    raw.to_str().ok_or(EvalError::NonUnicodeText {
        function: function.name(),
    })
}

fn mismatch(function: Function, expected: &'static str, found: &NativeNode) -> EvalError {
    EvalError::TypeMismatch {
        function: function.name(),
        expected,
        found: found.kind(),
    }
}

fn integer_text(n: &plist::Integer) -> String {
    match (n.as_signed(), n.as_unsigned()) {
        (Some(signed), _) => signed.to_string(),
        (None, Some(unsigned)) => unsigned.to_string(),
        (None, None) => String::new(),
    }
}

/// Truncate toward zero; NaN, infinities and reals outside `i64` are errors.
fn real_to_integer(r: f64) -> Result<i64, EvalError> {
    let truncated = r.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Ok(truncated as i64)
    } else {
        Err(EvalError::InvalidInteger(r.to_string()))
    }
}

/// strtobool-style truth values.
fn parse_truth(text: &str) -> Result<bool, EvalError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(EvalError::InvalidBoolean(text.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Text(String),
    Integer(i64),
    Real(f64),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Text(text) => write!(f, "string {text:?}"),
            Token::Integer(n) => write!(f, "integer {n}"),
            Token::Real(r) => write!(f, "real {r}"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::LBrace => f.write_str("'{'"),
            Token::RBrace => f.write_str("'}'"),
            Token::Comma => f.write_str("','"),
            Token::Colon => f.write_str("':'"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<(usize, Token)>, ExprError> {
    let error = |position: usize, message: &str| ExprError::Parse {
        input: input.to_string(),
        position,
        message: message.to_string(),
    };

    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some(&(start, ch)) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let punct = match ch {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            ',' => Some(Token::Comma),
            ':' => Some(Token::Colon),
            _ => None,
        };
        if let Some(token) = punct {
            chars.next();
            tokens.push((start, token));
            continue;
        }

        if ch == '"' || ch == '\'' {
            chars.next();
            let mut text = String::new();
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                if c == ch {
                    closed = true;
                    break;
                }
                if c != '\\' {
                    text.push(c);
                    continue;
                }
                match chars.next() {
                    Some((_, 'n')) => text.push('\n'),
                    Some((_, 't')) => text.push('\t'),
                    Some((_, 'r')) => text.push('\r'),
                    Some((_, c @ ('\\' | '"' | '\''))) => text.push(c),
                    Some((_, other)) => {
                        text.push('\\');
                        text.push(other);
                    }
                    None => break,
                }
            }
            if !closed {
                return Err(error(start, "unterminated string"));
            }
            tokens.push((start, Token::Text(text)));
            continue;
        }

        if ch.is_ascii_digit() || ch == '-' {
            let mut end = start;
            let mut is_real = false;
            while let Some(&(i, c)) = chars.peek() {
                let sign_ok = (c == '-' || c == '+')
                    && (i == start || input[..i].ends_with(['e', 'E']));
                if c.is_ascii_digit() || sign_ok {
                    end = i + c.len_utf8();
                } else if c == '.' || c == 'e' || c == 'E' {
                    is_real = true;
                    end = i + c.len_utf8();
                } else {
                    break;
                }
                chars.next();
            }
            let literal = &input[start..end];
            let token = if is_real {
                literal.parse::<f64>().map(Token::Real).ok()
            } else {
                literal.parse::<i64>().map(Token::Integer).ok()
            };
            match token {
                Some(token) => tokens.push((start, token)),
                None => return Err(error(start, &format!("invalid number '{literal}'"))),
            }
            continue;
        }

        if ch.is_alphabetic() || ch == '_' {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if !(c.is_alphanumeric() || c == '_') {
                    break;
                }
                end = i + c.len_utf8();
                chars.next();
            }
            tokens.push((start, Token::Ident(input[start..end].to_string())));
            continue;
        }

        return Err(error(start, &format!("unexpected character '{ch}'")));
    }

    Ok(tokens)
}

struct Parser<'a> {
    input: &'a str,
    tokens: Vec<(usize, Token)>,
    pos: usize,
}

impl Parser<'_> {
    fn error_at(&self, position: usize, message: String) -> ExprError {
        ExprError::Parse {
            input: self.input.to_string(),
            position,
            message,
        }
    }

    fn end_error(&self) -> ExprError {
        self.error_at(self.input.len(), "unexpected end of expression".to_string())
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(_, token)| token)
    }

    fn next(&mut self) -> Option<(usize, Token)> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), ExprError> {
        match self.next() {
            Some((_, token)) if token == expected => Ok(()),
            Some((offset, token)) => {
                Err(self.error_at(offset, format!("expected {expected}, found {token}")))
            }
            None => Err(self.end_error()),
        }
    }

    fn expr(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.primary()?;
        while matches!(self.peek(), Some(Token::Ident(word)) if word == "or") {
            self.pos += 1;
            let right = self.primary()?;
            left = Expr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn primary(&mut self) -> Result<Expr, ExprError> {
        let (offset, token) = self.next().ok_or_else(|| self.end_error())?;
        match token {
            Token::Ident(name) => {
                if self.peek() == Some(&Token::LParen) {
                    return self.call(name);
                }
                match name.as_str() {
                    "value" => Ok(Expr::Value),
                    "delete" | "null" | "None" => Ok(Expr::Null),
                    "true" | "True" => Ok(Expr::Boolean(true)),
                    "false" | "False" => Ok(Expr::Boolean(false)),
                    "or" => Err(self.error_at(offset, "unexpected 'or'".to_string())),
                    _ => Err(ExprError::UnknownIdentifier(name)),
                }
            }
            Token::Text(text) => Ok(Expr::Text(text)),
            Token::Integer(n) => Ok(Expr::Integer(n)),
            Token::Real(r) => Ok(Expr::Real(r)),
            Token::LParen => {
                let inner = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => {
                let items = self.sequence(Token::RBracket, Self::expr)?;
                Ok(Expr::Array(items))
            }
            Token::LBrace => {
                let entries = self.sequence(Token::RBrace, |parser| {
                    let key = match parser.next() {
                        Some((_, Token::Text(key))) => key,
                        Some((offset, token)) => {
                            return Err(parser.error_at(
                                offset,
                                format!("dictionary keys must be strings, found {token}"),
                            ))
                        }
                        None => return Err(parser.end_error()),
                    };
                    parser.expect(Token::Colon)?;
                    Ok((key, parser.expr()?))
                })?;
                Ok(Expr::Dictionary(entries))
            }
            other => Err(self.error_at(offset, format!("unexpected {other}"))),
        }
    }

    fn call(&mut self, name: String) -> Result<Expr, ExprError> {
        let function = Function::lookup(&name).ok_or(ExprError::UnknownFunction(name))?;
        self.expect(Token::LParen)?;
        let mut args = self.sequence(Token::RParen, Self::expr)?;
        if args.len() != 1 {
            return Err(ExprError::Arity {
                function: function.name(),
                expected: 1,
                found: args.len(),
            });
        }
        let arg = args.remove(0);
        Ok(Expr::Call(function, Box::new(arg)))
    }

    /// Comma-separated items up to `close`; a trailing comma is allowed.
    fn sequence<T>(
        &mut self,
        close: Token,
        mut item: impl FnMut(&mut Self) -> Result<T, ExprError>,
    ) -> Result<Vec<T>, ExprError> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&close) {
                self.pos += 1;
                return Ok(items);
            }
            items.push(item(self)?);
            match self.next() {
                Some((_, token)) if token == close => return Ok(items),
                Some((_, Token::Comma)) => continue,
                Some((offset, token)) => {
                    let message = format!("expected ',' or {close}, found {token}");
                    return Err(self.error_at(offset, message));
                }
                None => return Err(self.end_error()),
            }
        }
    }
}
