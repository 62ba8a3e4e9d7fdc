//! Lexer for template sources
//!
//! Text outside actions is split off by the scanner; the inside of each
//! action is tokenized with logos. The result is a single token stream where
//! actions are bracketed by [`TemplateToken::Open`] and
//! [`TemplateToken::Close`].

use logos::Logos;

use crate::error::{Span, TemplateSyntaxError};
use crate::value::Value;

use super::scanner::{scan, Segment};
use super::DelimiterPair;

/// A `$name` reference, optionally followed by a field chain
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    /// Including the `$`; `$` alone is the root data
    pub name: String,
    pub fields: Vec<String>,
}

fn field_chain(s: &str) -> Vec<String> {
    s.split('.')
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn var_ref(s: &str) -> VarRef {
    match s.split_once('.') {
        Some((name, rest)) => VarRef {
            name: name.to_string(),
            fields: field_chain(rest),
        },
        None => VarRef {
            name: s.to_string(),
            fields: Vec::new(),
        },
    }
}

/// Read `digits` characters in `radix` as one code point
fn code_point(chars: &mut std::str::Chars<'_>, digits: usize, radix: u32) -> Option<u32> {
    let mut n = 0u32;
    for _ in 0..digits {
        n = n.checked_mul(radix)?.checked_add(chars.next()?.to_digit(radix)?)?;
    }
    Some(n)
}

/// Resolve the escapes of an interpreted string literal
///
/// Byte escapes (`\x..` and octal) must stay in the ASCII range since
/// strings are UTF-8.
fn unescape(quoted: &str) -> Option<String> {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'a' => '\u{07}',
            'b' => '\u{08}',
            'f' => '\u{0C}',
            'v' => '\u{0B}',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            'x' => char::from_u32(code_point(&mut chars, 2, 16)?).filter(char::is_ascii)?,
            'u' => char::from_u32(code_point(&mut chars, 4, 16)?)?,
            'U' => char::from_u32(code_point(&mut chars, 8, 16)?)?,
            d @ '0'..='7' => {
                let rest = code_point(&mut chars, 2, 8)?;
                char::from_u32(d.to_digit(8)? * 64 + rest).filter(char::is_ascii)?
            }
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

/// An integer literal; values above `i64::MAX` are unsigned
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IntLiteral {
    Signed(i64),
    Unsigned(u64),
}

fn int_literal(s: &str) -> Option<IntLiteral> {
    match s.parse::<i64>() {
        Ok(n) => Some(IntLiteral::Signed(n)),
        Err(_) => s.parse::<u64>().ok().map(IntLiteral::Unsigned),
    }
}

impl From<IntLiteral> for Value {
    fn from(lit: IntLiteral) -> Self {
        match lit {
            IntLiteral::Signed(n) => Value::Int(n),
            IntLiteral::Unsigned(n) => Value::UInt(n),
        }
    }
}

impl std::fmt::Display for IntLiteral {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IntLiteral::Signed(n) => write!(f, "{}", n),
            IntLiteral::Unsigned(n) => write!(f, "{}", n),
        }
    }
}

/// Tokens inside an action
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Keywords
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("end")]
    End,
    #[token("range")]
    Range,
    #[token("with")]
    With,
    #[token("nil")]
    Nil,
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),

    // Operators and punctuation
    #[token(":=")]
    Declare,
    #[token("=")]
    Assign,
    #[token("|")]
    Pipe,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,

    /// `.A.B` evaluated against dot
    #[regex(r"(\.[a-zA-Z_][a-zA-Z0-9_]*)+", |lex| field_chain(lex.slice()))]
    Field(Vec<String>),

    #[regex(r"\$[a-zA-Z0-9_]*(\.[a-zA-Z_][a-zA-Z0-9_]*)*", |lex| var_ref(lex.slice()))]
    Variable(VarRef),

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r"-?[0-9]+", |lex| int_literal(lex.slice()))]
    Int(IntLiteral),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][-+]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"-?[0-9]+[eE][-+]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"`[^`]*`", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    String(String),

    /// Only valid as the whole contents of an action
    #[regex(r"/\*([^*]|\*[^/])*\*/")]
    Comment,
}

/// Token of the whole template: raw text, action brackets, action tokens
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateToken {
    Text(String),
    Open,
    Close,
    Action(Token),
}

/// Lex action contents, offsetting spans to positions in the full source
pub fn lex_action(body: &str, offset: usize) -> Result<Vec<(Token, Span)>, TemplateSyntaxError> {
    Token::lexer(body)
        .spanned()
        .map(|(tok, raw)| {
            let span = raw.start + offset..raw.end + offset;
            match tok {
                Ok(tok) => Ok((tok, span)),
                Err(()) => Err(TemplateSyntaxError::new(
                    span,
                    format!("unexpected {:?} in action", &body[raw]),
                )),
            }
        })
        .collect()
}

/// Lex a full template source with the given delimiters
pub fn lex(
    source: &str,
    delimiters: &DelimiterPair,
) -> Result<Vec<(TemplateToken, Span)>, TemplateSyntaxError> {
    let mut tokens = Vec::new();
    for segment in scan(source, delimiters)? {
        match segment {
            Segment::Text { text, span } => tokens.push((TemplateToken::Text(text), span)),
            Segment::Action { open, body, close } => {
                let offset = body.start;
                let action = lex_action(&source[body], offset)?;
                match action.as_slice() {
                    [] => {
                        return Err(TemplateSyntaxError::new(
                            open.start..close.end,
                            "missing value for command",
                        ))
                    }
                    [(Token::Comment, _)] => continue,
                    _ => {}
                }
                if let Some((_, span)) = action.iter().find(|(tok, _)| *tok == Token::Comment) {
                    return Err(TemplateSyntaxError::new(
                        span.clone(),
                        "comment must be the only content of an action",
                    ));
                }
                tokens.push((TemplateToken::Open, open));
                tokens.extend(action.into_iter().map(|(tok, span)| (TemplateToken::Action(tok), span)));
                tokens.push((TemplateToken::Close, close));
            }
        }
    }
    Ok(tokens)
}
