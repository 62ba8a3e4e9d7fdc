//! Error types for template parsing and rendering

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::numeric::{ArithOp, OperandPosition};
use crate::template::lexer::{TemplateToken, Token};
use crate::value::ValueKind;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A malformed template, reported with the offending source range
#[derive(Error, Debug, Clone, PartialEq)]
#[error("template syntax error at {span:?}: {message}")]
pub struct TemplateSyntaxError {
    pub span: Span,
    pub message: String,
    pub expected: Vec<String>,
}

impl TemplateSyntaxError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            expected: Vec::new(),
        }
    }

    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        let expected_str = if self.expected.is_empty() {
            String::new()
        } else {
            format!("\nExpected: {}", self.expected.join(", "))
        };

        let mut buf = Vec::new();
        let written = Report::build(ReportKind::Error, filename, self.span.start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, self.span.clone()))
                    .with_message(format!("{}{}", self.message, expected_str))
                    .with_color(Color::Red),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl<'a> From<chumsky::error::Rich<'a, TemplateToken>> for TemplateSyntaxError {
    fn from(err: chumsky::error::Rich<'a, TemplateToken>) -> Self {
        use chumsky::error::{RichPattern, RichReason};

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => match found {
                Some(tok) => format!("unexpected {}", format_token(tok)),
                None => "unexpected end of template".to_string(),
            },
            RichReason::Custom(msg) => msg.to_string(),
        };

        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                RichPattern::Token(tok) => Some(format_token(tok)),
                RichPattern::Label(label) => Some(label.to_string()),
                RichPattern::EndOfInput => Some("end of template".to_string()),
                RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                RichPattern::Any => Some("any token".to_string()),
                RichPattern::SomethingElse => None,
            })
            .collect();

        TemplateSyntaxError {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &TemplateToken) -> String {
    match tok {
        TemplateToken::Text(_) => "text".to_string(),
        TemplateToken::Open => "left delimiter".to_string(),
        TemplateToken::Close => "right delimiter".to_string(),
        TemplateToken::Action(tok) => match tok {
            Token::If => "keyword 'if'".to_string(),
            Token::Else => "keyword 'else'".to_string(),
            Token::End => "keyword 'end'".to_string(),
            Token::Range => "keyword 'range'".to_string(),
            Token::With => "keyword 'with'".to_string(),
            Token::Nil => "'nil'".to_string(),
            Token::Bool(b) => format!("'{}'", b),
            Token::Declare => "':='".to_string(),
            Token::Assign => "'='".to_string(),
            Token::Pipe => "'|'".to_string(),
            Token::ParenOpen => "'('".to_string(),
            Token::ParenClose => "')'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Dot => "'.'".to_string(),
            Token::Field(names) => format!("field '.{}'", names.join(".")),
            Token::Variable(var) => format!("variable '{}'", var.name),
            Token::Ident(s) => format!("identifier '{}'", s),
            Token::Int(n) => format!("number {}", n),
            Token::Float(n) => format!("number {}", n),
            Token::String(s) => format!("string {:?}", s),
            Token::Comment => "comment".to_string(),
        },
    }
}

/// Errors that can occur while rendering a template against an inventory
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RenderError {
    /// Lookup of a key absent from the inventory (or a nested mapping)
    #[error("no value found for key: {0}")]
    MissingKey(String),

    /// `getenvRequired` on an unset or empty variable
    #[error("no environment variable value found for key: {0}")]
    MissingEnvironmentVariable(String),

    /// Arithmetic on a value that is not a (suitable) number
    #[error("{op}: unsupported operand of kind {kind} as {position} argument")]
    UnsupportedOperand {
        op: ArithOp,
        kind: ValueKind,
        position: OperandPosition,
    },

    /// Integer division or modulo by zero
    #[error("{0}: integer divide by zero")]
    DivideByZero(ArithOp),

    /// Integer result outside the representable range
    #[error("{0}: integer overflow")]
    ArithmeticOverflow(ArithOp),

    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: ValueKind,
    },

    /// `indentWithSpaces` count above [`crate::functions::MAX_INDENT`]
    #[error("indentWithSpaces: {count} spaces exceeds the limit of {max}")]
    IndentTooWide { count: u64, max: usize },

    /// YAML serialization failure
    #[error("failed to generate yaml: {0}")]
    Serialization(String),

    #[error("wrong number of args for {function}: want {expected} got {found}")]
    WrongArgumentCount {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    TemplateSyntax(#[from] TemplateSyntaxError),
}

impl RenderError {
    /// Create a type mismatch error for a value of the given kind
    pub fn mismatch(expected: &'static str, actual: ValueKind) -> Self {
        Self::TypeMismatch { expected, actual }
    }

    /// Create a syntax error attached to a template source range
    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        Self::TemplateSyntax(TemplateSyntaxError::new(span, message))
    }
}
