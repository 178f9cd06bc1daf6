//! Error types for building and parsing filter and sort expressions.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for syntax operations.
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Errors raised while constructing or parsing filter and sort expressions.
#[derive(Error, Debug, Diagnostic)]
pub enum SyntaxError {
    /// A required argument was absent.
    #[error("`{argument}` must not be null")]
    #[diagnostic(code(strainer::syntax::invalid_argument))]
    InvalidArgument { argument: String },

    /// An argument was present but outside its accepted range.
    #[error("`{argument}` is out of range: {message}")]
    #[diagnostic(code(strainer::syntax::out_of_range))]
    OutOfRange { argument: String, message: String },

    /// Malformed filter text.
    #[error("invalid filter syntax: {message}")]
    #[diagnostic(code(strainer::syntax::parse_error))]
    ParseError {
        #[source_code]
        src: String,
        #[label("here")]
        span: miette::SourceSpan,
        message: String,
    },

    /// One or more sort sub-expressions do not match the sort grammar.
    #[error("{}", invalid_sort_message(.expressions, .pattern))]
    #[diagnostic(
        code(strainer::syntax::invalid_sort),
        help("use comma separated field names, each optionally prefixed by `+` or `-`")
    )]
    InvalidSort {
        expressions: Vec<String>,
        pattern: String,
    },

    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(strainer::syntax::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(strainer::syntax::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },
}

impl SyntaxError {
    /// Create an invalid-argument error.
    pub fn invalid_argument(argument: impl Into<String>) -> Self {
        Self::InvalidArgument {
            argument: argument.into(),
        }
    }

    /// Create an out-of-range error.
    pub fn out_of_range(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OutOfRange {
            argument: argument.into(),
            message: message.into(),
        }
    }

    /// Create a parse error with source location.
    pub fn parse(
        src: impl Into<String>,
        offset: usize,
        len: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::ParseError {
            src: src.into(),
            span: (offset, len).into(),
            message: message.into(),
        }
    }

    /// Short machine-friendly name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::OutOfRange { .. } => "out_of_range",
            Self::ParseError { .. } => "parse_error",
            Self::InvalidSort { .. } => "invalid_sort",
            Self::IoError { .. } => "io_error",
            Self::TomlError { .. } => "toml_error",
        }
    }
}

fn invalid_sort_message(expressions: &[String], pattern: &str) -> String {
    let plural = expressions.len() > 1;
    let quoted = expressions
        .iter()
        .map(|e| format!("\"{e}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Sort expression{} {quoted} do{} not match \"{pattern}\".",
        if plural { "s" } else { "" },
        if plural { "" } else { "es" },
    )
}
