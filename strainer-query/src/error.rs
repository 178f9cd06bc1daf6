//! Error types for compiling filters and sorts against a type.
//!
//! Every error carries an [`ErrorCode`] for programmatic handling, a
//! message and optional context (the type and field involved, suggestions,
//! help text).
//!
//! # Error Codes
//!
//! Codes follow the pattern `S{category}{number}`:
//! - 1xxx: input errors (missing argument, value out of range, syntax)
//! - 2xxx: errors resolving a filter against a type
//! - 9xxx: internal errors
//!
//! ```rust
//! use strainer_query::{ErrorCode, QueryError};
//!
//! let err = QueryError::member_resolution("SuperHero", "Age");
//! assert_eq!(err.code, ErrorCode::MemberResolution);
//! assert_eq!(err.code.code(), "S2001");
//! assert!(err.to_string().contains("Age"));
//! ```

use std::fmt;

use strainer_syntax::SyntaxError;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Input errors (1xxx)
    /// A required argument was absent (S1001).
    InvalidArgument = 1001,
    /// An argument was outside its accepted range (S1002).
    OutOfRange = 1002,
    /// Malformed filter or sort string (S1003).
    Parse = 1003,

    // Resolution errors (2xxx)
    /// A path segment names no member of the type (S2001).
    MemberResolution = 2001,
    /// A value or operator does not fit the member's type (S2002).
    TypeMismatch = 2002,

    // Internal errors (9xxx)
    /// Internal error (S9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "S1001").
    pub fn code(&self) -> String {
        format!("S{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidArgument => "Invalid argument",
            Self::OutOfRange => "Argument out of range",
            Self::Parse => "Invalid syntax",
            Self::MemberResolution => "Unknown member",
            Self::TypeMismatch => "Type mismatch",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The type the filter was compiled against.
    pub type_name: Option<String>,
    /// The field path involved.
    pub field: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors raised while compiling filters and sorts.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Set the type name.
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.context.type_name = Some(type_name.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(suggestion.into());
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// A required argument was absent.
    pub fn invalid_argument(argument: impl Into<String>) -> Self {
        let argument = argument.into();
        Self::new(
            ErrorCode::InvalidArgument,
            format!("`{argument}` must not be null"),
        )
    }

    /// An argument was outside its accepted range.
    pub fn out_of_range(argument: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::OutOfRange,
            format!("`{}` is out of range: {}", argument.into(), message.into()),
        )
    }

    /// A path segment does not name a member of the type.
    pub fn member_resolution(type_name: impl Into<String>, segment: impl Into<String>) -> Self {
        let type_name = type_name.into();
        let segment = segment.into();
        Self::new(
            ErrorCode::MemberResolution,
            format!("`{type_name}` has no member named `{segment}`"),
        )
        .with_type(type_name)
        .with_field(segment)
    }

    /// A value or operator does not fit a member's type.
    pub fn type_mismatch(field: impl Into<String>, message: impl Into<String>) -> Self {
        let field = field.into();
        Self::new(
            ErrorCode::TypeMismatch,
            format!("`{field}`: {}", message.into()),
        )
        .with_field(field)
    }

    /// Internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Get the error code.
    pub fn error_code(&self) -> &ErrorCode {
        &self.code
    }

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = format!("Error [{}]: {}\n", self.code.code(), self.message);

        if let Some(ref type_name) = self.context.type_name {
            output.push_str(&format!("  → Type: {type_name}\n"));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {field}\n"));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {suggestion}\n", i + 1));
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {help}\n"));
        }

        output
    }
}

impl From<SyntaxError> for QueryError {
    fn from(err: SyntaxError) -> Self {
        let code = match &err {
            SyntaxError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            SyntaxError::OutOfRange { .. } => ErrorCode::OutOfRange,
            SyntaxError::ParseError { .. } | SyntaxError::InvalidSort { .. } => ErrorCode::Parse,
            SyntaxError::IoError { .. } | SyntaxError::TomlError { .. } => ErrorCode::Internal,
        };
        Self::new(code, err.to_string()).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = QueryError::type_mismatch("Height", "`tall` is not an integer");
        assert_eq!(err.to_string(), "[S2002] `Height`: `tall` is not an integer");
        assert_eq!(err.context.field.as_deref(), Some("Height"));
    }

    #[test]
    fn test_from_syntax_error() {
        let err: QueryError = SyntaxError::out_of_range("text", "must not be empty").into();
        assert_eq!(err.code, ErrorCode::OutOfRange);
        assert!(err.source.is_some());

        let err: QueryError = SyntaxError::invalid_argument("text").into();
        assert_eq!(err.code, ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_display_full() {
        let err = QueryError::member_resolution("SuperHero", "Age")
            .with_suggestion("did you mean `Height`?");
        let full = err.display_full();
        assert!(full.contains("Error [S2001]"));
        assert!(full.contains("→ Type: SuperHero"));
        assert!(full.contains("1. did you mean `Height`?"));
    }
}
