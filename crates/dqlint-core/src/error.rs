//! Error and validation result types

use std::path::PathBuf;
use std::sync::Arc;

use miette::SourceSpan;
use serde::{Deserialize, Serialize};

use crate::version::SchemaVersion;

/// Source location span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset from start of the query text
    pub offset: usize,
    /// Length in bytes
    pub length: usize,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed, in characters)
    pub column: usize,
}

impl Span {
    /// Create a span at `offset`, computing line and column from `source`
    pub fn locate(source: &str, offset: usize, length: usize) -> Self {
        let offset = floor_char_boundary(source, offset);
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        Self {
            offset,
            length,
            line,
            column,
        }
    }

    /// Span covering the start of a query
    pub fn start(length: usize) -> Self {
        Self {
            offset: 0,
            length,
            line: 1,
            column: 1,
        }
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        SourceSpan::new(span.offset.into(), span.length)
    }
}

/// Largest char boundary in `text` that is `<= offset`
pub(crate) fn floor_char_boundary(text: &str, offset: usize) -> usize {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}

/// Kinds of validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationErrorKind {
    /// Q0001: No SELECT keyword
    MissingSelect,
    /// Q0002: No FROM keyword
    MissingFrom,
    /// Q0003: FROM is not followed by a resource name
    InvalidSyntax,
    /// Q0004: Resource not in the catalog
    InvalidResource,
    /// Q0005: Field not available on the resource
    InvalidField,
    /// Q0006: Reserved for operator checks, never produced by the validator yet
    InvalidOperator,
}

impl ValidationErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationErrorKind::MissingSelect => "Q0001",
            ValidationErrorKind::MissingFrom => "Q0002",
            ValidationErrorKind::InvalidSyntax => "Q0003",
            ValidationErrorKind::InvalidResource => "Q0004",
            ValidationErrorKind::InvalidField => "Q0005",
            ValidationErrorKind::InvalidOperator => "Q0006",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValidationErrorKind::MissingSelect => "missing-select",
            ValidationErrorKind::MissingFrom => "missing-from",
            ValidationErrorKind::InvalidSyntax => "invalid-syntax",
            ValidationErrorKind::InvalidResource => "invalid-resource",
            ValidationErrorKind::InvalidField => "invalid-field",
            ValidationErrorKind::InvalidOperator => "invalid-operator",
        }
    }
}

impl std::fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            ValidationErrorKind::MissingSelect => "MISSING_SELECT",
            ValidationErrorKind::MissingFrom => "MISSING_FROM",
            ValidationErrorKind::InvalidSyntax => "INVALID_SYNTAX",
            ValidationErrorKind::InvalidResource => "INVALID_RESOURCE",
            ValidationErrorKind::InvalidField => "INVALID_FIELD",
            ValidationErrorKind::InvalidOperator => "INVALID_OPERATOR",
        };
        f.write_str(tag)
    }
}

/// A located problem found in one query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            field: None,
            resource: None,
            suggestion: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: Option<String>) -> Self {
        self.suggestion = suggestion;
        self
    }

    /// Get the error code string (e.g., "Q0005")
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    pub fn column(&self) -> usize {
        self.span.column
    }

    pub fn length(&self) -> usize {
        self.span.length
    }

    /// "Did you mean" hint, if a suggestion is available
    pub fn help(&self) -> Option<String> {
        self.suggestion
            .as_ref()
            .map(|s| format!("Did you mean '{}'?", s))
    }
}

/// Outcome of validating one query
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Validation outcome for a query found inside a larger document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentQueryResult {
    /// Query body between the delimiters
    pub query: String,
    /// Line of the opening delimiter (0-indexed)
    pub start_line: usize,
    /// Byte offset of the body in the document
    pub offset: usize,
    #[serde(flatten)]
    pub result: ValidationResult,
}

/// Failures loading a schema artifact
///
/// Cloneable so a failed load can be cached and reported again.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("failed to read schema artifact {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },

    #[error("schema artifact for {version} is not valid JSON")]
    Json {
        version: SchemaVersion,
        #[source]
        source: Arc<serde_json::Error>,
    },

    #[error("schema artifact for {version} is malformed: {reason}")]
    InvalidArtifact {
        version: SchemaVersion,
        reason: String,
    },

    #[error("no schema artifact registered for {0}")]
    UnregisteredVersion(SchemaVersion),
}
