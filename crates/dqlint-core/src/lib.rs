//! dqlint-core: DQL query analysis library
//!
//! This library validates reporting queries against versioned resource
//! catalogs and offers cursor-aware completion, without a network
//! connection or a grammar parser.

pub mod analyzer;
pub mod builder;
pub mod error;
pub mod schema;
pub mod version;

pub use analyzer::{Analyzer, CompletionItem, CompletionItemKind, CompletionResult, QueryContext};
pub use builder::{Order, QueryBuilder};
pub use error::{
    DocumentQueryResult, SchemaError, Span, ValidationError, ValidationErrorKind, ValidationResult,
};
pub use schema::{FieldDefinition, FieldKind, ResourceInfo, SchemaRegistry};
pub use version::SchemaVersion;
