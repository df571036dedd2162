//! Query analyzer module

mod completion;
mod context;
pub mod extract;
mod suggest;
mod validator;

use crate::error::{DocumentQueryResult, ValidationResult};
use crate::schema::SchemaRegistry;
use crate::version::SchemaVersion;

pub use completion::{
    Completer, CompletionItem, CompletionItemKind, CompletionResult, KEYWORDS, OPERATORS,
    STATUS_VALUES,
};
pub use context::{classify, QueryContext};
pub use suggest::{levenshtein_distance, suggest};
pub use validator::QueryValidator;

/// Query analyzer - validates and completes queries against a schema registry
///
/// Holds no per-call state: every method takes the schema version
/// explicitly, so one analyzer can serve many threads.
#[derive(Debug, Clone, Copy)]
pub struct Analyzer<'a> {
    registry: &'a SchemaRegistry,
}

impl<'a> Analyzer<'a> {
    pub fn new(registry: &'a SchemaRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    /// Validate a single query
    pub fn validate_query(&self, query: &str, version: SchemaVersion) -> ValidationResult {
        let mut validator = QueryValidator::new(self.registry, version);
        validator.validate(query);
        let errors = validator.into_errors();

        tracing::debug!(%version, errors = errors.len(), "validated query");
        ValidationResult::from_errors(errors)
    }

    /// Validate every backtick-delimited query embedded in `document`
    pub fn validate_text(&self, document: &str, version: SchemaVersion) -> Vec<DocumentQueryResult> {
        extract::find_embedded_queries(document)
            .into_iter()
            .map(|embedded| {
                let offset = embedded.body.start;
                let query = &document[embedded.body];
                DocumentQueryResult {
                    query: query.to_string(),
                    start_line: embedded.start_line,
                    offset,
                    result: self.validate_query(query, version),
                }
            })
            .collect()
    }

    /// Completion suggestions for the cursor at byte offset `cursor`
    pub fn complete(&self, text: &str, cursor: usize, version: SchemaVersion) -> CompletionResult {
        Completer::new(self.registry, version).complete(text, cursor)
    }
}
