//! Context-aware completion
//!
//! Keywords, operators and status values are fixed lists; resources and
//! fields come from the registry. Dotted field paths complete one segment
//! at a time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::analyzer::context::{classify, QueryContext};
use crate::analyzer::extract::resource_after_from;
use crate::error::floor_char_boundary;
use crate::schema::{FieldDefinition, SchemaRegistry};
use crate::version::SchemaVersion;

pub const KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "ORDER BY", "ASC", "DESC", "LIMIT",
];

pub const OPERATORS: &[&str] = &[
    "=",
    "!=",
    ">",
    ">=",
    "<",
    "<=",
    "IN",
    "NOT IN",
    "LIKE",
    "NOT LIKE",
    "CONTAINS ANY",
    "CONTAINS ALL",
    "CONTAINS NONE",
    "IS NULL",
    "IS NOT NULL",
    "DURING",
    "BETWEEN",
    "REGEXP_MATCH",
    "NOT REGEXP_MATCH",
];

/// Offered in value position whatever the field; values are not schema-derived
pub const STATUS_VALUES: &[&str] = &["'ENABLED'", "'PAUSED'", "'REMOVED'"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionItemKind {
    Keyword,
    Resource,
    Field,
    Operator,
    Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl CompletionItem {
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            description: None,
            documentation: None,
        }
    }

    fn field(label: impl Into<String>, field: &FieldDefinition, leaf: bool) -> Self {
        Self {
            label: label.into(),
            kind: CompletionItemKind::Field,
            description: Some(field.kind.as_str().to_string()),
            documentation: if leaf {
                field.documentation.clone()
            } else {
                None
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub context: QueryContext,
    pub suggestions: Vec<CompletionItem>,
    /// Resource named by the first `FROM <identifier>` in the text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Dotted path typed just before the cursor, for field contexts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
}

/// Completion engine over a registry
pub struct Completer<'a> {
    registry: &'a SchemaRegistry,
    version: SchemaVersion,
}

impl<'a> Completer<'a> {
    pub fn new(registry: &'a SchemaRegistry, version: SchemaVersion) -> Self {
        Self { registry, version }
    }

    /// Suggestions for the cursor at byte offset `cursor` in `text`
    pub fn complete(&self, text: &str, cursor: usize) -> CompletionResult {
        let cursor = floor_char_boundary(text, cursor);
        let context = classify(text, cursor);
        let resource = resource_after_from(text).map(|range| text[range].to_string());

        let mut prefix = None;
        let suggestions = match context {
            QueryContext::Keyword => fixed(KEYWORDS, CompletionItemKind::Keyword),
            QueryContext::Operator => fixed(OPERATORS, CompletionItemKind::Operator),
            QueryContext::WhereValue => fixed(STATUS_VALUES, CompletionItemKind::Value),
            QueryContext::FromClause => self
                .registry
                .resource_names(self.version)
                .into_iter()
                .map(|name| CompletionItem::new(name, CompletionItemKind::Resource))
                .collect(),
            QueryContext::SelectFields | QueryContext::WhereField => {
                let path = typed_path(text, cursor);
                prefix = Some(path.to_string());
                match &resource {
                    Some(resource) => self.field_items(resource, path),
                    None => Vec::new(),
                }
            }
        };

        tracing::debug!(
            %context,
            resource = resource.as_deref().unwrap_or(""),
            count = suggestions.len(),
            "completion"
        );

        CompletionResult {
            context,
            suggestions,
            resource,
            prefix,
        }
    }

    fn field_items(&self, resource: &str, path: &str) -> Vec<CompletionItem> {
        let Some((scope, _)) = path.rsplit_once('.') else {
            return self
                .registry
                .fields_for_resource(resource, self.version)
                .iter()
                .map(|field| CompletionItem::field(&field.qualified_name, field, true))
                .collect();
        };

        // Keyed by next segment; the first field reaching a segment wins
        let mut segments: IndexMap<String, CompletionItem> = IndexMap::new();
        for field in self.registry.fields_for_prefix(resource, scope, self.version) {
            if !field.qualified_name.starts_with(path) {
                continue;
            }
            let Some(rest) = field.qualified_name.get(scope.len() + 1..) else {
                continue;
            };
            let (segment, leaf) = match rest.split_once('.') {
                Some((segment, _)) => (segment, false),
                None => (rest, true),
            };
            if segment.is_empty() {
                continue;
            }
            segments
                .entry(segment.to_string())
                .or_insert_with(|| CompletionItem::field(segment, &field, leaf));
        }
        segments.into_values().collect()
    }
}

fn fixed(labels: &[&str], kind: CompletionItemKind) -> Vec<CompletionItem> {
    labels
        .iter()
        .map(|label| CompletionItem::new(*label, kind))
        .collect()
}

/// The run of identifier characters and dots ending at `cursor`
fn typed_path(text: &str, cursor: usize) -> &str {
    let bytes = text.as_bytes();
    let mut start = cursor;
    while start > 0 {
        let b = bytes[start - 1];
        if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
            start -= 1;
        } else {
            break;
        }
    }
    &text[start..cursor]
}
