//! Cursor context classification
//!
//! The text before the cursor is trimmed and run through a fixed, ordered
//! list of trailing-pattern checks; the first match wins. The checks
//! overlap, so their order is part of the behaviour.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analyzer::extract::find_keyword;
use crate::error::floor_char_boundary;

/// What kind of token the cursor is positioned to receive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryContext {
    Keyword,
    SelectFields,
    FromClause,
    WhereField,
    WhereValue,
    Operator,
}

impl QueryContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryContext::Keyword => "keyword",
            QueryContext::SelectFields => "select_fields",
            QueryContext::FromClause => "from_clause",
            QueryContext::WhereField => "where_field",
            QueryContext::WhereValue => "where_value",
            QueryContext::Operator => "operator",
        }
    }
}

impl std::fmt::Display for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// `regex` matches in linear time; every pattern is anchored at the end.
static WHERE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bWHERE\s+[\w.]*$").expect("valid WHERE pattern"));

static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*$").expect("valid comma pattern"));

static FROM_RESOURCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bFROM\s+\w*$").expect("valid FROM pattern"));

static OPERATOR_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:!=|<>|<=|>=|[=<>]|\b(?:NOT\s+)?(?:IN|LIKE|REGEXP_MATCH)\b|\bCONTAINS\s+(?:ANY|ALL|NONE)\b|\b(?:BETWEEN|DURING)\b)\s*[('"]?[\w.\-]*$"#,
    )
    .expect("valid operator pattern")
});

static FIELD_THEN_PARTIAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bWHERE\s+[A-Za-z_]\w*\.[\w.]+\s+\S*$").expect("valid operator-position pattern")
});

/// Classify the cursor position `cursor` (a byte offset) within `text`.
///
/// Offsets past the end are clamped; offsets inside a UTF-8 sequence move
/// back to the previous character boundary.
pub fn classify(text: &str, cursor: usize) -> QueryContext {
    let cursor = floor_char_boundary(text, cursor);
    let before = text[..cursor].trim();

    let context = if WHERE_FIELD.is_match(before) {
        QueryContext::WhereField
    } else if TRAILING_COMMA.is_match(before) {
        QueryContext::SelectFields
    } else if FROM_RESOURCE.is_match(before) {
        QueryContext::FromClause
    } else if OPERATOR_VALUE.is_match(before) {
        QueryContext::WhereValue
    } else if FIELD_THEN_PARTIAL.is_match(before) {
        QueryContext::Operator
    } else if select_without_from(before) {
        QueryContext::SelectFields
    } else {
        QueryContext::Keyword
    };

    tracing::trace!(cursor, %context, "classified cursor context");
    context
}

fn select_without_from(text: &str) -> bool {
    match find_keyword(text, "SELECT", 0) {
        Some(select) => find_keyword(text, "FROM", select.end).is_none(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_end(text: &str) -> QueryContext {
        classify(text, text.len())
    }

    #[test]
    fn test_empty_text_is_keyword() {
        assert_eq!(classify("", 0), QueryContext::Keyword);
    }

    #[test]
    fn test_where_with_partial_field() {
        assert_eq!(
            at_end("SELECT campaign.id FROM campaign WHERE camp"),
            QueryContext::WhereField
        );
        assert_eq!(
            at_end("SELECT campaign.id FROM campaign WHERE campaign.st"),
            QueryContext::WhereField
        );
    }

    #[test]
    fn test_where_with_only_trailing_space_falls_through() {
        // Trimming removes the space, so no partial token follows WHERE
        assert_eq!(
            at_end("SELECT campaign.id FROM campaign WHERE "),
            QueryContext::Keyword
        );
    }

    #[test]
    fn test_trailing_comma_is_select_fields() {
        assert_eq!(at_end("SELECT campaign.id,"), QueryContext::SelectFields);
        assert_eq!(at_end("SELECT campaign.id,   "), QueryContext::SelectFields);
    }

    #[test]
    fn test_from_with_partial_resource() {
        assert_eq!(
            at_end("SELECT campaign.id FROM camp"),
            QueryContext::FromClause
        );
    }

    #[test]
    fn test_from_with_only_trailing_space_falls_through() {
        assert_eq!(at_end("SELECT campaign.id FROM "), QueryContext::Keyword);
        assert_eq!(at_end("FROM "), QueryContext::Keyword);
    }

    #[test]
    fn test_operator_then_value() {
        let base = "SELECT campaign.id FROM campaign WHERE campaign.status";
        assert_eq!(at_end(&format!("{} =", base)), QueryContext::WhereValue);
        assert_eq!(at_end(&format!("{} = 'ENA", base)), QueryContext::WhereValue);
        assert_eq!(at_end(&format!("{} IN (", base)), QueryContext::WhereValue);
        assert_eq!(at_end(&format!("{} NOT LIKE", base)), QueryContext::WhereValue);
        assert_eq!(
            at_end(&format!("{} CONTAINS ANY", base)),
            QueryContext::WhereValue
        );
    }

    #[test]
    fn test_partial_operator_after_field() {
        let base = "SELECT campaign.id FROM campaign WHERE campaign.status";
        assert_eq!(at_end(&format!("{} I", base)), QueryContext::Operator);
        assert_eq!(at_end(&format!("{} NOT", base)), QueryContext::Operator);
        assert_eq!(at_end(&format!("{} INSIDE", base)), QueryContext::Operator);
    }

    #[test]
    fn test_select_without_from() {
        assert_eq!(at_end("SELECT campaign.id"), QueryContext::SelectFields);
        assert_eq!(at_end("SELECT "), QueryContext::SelectFields);
    }

    #[test]
    fn test_complete_query_is_keyword() {
        assert_eq!(
            at_end("SELECT campaign.id FROM campaign WHERE campaign.id = 1 LIMIT 5 "),
            QueryContext::Keyword
        );
        // A value right after an operator still reads as a value being typed
        assert_eq!(
            at_end("SELECT campaign.id FROM campaign WHERE campaign.id = 1 "),
            QueryContext::WhereValue
        );
    }

    #[test]
    fn test_only_text_before_cursor_counts() {
        let text = "SELECT campaign.id FROM campaign";
        assert_eq!(classify(text, 18), QueryContext::SelectFields);
        assert_eq!(classify(text, text.len()), QueryContext::FromClause);
    }

    #[test]
    fn test_out_of_range_cursor_is_clamped() {
        assert_eq!(
            classify("SELECT campaign.id FROM camp", 10_000),
            QueryContext::FromClause
        );
        assert_eq!(classify("SELECT é", 8), QueryContext::SelectFields);
    }
}
