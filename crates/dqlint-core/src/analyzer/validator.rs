//! Query validator - checks clause structure, the resource and field references

use std::collections::HashSet;
use std::ops::Range;

use crate::analyzer::extract::{
    clause_range, contains_keyword, find_keyword, identifier_after, mask_interpolations,
    scan_dotted_identifiers, split_top_level, MaskedText, PLACEHOLDER,
};
use crate::analyzer::suggest::suggest;
use crate::error::{Span, ValidationError, ValidationErrorKind};
use crate::schema::SchemaRegistry;
use crate::version::SchemaVersion;

/// Keywords that end a WHERE clause
const WHERE_TERMINATORS: &[&str] = &["ORDER BY", "LIMIT"];

/// Validator for a single query against one schema version
pub struct QueryValidator<'a> {
    registry: &'a SchemaRegistry,
    version: SchemaVersion,
    /// Collected errors, in discovery order
    errors: Vec<ValidationError>,
}

/// Field names known for the resource being validated
struct FieldSet {
    resource: String,
    known: HashSet<String>,
    /// Qualified names in flattened order, for suggestions
    candidates: Vec<String>,
}

impl<'a> QueryValidator<'a> {
    pub fn new(registry: &'a SchemaRegistry, version: SchemaVersion) -> Self {
        Self {
            registry,
            version,
            errors: Vec::new(),
        }
    }

    /// Validate `query`, collecting errors internally.
    ///
    /// Missing FROM, an unparseable resource and an unknown resource each
    /// end the pass; field errors accumulate.
    pub fn validate(&mut self, query: &str) {
        let masked = mask_interpolations(query);
        let cleaned = masked.text.as_str();

        if !contains_keyword(cleaned, "SELECT") {
            self.errors.push(ValidationError::new(
                ValidationErrorKind::MissingSelect,
                "Query is missing a SELECT clause",
                Span::start(cleaned.len()),
            ));
        }

        let Some(from) = find_keyword(cleaned, "FROM", 0) else {
            self.errors.push(ValidationError::new(
                ValidationErrorKind::MissingFrom,
                "Query is missing a FROM clause",
                Span::start(cleaned.len()),
            ));
            return;
        };

        let Some(resource_range) = identifier_after(cleaned, from.end) else {
            let span = locate(query, &masked, from);
            self.errors.push(ValidationError::new(
                ValidationErrorKind::InvalidSyntax,
                "Expected a resource name after FROM",
                span,
            ));
            return;
        };

        let resource = &cleaned[resource_range.clone()];
        let Some(fields) = self.field_set(resource) else {
            // Report the name as written, interpolations included
            let span = locate(query, &masked, resource_range);
            let written = query
                .get(span.offset..span.offset + span.length)
                .unwrap_or(resource);
            let suggestion = if resource.contains(PLACEHOLDER) {
                None
            } else {
                suggest(resource, self.registry.resource_names(self.version))
            };
            self.errors.push(
                ValidationError::new(
                    ValidationErrorKind::InvalidResource,
                    format!("Unknown resource '{}'", written),
                    span,
                )
                .with_field(written)
                .with_suggestion(suggestion),
            );
            return;
        };

        if let Some(select) = clause_range(cleaned, "SELECT", &["FROM"]) {
            for (offset, item) in split_top_level(&cleaned[select.clone()]) {
                let start = select.start + offset;
                self.check_field(query, &masked, &fields, item, start..start + item.len(), false);
            }
        }

        if let Some(clause) = clause_range(cleaned, "WHERE", WHERE_TERMINATORS) {
            for (offset, ident) in scan_dotted_identifiers(&cleaned[clause.clone()]) {
                let start = clause.start + offset;
                self.check_field(query, &masked, &fields, ident, start..start + ident.len(), true);
            }
        }
    }

    fn field_set(&self, resource: &str) -> Option<FieldSet> {
        if !self.registry.has_resource(resource, self.version) {
            return None;
        }
        let candidates: Vec<String> = self
            .registry
            .fields_for_resource(resource, self.version)
            .into_iter()
            .map(|field| field.qualified_name)
            .collect();
        Some(FieldSet {
            resource: resource.to_string(),
            known: candidates.iter().cloned().collect(),
            candidates,
        })
    }

    fn check_field(
        &mut self,
        query: &str,
        masked: &MaskedText,
        fields: &FieldSet,
        name: &str,
        range: Range<usize>,
        in_where: bool,
    ) {
        if name.contains(PLACEHOLDER) || fields.known.contains(name) {
            return;
        }

        let message = if in_where {
            format!(
                "Field '{}' is not available on resource '{}' in the WHERE clause",
                name, fields.resource
            )
        } else {
            format!(
                "Field '{}' is not available on resource '{}'",
                name, fields.resource
            )
        };

        self.errors.push(
            ValidationError::new(
                ValidationErrorKind::InvalidField,
                message,
                locate(query, masked, range),
            )
            .with_field(name)
            .with_resource(&fields.resource)
            .with_suggestion(suggest(name, &fields.candidates)),
        );
    }

    /// Consume the validator and return collected errors
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

/// Span in the original query for a range of the masked text
fn locate(query: &str, masked: &MaskedText, range: Range<usize>) -> Span {
    let start = masked.to_original(range.start);
    let end = masked.to_original(range.end).max(start);
    Span::locate(query, start, end - start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new().with_json(
            SchemaVersion::V21,
            r#"{
                "campaign": {
                    "fields": { "campaign": { "id": null, "name": null, "status": null } },
                    "metrics": { "clicks": null },
                    "segments": { "date": null }
                }
            }"#,
        )
    }

    fn validate(query: &str) -> Vec<ValidationError> {
        let registry = registry();
        let mut validator = QueryValidator::new(&registry, SchemaVersion::V21);
        validator.validate(query);
        validator.into_errors()
    }

    #[test]
    fn test_valid_query() {
        let errors = validate(
            "SELECT campaign.id, metrics.clicks FROM campaign WHERE segments.date DURING LAST_7_DAYS ORDER BY metrics.clicks DESC LIMIT 10",
        );
        assert!(errors.is_empty(), "Expected no errors: {:?}", errors);
    }

    #[test]
    fn test_all_invalid_fields_reported() {
        let errors = validate("SELECT campaign.nme, campaign.budget FROM campaign WHERE campaign.stat = 'x'");
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_deref().unwrap()).collect();
        assert_eq!(fields, vec!["campaign.nme", "campaign.budget", "campaign.stat"]);
        assert_eq!(errors[0].suggestion.as_deref(), Some("campaign.name"));
        assert!(errors[2].message.contains("WHERE"));
    }

    #[test]
    fn test_invalid_syntax_after_from() {
        let errors = validate("SELECT campaign.id FROM 123");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidSyntax);
        assert_eq!(errors[0].span.column, 20);
        assert_eq!(errors[0].span.length, 4);
    }

    #[test]
    fn test_field_position_accounts_for_interpolation() {
        let query = "SELECT ${extra}, campaign.nope FROM campaign";
        let errors = validate(query);
        assert_eq!(errors.len(), 1);
        let span = errors[0].span;
        assert_eq!(&query[span.offset..span.offset + span.length], "campaign.nope");
        assert_eq!(span.column, 18);
    }

    #[test]
    fn test_interpolated_resource_reported_as_written() {
        let query = "SELECT campaign.id FROM campaign${suffix}";
        let errors = validate(query);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Unknown resource 'campaign${suffix}'");
        assert_eq!(errors[0].field.as_deref(), Some("campaign${suffix}"));
        assert_eq!(errors[0].suggestion, None);
        let span = errors[0].span;
        assert_eq!(&query[span.offset..span.offset + span.length], "campaign${suffix}");
    }

    #[test]
    fn test_quoted_where_values_are_not_fields() {
        let errors = validate("SELECT campaign.id FROM campaign WHERE campaign.name = 'shop.example'");
        assert!(errors.is_empty(), "Expected no errors: {:?}", errors);
    }

    #[test]
    fn test_where_field_position_on_later_line() {
        let query = "SELECT campaign.id\nFROM campaign\nWHERE  metrics.clicks > 1 AND campaign.bogus = 2";
        let errors = validate(query);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].span.line, 3);
        assert_eq!(errors[0].span.column, 31);
        assert_eq!(errors[0].span.length, "campaign.bogus".len());
    }
}
