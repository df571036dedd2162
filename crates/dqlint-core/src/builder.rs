//! Fluent query construction

use crate::analyzer::Analyzer;
use crate::error::ValidationResult;
use crate::version::SchemaVersion;

/// Sort direction for ORDER BY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Asc => write!(f, "ASC"),
            Order::Desc => write!(f, "DESC"),
        }
    }
}

/// Builds query text clause by clause
///
/// Repeated `where_clause` calls are joined with AND; repeated `order_by`
/// calls are listed in call order.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    fields: Vec<String>,
    resource: Option<String>,
    conditions: Vec<String>,
    ordering: Vec<(String, Order)>,
    limit: Option<usize>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn from(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn where_clause(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn order_by(mut self, field: impl Into<String>, order: Order) -> Self {
        self.ordering.push((field.into(), order));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Render the query; empty clauses are omitted
    pub fn build(&self) -> String {
        let mut clauses = Vec::new();

        if !self.fields.is_empty() {
            clauses.push(format!("SELECT {}", self.fields.join(", ")));
        }
        if let Some(resource) = &self.resource {
            clauses.push(format!("FROM {}", resource));
        }
        if !self.conditions.is_empty() {
            clauses.push(format!("WHERE {}", self.conditions.join(" AND ")));
        }
        if !self.ordering.is_empty() {
            let ordering: Vec<String> = self
                .ordering
                .iter()
                .map(|(field, order)| format!("{} {}", field, order))
                .collect();
            clauses.push(format!("ORDER BY {}", ordering.join(", ")));
        }
        if let Some(limit) = self.limit {
            clauses.push(format!("LIMIT {}", limit));
        }

        clauses.join(" ")
    }

    pub fn validate(&self, analyzer: &Analyzer<'_>, version: SchemaVersion) -> ValidationResult {
        analyzer.validate_query(&self.build(), version)
    }

    /// The rendered query if it validates, otherwise the validation result
    pub fn build_validated(
        &self,
        analyzer: &Analyzer<'_>,
        version: SchemaVersion,
    ) -> Result<String, ValidationResult> {
        let query = self.build();
        let result = analyzer.validate_query(&query, version);
        if result.valid {
            Ok(query)
        } else {
            Err(result)
        }
    }
}
