//! Output formatting

use dqlint_core::{CompletionResult, FieldDefinition, ResourceInfo, ValidationError};

use crate::args::OutputFormat;

/// Output formatter for validation errors
pub struct OutputFormatter {
    format: OutputFormat,
    file_name: String,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, file_name: String) -> Self {
        Self { format, file_name }
    }

    /// Print errors in the configured format; spans must be relative to `source`
    pub fn print_errors(&self, errors: &[ValidationError], source: &str) {
        match self.format {
            OutputFormat::Human => self.print_human(errors, source),
            OutputFormat::Json => self.print_json(errors),
            OutputFormat::Sarif => self.print_sarif(errors),
        }
    }

    fn print_human(&self, errors: &[ValidationError], source: &str) {
        for error in errors {
            eprintln!("\x1b[31merror\x1b[0m[{}]: {}", error.code(), error.message);

            let (line, col) = (error.line(), error.column());
            eprintln!("  --> {}:{}:{}", self.file_name, line, col);

            if let Some(source_line) = get_source_line(source, line) {
                eprintln!("   |");
                eprintln!("{:>3} | {}", line, source_line);

                let padding = " ".repeat(col.saturating_sub(1));
                let underline = "^".repeat(underline_width(source_line, col, error.length()));
                eprintln!("   | {}{}", padding, underline);
            }

            if let Some(help) = error.help() {
                eprintln!("   = help: {}", help);
            }

            eprintln!();
        }
    }

    fn print_json(&self, errors: &[ValidationError]) {
        let output = serde_json::json!({
            "file": self.file_name,
            "errors": errors
        });
        print_pretty(&output);
    }

    fn print_sarif(&self, errors: &[ValidationError]) {
        let results: Vec<serde_json::Value> = errors
            .iter()
            .map(|e| {
                let mut text = e.message.clone();
                if let Some(help) = e.help() {
                    text = format!("{}. {}", text, help);
                }
                serde_json::json!({
                    "ruleId": e.code(),
                    "level": "error",
                    "message": {
                        "text": text
                    },
                    "locations": [{
                        "physicalLocation": {
                            "artifactLocation": {
                                "uri": self.file_name
                            },
                            "region": {
                                "startLine": e.line(),
                                "startColumn": e.column()
                            }
                        }
                    }]
                })
            })
            .collect();

        let sarif = serde_json::json!({
            "$schema": "https://raw.githubusercontent.com/oasis-tcs/sarif-spec/master/Schemata/sarif-schema-2.1.0.json",
            "version": "2.1.0",
            "runs": [{
                "tool": {
                    "driver": {
                        "name": "dqlint",
                        "version": env!("CARGO_PKG_VERSION")
                    }
                },
                "results": results
            }]
        });

        print_pretty(&sarif);
    }
}

/// Print completion context and items
pub fn print_completion(format: OutputFormat, result: &CompletionResult) {
    if format != OutputFormat::Human {
        print_pretty(&serde_json::to_value(result).unwrap_or_default());
        return;
    }

    println!("context: {}", result.context);
    if let Some(resource) = &result.resource {
        println!("resource: {}", resource);
    }
    if let Some(prefix) = &result.prefix {
        println!("prefix: {:?}", prefix);
    }
    for item in &result.suggestions {
        match &item.description {
            Some(description) => println!("  {:<40} {}", item.label, description),
            None => println!("  {}", item.label),
        }
    }
}

/// Print resource names with their field counts
pub fn print_resources(resources: &[(String, ResourceInfo)]) {
    println!("Resources:");
    println!("==========");
    for (name, info) in resources {
        println!(
            "  {:<28} {:>3} fields  {:>3} metrics  {:>3} segments",
            name, info.field_count, info.metric_count, info.segment_count
        );
    }
}

/// Print every field of one resource
pub fn print_fields(resource: &str, fields: &[FieldDefinition]) {
    println!("Resource: {}", resource);
    for field in fields {
        match &field.documentation {
            Some(doc) => println!("    - {:<48} {:<9} {}", field.qualified_name, field.kind.as_str(), doc),
            None => println!("    - {:<48} {}", field.qualified_name, field.kind),
        }
    }
}

fn print_pretty(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(err) => tracing::error!(error = %err, "failed to serialize output"),
    }
}

/// Get a specific line from source (1-indexed)
fn get_source_line(source: &str, line: usize) -> Option<&str> {
    source.lines().nth(line.saturating_sub(1))
}

/// Number of carets under a span starting at `column`, clipped to the line
fn underline_width(source_line: &str, column: usize, length: usize) -> usize {
    let remaining = source_line
        .chars()
        .count()
        .saturating_sub(column.saturating_sub(1));
    length.min(remaining).max(1)
}
