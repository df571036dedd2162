//! dqlint CLI - DQL query validation tool

mod args;
mod config;
mod output;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use dqlint_core::analyzer::suggest;
use dqlint_core::{Analyzer, SchemaRegistry, SchemaVersion, Span, ValidationError};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use crate::args::{Args, Command};
use crate::config::{Config, CONFIG_FILE_NAME};
use crate::output::OutputFormatter;

/// Extensions of files holding exactly one query
const QUERY_EXTENSIONS: &[&str] = &["dql", "gaql"];

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Error: {:?}", e);
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: u8) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(verbose, rust_log.as_deref()))
        .init();
}

/// `RUST_LOG` directives when set, otherwise the level picked by `-v`
fn env_filter(verbose: u8, rust_log: Option<&str>) -> EnvFilter {
    if let Some(directives) = rust_log.map(str::trim).filter(|d| !d.is_empty()) {
        return EnvFilter::new(directives);
    }

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    EnvFilter::default().add_directive(level.into())
}

fn run(args: Args) -> Result<bool> {
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Check {
            files,
            schema_version,
            schema_dir,
            disable,
            format,
            max_errors,
        } => {
            let config = config.merge_with_args(&schema_version, &schema_dir, &files, &format, &disable);
            check(&config, max_errors, args.quiet)
        }

        Command::Schema {
            resource,
            schema_version,
            schema_dir,
        } => {
            let config = config.merge_with_args(&schema_version, &schema_dir, &[], &None, &[]);
            show_schema(&config, resource.as_deref())
        }

        Command::Complete {
            file,
            offset,
            schema_version,
            schema_dir,
            format,
        } => {
            let config = config.merge_with_args(&schema_version, &schema_dir, &[], &format, &[]);
            let version = resolve_version(&config)?;
            let registry = load_registry(&config, version)?;

            let content = fs::read_to_string(&file).into_diagnostic()?;
            let result = Analyzer::new(&registry).complete(&content, offset, version);
            output::print_completion(config.output_format()?, &result);
            Ok(false)
        }
    }
}

fn check(config: &Config, max_errors: usize, quiet: bool) -> Result<bool> {
    let version = resolve_version(config)?;
    let output_format = config.output_format()?;
    let registry = load_registry(config, version)?;
    let analyzer = Analyzer::new(&registry);

    let query_files = expand_patterns(&config.files)?;
    if query_files.is_empty() {
        miette::bail!(
            "No query files specified. Use positional arguments or configure in {}",
            CONFIG_FILE_NAME
        );
    }

    let limit = if max_errors == 0 { usize::MAX } else { max_errors };
    let disabled: HashSet<&str> = config.disable.iter().map(String::as_str).collect();
    let mut total_errors = 0;

    for query_file in &query_files {
        if total_errors >= limit {
            tracing::info!(limit, "error limit reached, stopping");
            break;
        }

        let content = fs::read_to_string(query_file).into_diagnostic()?;
        let mut errors = filter_disabled(file_errors(&analyzer, query_file, &content, version), &disabled);
        errors.truncate(limit - total_errors);

        if !errors.is_empty() {
            let formatter = OutputFormatter::new(output_format, query_file.display().to_string());
            formatter.print_errors(&errors, &content);
            total_errors += errors.len();
        }
    }

    if !quiet {
        if total_errors > 0 {
            eprintln!();
            eprintln!(
                "Found {} error(s) in {} file(s) against schema {}",
                total_errors,
                query_files.len(),
                version
            );
        } else {
            eprintln!(
                "All {} file(s) passed validation against schema {}",
                query_files.len(),
                version
            );
        }
    }

    Ok(total_errors > 0)
}

fn show_schema(config: &Config, resource: Option<&str>) -> Result<bool> {
    let version = resolve_version(config)?;
    let registry = load_registry(config, version)?;

    match resource {
        Some(resource) => {
            if !registry.has_resource(resource, version) {
                let hint = suggest(resource, registry.resource_names(version))
                    .map(|s| format!(" Did you mean '{}'?", s))
                    .unwrap_or_default();
                miette::bail!("Unknown resource '{}' in schema {}.{}", resource, version, hint);
            }
            output::print_fields(resource, &registry.fields_for_resource(resource, version));
        }
        None => {
            let resources: Vec<_> = registry
                .resource_names(version)
                .into_iter()
                .filter_map(|name| {
                    let info = registry.resource_info(&name, version)?;
                    Some((name, info))
                })
                .collect();
            output::print_resources(&resources);
        }
    }

    Ok(false)
}

fn resolve_version(config: &Config) -> Result<SchemaVersion> {
    match &config.version {
        Some(version) => version.parse().map_err(|e: String| miette::miette!(e)),
        None => Ok(SchemaVersion::latest()),
    }
}

/// Registry for the configured artifacts, with `version` loaded up front so
/// a broken artifact is reported instead of degrading every lookup
fn load_registry(config: &Config, version: SchemaVersion) -> Result<SchemaRegistry> {
    let registry = match &config.schema_dir {
        Some(dir) => SchemaRegistry::from_dir(dir),
        None => SchemaRegistry::builtin(),
    };
    registry.load_version(version).into_diagnostic()?;
    Ok(registry)
}

fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for pattern in patterns {
        if pattern.contains('*') {
            for path in glob::glob(pattern).into_diagnostic()?.flatten() {
                paths.push(path);
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }
    Ok(paths)
}

fn is_query_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| QUERY_EXTENSIONS.iter().any(|q| ext.eq_ignore_ascii_case(q)))
        .unwrap_or(false)
}

/// Errors for one file, with spans relative to the whole file
fn file_errors(
    analyzer: &Analyzer<'_>,
    path: &Path,
    content: &str,
    version: SchemaVersion,
) -> Vec<ValidationError> {
    if is_query_file(path) {
        return analyzer.validate_query(content, version).errors;
    }

    analyzer
        .validate_text(content, version)
        .into_iter()
        .flat_map(|embedded| {
            let base = embedded.offset;
            embedded
                .result
                .errors
                .into_iter()
                .map(move |error| relocate(error, content, base))
        })
        .collect()
}

/// Shift a span found in an embedded query by the query's offset in `document`
fn relocate(mut error: ValidationError, document: &str, base: usize) -> ValidationError {
    error.span = Span::locate(document, base + error.span.offset, error.span.length);
    error
}

/// Drop errors whose code, name or tag is disabled
fn filter_disabled(errors: Vec<ValidationError>, disabled: &HashSet<&str>) -> Vec<ValidationError> {
    if disabled.is_empty() {
        return errors;
    }
    errors
        .into_iter()
        .filter(|e| {
            !disabled.contains(e.code())
                && !disabled.contains(e.kind.name())
                && !disabled.contains(e.kind.to_string().as_str())
        })
        .collect()
}
