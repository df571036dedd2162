//! Catalog builder - converts a schema artifact into a ResourceCatalog

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::SchemaError;
use crate::schema::catalog::{FieldDocs, ResourceCatalog, ResourceDef};
use crate::version::SchemaVersion;

/// Builder for constructing a ResourceCatalog from JSON schema artifacts
pub struct CatalogBuilder {
    catalog: ResourceCatalog,
    warnings: Vec<String>,
}

impl CatalogBuilder {
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            catalog: ResourceCatalog::new(version),
            warnings: Vec::new(),
        }
    }

    /// Parse an artifact and add its resources to the catalog.
    ///
    /// Only a non-JSON document or a non-object top level fails. Resources
    /// with missing or malformed groups degrade to empty collections.
    pub fn parse(&mut self, json: &str) -> Result<(), SchemaError> {
        let version = self.catalog.version;
        let document: Value =
            serde_json::from_str(json).map_err(|source| SchemaError::Json {
            version,
            source: Arc::new(source),
        })?;

        let resources = match document {
            Value::Object(resources) => resources,
            other => {
                return Err(SchemaError::InvalidArtifact {
                    version,
                    reason: format!(
                        "expected a JSON object at the top level, found {}",
                        kind_of(&other)
                    ),
                })
            }
        };

        for (name, entry) in &resources {
            let resource = self.process_resource(name, entry);
            self.catalog.add_resource(resource);
        }

        tracing::debug!(
            %version,
            resources = self.catalog.resources.len(),
            "parsed schema artifact"
        );
        Ok(())
    }

    /// Finish building, returning the catalog and any degradation warnings
    pub fn build(self) -> (ResourceCatalog, Vec<String>) {
        (self.catalog, self.warnings)
    }

    fn process_resource(&mut self, name: &str, entry: &Value) -> ResourceDef {
        let mut resource = ResourceDef::new(name);
        let Some(entry) = entry.as_object() else {
            self.warn(format!(
                "resource '{}' is {} rather than an object; treating it as empty",
                name,
                kind_of(entry)
            ));
            return resource;
        };

        if let Some(groups) = self.object_member(name, entry, "fields") {
            for (prefix, group) in groups {
                match group.as_object() {
                    Some(group) => {
                        resource.fields.insert(prefix.clone(), docs_from(group));
                    }
                    None => self.warn(format!(
                        "resource '{}' field group '{}' is {}; skipping it",
                        name,
                        prefix,
                        kind_of(group)
                    )),
                }
            }
        }
        if let Some(metrics) = self.object_member(name, entry, "metrics") {
            resource.metrics = docs_from(metrics);
        }
        if let Some(segments) = self.object_member(name, entry, "segments") {
            resource.segments = docs_from(segments);
        }

        resource
    }

    /// Look up an object-valued member, recording a warning when it has the wrong shape
    fn object_member<'v>(
        &mut self,
        resource: &str,
        entry: &'v Map<String, Value>,
        key: &str,
    ) -> Option<&'v Map<String, Value>> {
        match entry.get(key) {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                self.warn(format!(
                    "resource '{}' has {} for '{}'; treating it as empty",
                    resource,
                    kind_of(other),
                    key
                ));
                None
            }
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!(version = %self.catalog.version, "{}", message);
        self.warnings.push(message);
    }
}

/// Parse a complete artifact into a catalog
pub fn parse_artifact(version: SchemaVersion, json: &str) -> Result<ResourceCatalog, SchemaError> {
    let mut builder = CatalogBuilder::new(version);
    builder.parse(json)?;
    let (catalog, _) = builder.build();
    Ok(catalog)
}

fn docs_from(map: &Map<String, Value>) -> FieldDocs {
    map.iter()
        .map(|(name, doc)| (name.clone(), doc.as_str().map(str::to_string)))
        .collect()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
