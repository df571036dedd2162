//! Resource catalog - stores resource, field, metric and segment definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::version::SchemaVersion;

/// Prefix shared by every metric's qualified name
pub const METRICS_PREFIX: &str = "metrics";
/// Prefix shared by every segment's qualified name
pub const SEGMENTS_PREFIX: &str = "segments";

/// Documentation attached to a field, as found in the artifact
pub type FieldDocs = IndexMap<String, Option<String>>;

/// Resource catalog for one schema version - holds all resource information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceCatalog {
    pub version: SchemaVersion,
    /// Resource name -> ResourceDef
    pub resources: IndexMap<String, ResourceDef>,
}

impl ResourceCatalog {
    pub fn new(version: SchemaVersion) -> Self {
        Self {
            version,
            resources: IndexMap::new(),
        }
    }

    /// Add a resource, replacing any previous definition with the same name
    pub fn add_resource(&mut self, resource: ResourceDef) {
        self.resources.insert(resource.name.clone(), resource);
    }

    /// Look up a resource by exact name
    pub fn get_resource(&self, name: &str) -> Option<&ResourceDef> {
        self.resources.get(name)
    }

    /// Check if a resource exists
    pub fn resource_exists(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Get all resource names, sorted
    pub fn resource_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.resources.keys().cloned().collect();
        names.sort();
        names
    }
}

/// A queryable resource with its attribute groups, metrics and segments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDef {
    pub name: String,
    /// Attribution prefix -> field name -> documentation
    pub fields: IndexMap<String, FieldDocs>,
    pub metrics: FieldDocs,
    pub segments: FieldDocs,
}

impl ResourceDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_field(
        mut self,
        prefix: impl Into<String>,
        name: impl Into<String>,
        doc: Option<&str>,
    ) -> Self {
        self.fields
            .entry(prefix.into())
            .or_default()
            .insert(name.into(), doc.map(str::to_string));
        self
    }

    pub fn with_metric(mut self, name: impl Into<String>, doc: Option<&str>) -> Self {
        self.metrics.insert(name.into(), doc.map(str::to_string));
        self
    }

    pub fn with_segment(mut self, name: impl Into<String>, doc: Option<&str>) -> Self {
        self.segments.insert(name.into(), doc.map(str::to_string));
        self
    }

    /// Attribute fields of every prefix group, in artifact order
    pub fn attribute_fields(&self) -> Vec<FieldDefinition> {
        self.fields
            .iter()
            .flat_map(|(prefix, group)| {
                group
                    .iter()
                    .map(move |(name, doc)| FieldDefinition::new(prefix, name, FieldKind::Attribute, doc))
            })
            .collect()
    }

    /// Attribute fields of a single prefix group
    pub fn group_fields(&self, prefix: &str) -> Vec<FieldDefinition> {
        self.fields
            .get(prefix)
            .map(|group| {
                group
                    .iter()
                    .map(|(name, doc)| FieldDefinition::new(prefix, name, FieldKind::Attribute, doc))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn metric_fields(&self) -> Vec<FieldDefinition> {
        self.metrics
            .iter()
            .map(|(name, doc)| FieldDefinition::new(METRICS_PREFIX, name, FieldKind::Metric, doc))
            .collect()
    }

    pub fn segment_fields(&self) -> Vec<FieldDefinition> {
        self.segments
            .iter()
            .map(|(name, doc)| FieldDefinition::new(SEGMENTS_PREFIX, name, FieldKind::Segment, doc))
            .collect()
    }

    /// Attributes, metrics and segments together, sorted by name then qualified name
    pub fn flattened_fields(&self) -> Vec<FieldDefinition> {
        let mut fields = self.attribute_fields();
        fields.extend(self.metric_fields());
        fields.extend(self.segment_fields());
        fields.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.qualified_name.cmp(&b.qualified_name))
        });
        fields
    }

    /// Attribution prefixes, sorted
    pub fn attributed_prefixes(&self) -> Vec<String> {
        let mut prefixes: Vec<String> = self.fields.keys().cloned().collect();
        prefixes.sort();
        prefixes
    }

    pub fn field_count(&self) -> usize {
        self.fields.values().map(|group| group.len()).sum()
    }

    /// Summary counts for this resource
    pub fn info(&self) -> ResourceInfo {
        ResourceInfo {
            field_count: self.field_count(),
            metric_count: self.metrics.len(),
            segment_count: self.segments.len(),
            attributed_prefixes: self.attributed_prefixes(),
        }
    }
}

/// Category a field belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Attribute,
    Metric,
    Segment,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Attribute => "attribute",
            FieldKind::Metric => "metric",
            FieldKind::Segment => "segment",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field as seen by queries, derived from a [`ResourceDef`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Name within its group (`id`, `clicks`, `ad.type`)
    pub name: String,
    pub kind: FieldKind,
    /// Group the field was listed under (`campaign`, `metrics`, `segments`)
    pub prefix: String,
    /// Full dotted reference (`campaign.id`, `metrics.clicks`)
    pub qualified_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

impl FieldDefinition {
    fn new(prefix: &str, key: &str, kind: FieldKind, doc: &Option<String>) -> Self {
        let (name, qualified_name) = qualify(prefix, key);
        Self {
            name,
            kind,
            prefix: prefix.to_string(),
            qualified_name,
            documentation: doc.clone(),
        }
    }
}

/// Split an artifact key into (short name, qualified name).
///
/// Keys that already carry the prefix are taken as qualified.
fn qualify(prefix: &str, key: &str) -> (String, String) {
    match key
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('.'))
    {
        Some(short) if !short.is_empty() => (short.to_string(), key.to_string()),
        _ => (key.to_string(), format!("{}.{}", prefix, key)),
    }
}

/// Summary of a resource's shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub field_count: usize,
    pub metric_count: usize,
    pub segment_count: usize,
    pub attributed_prefixes: Vec<String>,
}
