//! Versioned schema registry
//!
//! Catalogs are parsed lazily, once per version, and are read-only after
//! that. Lookups never fail: an unknown resource or an unusable version
//! yields empty results, since editors call them while a name is still
//! being typed.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::OnceCell;

use crate::error::SchemaError;
use crate::schema::catalog::{
    FieldDefinition, ResourceCatalog, ResourceDef, ResourceInfo, METRICS_PREFIX, SEGMENTS_PREFIX,
};
use crate::schema::loader::parse_artifact;
use crate::version::SchemaVersion;

/// Where a version's artifact comes from
#[derive(Debug, Clone)]
enum ArtifactSource {
    Bundled,
    File(PathBuf),
    Inline(String),
}

#[derive(Debug)]
struct VersionSlot {
    source: ArtifactSource,
    /// Outcome of the first load, failures included
    catalog: OnceCell<Result<ResourceCatalog, SchemaError>>,
}

impl VersionSlot {
    fn new(source: ArtifactSource) -> Self {
        Self {
            source,
            catalog: OnceCell::new(),
        }
    }

    fn load(&self, version: SchemaVersion) -> Result<&ResourceCatalog, SchemaError> {
        self.catalog
            .get_or_init(|| {
                let loaded = self.read(version);
                if let Err(err) = &loaded {
                    tracing::error!(%version, error = %err, "schema catalog unavailable");
                }
                loaded
            })
            .as_ref()
            .map_err(Clone::clone)
    }

    fn read(&self, version: SchemaVersion) -> Result<ResourceCatalog, SchemaError> {
        match &self.source {
            ArtifactSource::Bundled => parse_artifact(version, version.bundled_artifact()),
            ArtifactSource::Inline(json) => parse_artifact(version, json),
            ArtifactSource::File(path) => {
                let json = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
                    path: path.clone(),
                    source: Arc::new(source),
                })?;
                parse_artifact(version, &json)
            }
        }
    }
}

/// Per-version catalogs of resources, fields, metrics and segments
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    slots: IndexMap<SchemaVersion, VersionSlot>,
}

impl SchemaRegistry {
    /// An empty registry; register artifacts with the `with_*` methods
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry backed by the artifacts bundled with the library
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for version in SchemaVersion::ALL {
            registry
                .slots
                .insert(version, VersionSlot::new(ArtifactSource::Bundled));
        }
        registry
    }

    /// Registry reading `<dir>/<version>.json` for every supported version
    ///
    /// Files are read when a version is first loaded.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let mut registry = Self::new();
        for version in SchemaVersion::ALL {
            let path = dir.join(format!("{}.json", version));
            registry
                .slots
                .insert(version, VersionSlot::new(ArtifactSource::File(path)));
        }
        registry
    }

    /// Register an in-memory artifact for `version`, replacing any previous source
    pub fn with_json(mut self, version: SchemaVersion, json: impl Into<String>) -> Self {
        self.slots
            .insert(version, VersionSlot::new(ArtifactSource::Inline(json.into())));
        self
    }

    /// Register an artifact file for `version`, replacing any previous source
    pub fn with_file(mut self, version: SchemaVersion, path: impl Into<PathBuf>) -> Self {
        self.slots
            .insert(version, VersionSlot::new(ArtifactSource::File(path.into())));
        self
    }

    /// Versions with a registered artifact
    pub fn versions(&self) -> Vec<SchemaVersion> {
        self.slots.keys().copied().collect()
    }

    /// Load (once) and return the catalog for `version`
    ///
    /// A failed load is cached too: later calls return the same error
    /// without reading the artifact again.
    pub fn load_version(&self, version: SchemaVersion) -> Result<&ResourceCatalog, SchemaError> {
        self.slots
            .get(&version)
            .ok_or(SchemaError::UnregisteredVersion(version))?
            .load(version)
    }

    /// Load every registered version, failing on the first bad artifact
    pub fn preload(&self) -> Result<(), SchemaError> {
        for version in self.slots.keys() {
            self.load_version(*version)?;
        }
        Ok(())
    }

    fn catalog(&self, version: SchemaVersion) -> Option<&ResourceCatalog> {
        match self.slots.get(&version) {
            Some(slot) => slot.load(version).ok(),
            None => {
                tracing::debug!(%version, "no schema artifact registered");
                None
            }
        }
    }

    fn resource(&self, resource: &str, version: SchemaVersion) -> Option<&ResourceDef> {
        self.catalog(version)?.get_resource(resource)
    }

    /// All resource names for `version`, sorted
    pub fn resource_names(&self, version: SchemaVersion) -> Vec<String> {
        self.catalog(version)
            .map(|catalog| catalog.resource_names())
            .unwrap_or_default()
    }

    pub fn has_resource(&self, resource: &str, version: SchemaVersion) -> bool {
        self.resource(resource, version).is_some()
    }

    /// Attributes, metrics and segments of a resource, sorted by name
    pub fn fields_for_resource(&self, resource: &str, version: SchemaVersion) -> Vec<FieldDefinition> {
        self.resource(resource, version)
            .map(ResourceDef::flattened_fields)
            .unwrap_or_default()
    }

    /// Fields whose qualified name lies under `prefix`
    ///
    /// `metrics` and `segments` select those groups; any other prefix,
    /// including a nested one like `ad_group_ad.ad`, selects fields whose
    /// qualified name starts with `prefix.`.
    pub fn fields_for_prefix(
        &self,
        resource: &str,
        prefix: &str,
        version: SchemaVersion,
    ) -> Vec<FieldDefinition> {
        let Some(def) = self.resource(resource, version) else {
            return Vec::new();
        };
        match prefix {
            METRICS_PREFIX => def.metric_fields(),
            SEGMENTS_PREFIX => def.segment_fields(),
            _ => {
                let scope = format!("{}.", prefix);
                def.flattened_fields()
                    .into_iter()
                    .filter(|field| field.qualified_name.starts_with(&scope))
                    .collect()
            }
        }
    }

    pub fn metrics_for_resource(&self, resource: &str, version: SchemaVersion) -> Vec<FieldDefinition> {
        self.resource(resource, version)
            .map(ResourceDef::metric_fields)
            .unwrap_or_default()
    }

    pub fn segments_for_resource(&self, resource: &str, version: SchemaVersion) -> Vec<FieldDefinition> {
        self.resource(resource, version)
            .map(ResourceDef::segment_fields)
            .unwrap_or_default()
    }

    /// Field/metric/segment counts and prefixes, or `None` for an unknown resource
    pub fn resource_info(&self, resource: &str, version: SchemaVersion) -> Option<ResourceInfo> {
        self.resource(resource, version).map(ResourceDef::info)
    }
}
