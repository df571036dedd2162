//! Schema management module

mod catalog;
mod loader;
mod registry;

pub use catalog::{
    FieldDefinition, FieldDocs, FieldKind, ResourceCatalog, ResourceDef, ResourceInfo,
    METRICS_PREFIX, SEGMENTS_PREFIX,
};
pub use loader::{parse_artifact, CatalogBuilder};
pub use registry::SchemaRegistry;
