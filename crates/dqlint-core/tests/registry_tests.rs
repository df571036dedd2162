// Integration tests for the schema registry
use std::fs;
use std::path::PathBuf;

use dqlint_core::analyzer::Analyzer;
use dqlint_core::error::SchemaError;
use dqlint_core::schema::{FieldKind, SchemaRegistry};
use dqlint_core::version::SchemaVersion;
use pretty_assertions::assert_eq;

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("dqlint-{}-{}", name, std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn test_builtin_versions_load() {
    let registry = SchemaRegistry::builtin();
    assert_eq!(registry.versions(), SchemaVersion::ALL.to_vec());
    registry.preload().unwrap();

    for version in SchemaVersion::ALL {
        let names = registry.resource_names(version);
        assert!(names.contains(&"campaign".to_string()), "{}", version);
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}

#[test]
fn test_later_versions_add_resources() {
    let registry = SchemaRegistry::builtin();
    assert!(!registry.has_resource("search_term_view", SchemaVersion::V19));
    assert!(registry.has_resource("search_term_view", SchemaVersion::V20));
    assert!(!registry.has_resource("asset_group", SchemaVersion::V20));
    assert!(registry.has_resource("asset_group", SchemaVersion::V21));
}

#[test]
fn test_flattened_fields_are_sorted_and_unique() {
    let registry = SchemaRegistry::builtin();
    for resource in registry.resource_names(SchemaVersion::V21) {
        let fields = registry.fields_for_resource(&resource, SchemaVersion::V21);
        let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted, "{}", resource);

        let mut qualified: Vec<_> = fields.iter().map(|f| f.qualified_name.as_str()).collect();
        qualified.sort();
        qualified.dedup();
        assert_eq!(qualified.len(), fields.len(), "{}", resource);
    }
}

#[test]
fn test_prefix_lookups() {
    let registry = SchemaRegistry::builtin();
    let v = SchemaVersion::V21;

    let metrics = registry.fields_for_prefix("campaign", "metrics", v);
    assert_eq!(metrics, registry.metrics_for_resource("campaign", v));
    assert!(metrics.iter().all(|f| f.kind == FieldKind::Metric));

    let segments = registry.fields_for_prefix("campaign", "segments", v);
    assert_eq!(segments, registry.segments_for_resource("campaign", v));

    let nested: Vec<_> = registry
        .fields_for_prefix("ad_group_ad", "ad_group_ad.ad", v)
        .into_iter()
        .map(|f| f.qualified_name)
        .collect();
    assert_eq!(
        nested,
        vec![
            "ad_group_ad.ad.final_urls",
            "ad_group_ad.ad.id",
            "ad_group_ad.ad.name",
            "ad_group_ad.ad.type"
        ]
    );

    assert!(registry.fields_for_prefix("nope", "metrics", v).is_empty());
}

#[test]
fn test_resource_info() {
    let registry = SchemaRegistry::builtin();
    let info = registry
        .resource_info("campaign", SchemaVersion::V21)
        .unwrap();
    assert_eq!(
        info.attributed_prefixes,
        vec!["campaign", "campaign_budget", "customer"]
    );
    assert_eq!(
        info.metric_count,
        registry.metrics_for_resource("campaign", SchemaVersion::V21).len()
    );
    assert_eq!(registry.resource_info("nope", SchemaVersion::V21), None);
}

#[test]
fn test_from_dir_reads_files_lazily() {
    let dir = temp_dir("from-dir");
    fs::write(
        dir.join("v21.json"),
        r#"{ "widget": { "fields": { "widget": { "id": "Widget ID." } } } }"#,
    )
    .unwrap();
    fs::write(dir.join("v20.json"), "not json").unwrap();

    let registry = SchemaRegistry::from_dir(&dir);
    assert_eq!(registry.resource_names(SchemaVersion::V21), vec!["widget"]);

    // Broken or missing artifacts degrade lookups but fail explicit loads
    assert!(registry.resource_names(SchemaVersion::V20).is_empty());
    assert!(matches!(
        registry.load_version(SchemaVersion::V20),
        Err(SchemaError::Json { .. })
    ));
    assert!(matches!(
        registry.load_version(SchemaVersion::V19),
        Err(SchemaError::Io { .. })
    ));
    assert!(registry.preload().is_err());

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_missing_artifact_stays_missing() {
    let dir = temp_dir("late-file");
    let registry = SchemaRegistry::from_dir(&dir);
    assert!(registry.resource_names(SchemaVersion::V21).is_empty());

    // Writing the file afterwards does not change the loaded version
    fs::write(
        dir.join("v21.json"),
        r#"{ "widget": { "fields": { "widget": { "id": null } } } }"#,
    )
    .unwrap();
    assert!(registry.resource_names(SchemaVersion::V21).is_empty());
    assert!(!registry.has_resource("widget", SchemaVersion::V21));
    assert!(matches!(
        registry.load_version(SchemaVersion::V21),
        Err(SchemaError::Io { .. })
    ));

    // A fresh registry picks it up
    let fresh = SchemaRegistry::from_dir(&dir);
    assert_eq!(fresh.resource_names(SchemaVersion::V21), vec!["widget"]);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_unregistered_version() {
    let registry = SchemaRegistry::new().with_json(SchemaVersion::V21, "{}");
    assert!(matches!(
        registry.load_version(SchemaVersion::V19),
        Err(SchemaError::UnregisteredVersion(SchemaVersion::V19))
    ));
    assert!(registry.resource_names(SchemaVersion::V21).is_empty());
}

#[test]
fn test_top_level_must_be_an_object() {
    let registry = SchemaRegistry::new().with_json(SchemaVersion::V21, "[1, 2]");
    assert!(matches!(
        registry.load_version(SchemaVersion::V21),
        Err(SchemaError::InvalidArtifact { .. })
    ));
}

#[test]
fn test_concurrent_reads_share_one_registry() {
    let registry = SchemaRegistry::builtin();
    let analyzer = Analyzer::new(&registry);
    let queries = [
        ("SELECT campaign.id FROM campaign", SchemaVersion::V21, true),
        ("SELECT campaign.primary_status FROM campaign", SchemaVersion::V19, false),
        ("SELECT campaign.primary_status FROM campaign", SchemaVersion::V20, true),
        ("SELECT asset_group.id FROM asset_group", SchemaVersion::V21, true),
    ];

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..50 {
                    for (query, version, valid) in queries {
                        assert_eq!(analyzer.validate_query(query, version).valid, valid);
                    }
                }
            });
        }
    });
}
