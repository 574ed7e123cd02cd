//! Configuration Tests
//!
//! Tests loading couchsphinx.toml and that indexing and querying agree on
//! the settings derived from it.

use crate::common::*;
use couchsphinx::{MultiAttributeCodec, ResultReconstructor, CONFIG_FILE_NAME};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

// ============================================================================
// Loading
// ============================================================================

#[test]
fn load_reads_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    fs::write(&path, BLOG_CONFIG).unwrap();

    let config = IndexerConfig::load(&path).unwrap();
    assert_eq!(config.server, "search.local");
    assert_eq!(config.port, 9312);
    assert_eq!(config.registry().names(), vec!["Comment", "Post"]);
}

#[test]
fn load_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let config = IndexerConfig::load(&dir.path().join(CONFIG_FILE_NAME)).unwrap();
    assert_eq!(config, IndexerConfig::default());
}

#[test]
fn load_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    fs::write(&path, "stride = 100\n").unwrap();
    assert!(matches!(IndexerConfig::load(&path), Err(Error::InvalidConfig(_))));

    fs::write(&path, "port = \"not a number\"\n").unwrap();
    assert!(matches!(IndexerConfig::load(&path), Err(Error::ConfigParse(_))));
}

#[test]
fn fixed_names_must_be_element_names() {
    let err = IndexerConfig::from_toml_str(
        r#"
tag_attribute = "kind tag"

[types.Note]
properties = ["text"]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn default_toml_round_trips() {
    let config = IndexerConfig::from_toml_str(IndexerConfig::default_toml()).unwrap();
    assert_eq!(config.type_field, "couchrest-type");
    assert_eq!(config.tag_attribute, "csphinx-class");
}

// ============================================================================
// Consistency between indexing and querying
// ============================================================================

#[test]
fn custom_settings_apply_to_both_sides() {
    init_tracing();
    let config = IndexerConfig::from_toml_str(
        r#"
stride = 1000
type_field = "kind"
tag_attribute = "kind-tag"

[types.Note]
properties = ["text"]
"#,
    )
    .unwrap();
    let catalog = FieldCatalog::new(Arc::new(config.registry()));
    let set = DocsetBuilder::from_config(&catalog, &config)
        .unwrap()
        .build(vec![json!({"_id": "Note-42", "kind": "Note", "text": "remember"})]);

    let xml = set.to_xml();
    assert!(xml.contains(r#"<sphinx:field name="kind"/>"#));
    assert!(xml.contains(r#"<sphinx:attr name="kind-tag" type="multi"/>"#));
    assert!(xml.contains("<kind-tag>1078,2111,3116,4101</kind-tag>"));

    let tag = set.documents()[0].type_tag().clone();
    assert_eq!(MultiAttributeCodec::new(1000).unwrap().decode(&tag), b"Note");

    let hit = SearchHit::new(42).with_attribute("kind-tag", tag);
    let reconstructor = ResultReconstructor::from_config(&config).unwrap();
    assert_eq!(reconstructor.reconstruct(&[hit]), vec!["Note-42"]);
}

#[test]
fn generated_ids_fit_configured_width() {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    let config = IndexerConfig::from_toml_str("id_bits = 16\n").unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let id = StoreId::random("Post", config.id_bits, &mut rng).unwrap();
        assert!(id.number() < u16::MAX as u64);
        let parsed: StoreId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
