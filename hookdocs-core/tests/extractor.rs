use hookdocs_core::config::{resolve_product, Config, Product};
use hookdocs_core::contract::HookExtractor;
use hookdocs_core::extractor::{ExternalExtractor, ExtractorConfig};
use std::path::Path;
use tempfile::tempdir;

#[test]
fn config_file_uses_camel_case_and_flattens_custom_fields() {
    let mut config = Config::default();
    config
        .custom_fields
        .insert("homepageUrl".to_string(), serde_json::json!("https://example.com"));
    let product = Product {
        id: "gravityview".to_string(),
        repo: "Org/GravityView".to_string(),
        label: Some("GravityView".to_string()),
        tagline: Some("Display entries".to_string()),
        ignore_files: vec!["vendor/*".to_string()],
        ..Default::default()
    };
    let resolved = resolve_product(&config, &product);

    let dir = tempdir().unwrap();
    let tool = ExtractorConfig::for_product(&resolved, Path::new("/src/gv"), Path::new("/tmp/out"));
    let path = tool.write(dir.path(), "wp-hooks-doc.json").unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    assert_eq!(
        value,
        serde_json::json!({
            "type": "plugin",
            "inputFolder": "/src/gv",
            "outputFolder": "/tmp/out",
            "title": "GravityView",
            "tagline": "Display entries",
            "ignoreFiles": ["vendor/*"],
            "ignoreHooks": [],
            "skipBuild": true,
            "homepageUrl": "https://example.com"
        })
    );
}

#[tokio::test]
async fn missing_binary_is_reported_as_not_found() {
    let dir = tempdir().unwrap();
    let extractor = ExternalExtractor::new("hookdocs-test-no-such-extractor", vec![]);
    let err = extractor.extract(dir.path()).await.unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[tokio::test]
async fn non_zero_exit_keeps_stderr() {
    let dir = tempdir().unwrap();
    let extractor = ExternalExtractor::new(
        "sh",
        vec!["-c".to_string(), "echo broken config >&2; exit 3".to_string()],
    );
    let err = extractor.extract(dir.path()).await.unwrap_err();
    assert!(!err.is_not_found());
    assert_eq!(err.stderr(), Some("broken config"));
}
