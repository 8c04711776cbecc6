use hookdocs::load_config::load_config;
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// A full config with categories, templates and per-product overrides loads and validates.
#[test]
fn test_load_config_full_example() {
    let config_yaml = r##"
checkout_dir: ./work/repos
docs_dir: ./site/docs
parallel: 8
default_branch: develop
extractor:
  command: npx
  args: ["wp-hooks-documentor"]
  tagline: Hooks reference
ignore_files:
  - vendor/*
ignore_hooks:
  - deprecated_*
custom_fields:
  homepageUrl: https://www.gravitykit.com
templates:
  kind_index: "# {{product_label}} {{kind_label}}"
categories:
  views:
    label: Views
    position: 1
  extensions:
    label: Extensions
    position: 2
    parent: views
products:
  - id: gravityview
    repo: GravityKit/GravityView
    label: GravityView
    category: views
  - id: gravityview-datatables
    repo: GravityKit/DataTables
    branch: main
    category: extensions
    source_dir: src
    ignore_hooks:
      - internal_*
"##;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(config.checkout_dir, PathBuf::from("./work/repos"));
    assert_eq!(config.docs_dir, PathBuf::from("./site/docs"));
    assert_eq!(config.json_dir, PathBuf::from("static/hooks"));
    assert_eq!(config.parallel, 8);
    assert_eq!(config.default_branch, "develop");
    assert_eq!(config.extractor.command, "npx");
    assert_eq!(config.extractor.args, vec!["wp-hooks-documentor"]);
    assert_eq!(config.extractor.config_file, "wp-hooks-doc.json");
    assert_eq!(
        config.custom_fields["homepageUrl"].as_str(),
        Some("https://www.gravitykit.com")
    );
    assert!(config.templates.product_index.is_none());
    assert!(config.templates.kind_index.is_some());
    assert_eq!(config.categories["extensions"].parent.as_deref(), Some("views"));
    assert_eq!(config.products.len(), 2);
    assert_eq!(
        config.products[1].source_dir.as_deref(),
        Some(std::path::Path::new("src"))
    );
    assert_eq!(config.products[1].ignore_hooks, vec!["internal_*"]);
}

/// Only products are required; everything else falls back to defaults.
#[test]
fn test_load_config_minimal() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(
        config_file.path(),
        "products:\n  - id: gravityview\n    repo: GravityKit/GravityView\n",
    )
    .unwrap();

    let config = load_config(config_file.path()).expect("Config should load");
    assert_eq!(config.checkout_dir, PathBuf::from("repos"));
    assert_eq!(config.parallel, 4);
    assert!(config.categories.is_empty());
}

#[test]
fn test_load_config_rejects_unknown_category() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(
        config_file.path(),
        "products:\n  - id: gravityview\n    repo: GravityKit/GravityView\n    category: missing\n",
    )
    .unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Invalid configuration"), "{message}");
    assert!(message.contains("unknown category") || message.contains("missing"), "{message}");
}

#[test]
fn test_load_config_reports_yaml_errors() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "products: [unterminated\n").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"));
}
