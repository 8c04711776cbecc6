use hookdocs_core::config::{category_path, resolve_product, Category, Config, Product};
use hookdocs_core::error::ConfigError;
use std::collections::BTreeMap;
use std::path::PathBuf;

fn product(id: &str, repo: &str) -> Product {
    Product {
        id: id.to_string(),
        repo: repo.to_string(),
        ..Default::default()
    }
}

fn category(label: &str, parent: Option<&str>) -> Category {
    Category {
        label: label.to_string(),
        position: 1,
        parent: parent.map(str::to_string),
    }
}

#[test]
fn defaults_match_the_documented_layout() {
    let config = Config::default();
    assert_eq!(config.checkout_dir, PathBuf::from("repos"));
    assert_eq!(config.docs_dir, PathBuf::from("docs"));
    assert_eq!(config.json_dir, PathBuf::from("static/hooks"));
    assert_eq!(config.context_file, PathBuf::from("static/llms.txt"));
    assert_eq!(config.default_branch, "main");
    assert_eq!(config.git_host, "github.com");
    assert_eq!(config.parallel, 4);
    assert_eq!(config.extractor.command, "wp-hooks-documentor");
    assert_eq!(config.extractor.config_file, "wp-hooks-doc.json");
}

#[test]
fn validate_table_driven() {
    let mut nested = BTreeMap::new();
    nested.insert("a".to_string(), category("A", None));
    nested.insert("b".to_string(), category("B", Some("a")));
    nested.insert("c".to_string(), category("C", Some("b")));

    let cases: Vec<(&str, Config, Result<(), ConfigError>)> = vec![
        (
            "valid",
            Config {
                products: vec![product("gv", "Org/GravityView")],
                ..Default::default()
            },
            Ok(()),
        ),
        (
            "empty id",
            Config {
                products: vec![product("gv", "Org/GV"), product(" ", "Org/X")],
                ..Default::default()
            },
            Err(ConfigError::EmptyProductId(1)),
        ),
        (
            "duplicate id",
            Config {
                products: vec![product("gv", "Org/GV"), product("gv", "Org/Other")],
                ..Default::default()
            },
            Err(ConfigError::DuplicateProduct("gv".to_string())),
        ),
        (
            "repo without owner",
            Config {
                products: vec![product("gv", "GravityView")],
                ..Default::default()
            },
            Err(ConfigError::InvalidRepo {
                product: "gv".to_string(),
                repo: "GravityView".to_string(),
            }),
        ),
        (
            "unknown category",
            Config {
                products: vec![Product {
                    category: Some("nope".to_string()),
                    ..product("gv", "Org/GV")
                }],
                ..Default::default()
            },
            Err(ConfigError::UnknownCategory {
                product: "gv".to_string(),
                category: "nope".to_string(),
            }),
        ),
        (
            "two nesting levels",
            Config {
                categories: nested,
                ..Default::default()
            },
            Err(ConfigError::NestingTooDeep {
                category: "c".to_string(),
                parent: "b".to_string(),
            }),
        ),
        (
            "uncategorised product named after a category",
            Config {
                categories: BTreeMap::from([(
                    "extensions".to_string(),
                    category("Extensions", None),
                )]),
                products: vec![
                    Product {
                        category: Some("extensions".to_string()),
                        ..product("maps", "Org/GravityMaps")
                    },
                    product("extensions", "Org/Extensions"),
                ],
                ..Default::default()
            },
            Err(ConfigError::OutputCollision {
                product: "extensions".to_string(),
                other: "category extensions".to_string(),
            }),
        ),
        (
            "product filed under its own category id",
            Config {
                categories: BTreeMap::from([("maps".to_string(), category("Maps", None))]),
                products: vec![Product {
                    category: Some("maps".to_string()),
                    ..product("maps", "Org/GravityMaps")
                }],
                ..Default::default()
            },
            Ok(()),
        ),
        (
            "zero parallelism",
            Config {
                parallel: 0,
                ..Default::default()
            },
            Err(ConfigError::ZeroParallelism),
        ),
    ];

    for (name, config, expected) in cases {
        assert_eq!(config.validate(), expected, "case: {name}");
    }
}

#[test]
fn resolve_product_merges_without_mutating() {
    let mut config = Config {
        ignore_files: vec!["vendor/*".to_string(), "tests/*".to_string()],
        ignore_hooks: vec!["deprecated_*".to_string()],
        ..Default::default()
    };
    config.extractor.tagline = "Hooks reference".to_string();
    let gv = Product {
        branch: Some("develop".to_string()),
        ignore_files: vec!["tests/*".to_string(), "build/*".to_string()],
        ..product("gv", "Org/GravityView")
    };
    config.products.push(gv.clone());
    let before = config.clone();

    let resolved = resolve_product(&config, &gv);
    assert_eq!(resolved.branch, "develop");
    assert_eq!(resolved.label, "gv");
    assert_eq!(resolved.tagline, "Hooks reference");
    assert_eq!(resolved.ignore_files, vec!["vendor/*", "tests/*", "build/*"]);
    assert_eq!(resolved.ignore_hooks, vec!["deprecated_*"]);

    let other = resolve_product(&config, &product("maps", "Org/Maps"));
    assert_eq!(other.branch, "main");
    assert_eq!(other.ignore_files, vec!["vendor/*", "tests/*"]);

    assert_eq!(config.ignore_files, before.ignore_files);
    assert_eq!(config.products, before.products);
}

#[test]
fn category_path_follows_one_parent_level() {
    let mut categories = BTreeMap::new();
    categories.insert("views".to_string(), category("Views", None));
    categories.insert("extensions".to_string(), category("Extensions", Some("views")));

    let flat = product("gv", "Org/GV");
    assert_eq!(category_path(&flat, &categories), vec!["gv"]);

    let top = Product {
        category: Some("views".to_string()),
        ..product("gv", "Org/GV")
    };
    assert_eq!(category_path(&top, &categories), vec!["views", "gv"]);

    let nested = Product {
        category: Some("extensions".to_string()),
        ..product("dt", "Org/DT")
    };
    assert_eq!(
        category_path(&nested, &categories),
        vec!["views", "extensions", "dt"]
    );
}

#[test]
fn products_deserialize_with_defaults_and_select_by_id() {
    let config: Config = serde_json::from_value(serde_json::json!({
        "products": [
            {"id": "gravityview", "repo": "GravityKit/GravityView", "label": "GravityView"},
            {"id": "gravityview-datatables", "repo": "GravityKit/DataTables"}
        ]
    }))
    .unwrap();

    assert_eq!(config.docs_dir, PathBuf::from("docs"));
    assert_eq!(config.products.len(), 2);
    assert_eq!(config.products[1].repo_name(), "DataTables");
    assert_eq!(config.products[1].display_label(), "gravityview-datatables");
    assert_eq!(
        config.select_products(Some("gravityview")).unwrap()[0].display_label(),
        "GravityView"
    );
    assert_eq!(config.select_products(None).unwrap().len(), 2);
    assert!(config.select_products(Some("missing")).is_none());
}
