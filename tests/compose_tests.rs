//! Integration tests for loading config directories.
//!
//! Covers composition, tag overlays and variant selection together:
//! - compose() / Composer - directory walk into one tree
//! - TagSet::resolve() - tagged overlays on a composed tree
//! - select_variants() - top-level variant selection

use serde_json::json;
use std::fs;
use std::path::Path;
use config_tree::{Composer, ErrorCode, LoaderRegistry, TagSet, compose, load_yaml, select_variants};
use tempfile::TempDir;

/// Write a file under `root`, creating parent directories.
fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// A config directory mixing JSON, YAML, nesting and ignorable files.
fn example_configs() -> TempDir {
    let temp = TempDir::new().unwrap();
    let root = temp.path();
    write(
        root,
        "a.json",
        r#"{"key-a": "value-a", "key-b": {"key-b-1": "content-b-1", "key-b-2": "content-b-2"}}"#,
    );
    write(
        root,
        "b.yaml",
        r#"
key-b: content-b
key-c:
  key-c-1: content-c-1
  key-c-2: content-c-2
"#,
    );
    write(
        root,
        "c.yml",
        r#"
key-c: content-c
key-d:
  key-d-1:
    - content-d-1.0
    - content-d-1.1
  key-d-2:
    content-d-2: null
"#,
    );
    write(root, "d/e.json", r#"{"key-e": "content-e"}"#);
    write(root, "d/notes.md", "# not config");
    write(root, "README", "not config either");
    temp
}

#[test]
fn test_compose_example_directory() {
    let temp = example_configs();
    let tree = compose(temp.path(), &LoaderRegistry::new()).unwrap();

    assert_eq!(
        tree,
        json!({
            "a": {
                "key-a": "value-a",
                "key-b": {"key-b-1": "content-b-1", "key-b-2": "content-b-2"}
            },
            "b": {
                "key-b": "content-b",
                "key-c": {"key-c-1": "content-c-1", "key-c-2": "content-c-2"}
            },
            "c": {
                "key-c": "content-c",
                "key-d": {
                    "key-d-1": ["content-d-1.0", "content-d-1.1"],
                    "key-d-2": {"content-d-2": null}
                }
            },
            "d": {"e": {"key-e": "content-e"}}
        })
    );
}

#[test]
fn test_compose_is_order_independent() {
    // Same files written in a different order give the same tree.
    let first = TempDir::new().unwrap();
    write(first.path(), "z.json", r#"{"z": 1}"#);
    write(first.path(), "m/n.json", r#"{"n": 2}"#);
    write(first.path(), "a.yaml", "a: 3\n");

    let second = TempDir::new().unwrap();
    write(second.path(), "a.yaml", "a: 3\n");
    write(second.path(), "m/n.json", r#"{"n": 2}"#);
    write(second.path(), "z.json", r#"{"z": 1}"#);

    let loaders = LoaderRegistry::new();
    assert_eq!(
        compose(first.path(), &loaders).unwrap(),
        compose(second.path(), &loaders).unwrap()
    );
}

#[test]
fn test_file_and_directory_with_same_name_fail() {
    let temp = example_configs();
    write(temp.path(), "a/key-c.json", r#"{"key-d": "value-d"}"#);

    let err = compose(temp.path(), &LoaderRegistry::new()).unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateKey);
    assert!(err.path.unwrap().ends_with("a"));
}

#[test]
fn test_yaml_anchor_merge_in_composed_tree() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "db.yaml",
        r#"
base: &base {host: h, port: 1}
prod: {<<: *base, port: 2}
"#,
    );

    let tree = compose(temp.path(), &LoaderRegistry::new()).unwrap();
    assert_eq!(tree["db"]["prod"], json!({"host": "h", "port": 2}));
}

#[test]
fn test_custom_loader_extension() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "c.conf",
        "name:\n  field1: value1\n  field2: [value2, value3]\n",
    );

    let mut loaders = LoaderRegistry::new();
    assert_eq!(compose(temp.path(), &loaders).unwrap(), json!({}));

    loaders.register("conf", load_yaml).unwrap();
    assert_eq!(
        compose(temp.path(), &loaders).unwrap(),
        json!({"c": {"name": {"field1": "value1", "field2": ["value2", "value3"]}}})
    );
}

#[test]
fn test_injected_module_loader() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "g.js", "module.exports = { g: 'How are you' }");

    let loaders = LoaderRegistry::new().with_module_loader(|path| {
        // Stand-in for a host runtime: report which file was evaluated.
        Ok(json!({"evaluated": path.file_name().unwrap().to_str().unwrap()}))
    });
    let tree = compose(temp.path(), &loaders).unwrap();
    assert_eq!(tree, json!({"g": {"evaluated": "g.js"}}));
}

#[test]
fn test_tags_on_composed_tree() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "server.yaml",
        r#"
host: 1.1.1.1
port: 80
"host:test": 127.0.0.1
"#,
    );
    write(temp.path(), "server:test.json", r#"{"port": 8080}"#);

    let tree = compose(temp.path(), &LoaderRegistry::new()).unwrap();
    let resolved = TagSet::from_specs([":test"]).resolve(tree);

    assert_eq!(resolved["server"]["host"], "127.0.0.1");
    assert_eq!(resolved["server"]["port"], 8080);
    // Tagged keys are retained by default.
    assert!(resolved.get("server:test").is_some());
}

#[test]
fn test_variant_selection_like_env_and_locale() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "f.json", r#""value-f""#);
    write(temp.path(), "env/development.json", r#"{"f": "value-f-dev"}"#);
    write(temp.path(), "env/production.json", r#"{"f": "value-f-prod"}"#);
    write(
        temp.path(),
        "locale/en.yaml",
        "locales:\n  welcome: welcome\n  \":)\": \":)\"\n",
    );
    write(
        temp.path(),
        "locale/zhCN.yaml",
        "locales:\n  welcome: 欢迎\n  \":)\": \"^_^\"\n",
    );

    let tree = compose(temp.path(), &LoaderRegistry::new()).unwrap();

    let dev_en = select_variants(tree.clone(), &[("env", "development"), ("locale", "en")]);
    assert_eq!(
        dev_en,
        json!({"f": "value-f-dev", "locales": {"welcome": "welcome", ":)": ":)"}})
    );

    let prod_zh = select_variants(tree, &[("env", "production"), ("locale", "zhCN")]);
    assert_eq!(
        prod_zh,
        json!({"f": "value-f-prod", "locales": {"welcome": "欢迎", ":)": "^_^"}})
    );
}

#[test]
fn test_depth_cap() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "a/b/c/d.json", "{}");

    let loaders = LoaderRegistry::new();
    let err = Composer::new(&loaders)
        .with_max_depth(Some(2))
        .compose(temp.path())
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CyclicPath);
}
