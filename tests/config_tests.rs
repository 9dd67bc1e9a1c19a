//! Integration tests for the Config facade.
//!
//! Tests loading sources into a Config and addressing the result:
//! - load() / use_source() - directories, single files, inline trees, other configs
//! - get() / has() / set() / delete() / get_config() - key path access
//! - use_source_async() - loading on a blocking thread

use serde_json::json;
use std::fs;
use std::path::Path;
use config_tree::{Config, ConfigOptions, Entry, ErrorCode, Selection, Source, TagSet, load_yaml};
use tempfile::TempDir;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Helper to create a config directory used by most tests.
fn create_configs() -> TempDir {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("configs");
    write(
        &dir,
        "a.json",
        r#"{"key-a": "value-a", "key-b": {"key-b-1": "content-b-1", "key-b-2": "content-b-2"}}"#,
    );
    write(
        &dir,
        "b.yaml",
        "key-b: content-b\nkey-c:\n  key-c-1: content-c-1\n  key-c-2: content-c-2\n",
    );
    write(&dir, "d/e.json", r#"{"key-e": "content-e"}"#);
    write(
        &dir,
        "server.yaml",
        "host: 1.1.1.1\n\"host:test\": 127.0.0.1\n",
    );
    temp
}

#[test]
fn test_load_directory_relative_to_root() {
    let temp = create_configs();
    let mut config = Config::new().with_root(temp.path());
    config.load("configs").unwrap();

    assert_eq!(config.get("b.key-b").unwrap(), json!("content-b"));
    assert_eq!(config.get("d.e.key-e").unwrap(), json!("content-e"));
    assert_eq!(config.config_path(), Some(temp.path().join("configs").as_path()));
}

#[test]
fn test_directory_load_applies_tags() {
    let temp = create_configs();
    let mut config = Config::new()
        .with_root(temp.path())
        .with_tags(TagSet::from_specs([":test"]));
    config.load("configs").unwrap();

    assert_eq!(config.get("server.host").unwrap(), json!("127.0.0.1"));
    assert!(config.has(r"server.host:test"));
}

#[test]
fn test_options_drive_tags_selection_and_separator() {
    let temp = create_configs();
    write(&temp.path().join("configs"), "env/dev.json", r#"{"b": {"key-b": "dev"}}"#);

    let options = ConfigOptions {
        separator: '/',
        root: Some(temp.path().to_path_buf()),
        tags: vec!["/:test$/".to_string()],
        prune_tagged: true,
        select: vec![Selection::new("env", "dev")],
        ..ConfigOptions::default()
    };
    let mut config = Config::with_options(&options);
    config.load("configs").unwrap();

    assert_eq!(config.get("b/key-b").unwrap(), json!("dev"));
    assert_eq!(config.get("server").unwrap(), json!({"host": "127.0.0.1"}));
    assert!(!config.has("env"));
}

#[test]
fn test_missing_path_fails_to_load() {
    let temp = TempDir::new().unwrap();
    let mut config = Config::new();
    let err = config.load(temp.path().join("faked_configs_path")).unwrap_err();
    assert_eq!(err.code, ErrorCode::ReadFailed);
    assert!(config.config_path().is_none());
}

#[test]
fn test_load_single_file_with_custom_loader() {
    let temp = TempDir::new().unwrap();
    write(
        temp.path(),
        "conf/c.conf",
        "name:\n  field1: value1\n  field2: [value2, value3]\n",
    );

    let mut config = Config::new().with_root(temp.path());
    let err = config.load("conf/c.conf").unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedExtension);

    config.set_file_loader("conf", load_yaml).unwrap();
    config.load("conf/c.conf").unwrap();
    assert_eq!(
        config.tree(),
        &json!({"name": {"field1": "value1", "field2": ["value2", "value3"]}})
    );
}

#[test]
fn test_single_file_must_hold_an_object() {
    let temp = TempDir::new().unwrap();
    write(temp.path(), "list.json", "[1, 2, 3]");

    let err = Config::new().load(temp.path().join("list.json")).unwrap_err();
    assert_eq!(err.code, ErrorCode::NotAnObject);
}

#[test]
fn test_common_use() {
    let temp = create_configs();
    let mut config = Config::new().with_root(temp.path());
    config.load("configs").unwrap();

    // get
    assert_eq!(
        config.get("a").unwrap(),
        json!({"key-a": "value-a", "key-b": {"key-b-1": "content-b-1", "key-b-2": "content-b-2"}})
    );
    assert!(config.try_get("a.no-exists.no-exists").is_none());

    // getConfig
    let Entry::Config(b_config) = config.get_config("b").unwrap() else {
        panic!("expected a nested config");
    };
    assert_eq!(b_config.get("key-c.key-c-2").unwrap(), json!("content-c-2"));
    let Entry::Value(value) = config.get_config("b.key-c.key-c-2").unwrap() else {
        panic!("expected a plain value");
    };
    assert_eq!(value, json!("content-c-2"));

    // has
    assert!(config.has("a"));
    assert!(!config.has("no-exist"));

    // set
    config.set("a.b", "a-b", false).unwrap();
    assert_eq!(config.tree()["a"]["b"], json!("a-b"));

    // set with another config
    let mut another = Config::new();
    another.use_source(json!({"a": {"c": "CC"}})).unwrap();
    config.set("aa", &another, false).unwrap();
    assert_eq!(config.get("aa").unwrap(), json!({"a": {"c": "CC"}}));

    // use another config
    config.use_source(&another).unwrap();
    assert_eq!(config.get("a.c").unwrap(), json!("CC"));
    assert_eq!(config.get("a.key-a").unwrap(), json!("value-a"));

    // delete
    config.delete("a.b", false).unwrap();
    assert!(!config.has("a.b"));
}

#[test]
fn test_nested_config_shares_no_state() {
    let mut donor = Config::from_value(json!({"shared": {"x": 1}})).unwrap();
    let mut receiver = Config::new();
    receiver.use_source(Source::from(&donor)).unwrap();

    donor.set("shared.x", 2, true).unwrap();
    receiver.set("shared.y", 3, false).unwrap();

    assert_eq!(receiver.get("shared").unwrap(), json!({"x": 1, "y": 3}));
    assert_eq!(donor.get("shared").unwrap(), json!({"x": 2}));
}

#[test]
fn test_loaded_configs_are_independent() {
    let temp = create_configs();
    let dir = temp.path().join("configs");

    let mut first = Config::new();
    first.load(&dir).unwrap();
    let mut second = Config::new();
    second.load(&dir).unwrap();

    first.set("a.key-a", "changed", true).unwrap();
    assert_eq!(second.get("a.key-a").unwrap(), json!("value-a"));
}

#[test]
fn test_later_sources_win() {
    let temp = create_configs();
    let mut config = Config::from_value(json!({"a": {"key-a": "inline", "extra": true}})).unwrap();
    config.load(temp.path().join("configs")).unwrap();

    assert_eq!(config.get("a.key-a").unwrap(), json!("value-a"));
    assert_eq!(config.get("a.extra").unwrap(), json!(true));
}

#[test]
fn test_reset_then_reuse() {
    let temp = create_configs();
    let mut config = Config::new();
    config.load(temp.path().join("configs")).unwrap();
    config.reset();
    assert_eq!(config.tree(), &json!({}));
    assert!(config.config_path().is_none());

    config.use_source(json!({"fresh": 1})).unwrap();
    assert_eq!(config.tree(), &json!({"fresh": 1}));
}

#[tokio::test]
async fn test_use_source_async() {
    let temp = create_configs();
    let mut config = Config::new()
        .with_root(temp.path())
        .with_tags(TagSet::from_specs([":test"]));

    config.use_source_async(Source::path("configs")).await.unwrap();
    config.use_source_async(json!({"added": "inline"})).await.unwrap();

    assert_eq!(config.get("server.host").unwrap(), json!("127.0.0.1"));
    assert_eq!(config.get("added").unwrap(), json!("inline"));
}

#[tokio::test]
async fn test_use_source_async_propagates_errors() {
    let temp = create_configs();
    write(&temp.path().join("configs"), "a/dup.json", "{}");

    let mut config = Config::new();
    let err = config
        .use_source_async(temp.path().join("configs"))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::DuplicateKey);
    assert_eq!(config.tree(), &json!({}));
}
