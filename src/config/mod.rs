//! The configuration facade.
//!
//! A [`Config`] owns one composed tree and exposes it through key paths:
//! - `get` / `try_get` / `has` read a copy of a value
//! - `set` / `delete` edit in place, leniently or strictly
//! - `use_source` deep-merges an inline tree, another config, or a file or
//!   directory on disk into the current tree
//! - `select` replaces a top-level key with one of its named variants
//!
//! Relative on-disk paths are joined onto the configured root; nothing is
//! inferred from the process.

mod access;
mod source;

pub use source::Source;

use crate::error::{ConfigError, Result};
use crate::keypath::{DEFAULT_SEPARATOR, KeyPath};
use crate::loaders::LoaderRegistry;
use crate::merge::{kind_of, merge_into};
use crate::options::ConfigOptions;
use crate::select::select_variants;
use crate::tags::TagSet;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use source::{DiskLoader, in_memory_tree};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A config subtree: a nested config for objects, a plain value otherwise.
#[derive(Debug, Clone)]
pub enum Entry {
    Config(Config),
    Value(Value),
}

impl Entry {
    pub fn into_value(self) -> Value {
        match self {
            Entry::Config(config) => config.into_value(),
            Entry::Value(value) => value,
        }
    }
}

/// Composed configuration addressed by key paths.
#[derive(Debug, Clone)]
pub struct Config {
    tree: Value,
    separator: char,
    root: Option<PathBuf>,
    loaders: LoaderRegistry,
    tags: TagSet,
    max_depth: Option<usize>,
    selections: Vec<(String, String)>,
    config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tree: Value::Object(Map::new()),
            separator: DEFAULT_SEPARATOR,
            root: None,
            loaders: LoaderRegistry::default(),
            tags: TagSet::default(),
            max_depth: None,
            selections: Vec::new(),
            config_path: None,
        }
    }
}

impl Serialize for Config {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.tree.serialize(serializer)
    }
}

impl From<&Config> for Value {
    fn from(config: &Config) -> Self {
        config.tree.clone()
    }
}

impl From<Config> for Value {
    fn from(config: Config) -> Self {
        config.into_value()
    }
}

impl Config {
    /// Empty config with default loaders and no tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty config set up from options.
    pub fn with_options(options: &ConfigOptions) -> Self {
        Self {
            separator: options.separator,
            root: options.root.clone(),
            tags: options.tag_set(),
            max_depth: options.max_depth,
            selections: options.selection_pairs(),
            ..Self::default()
        }
    }

    /// Config holding an existing object.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut config = Self::new();
        config.use_source(Source::Inline(value))?;
        Ok(config)
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_loaders(mut self, loaders: LoaderRegistry) -> Self {
        self.loaders = loaders;
        self
    }

    /// Register a loader for files with `extension`.
    pub fn set_file_loader<F>(&mut self, extension: &str, loader: F) -> Result<&mut Self>
    where
        F: Fn(&Path) -> Result<Value> + Send + Sync + 'static,
    {
        self.loaders.register(extension, loader)?;
        Ok(self)
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn loaders(&self) -> &LoaderRegistry {
        &self.loaders
    }

    pub fn loaders_mut(&mut self) -> &mut LoaderRegistry {
        &mut self.loaders
    }

    pub fn tags(&self) -> &TagSet {
        &self.tags
    }

    /// The last on-disk path merged into this config.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// The whole tree.
    pub fn tree(&self) -> &Value {
        &self.tree
    }

    /// Consume the config and return its tree.
    pub fn into_value(self) -> Value {
        self.tree
    }

    fn parse(&self, path: &str) -> Result<KeyPath> {
        KeyPath::parse(path, self.separator)
    }

    /// Copy of the value at `path`.
    ///
    /// Fails with `NoSuchPath` if any segment is missing.
    pub fn get(&self, path: &str) -> Result<Value> {
        let key = self.parse(path)?;
        access::lookup(&self.tree, key.segments())
            .cloned()
            .ok_or_else(|| ConfigError::no_such_path(path))
    }

    /// Copy of the value at `path`, or `None` when missing or invalid.
    pub fn try_get(&self, path: &str) -> Option<Value> {
        self.get(path).ok()
    }

    /// Typed copy of the value at `path`.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get(path)?;
        serde_json::from_value(value).map_err(|e| {
            ConfigError::new(
                crate::error::ErrorCode::ParseFailed,
                format!("Value at '{}' has the wrong shape: {}", path, e),
            )
            .with_path(path)
        })
    }

    /// Whether `path` exists. Never fails.
    pub fn has(&self, path: &str) -> bool {
        self.parse(path)
            .map(|key| access::lookup(&self.tree, key.segments()).is_some())
            .unwrap_or(false)
    }

    /// Like [`get`](Self::get), but objects come back as their own config.
    ///
    /// The nested config shares settings (separator, loaders, tags, root)
    /// but no state with this one.
    pub fn get_config(&self, path: &str) -> Result<Entry> {
        let value = self.get(path)?;
        if !value.is_object() {
            return Ok(Entry::Value(value));
        }
        Ok(Entry::Config(Self {
            tree: value,
            config_path: None,
            ..self.clone_settings()
        }))
    }

    fn clone_settings(&self) -> Self {
        Self {
            tree: Value::Object(Map::new()),
            separator: self.separator,
            root: self.root.clone(),
            loaders: self.loaders.clone(),
            tags: self.tags.clone(),
            max_depth: self.max_depth,
            selections: self.selections.clone(),
            config_path: self.config_path.clone(),
        }
    }

    /// Write `value` at `path`.
    ///
    /// Missing intermediate objects are created unless `strict`, in which
    /// case every segment must already exist (`NoSuchPath` otherwise).
    /// Passing a `&Config` stores a copy of its tree.
    pub fn set(&mut self, path: &str, value: impl Into<Value>, strict: bool) -> Result<&mut Self> {
        let key = self.parse(path)?;
        let (parents, last) = key.split_last();
        access::insert(&mut self.tree, parents, last, value.into(), strict, path)?;
        Ok(self)
    }

    /// Remove the value at `path`.
    ///
    /// A missing path is a no-op unless `strict` (`NoSuchPath`).
    pub fn delete(&mut self, path: &str, strict: bool) -> Result<&mut Self> {
        let key = self.parse(path)?;
        let (parents, last) = key.split_last();
        if access::remove(&mut self.tree, parents, last).is_none() && strict {
            return Err(ConfigError::no_such_path(path));
        }
        Ok(self)
    }

    /// Merge a source into the tree; the source wins on conflicts.
    pub fn use_source(&mut self, source: impl Into<Source>) -> Result<&mut Self> {
        let value = match source.into() {
            Source::OnDisk(path) => {
                let path = self.resolve_path(&path);
                let value = self.disk_loader().load(&path)?;
                self.config_path = Some(path);
                value
            }
            other => in_memory_tree(other)?,
        };
        self.absorb(value)
    }

    /// [`use_source`](Self::use_source) with disk access on a blocking thread.
    pub async fn use_source_async(&mut self, source: impl Into<Source>) -> Result<&mut Self> {
        let value = match source.into() {
            Source::OnDisk(path) => {
                let path = self.resolve_path(&path);
                let loader = self.disk_loader();
                let load_path = path.clone();
                let value = tokio::task::spawn_blocking(move || loader.load(&load_path))
                    .await
                    .map_err(ConfigError::internal)??;
                self.config_path = Some(path);
                value
            }
            other => in_memory_tree(other)?,
        };
        self.absorb(value)
    }

    /// Shorthand for merging a file or directory.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        self.use_source(Source::path(path.as_ref()))
    }

    /// Replace top-level keys with their chosen variants.
    pub fn select<N: AsRef<str>, C: AsRef<str>>(&mut self, selections: &[(N, C)]) -> &mut Self {
        let tree = std::mem::take(&mut self.tree);
        self.tree = select_variants(tree, selections);
        self
    }

    /// Apply the configured tags to the current tree.
    pub fn resolve_tags(&mut self) -> &mut Self {
        let tree = std::mem::take(&mut self.tree);
        self.tree = self.tags.resolve(tree);
        self
    }

    /// Clear the tree.
    pub fn reset(&mut self) -> &mut Self {
        self.tree = Value::Object(Map::new());
        self.config_path = None;
        self
    }

    fn absorb(&mut self, value: Value) -> Result<&mut Self> {
        if !value.is_object() {
            return Err(ConfigError::not_an_object("<source>", kind_of(&value)));
        }
        debug!(
            keys = value.as_object().map_or(0, Map::len),
            "merging source into config"
        );
        merge_into(&mut self.tree, value);
        Ok(self)
    }

    fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn disk_loader(&self) -> DiskLoader {
        DiskLoader {
            loaders: self.loaders.clone(),
            tags: self.tags.clone(),
            max_depth: self.max_depth,
            selections: self.selections.clone(),
        }
    }
}
