//! File loaders keyed by extension.
//!
//! A loader turns one file into a configuration value. The registry maps a
//! lower-cased extension (no leading dot) to a loader and can be changed at
//! runtime. Defaults cover `json`, `yaml` and `yml`; `js`/`node` modules are
//! only understood when the host injects a module loader.

use crate::error::{ConfigError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A function that loads one file into a configuration value.
pub type Loader = Arc<dyn Fn(&Path) -> Result<Value> + Send + Sync>;

/// Extensions a host module loader is registered under.
pub const MODULE_EXTENSIONS: [&str; 2] = ["js", "node"];

/// Read and parse a JSON file.
pub fn load_json(path: &Path) -> Result<Value> {
    let content = read(path)?;
    serde_json::from_str(&content).map_err(|e| ConfigError::parse_failed(path, e))
}

/// Read and parse a YAML file.
///
/// An empty document loads as null. Merge keys (`<<: *anchor`) are applied
/// before the document is converted.
pub fn load_yaml(path: &Path) -> Result<Value> {
    let content = read(path)?;
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }
    let mut document: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::parse_failed(path, e))?;
    document
        .apply_merge()
        .map_err(|e| ConfigError::parse_failed(path, e))?;
    serde_json::to_value(document).map_err(|e| ConfigError::parse_failed(path, e))
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::read_failed(path, e))
}

/// Extension token of a file path, lower-cased, without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(str::to_lowercase)
}

/// Normalize a user-supplied extension into a registry key.
fn normalize_extension(extension: &str) -> Result<String> {
    let trimmed = extension.trim();
    let token = trimmed.strip_prefix('.').unwrap_or(trimmed);
    if token.is_empty() {
        return Err(ConfigError::invalid_loader(
            extension,
            "extension must be a non-empty string",
        ));
    }
    if token.contains(['.', '/', '\\']) || token.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid_loader(
            extension,
            "extension must be a single token without dots, slashes or spaces",
        ));
    }
    Ok(token.to_lowercase())
}

/// Extension to loader table.
#[derive(Clone)]
pub struct LoaderRegistry {
    loaders: BTreeMap<String, Loader>,
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        let mut loaders: BTreeMap<String, Loader> = BTreeMap::new();
        let json: Loader = Arc::new(load_json);
        let yaml: Loader = Arc::new(load_yaml);
        loaders.insert("json".to_string(), json);
        loaders.insert("yaml".to_string(), Arc::clone(&yaml));
        loaders.insert("yml".to_string(), yaml);
        Self { loaders }
    }
}

impl fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderRegistry")
            .field("extensions", &self.extensions())
            .finish()
    }
}

impl LoaderRegistry {
    /// Registry with the default JSON and YAML loaders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with no loaders at all.
    pub fn empty() -> Self {
        Self {
            loaders: BTreeMap::new(),
        }
    }

    /// Register a host-supplied module loader for `js` and `node` files.
    ///
    /// Each call returns a fresh value, so no two facades ever share a
    /// module's result.
    pub fn with_module_loader<F>(mut self, loader: F) -> Self
    where
        F: Fn(&Path) -> Result<Value> + Send + Sync + 'static,
    {
        let loader: Loader = Arc::new(loader);
        for ext in MODULE_EXTENSIONS {
            self.loaders.insert(ext.to_string(), Arc::clone(&loader));
        }
        self
    }

    /// Register (or replace) the loader for an extension.
    ///
    /// A leading dot is tolerated; the extension is stored lower-cased.
    pub fn register<F>(&mut self, extension: &str, loader: F) -> Result<&mut Self>
    where
        F: Fn(&Path) -> Result<Value> + Send + Sync + 'static,
    {
        self.register_shared(extension, Arc::new(loader))
    }

    /// Register an already shared loader.
    pub fn register_shared(&mut self, extension: &str, loader: Loader) -> Result<&mut Self> {
        let key = normalize_extension(extension)?;
        debug!(extension = %key, "registering file loader");
        self.loaders.insert(key, loader);
        Ok(self)
    }

    /// Remove the loader for an extension, returning whether one existed.
    pub fn unregister(&mut self, extension: &str) -> bool {
        match normalize_extension(extension) {
            Ok(key) => self.loaders.remove(&key).is_some(),
            Err(_) => false,
        }
    }

    /// Look up the loader for an extension.
    pub fn resolve(&self, extension: &str) -> Option<Loader> {
        let key = normalize_extension(extension).ok()?;
        self.loaders.get(&key).cloned()
    }

    /// Look up the loader for a file by its extension.
    pub fn resolve_for(&self, path: &Path) -> Option<Loader> {
        extension_of(path).and_then(|ext| self.loaders.get(&ext).cloned())
    }

    /// Whether a file would be picked up by any loader.
    pub fn supports(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| self.loaders.contains_key(&ext))
    }

    /// Registered extensions in sorted order.
    pub fn extensions(&self) -> Vec<&str> {
        self.loaders.keys().map(String::as_str).collect()
    }

    /// Load a single file.
    ///
    /// Fails with `UnsupportedExtension` when no loader is registered;
    /// directory composition treats that as a skip, not an error.
    pub fn load_file(&self, path: &Path) -> Result<Value> {
        let loader = self
            .resolve_for(path)
            .ok_or_else(|| ConfigError::unsupported_extension(path))?;
        debug!(path = %path.display(), "loading config file");
        loader(path)
    }
}
