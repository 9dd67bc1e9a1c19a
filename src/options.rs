//! Options for building a [`Config`](crate::Config).
//!
//! Options can be built in code or read from a YAML/JSON file:
//!
//! ```yaml
//! separator: "/"
//! root: /etc/myapp
//! tags: [":test", "/@(dev|local)$/"]
//! prune_tagged: true
//! max_depth: 8
//! select:
//!   - { name: env, choice: development }
//! ```

use crate::error::{ConfigError, Result};
use crate::keypath::DEFAULT_SEPARATOR;
use crate::loaders::LoaderRegistry;
use crate::tags::TagSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// One variant selection: replace top-level `name` with `name.choice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub name: String,
    pub choice: String,
}

impl Selection {
    pub fn new(name: impl Into<String>, choice: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            choice: choice.into(),
        }
    }

    /// Parse `name=choice`.
    pub fn parse(spec: &str) -> Option<Self> {
        let (name, choice) = spec.split_once('=')?;
        let (name, choice) = (name.trim(), choice.trim());
        if name.is_empty() || choice.is_empty() {
            return None;
        }
        Some(Self::new(name, choice))
    }
}

/// Loader options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigOptions {
    /// Key path separator (default: `.`).
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Base directory for relative on-disk sources.
    #[serde(default)]
    pub root: Option<PathBuf>,

    /// Active tags: literal suffixes, or `/pattern/`.
    #[serde(default)]
    pub tags: Vec<String>,

    /// Remove tagged keys after their overlays are applied (default: false).
    #[serde(default)]
    pub prune_tagged: bool,

    /// Maximum directory nesting when composing (default: unlimited).
    #[serde(default)]
    pub max_depth: Option<usize>,

    /// Variant selections applied after each on-disk load.
    #[serde(default)]
    pub select: Vec<Selection>,
}

impl Default for ConfigOptions {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            root: None,
            tags: Vec::new(),
            prune_tagged: false,
            max_depth: None,
            select: Vec::new(),
        }
    }
}

fn default_separator() -> char {
    DEFAULT_SEPARATOR
}

impl ConfigOptions {
    /// Load options from a YAML or JSON file.
    ///
    /// An empty file yields the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let value = LoaderRegistry::new().load_file(path)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        Self::from_value(value).map_err(|e| e.with_path(path.display().to_string()))
    }

    /// Deserialize options from an already loaded value.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| {
            ConfigError::new(
                crate::error::ErrorCode::ParseFailed,
                format!("Invalid options: {}", e),
            )
        })
    }

    /// The tag set these options describe.
    pub fn tag_set(&self) -> TagSet {
        TagSet::from_specs(&self.tags).with_prune_tagged(self.prune_tagged)
    }

    /// Selections as `(name, choice)` pairs.
    pub fn selection_pairs(&self) -> Vec<(String, String)> {
        self.select
            .iter()
            .map(|s| (s.name.clone(), s.choice.clone()))
            .collect()
    }
}
