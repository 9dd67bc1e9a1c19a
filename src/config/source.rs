//! Sources a [`Config`] can absorb.

use super::Config;
use crate::compose::Composer;
use crate::error::{ConfigError, Result};
use crate::loaders::LoaderRegistry;
use crate::merge::kind_of;
use crate::select::select_variants;
use crate::tags::TagSet;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Something to merge into a [`Config`].
#[derive(Debug, Clone)]
pub enum Source {
    /// An in-memory tree; must be an object.
    Inline(Value),
    /// Another config; its tree is copied, never shared.
    Nested(Box<Config>),
    /// A file (single loader call) or a directory (composed, then tags resolved).
    OnDisk(PathBuf),
}

impl Source {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Source::OnDisk(path.into())
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        Source::Inline(value)
    }
}

impl From<Config> for Source {
    fn from(config: Config) -> Self {
        Source::Nested(Box::new(config))
    }
}

impl From<&Config> for Source {
    fn from(config: &Config) -> Self {
        Source::Nested(Box::new(config.clone()))
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::OnDisk(path)
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::OnDisk(path.to_path_buf())
    }
}

/// Everything needed to load from disk without borrowing the config, so the
/// work can move onto a blocking thread.
#[derive(Debug, Clone)]
pub(crate) struct DiskLoader {
    pub loaders: LoaderRegistry,
    pub tags: TagSet,
    pub max_depth: Option<usize>,
    pub selections: Vec<(String, String)>,
}

impl DiskLoader {
    /// Load a file or directory into an object.
    pub fn load(&self, path: &Path) -> Result<Value> {
        let metadata = std::fs::metadata(path).map_err(|e| ConfigError::read_failed(path, e))?;

        let value = if metadata.is_dir() {
            let tree = Composer::new(&self.loaders)
                .with_max_depth(self.max_depth)
                .compose(path)?;
            self.tags.resolve(tree)
        } else if metadata.is_file() {
            self.loaders.load_file(path)?
        } else {
            return Err(ConfigError::read_failed(path, "not a file or directory"));
        };

        if !value.is_object() {
            return Err(ConfigError::not_an_object(
                &path.display().to_string(),
                kind_of(&value),
            ));
        }

        if self.selections.is_empty() {
            return Ok(value);
        }
        debug!(count = self.selections.len(), "applying variant selections");
        Ok(select_variants(value, &self.selections))
    }
}

/// Check an in-memory source is an object and take its tree.
pub(crate) fn in_memory_tree(source: Source) -> Result<Value> {
    match source {
        Source::Inline(value) if value.is_object() => Ok(value),
        Source::Inline(value) => Err(ConfigError::not_an_object("<inline>", kind_of(&value))),
        Source::Nested(config) => Ok(config.into_value()),
        Source::OnDisk(path) => Err(ConfigError::internal(format!(
            "{} is an on-disk source",
            path.display()
        ))),
    }
}
