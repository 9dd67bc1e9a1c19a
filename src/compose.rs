//! Directory composition.
//!
//! Walks a config directory and builds one nested object from it:
//! - `name.<ext>` with a registered loader becomes key `name`
//! - a subdirectory `name/` becomes key `name`, composed recursively
//! - files without a loader and special files are skipped
//!
//! Two entries claiming the same key in one directory (`a.json` and `a/`, or
//! `a.json` and `a.yaml`) abort the walk with `DuplicateKey`. A directory
//! reached again through a symlink while it is still being composed aborts
//! with `CyclicPath`. Any other per-entry failure is logged and only that
//! entry is left out.

use crate::error::{ConfigError, ErrorCode, Result};
use crate::loaders::LoaderRegistry;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What an entry contributes to its parent object.
#[derive(Debug, Clone, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

/// A directory entry that claims a key.
#[derive(Debug, Clone)]
struct Claim {
    path: PathBuf,
    kind: EntryKind,
}

/// Composes config directories using a loader registry.
#[derive(Debug, Clone)]
pub struct Composer<'a> {
    loaders: &'a LoaderRegistry,
    max_depth: Option<usize>,
}

impl<'a> Composer<'a> {
    pub fn new(loaders: &'a LoaderRegistry) -> Self {
        Self {
            loaders,
            max_depth: None,
        }
    }

    /// Cap on directory nesting below the root (root is depth 0).
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Compose a directory into an object.
    pub fn compose(&self, dir: &Path) -> Result<Value> {
        debug!(path = %dir.display(), "composing config directory");
        let canonical =
            std::fs::canonicalize(dir).map_err(|e| ConfigError::read_failed(dir, e))?;
        if !canonical.is_dir() {
            return Err(ConfigError::read_failed(dir, "not a directory"));
        }

        let mut ancestors = Vec::new();
        let map = self.compose_dir(dir, canonical, &mut ancestors, 0)?;
        debug!(path = %dir.display(), keys = map.len(), "composed config directory");
        Ok(Value::Object(map))
    }

    fn compose_dir(
        &self,
        dir: &Path,
        canonical: PathBuf,
        ancestors: &mut Vec<PathBuf>,
        depth: usize,
    ) -> Result<Map<String, Value>> {
        if ancestors.contains(&canonical) {
            return Err(ConfigError::cyclic_path(dir));
        }
        if let Some(max) = self.max_depth
            && depth > max
        {
            return Err(ConfigError::new(
                ErrorCode::CyclicPath,
                format!(
                    "Directory {} is nested deeper than the limit of {}",
                    dir.display(),
                    max
                ),
            )
            .with_path(dir.display().to_string()));
        }

        let claims = self.claim_entries(dir)?;

        ancestors.push(canonical);
        let result = self.load_claims(claims, ancestors, depth);
        ancestors.pop();
        result
    }

    /// List a directory and work out which key each entry would contribute.
    ///
    /// Claims are made before anything is loaded, so duplicate detection does
    /// not depend on listing order or on whether a load later fails.
    fn claim_entries(&self, dir: &Path) -> Result<BTreeMap<String, Claim>> {
        let entries = std::fs::read_dir(dir).map_err(|e| ConfigError::read_failed(dir, e))?;

        let mut claims: BTreeMap<String, Claim> = BTreeMap::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "failed to read directory entry");
                    continue;
                }
            };
            let path = entry.path();

            // Follows symlinks; broken links and permission errors are skipped.
            let metadata = match std::fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };

            let (name, kind) = if metadata.is_file() {
                if !self.loaders.supports(&path) {
                    debug!(path = %path.display(), "no loader for file, skipping");
                    continue;
                }
                (path.file_stem(), EntryKind::File)
            } else if metadata.is_dir() {
                (path.file_name(), EntryKind::Directory)
            } else {
                debug!(path = %path.display(), "skipping special file");
                continue;
            };

            let Some(name) = name.and_then(|n| n.to_str()).map(str::to_string) else {
                warn!(path = %path.display(), "skipping entry with a non UTF-8 name");
                continue;
            };

            if claims.contains_key(&name) {
                return Err(ConfigError::duplicate_key(&name, dir));
            }
            claims.insert(name, Claim { path, kind });
        }
        Ok(claims)
    }

    fn load_claims(
        &self,
        claims: BTreeMap<String, Claim>,
        ancestors: &mut Vec<PathBuf>,
        depth: usize,
    ) -> Result<Map<String, Value>> {
        let mut map = Map::new();
        for (name, claim) in claims {
            let loaded = match claim.kind {
                EntryKind::File => self.loaders.load_file(&claim.path),
                EntryKind::Directory => std::fs::canonicalize(&claim.path)
                    .map_err(|e| ConfigError::read_failed(&claim.path, e))
                    .and_then(|canonical| {
                        self.compose_dir(&claim.path, canonical, ancestors, depth + 1)
                    })
                    .map(Value::Object),
            };

            match loaded {
                Ok(value) => {
                    map.insert(name, value);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    warn!(
                        path = %claim.path.display(),
                        kind = ?claim.kind,
                        error = %err,
                        details = err.details.as_deref().unwrap_or(""),
                        "failed to load config entry, leaving it out"
                    );
                }
            }
        }
        Ok(map)
    }
}

/// Compose a directory with the given loaders and no depth cap.
pub fn compose(dir: &Path, loaders: &LoaderRegistry) -> Result<Value> {
    Composer::new(loaders).compose(dir)
}
