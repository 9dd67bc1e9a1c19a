//! Tag based variant overlays.
//!
//! A key such as `host:test` is a tagged variant of its sibling `host` when
//! the tag `:test` is active. Resolving a tree copies every tagged variant
//! onto its untagged sibling with [`merge_into`], the tagged value winning.
//!
//! Tags are either literal suffixes or patterns (`regex-lite` syntax). A
//! pattern tags a key when it can match a non-empty tail of the key; the
//! longest such tail is stripped.
//!
//! Overlays are collected over the whole tree first (children before parents)
//! and applied afterwards, so the result does not depend on where in the walk
//! an overlay was found. An overlay can carry tagged keys onto an untagged
//! sibling, so the walk repeats until the tree stops changing.

use crate::merge::merge_into;
use regex_lite::Regex;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

/// Upper bound on overlay walks before giving up on a settled tree.
const MAX_PASSES: usize = 16;

/// A single tag: a literal suffix or a pattern.
#[derive(Debug, Clone)]
pub enum Tag {
    Suffix(String),
    /// `source` is the pattern as written; `re` is anchored at the end.
    Pattern { source: String, re: Regex },
}

impl Tag {
    /// Literal suffix tag. Blank suffixes are not tags.
    pub fn suffix(suffix: impl Into<String>) -> Option<Self> {
        let suffix = suffix.into();
        if suffix.trim().is_empty() {
            None
        } else {
            Some(Tag::Suffix(suffix))
        }
    }

    /// Pattern tag. Invalid or empty patterns are not tags.
    pub fn pattern(pattern: &str) -> Option<Self> {
        if pattern.is_empty() {
            return None;
        }
        match Regex::new(&format!("(?:{pattern})$")) {
            Ok(re) => Some(Tag::Pattern {
                source: pattern.to_string(),
                re,
            }),
            Err(e) => {
                warn!(pattern, error = %e, "ignoring invalid tag pattern");
                None
            }
        }
    }

    /// Parse a tag spec: `/regex/` is a pattern, anything else a suffix.
    pub fn parse(spec: &str) -> Option<Self> {
        match spec
            .strip_prefix('/')
            .and_then(|rest| rest.strip_suffix('/'))
        {
            Some(pattern) => Tag::pattern(pattern),
            _ => Tag::suffix(spec),
        }
    }

    /// Strip this tag from the end of `name`.
    ///
    /// Returns `None` when the tag does not end `name`, or when stripping
    /// would leave nothing behind.
    pub fn strip<'a>(&self, name: &'a str) -> Option<&'a str> {
        let stripped = match self {
            Tag::Suffix(suffix) => name.strip_suffix(suffix.as_str())?,
            Tag::Pattern { re, .. } => {
                let m = re.find(name).filter(|m| m.start() < m.end())?;
                &name[..m.start()]
            }
        };
        if stripped.is_empty() {
            None
        } else {
            Some(stripped)
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Suffix(suffix) => f.write_str(suffix),
            Tag::Pattern { source, .. } => write!(f, "/{source}/"),
        }
    }
}

/// One overlay found during the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Overlay {
    /// Keys from the root to the object holding both siblings.
    parent: Vec<String>,
    tagged: String,
    detagged: String,
}

/// The active set of tags.
#[derive(Debug, Clone, Default)]
pub struct TagSet {
    tags: Vec<Tag>,
    prune_tagged: bool,
}

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from tag specs, dropping blank and invalid entries.
    pub fn from_specs<I, S>(specs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = specs
            .into_iter()
            .filter_map(|spec| {
                let spec = spec.as_ref();
                let tag = Tag::parse(spec);
                if tag.is_none() {
                    debug!(spec, "dropping empty or invalid tag");
                }
                tag
            })
            .collect();
        Self {
            tags,
            prune_tagged: false,
        }
    }

    /// Remove tagged keys once every overlay has been applied.
    pub fn with_prune_tagged(mut self, prune: bool) -> Self {
        self.prune_tagged = prune;
        self
    }

    pub fn push(&mut self, tag: Tag) -> &mut Self {
        self.tags.push(tag);
        self
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn prunes_tagged(&self) -> bool {
        self.prune_tagged
    }

    /// The untagged name for `name`, if any active tag ends it.
    ///
    /// Every tag is tried and the last one that matches wins. Stacked tags
    /// (`host:a:b` with both `:a` and `:b` active) are stripped down to the
    /// bare key, so an overlay never creates a key that is itself tagged.
    pub fn detag(&self, name: &str) -> Option<String> {
        let mut current = self.strip_once(name)?;
        while let Some(next) = self.strip_once(current) {
            current = next;
        }
        Some(current.to_string())
    }

    fn strip_once<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.tags.iter().filter_map(|tag| tag.strip(name)).last()
    }

    /// Apply every tagged overlay in `tree`.
    pub fn resolve(&self, mut tree: Value) -> Value {
        if self.is_empty() {
            return tree;
        }

        for pass in 1..=MAX_PASSES {
            let before = tree.clone();
            self.apply_overlays(&mut tree);
            if identical(&tree, &before) {
                debug!(pass, "tag overlays settled");
                break;
            }
            if pass == MAX_PASSES {
                warn!(passes = MAX_PASSES, "tag overlays did not settle");
            }
        }

        if self.prune_tagged {
            self.prune(&mut tree);
        }
        tree
    }

    fn apply_overlays(&self, tree: &mut Value) {
        let mut overlays = Vec::new();
        let mut prefix = Vec::new();
        self.collect(tree, &mut prefix, &mut overlays);
        debug!(count = overlays.len(), "applying tag overlays");

        for overlay in &overlays {
            apply(tree, overlay);
        }
    }

    /// Remove every tagged key left in `value`, including copies that
    /// overlays carried onto untagged siblings.
    fn prune(&self, value: &mut Value) {
        let Value::Object(map) = value else {
            return;
        };
        map.retain(|key, _| self.detag(key).is_none());
        for child in map.values_mut() {
            self.prune(child);
        }
    }

    fn collect(&self, value: &Value, prefix: &mut Vec<String>, out: &mut Vec<Overlay>) {
        let Value::Object(map) = value else {
            return;
        };
        for (key, child) in map {
            prefix.push(key.clone());
            self.collect(child, prefix, out);
            prefix.pop();

            if let Some(detagged) = self.detag(key) {
                out.push(Overlay {
                    parent: prefix.clone(),
                    tagged: key.clone(),
                    detagged,
                });
            }
        }
    }
}

/// Resolve `tree` against `tags`.
pub fn resolve_tags(tree: Value, tags: &TagSet) -> Value {
    tags.resolve(tree)
}

/// Equality that also requires object keys in the same order, since the order
/// decides which overlay is applied last on the next walk.
fn identical(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|((ka, va), (kb, vb))| ka == kb && identical(va, vb))
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| identical(x, y))
        }
        _ => a == b,
    }
}

fn object_at_mut<'a>(tree: &'a mut Value, path: &[String]) -> Option<&'a mut Map<String, Value>> {
    let mut current = tree;
    for key in path {
        current = current.as_object_mut()?.get_mut(key)?;
    }
    current.as_object_mut()
}

fn apply(tree: &mut Value, overlay: &Overlay) {
    let Some(parent) = object_at_mut(tree, &overlay.parent) else {
        debug!(parent = ?overlay.parent, "tag overlay target no longer an object");
        return;
    };
    let Some(tagged_value) = parent.get(&overlay.tagged).cloned() else {
        return;
    };
    match parent.get_mut(&overlay.detagged) {
        Some(existing) => merge_into(existing, tagged_value),
        None => {
            parent.insert(overlay.detagged.clone(), tagged_value);
        }
    }
}
