//! Navigation of a tree by key path segments.
//!
//! Objects are addressed by key. Arrays are addressed by a segment that
//! parses as an index; an index past the end is a missing path.

use crate::error::{ConfigError, Result};
use crate::merge::kind_of;
use serde_json::{Map, Value};

fn index(segment: &str) -> Option<usize> {
    segment.parse().ok()
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => items.get(index(segment)?),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => items.get_mut(index(segment)?),
        _ => None,
    }
}

/// Value at `segments`, if every segment exists.
pub fn lookup<'a, S: AsRef<str>>(tree: &'a Value, segments: &[S]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(tree, |current, segment| child(current, segment.as_ref()))
}

/// Mutable value at `segments`, if every segment exists.
pub fn lookup_mut<'a, S: AsRef<str>>(tree: &'a mut Value, segments: &[S]) -> Option<&'a mut Value> {
    let mut current = tree;
    for segment in segments {
        current = child_mut(current, segment.as_ref())?;
    }
    Some(current)
}

/// Step one segment down for a write.
///
/// With `create`, a missing object key becomes an empty object. Stepping
/// through a scalar is never allowed.
fn descend<'a>(value: &'a mut Value, segment: &str, create: bool, path: &str) -> Result<&'a mut Value> {
    match value {
        Value::Object(map) => {
            if !map.contains_key(segment) {
                if !create {
                    return Err(ConfigError::no_such_path(path));
                }
                map.insert(segment.to_string(), Value::Object(Map::new()));
            }
            map.get_mut(segment)
                .ok_or_else(|| ConfigError::no_such_path(path))
        }
        Value::Array(items) => index(segment)
            .and_then(|i| items.get_mut(i))
            .ok_or_else(|| ConfigError::no_such_path(path)),
        other => Err(ConfigError::not_an_object(path, kind_of(other))),
    }
}

/// Write `value` at `parents` + `last`.
///
/// `strict` requires every segment, including the last, to exist already.
/// `path` is the caller's rendering of the key path, used in errors.
pub fn insert<S: AsRef<str>>(
    tree: &mut Value,
    parents: &[S],
    last: &str,
    value: Value,
    strict: bool,
    path: &str,
) -> Result<()> {
    let mut current = tree;
    for segment in parents {
        current = descend(current, segment.as_ref(), !strict, path)?;
    }

    match current {
        Value::Object(map) => {
            if strict && !map.contains_key(last) {
                return Err(ConfigError::no_such_path(path));
            }
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let slot = index(last)
                .and_then(|i| items.get_mut(i))
                .ok_or_else(|| ConfigError::no_such_path(path))?;
            *slot = value;
            Ok(())
        }
        other => Err(ConfigError::not_an_object(path, kind_of(other))),
    }
}

/// Remove the value at `parents` + `last`, returning it if it existed.
pub fn remove<S: AsRef<str>>(tree: &mut Value, parents: &[S], last: &str) -> Option<Value> {
    match lookup_mut(tree, parents)? {
        Value::Object(map) => map.shift_remove(last),
        Value::Array(items) => {
            let i = index(last).filter(|i| *i < items.len())?;
            Some(items.remove(i))
        }
        _ => None,
    }
}
