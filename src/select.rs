//! Variant selection.
//!
//! A top-level key can hold named variants, e.g.
//! `env: { development: {...}, production: {...} }`. Selecting
//! `env = development` removes `env` from the root and merges the chosen
//! variant into the root instead. Selections are merged in the order given,
//! after every selected key has been removed.

use crate::merge::merge_into;
use serde_json::Value;
use tracing::{debug, warn};

/// Apply `(name, choice)` selections to the root of `tree`.
///
/// Missing names are skipped. A present name with a missing choice is still
/// removed, and a warning is logged. Non-object roots are returned unchanged.
pub fn select_variants<N, C>(mut tree: Value, selections: &[(N, C)]) -> Value
where
    N: AsRef<str>,
    C: AsRef<str>,
{
    let Value::Object(root) = &mut tree else {
        return tree;
    };

    let mut chosen = Vec::new();
    for (name, choice) in selections {
        let (name, choice) = (name.as_ref(), choice.as_ref());
        let Some(variants) = root.shift_remove(name) else {
            debug!(name, "no variants to select from");
            continue;
        };
        match variants {
            Value::Object(mut variants) => match variants.shift_remove(choice) {
                Some(value) => {
                    debug!(name, choice, "selected variant");
                    chosen.push(value);
                }
                None => warn!(name, choice, "selected variant does not exist"),
            },
            other => warn!(
                name,
                choice,
                found = crate::merge::kind_of(&other),
                "can not select a variant from a non-object"
            ),
        }
    }

    for value in chosen {
        // Only objects merge into the root; anything else would replace it.
        if value.is_object() {
            merge_into(&mut tree, value);
        } else {
            warn!("ignoring selected variant that is not an object");
        }
    }
    tree
}
