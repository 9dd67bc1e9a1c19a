//! Deep merge of configuration trees.
//!
//! Objects merge key by key; anything else in the overlay replaces the base.
//! Arrays are replaced entirely, not concatenated. This is the only merge rule
//! used anywhere in the crate.

use serde_json::Value;

/// Deep merge two values, with `overlay` taking precedence over `base`.
///
/// - Objects are merged recursively: keys in overlay override keys in base
/// - Arrays, strings, numbers, booleans and nulls in overlay replace base
/// - Type mismatches resolve to overlay
///
/// Both inputs are consumed, so the result never aliases either of them.
///
/// # Example
/// ```
/// use serde_json::json;
/// use config_tree::merge::deep_merge;
///
/// let base = json!({
///     "server": { "port": 8080, "host": "localhost" },
///     "features": ["a", "b"]
/// });
/// let overlay = json!({
///     "server": { "port": 9000 },
///     "features": ["c"]
/// });
/// let result = deep_merge(base, overlay);
/// assert_eq!(result, json!({
///     "server": { "port": 9000, "host": "localhost" },
///     "features": ["c"]
/// }));
/// ```
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    let mut merged = base;
    merge_into(&mut merged, overlay);
    merged
}

/// Merge `overlay` into `target` in place.
///
/// Same semantics as [`deep_merge`]. Existing keys keep their position, new
/// keys are appended in overlay order.
pub fn merge_into(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target_map), Value::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                match target_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, overlay_value),
                    None => {
                        target_map.insert(key, overlay_value);
                    }
                }
            }
        }
        (target, overlay) => *target = overlay,
    }
}

/// Merge multiple values in order, with later values taking precedence.
///
/// Starts from an empty object, so the result of merging only objects is an
/// object even for an empty input.
pub fn deep_merge_all(values: impl IntoIterator<Item = Value>) -> Value {
    values
        .into_iter()
        .fold(Value::Object(Default::default()), deep_merge)
}

/// Short name for a value's kind, for error messages.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
