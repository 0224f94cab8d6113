//! Layering of configuration documents.
//!
//! Each tier is parsed into a `serde_json::Value` and folded over the previous
//! ones before the result is deserialized into `Config`, so a tier only has
//! to mention the keys it changes.

use serde_json::Value;

/// Fold `overlay` into `base` in place.
///
/// Mappings merge key by key. A null in the overlay is treated as "unset" and
/// keeps the base value. Everything else (scalars, sequences) replaces.
pub fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        if !value.is_null() {
                            base_map.insert(key, value);
                        }
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}

/// Merge tiers lowest priority first.
pub fn merge_layers(layers: impl IntoIterator<Item = Value>) -> Value {
    let mut merged = Value::Null;
    for layer in layers {
        merge_into(&mut merged, layer);
    }
    merged
}
