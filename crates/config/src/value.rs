//! The untyped configuration tree and the layered merge rule.

use serde_yaml::{Mapping, Value};

/// A configuration document: mappings, sequences, and scalars.
pub type ConfigValue = Value;

/// An empty mapping, the identity element of [`merge`].
pub fn empty() -> ConfigValue {
    Value::Mapping(Mapping::new())
}

/// Merge `overlay` into `base`.
///
/// Mappings merge key by key, recursively. Any other pair of values is
/// resolved by replacing `base` with `overlay`: sequences are never
/// concatenated and a null in `overlay` clears the value.
pub fn merge(base: &mut ConfigValue, overlay: ConfigValue) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Merge a sequence of documents in order; later documents win.
pub fn merge_all(documents: impl IntoIterator<Item = ConfigValue>) -> ConfigValue {
    documents.into_iter().fold(empty(), |mut acc, doc| {
        merge(&mut acc, doc);
        acc
    })
}

/// Look up a dotted key path (`agent.model.name`) in a tree.
pub fn get_path<'a>(tree: &'a ConfigValue, dotted: &str) -> Option<&'a ConfigValue> {
    dotted
        .split('.')
        .try_fold(tree, |node, segment| node.as_mapping()?.get(segment))
}
