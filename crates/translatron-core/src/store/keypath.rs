//! Dot-path helpers for nested translation documents.
//!
//! A key like `menu.settings.title` addresses a leaf string inside nested
//! JSON objects. These helpers translate between the nested representation
//! stored on disk and the flat dot-path maps the editors work with.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Set `path` to `value`, creating intermediate objects as needed.
/// A non-object intermediate is replaced by an object.
pub fn set(doc: &mut Value, path: &str, value: Value) {
    if !doc.is_object() {
        *doc = Value::Object(Map::new());
    }
    let Some(map) = doc.as_object_mut() else {
        return;
    };
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            set(child, rest, value);
        }
    }
}

/// Look up the value at `path`, if present.
pub fn get<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(doc, |node, segment| node.as_object()?.get(segment))
}

/// Remove the value at `path`, returning it if it was present.
/// Intermediate objects emptied by the removal are left in place.
pub fn remove(doc: &mut Value, path: &str) -> Option<Value> {
    match path.split_once('.') {
        None => doc.as_object_mut()?.remove(path),
        Some((head, rest)) => remove(doc.as_object_mut()?.get_mut(head)?, rest),
    }
}

/// Flatten a nested document into `dot.path -> string` pairs.
/// Non-string leaves are not translations and are skipped.
pub fn flatten(doc: &Value) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    collect(doc, String::new(), &mut out);
    out
}

fn collect(node: &Value, prefix: String, out: &mut BTreeMap<String, String>) {
    match node {
        Value::Object(map) => {
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                collect(child, path, out);
            }
        }
        Value::String(text) => {
            if !prefix.is_empty() {
                out.insert(prefix, text.clone());
            }
        }
        _ => {}
    }
}
