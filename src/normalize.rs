//! Schema normalization - canonicalizes a raw schema node before synthesis.
//!
//! Steps, in order: boolean schemas become objects, `allOf` branches are
//! merged, `type: "object"` is inferred, `nullable` folds into `type`, and a
//! `type` array is reduced (collapsing to a string when one entry remains).

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::error::{GenerateError, ResolveError};
use crate::loader::navigate_pointer;
use crate::resolver::ReferenceResolver;
use crate::types::{declared_id, is_truthy, json_type_name, NormalizedSchema, Schema, SchemaId, ID_KEYS};

/// Normalize `schema`, or the sub-schema at `pointer` within it.
///
/// A sub-schema keeps the empty id unless it declares its own.
///
/// # Errors
///
/// Returns `GenerateError::Resolve` if an `allOf` branch references an
/// unregistered schema or `pointer` does not exist.
pub fn normalize(
    resolver: &ReferenceResolver,
    schema: &Schema,
    pointer: Option<&str>,
) -> Result<NormalizedSchema, GenerateError> {
    normalize_guarded(resolver, schema, pointer, &mut Vec::new())
}

fn normalize_guarded(
    resolver: &ReferenceResolver,
    schema: &Schema,
    pointer: Option<&str>,
    merging: &mut Vec<SchemaId>,
) -> Result<NormalizedSchema, GenerateError> {
    let (id, content) = match pointer {
        None => (schema.id.clone(), &schema.content),
        Some(pointer) => {
            let content = navigate_pointer(&schema.content, pointer).ok_or_else(|| {
                ResolveError::PointerNotFound {
                    document: schema.id.absolute_id(),
                    pointer: pointer.to_string(),
                }
            })?;
            let id = content
                .as_object()
                .and_then(declared_id)
                .and_then(|declared| schema.id.join(declared).ok())
                .unwrap_or_default();
            (id, content)
        }
    };

    let mut content = match content {
        Value::Object(map) => map.clone(),
        Value::Bool(false) => never_content(),
        Value::Bool(true) => Map::new(),
        other => {
            debug!("treating {} schema at {} as empty", json_type_name(other), id);
            Map::new()
        }
    };

    merge_all_of(resolver, &mut content, merging)?;

    if !content.contains_key("type")
        && (content.get("properties").is_some_and(is_truthy)
            || content.get("additionalProperties").is_some_and(is_truthy))
    {
        content.insert("type".to_string(), json!("object"));
    }

    if content.remove("nullable").is_some_and(|v| is_truthy(&v)) {
        match content.get_mut("type") {
            None => {
                content.insert("type".to_string(), json!("null"));
            }
            Some(Value::Array(types)) => types.push(json!("null")),
            Some(other) => *other = json!([other.clone(), "null"]),
        }
    }

    if let Some(Value::Array(types)) = content.get("type") {
        let mut reduced = reduce_types(types);
        match reduced.len() {
            0 => {
                content.remove("type");
            }
            1 => {
                content.insert("type".to_string(), reduced.remove(0));
            }
            _ => {
                content.insert("type".to_string(), Value::Array(reduced));
            }
        }
    }

    Ok(NormalizedSchema { id, content })
}

fn never_content() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("not".to_string(), json!({}));
    map
}

/// Merge every `allOf` branch into `content` and drop the key.
///
/// `$ref` branches are dereferenced and normalized first; inline branches
/// have their own `allOf` flattened. Branch identifiers are not merged.
fn merge_all_of(
    resolver: &ReferenceResolver,
    content: &mut Map<String, Value>,
    merging: &mut Vec<SchemaId>,
) -> Result<(), GenerateError> {
    let Some(branches) = content.remove("allOf") else {
        return Ok(());
    };
    let Value::Array(branches) = branches else {
        return Ok(());
    };

    for branch in branches {
        let mut branch = match branch {
            Value::Object(map) => match map.get("$ref").and_then(Value::as_str) {
                Some(reference) => {
                    let target = resolver.dereference(reference)?;
                    if merging.contains(&target.id) {
                        warn!("skipping recursive allOf reference to {}", target.id);
                        continue;
                    }
                    merging.push(target.id.clone());
                    let normalized = normalize_guarded(resolver, target, None, merging);
                    merging.pop();
                    normalized?.content
                }
                None => {
                    let mut map = map;
                    merge_all_of(resolver, &mut map, merging)?;
                    map
                }
            },
            Value::Bool(false) => never_content(),
            _ => continue,
        };
        for key in ID_KEYS {
            branch.remove(*key);
        }
        merge_schema(content, branch);
    }
    Ok(())
}

/// Deep-merge `source` into `target`.
///
/// Objects merge key-wise, arrays are unioned without duplicates (first
/// occurrence order), and any other conflict is won by `source`.
pub fn merge_schema(target: &mut Map<String, Value>, source: Map<String, Value>) {
    for (key, value) in source {
        let replacement = match (target.get_mut(&key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_schema(existing, incoming);
                None
            }
            (Some(Value::Array(existing)), Value::Array(incoming)) => {
                for item in incoming {
                    if !existing.contains(&item) {
                        existing.push(item);
                    }
                }
                None
            }
            (Some(existing), value) => {
                if json_type_name(existing) != json_type_name(&value) {
                    warn!(
                        "allOf merge: {} is {} in one branch and {} in another",
                        key,
                        json_type_name(existing),
                        json_type_name(&value)
                    );
                }
                Some(value)
            }
            (None, value) => Some(value),
        };
        if let Some(value) = replacement {
            target.insert(key, value);
        }
    }
}

/// Deduplicate a `type` array; `integer` is dropped when `number` is present.
pub fn reduce_types(types: &[Value]) -> Vec<Value> {
    let mut reduced: Vec<Value> = Vec::new();
    for t in types {
        if !reduced.contains(t) {
            reduced.push(t.clone());
        }
    }
    if reduced.contains(&json!("number")) {
        reduced.retain(|t| t != "integer");
    }
    reduced
}
