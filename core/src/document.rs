use serde_json::{Map, Value};
use std::sync::Arc;

pub type DocId = String;

static NULL: Value = Value::Null;

/// Derives the id of a document. Must be deterministic and unique across the
/// live document set; colliding ids overwrite each other.
pub type IdFunction = Arc<dyn Fn(&Value) -> Option<DocId> + Send + Sync>;

/// Reads the document's `id` member. Numeric ids use their JSON text.
pub fn default_id_function(doc: &Value) -> Option<DocId> {
    match doc.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Text for a field value, or `None` when the value is not worth indexing
/// (`null`, `false`, `0`, `""`, nested objects).
pub fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Value::Bool(true) => Some("true".to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items
                .iter()
                .filter(|v| !v.is_array() && !v.is_object())
                .filter_map(field_text)
                .collect();
            if parts.is_empty() { None } else { Some(parts.join(" ")) }
        }
        _ => None,
    }
}

/// Values to tokenize: the named fields when given, otherwise every field
/// except `id`. Missing fields come back as `Value::Null`.
pub fn indexable_values<'a>(doc: &'a Value, fields: Option<&[String]>) -> Vec<&'a Value> {
    match fields {
        Some(fields) => fields
            .iter()
            .map(|f| doc.get(f).unwrap_or(&NULL))
            .collect(),
        None => match doc.as_object() {
            Some(obj) => obj
                .iter()
                .filter(|(k, _)| k.as_str() != "id")
                .map(|(_, v)| v)
                .collect(),
            None => Vec::new(),
        },
    }
}

/// Copy of `doc` with the excluded fields removed.
pub fn strip_exclusions(doc: &Value, exclusions: &[String]) -> Value {
    if exclusions.is_empty() {
        return doc.clone();
    }
    match doc.as_object() {
        Some(obj) => {
            let kept: Map<String, Value> = obj
                .iter()
                .filter(|(k, _)| !exclusions.iter().any(|e| e == *k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            Value::Object(kept)
        }
        None => doc.clone(),
    }
}
