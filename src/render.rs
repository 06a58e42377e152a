//! Rendering of included resources as a JSON:API `included` array.

use serde_json::{json, Map, Value};

use crate::types::IncludedResources;

/// Render included resources as resource identifier objects.
///
/// Entries are sorted by type, then id. The segment and originating field
/// go into each object's `meta`.
pub fn render_included<H>(included: &IncludedResources<H>) -> Value {
    let mut entries: Vec<_> = included.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));

    let rendered = entries
        .into_iter()
        .map(|(digest, entry)| {
            let mut meta = Map::new();
            meta.insert("segment".to_string(), json!(entry.segment));
            if let Some(field) = &entry.field_name {
                meta.insert("field".to_string(), json!(field));
            }
            json!({
                "type": digest.resource_type,
                "id": digest.id,
                "meta": meta,
            })
        })
        .collect();

    Value::Array(rendered)
}
