//! Submission serialization: the flat `field → string` map the backend's
//! "complete flow" and "update CV" endpoints accept.
//!
//! Header fields are flattened to `header.<field id>` with their raw value, textarea
//! sections map to their raw text, and every structured section becomes one JSON blob
//! keyed by its section id.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::cv::model::{Document, SectionBody};

pub fn to_submission_fields(document: &Document) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    for section in &document.sections {
        match &section.body {
            SectionBody::Object { fields: header } => {
                for field in header {
                    fields.insert(format!("{}.{}", section.id, field.id), field.value.clone());
                }
            }
            SectionBody::Textarea { value } => {
                fields.insert(section.id.clone(), value.clone());
            }
            SectionBody::List { items, .. } => {
                insert_json(&mut fields, &section.id, serde_json::to_value(items));
            }
            SectionBody::NestedList { categories } => {
                insert_json(&mut fields, &section.id, serde_json::to_value(categories));
            }
            SectionBody::Interests { items } => {
                insert_json(&mut fields, &section.id, serde_json::to_value(items));
            }
        }
    }

    fields
}

fn insert_json(
    fields: &mut BTreeMap<String, String>,
    key: &str,
    value: Result<Value, serde_json::Error>,
) {
    match value {
        Ok(value) => {
            fields.insert(key.to_string(), value.to_string());
        }
        Err(e) => warn!("Could not serialize section '{key}' for submission: {e}"),
    }
}
