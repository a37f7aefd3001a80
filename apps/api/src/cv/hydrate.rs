//! Hydration: builds a [`Document`] from the `editable_sections` JSON produced by the
//! upstream CV analysis.
//!
//! Upstream output is not contractually fixed, so hydration is permissive: scalars are
//! stringified, array fields are normalized to `[]`, items without ids get synthetic
//! ones. Sections that cannot be typed (unknown `type`, no `id`, not an object) are
//! dropped with a warning and are therefore never addressable by a recommendation.

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cv::model::{
    Document, EditableSection, FieldValue, HeaderField, ListItem, SectionBody, SectionKind,
    SkillCategory,
};
use crate::cv::recommendation::Recommendation;

#[derive(Debug, Error, PartialEq)]
pub enum HydrateError {
    #[error("section is not a JSON object")]
    NotAnObject,

    #[error("section has no id")]
    MissingId,

    #[error("section '{id}' has unknown type '{tag}'")]
    UnknownType { id: String, tag: String },

    #[error("section id '{0}' appears more than once")]
    DuplicateId(String),
}

/// The CV analysis payload handed over by the analysis service.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CvAnalysis {
    #[serde(default)]
    pub editable_sections: Value,
    #[serde(default)]
    pub detailed_analysis: DetailedAnalysis,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DetailedAnalysis {
    #[serde(default)]
    pub recommendations: Vec<Value>,
}

impl CvAnalysis {
    pub fn document(&self) -> Document {
        hydrate_document(&self.editable_sections)
    }

    /// Recommendations that deserialize; malformed ones are dropped with a warning.
    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.detailed_analysis
            .recommendations
            .iter()
            .filter_map(|raw| match Recommendation::deserialize(raw) {
                Ok(rec) => Some(rec),
                Err(e) => {
                    warn!("Dropping malformed recommendation: {e}");
                    None
                }
            })
            .collect()
    }
}

/// Builds a document from an `editable_sections` array. Anything that is not an array
/// yields an empty document.
pub fn hydrate_document(value: &Value) -> Document {
    let Some(raw_sections) = value.as_array() else {
        if !value.is_null() {
            warn!("editable_sections is not an array; starting from an empty document");
        }
        return Document::default();
    };

    let mut sections: Vec<EditableSection> = Vec::with_capacity(raw_sections.len());
    for raw in raw_sections {
        let result = hydrate_section(raw).and_then(|section| {
            if sections.iter().any(|s| s.id == section.id) {
                Err(HydrateError::DuplicateId(section.id))
            } else {
                Ok(section)
            }
        });
        match result {
            Ok(section) => sections.push(section),
            Err(e) => warn!("Skipping section during hydration: {e}"),
        }
    }

    debug!("Hydrated document with {} sections", sections.len());
    Document::new(sections)
}

/// Types one raw section.
pub fn hydrate_section(raw: &Value) -> Result<EditableSection, HydrateError> {
    let obj = raw.as_object().ok_or(HydrateError::NotAnObject)?;
    let id = obj
        .get("id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(HydrateError::MissingId)?
        .to_string();
    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| id.clone());
    let tag = obj.get("type").and_then(Value::as_str).unwrap_or_default();
    let kind = SectionKind::parse(tag).ok_or_else(|| HydrateError::UnknownType {
        id: id.clone(),
        tag: tag.to_string(),
    })?;

    let body = match kind {
        SectionKind::Object => SectionBody::Object {
            fields: hydrate_header_fields(obj.get("fields")),
        },
        SectionKind::List => hydrate_list(&id, obj),
        SectionKind::NestedList => SectionBody::NestedList {
            categories: hydrate_categories(obj.get("items")),
        },
        SectionKind::Textarea => SectionBody::Textarea {
            value: obj.get("value").map(textarea_text).unwrap_or_default(),
        },
        SectionKind::Interests => SectionBody::Interests {
            items: obj.get("items").map(string_list).unwrap_or_default(),
        },
    };

    Ok(EditableSection { id, name, body })
}

fn hydrate_header_fields(raw: Option<&Value>) -> Vec<HeaderField> {
    let Some(entries) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|field| {
            let id = field.get("id").and_then(Value::as_str).map(str::to_string);
            let name = field.get("name").and_then(Value::as_str).map(str::to_string);
            let (id, name) = match (id, name) {
                (Some(id), Some(name)) => (id, name),
                (Some(id), None) => (id.clone(), id),
                (None, Some(name)) => (name.to_lowercase(), name),
                (None, None) => return None,
            };
            Some(HeaderField {
                id,
                name,
                value: field.get("value").map(value_to_text).unwrap_or_default(),
            })
        })
        .collect()
}

fn hydrate_list(section_id: &str, obj: &Map<String, Value>) -> SectionBody {
    let raw_items: Vec<&Map<String, Value>> = obj
        .get("items")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default();

    let mut items: Vec<ListItem> = raw_items
        .iter()
        .enumerate()
        .map(|(index, raw)| list_item_from_map(raw, || format!("{section_id}_{index}")))
        .collect();

    let template = match obj.get("template").and_then(Value::as_object) {
        Some(raw) => {
            let mut template = list_item_from_map(raw, String::new);
            template.id.clear();
            template
        }
        None => derive_template(&items),
    };

    for item in &mut items {
        item.normalize_arrays(&template);
    }

    SectionBody::List { items, template }
}

/// Builds a list item from a JSON object. `fallback_id` is only called when the
/// object carries no usable id.
pub fn list_item_from_map(raw: &Map<String, Value>, fallback_id: impl FnOnce() -> String) -> ListItem {
    let mut item = ListItem::default();
    for (key, value) in raw {
        if ListItem::is_reserved(key) {
            continue;
        }
        let field = match value {
            Value::Array(_) => FieldValue::List(string_list(value)),
            other => FieldValue::Text(value_to_text(other)),
        };
        item.fields.insert(key.clone(), field);
    }
    item.id = raw
        .get("id")
        .map(value_to_text)
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(fallback_id);
    item
}

/// Zero-valued shape of the union of all item fields. Used when upstream sends no template.
fn derive_template(items: &[ListItem]) -> ListItem {
    let mut template = ListItem::default();
    for item in items {
        for (key, value) in &item.fields {
            template
                .fields
                .entry(key.clone())
                .or_insert_with(|| value.zeroed());
        }
    }
    template
}

fn hydrate_categories(raw: Option<&Value>) -> Vec<SkillCategory> {
    let Some(entries) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(Value::as_object)
        .enumerate()
        .map(|(index, category)| {
            let name = category
                .get("name")
                .or_else(|| category.get("category"))
                .map(value_to_text)
                .unwrap_or_default();
            let items = category
                .get("items")
                .or_else(|| category.get("skills"))
                .map(string_list)
                .unwrap_or_default();
            let id = category
                .get("id")
                .map(value_to_text)
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("category_{index}"));
            SkillCategory { id, name, items }
        })
        .collect()
}

/// Stringifies any JSON value: strings verbatim, `null` as empty, the rest as JSON text.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// String array from a JSON array (nulls dropped) or a comma-separated string.
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(entries) => entries
            .iter()
            .filter(|v| !v.is_null())
            .map(value_to_text)
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn textarea_text(value: &Value) -> String {
    match value {
        Value::Array(lines) => lines
            .iter()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join("\n"),
        other => value_to_text(other),
    }
}
