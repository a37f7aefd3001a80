//! Patch Applier: writes one resolved recommendation into the document.
//!
//! Every write validates first and mutates last, so a failed recommendation leaves the
//! document untouched. The section as it was before the write is captured in the
//! returned [`AppliedPatch`] so the ledger can offer a compensating revert.
//!
//! The applier does not detect repeats: applying the same `new_item` twice appends two
//! items with distinct ids. Callers deduplicate when they need to.

use serde_json::Value;
use tracing::debug;

use crate::cv::hydrate::{list_item_from_map, string_list, value_to_text};
use crate::cv::model::{Document, EditableSection, SectionBody, SkillCategory};
use crate::cv::recommendation::Recommendation;
use crate::patch::error::PatchError;
use crate::patch::ids::IdAllocator;
use crate::patch::ledger::ChangeKind;
use crate::patch::resolver::{resolve, PatchTarget};

/// A successful write, ready to be recorded in the ledger.
#[derive(Debug, Clone)]
pub struct AppliedPatch {
    pub kind: ChangeKind,
    pub section_id: String,
    pub description: String,
    /// The section before this write.
    pub before: EditableSection,
}

pub fn apply_recommendation(
    document: &mut Document,
    recommendation: &Recommendation,
    ids: &mut IdAllocator,
) -> Result<AppliedPatch, PatchError> {
    let target = resolve(document, &recommendation.section, &recommendation.field)?;
    debug!(
        "Resolved recommendation {} ({}/{}) to {:?}",
        recommendation.id, recommendation.section, recommendation.field, target
    );
    apply_to_target(document, &target, &recommendation.suggested, ids)
}

/// Writes `suggested` to an already-resolved target.
pub fn apply_to_target(
    document: &mut Document,
    target: &PatchTarget,
    suggested: &str,
    ids: &mut IdAllocator,
) -> Result<AppliedPatch, PatchError> {
    let section_index = target.section_index();
    let section = document
        .sections
        .get_mut(section_index)
        .ok_or_else(|| PatchError::SectionNotFound(format!("#{section_index}")))?;
    let before = section.clone();
    let section_id = section.id.clone();
    let section_name = section.name.clone();

    let (kind, description) = match (target, &mut section.body) {
        (PatchTarget::HeaderField { field, .. }, SectionBody::Object { fields }) => {
            let len = fields.len();
            let header = fields
                .get_mut(*field)
                .ok_or_else(|| out_of_range(&section_id, *field, len))?;
            header.value = suggested.to_string();
            (
                ChangeKind::FieldUpdated,
                format!("{section_name}: updated {}", header.name),
            )
        }
        (PatchTarget::ItemField { item, field, .. }, SectionBody::List { items, template }) => {
            let len = items.len();
            let entry = items
                .get_mut(*item)
                .ok_or_else(|| out_of_range(&section_id, *item, len))?;
            let written = if entry.is_array_field(field, template) {
                entry.set_array(field, parse_replacement_array(suggested))
            } else {
                entry.set_text(field, suggested)
            };
            if !written {
                return Err(PatchError::FieldNotFound {
                    section: section_id,
                    field: field.clone(),
                });
            }
            (
                ChangeKind::FieldUpdated,
                format!("{section_name}: updated {field} of {}", entry.label()),
            )
        }
        (PatchTarget::ItemField { item, field, .. }, SectionBody::NestedList { categories }) => {
            let len = categories.len();
            let category = categories
                .get_mut(*item)
                .ok_or_else(|| out_of_range(&section_id, *item, len))?;
            match field.as_str() {
                "name" | "category" => category.name = suggested.to_string(),
                "items" | "skills" => category.items = parse_replacement_array(suggested),
                _ => {
                    return Err(PatchError::FieldNotFound {
                        section: section_id,
                        field: field.clone(),
                    })
                }
            }
            (
                ChangeKind::FieldUpdated,
                format!("{section_name}: updated {field} of category {}", category.name),
            )
        }
        (PatchTarget::InsertItem { .. }, SectionBody::List { items, template }) => {
            let payload = parse_object_payload(&section_id, suggested)?;
            let mut item = template.clone();
            let incoming = list_item_from_map(&payload, String::new);
            item.fields.extend(incoming.fields);
            item.id = ids.allocate(&section_id);
            item.normalize_arrays(template);
            let label = item.label();
            items.push(item);
            (ChangeKind::ItemAdded, format!("{section_name}: added {label}"))
        }
        (PatchTarget::InsertCategory { .. }, SectionBody::NestedList { categories }) => {
            let payload = parse_object_payload(&section_id, suggested)?;
            let name = payload
                .get("name")
                .or_else(|| payload.get("category"))
                .map(value_to_text)
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| "Other".to_string());
            let skills = payload
                .get("items")
                .or_else(|| payload.get("skills"))
                .map(string_list)
                .unwrap_or_default();
            let description = format!("{section_name}: added category {name}");
            categories.push(SkillCategory {
                id: ids.allocate("category"),
                name,
                items: skills,
            });
            (ChangeKind::CategoryAdded, description)
        }
        (
            PatchTarget::SkillSlot {
                category, skill, ..
            },
            SectionBody::NestedList { categories },
        ) => {
            // Categories may have changed since the recommendation was created.
            let len = categories.len();
            let category = categories
                .get_mut(*category)
                .ok_or_else(|| out_of_range(&section_id, *category, len))?;
            let len = category.items.len();
            let slot = category
                .items
                .get_mut(*skill)
                .ok_or_else(|| out_of_range(&section_id, *skill, len))?;
            let previous = std::mem::replace(slot, suggested.to_string());
            (
                ChangeKind::SkillUpdated,
                format!("{section_name}: replaced {previous} with {suggested}"),
            )
        }
        (PatchTarget::SectionValue { .. }, SectionBody::Textarea { value }) => {
            *value = suggested.to_string();
            (ChangeKind::FieldUpdated, format!("{section_name}: rewritten"))
        }
        (PatchTarget::AppendInterest { .. }, SectionBody::Interests { items }) => {
            let interest = suggested.trim();
            if interest.is_empty() {
                return Err(PatchError::MalformedPayload {
                    section: section_id,
                    message: "empty interest".to_string(),
                });
            }
            items.push(interest.to_string());
            (ChangeKind::ItemAdded, format!("{section_name}: added {interest}"))
        }
        (PatchTarget::ReplaceInterests { .. }, SectionBody::Interests { items }) => {
            *items = parse_replacement_array(suggested);
            (ChangeKind::FieldUpdated, format!("{section_name}: replaced list"))
        }
        (target, body) => {
            // The target was resolved against a different section shape.
            debug!("Target {target:?} does not fit a {} section", body.kind().as_str());
            return Err(PatchError::FieldNotFound {
                section: section_id,
                field: format!("{target:?}"),
            });
        }
    };

    Ok(AppliedPatch {
        kind,
        section_id,
        description,
        before,
    })
}

/// Bulk replacement value for an array field: a JSON string array, otherwise one entry
/// per non-empty line, otherwise a comma-separated list.
pub fn parse_replacement_array(suggested: &str) -> Vec<String> {
    if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(suggested) {
        return string_list(&value);
    }
    let lines: Vec<String> = suggested
        .lines()
        .map(|l| l.trim().trim_start_matches(['•', '-', '*']).trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect();
    if lines.len() > 1 {
        return lines;
    }
    string_list(&Value::String(suggested.to_string()))
}

fn parse_object_payload(
    section: &str,
    suggested: &str,
) -> Result<serde_json::Map<String, Value>, PatchError> {
    match serde_json::from_str::<Value>(suggested) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(PatchError::MalformedPayload {
            section: section.to_string(),
            message: format!("expected a JSON object, got {other}"),
        }),
        Err(e) => Err(PatchError::MalformedPayload {
            section: section.to_string(),
            message: e.to_string(),
        }),
    }
}

fn out_of_range(section: &str, index: usize, len: usize) -> PatchError {
    PatchError::IndexOutOfRange {
        section: section.to_string(),
        index,
        len,
    }
}
