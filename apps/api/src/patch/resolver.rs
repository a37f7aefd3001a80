//! Path Resolver: turns a recommendation's `section` + `field` address into a concrete
//! write target inside the current document.
//!
//! Resolution order, per section kind:
//! - `object`: field id (lower-cased label) or exact field name
//! - `list` / `nested_list`: `"<ignored>.<index>.<subField>"` first, then the insertion
//!   sentinel for the kind, then (skills only) `"<categoryIndex>.<skillIndex>"`
//! - `textarea`: any bare field addresses the whole value
//! - `interests`: `new_item` appends one entry, any bare field replaces the list
//!
//! The `id` subfield of an item or category is never a target: ids stay stable for the
//! life of the document.
//!
//! Nothing here panics on malformed input. Every failure is a [`PatchError`] the caller
//! is expected to treat as "skip this recommendation".

use crate::cv::model::{Document, ListItem, SectionBody};
use crate::cv::recommendation::{NEW_CATEGORY, NEW_ITEM};
use crate::patch::error::PatchError;

/// A resolved write target. Indices are valid for the document the target was resolved
/// against; the applier re-checks them before writing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchTarget {
    /// Overwrite one header field value.
    HeaderField { section: usize, field: usize },
    /// Overwrite one field of one list item (or a category's `name` / `items`).
    ItemField {
        section: usize,
        item: usize,
        field: String,
    },
    /// Append a new item built from a JSON payload.
    InsertItem { section: usize },
    /// Append a new skill category built from a JSON payload.
    InsertCategory { section: usize },
    /// Overwrite one skill inside one category.
    SkillSlot {
        section: usize,
        category: usize,
        skill: usize,
    },
    /// Overwrite a textarea section's whole value.
    SectionValue { section: usize },
    /// Append one entry to an interests section.
    AppendInterest { section: usize },
    /// Replace an interests section's entries.
    ReplaceInterests { section: usize },
}

impl PatchTarget {
    pub fn section_index(&self) -> usize {
        match self {
            PatchTarget::HeaderField { section, .. }
            | PatchTarget::ItemField { section, .. }
            | PatchTarget::InsertItem { section }
            | PatchTarget::InsertCategory { section }
            | PatchTarget::SkillSlot { section, .. }
            | PatchTarget::SectionValue { section }
            | PatchTarget::AppendInterest { section }
            | PatchTarget::ReplaceInterests { section } => *section,
        }
    }
}

pub fn resolve(document: &Document, section_label: &str, field: &str) -> Result<PatchTarget, PatchError> {
    let section_index = document
        .locate(section_label)
        .ok_or_else(|| PatchError::SectionNotFound(section_label.to_string()))?;
    let section = &document.sections[section_index];
    let not_found = || PatchError::FieldNotFound {
        section: section.id.clone(),
        field: field.to_string(),
    };

    match &section.body {
        SectionBody::Object { fields } => {
            let lowered = field.to_lowercase();
            fields
                .iter()
                .position(|f| f.id.to_lowercase() == lowered || f.name == field)
                .map(|index| PatchTarget::HeaderField {
                    section: section_index,
                    field: index,
                })
                .ok_or_else(not_found)
        }
        SectionBody::List { items, .. } => {
            if let Some((index, sub_field)) = split_item_path(field) {
                let index = parse_index(index).ok_or_else(not_found)?;
                if ListItem::is_reserved(sub_field) {
                    return Err(not_found());
                }
                check_bounds(&section.id, index, items.len())?;
                return Ok(PatchTarget::ItemField {
                    section: section_index,
                    item: index,
                    field: sub_field.to_string(),
                });
            }
            if field == NEW_ITEM {
                return Ok(PatchTarget::InsertItem {
                    section: section_index,
                });
            }
            Err(not_found())
        }
        SectionBody::NestedList { categories } => {
            if let Some((index, sub_field)) = split_item_path(field) {
                let index = parse_index(index).ok_or_else(not_found)?;
                if ListItem::is_reserved(sub_field) {
                    return Err(not_found());
                }
                check_bounds(&section.id, index, categories.len())?;
                return Ok(PatchTarget::ItemField {
                    section: section_index,
                    item: index,
                    field: sub_field.to_string(),
                });
            }
            if field == NEW_CATEGORY {
                return Ok(PatchTarget::InsertCategory {
                    section: section_index,
                });
            }
            if let Some((category, skill)) = split_index_pair(field) {
                check_bounds(&section.id, category, categories.len())?;
                check_bounds(&section.id, skill, categories[category].items.len())?;
                return Ok(PatchTarget::SkillSlot {
                    section: section_index,
                    category,
                    skill,
                });
            }
            Err(not_found())
        }
        SectionBody::Textarea { .. } => {
            if field.contains('.') {
                return Err(not_found());
            }
            Ok(PatchTarget::SectionValue {
                section: section_index,
            })
        }
        SectionBody::Interests { .. } => {
            if field == NEW_ITEM {
                Ok(PatchTarget::AppendInterest {
                    section: section_index,
                })
            } else if field.contains('.') {
                Err(not_found())
            } else {
                Ok(PatchTarget::ReplaceInterests {
                    section: section_index,
                })
            }
        }
    }
}

/// `"<ignored>.<index>.<subField>"` → `(index token, subField)`.
fn split_item_path(field: &str) -> Option<(&str, &str)> {
    let mut parts = field.split('.');
    let (_, index, sub_field) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || sub_field.trim().is_empty() {
        return None;
    }
    Some((index, sub_field))
}

/// `"<a>.<b>"` with both tokens numeric → `(a, b)`.
fn split_index_pair(field: &str) -> Option<(usize, usize)> {
    let (a, b) = field.split_once('.')?;
    if b.contains('.') {
        return None;
    }
    Some((parse_index(a)?, parse_index(b)?))
}

fn parse_index(token: &str) -> Option<usize> {
    token.trim().parse::<usize>().ok()
}

fn check_bounds(section: &str, index: usize, len: usize) -> Result<(), PatchError> {
    if index < len {
        Ok(())
    } else {
        Err(PatchError::IndexOutOfRange {
            section: section.to_string(),
            index,
            len,
        })
    }
}
