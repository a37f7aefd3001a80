//! Interactive edits: the single-element operations a user triggers directly in the
//! optimizer (add a skill, add/edit/remove one achievement, add/remove one item).
//!
//! Unlike bulk recommendation writes, array edits here append, overwrite, or splice
//! exactly one element and never replace the whole array.

use crate::cv::model::{
    Document, EditableSection, ListItem, SectionBody, SkillCategory, SKILLS_SECTION_ID,
};
use crate::patch::applier::AppliedPatch;
use crate::patch::error::PatchError;
use crate::patch::ids::IdAllocator;
use crate::patch::ledger::ChangeKind;

const DEFAULT_CATEGORY_NAME: &str = "Skills";

/// Adds one skill, unless it is already in the CV (case-insensitive exact match).
///
/// `category` picks a category by id or name (case-insensitive); an unknown name
/// creates that category. Without one the skill lands in the first category, or in a
/// new "Skills" category when the section has none.
pub fn add_skill(
    document: &mut Document,
    skill: &str,
    category: Option<&str>,
    ids: &mut IdAllocator,
) -> Result<AppliedPatch, PatchError> {
    let skill = non_empty(SKILLS_SECTION_ID, skill)?;
    if document.has_skill(skill) {
        return Err(PatchError::DuplicateSkill {
            skill: skill.to_string(),
        });
    }

    let section = document
        .sections
        .iter_mut()
        .find(|s| s.id == SKILLS_SECTION_ID)
        .ok_or_else(|| PatchError::SectionNotFound(SKILLS_SECTION_ID.to_string()))?;
    let before = section.clone();
    let SectionBody::NestedList { categories } = &mut section.body else {
        return Err(PatchError::SectionNotFound(SKILLS_SECTION_ID.to_string()));
    };

    let position = match category.map(str::trim).filter(|c| !c.is_empty()) {
        Some(label) => categories
            .iter()
            .position(|c| c.id == label || c.name.eq_ignore_ascii_case(label))
            .unwrap_or_else(|| push_category(categories, label, ids)),
        None if categories.is_empty() => push_category(categories, DEFAULT_CATEGORY_NAME, ids),
        None => 0,
    };
    let target = &mut categories[position];
    target.items.push(skill.to_string());

    Ok(AppliedPatch {
        kind: ChangeKind::SkillAdded,
        section_id: section.id.clone(),
        description: format!("{}: added {skill} to {}", section.name, target.name),
        before,
    })
}

/// Removes the first skill equal (case-insensitive) to `skill` from whichever category
/// holds it.
pub fn remove_skill(document: &mut Document, skill: &str) -> Result<AppliedPatch, PatchError> {
    let wanted = skill.trim().to_lowercase();
    let not_found = || PatchError::SkillNotFound {
        skill: skill.to_string(),
    };

    let section = document
        .sections
        .iter_mut()
        .find(|s| s.id == SKILLS_SECTION_ID)
        .ok_or_else(not_found)?;
    let before = section.clone();
    let SectionBody::NestedList { categories } = &mut section.body else {
        return Err(not_found());
    };

    let (category, index) = categories
        .iter()
        .enumerate()
        .find_map(|(ci, c)| {
            c.items
                .iter()
                .position(|s| s.trim().to_lowercase() == wanted)
                .map(|si| (ci, si))
        })
        .ok_or_else(not_found)?;
    let removed = categories[category].items.remove(index);

    Ok(AppliedPatch {
        kind: ChangeKind::SkillRemoved,
        section_id: section.id.clone(),
        description: format!(
            "{}: removed {removed} from {}",
            section.name, categories[category].name
        ),
        before,
    })
}

/// Appends one element to an array field of one list item.
pub fn add_array_entry(
    document: &mut Document,
    section_label: &str,
    item: usize,
    field: &str,
    text: &str,
) -> Result<AppliedPatch, PatchError> {
    let text = non_empty(section_label, text)?.to_string();
    writable_field(section_label, field)?;
    edit_list_item(document, section_label, item, |section, entry| {
        entry.array_mut(field).push(text.clone());
        Ok((
            ChangeKind::AchievementAdded,
            format!("{section}: added to {field} of {}", entry.label()),
        ))
    })
}

/// Overwrites one element of an array field.
pub fn edit_array_entry(
    document: &mut Document,
    section_label: &str,
    item: usize,
    field: &str,
    index: usize,
    text: &str,
) -> Result<AppliedPatch, PatchError> {
    let text = non_empty(section_label, text)?.to_string();
    writable_field(section_label, field)?;
    edit_list_item(document, section_label, item, |section, entry| {
        check_entry_index(section, entry, field, index)?;
        entry.array_mut(field)[index] = text.clone();
        Ok((
            ChangeKind::AchievementEdited,
            format!("{section}: edited {field} of {}", entry.label()),
        ))
    })
}

/// Splices one element out of an array field.
pub fn remove_array_entry(
    document: &mut Document,
    section_label: &str,
    item: usize,
    field: &str,
    index: usize,
) -> Result<AppliedPatch, PatchError> {
    writable_field(section_label, field)?;
    edit_list_item(document, section_label, item, |section, entry| {
        check_entry_index(section, entry, field, index)?;
        entry.array_mut(field).remove(index);
        Ok((
            ChangeKind::AchievementRemoved,
            format!("{section}: removed from {field} of {}", entry.label()),
        ))
    })
}

/// Appends a blank item built from the section template (or an empty category).
pub fn add_item(
    document: &mut Document,
    section_label: &str,
    ids: &mut IdAllocator,
) -> Result<AppliedPatch, PatchError> {
    let section = locate_mut(document, section_label)?;
    let before = section.clone();
    let description = match &mut section.body {
        SectionBody::List { items, template } => {
            let mut item = template.clone();
            item.id = ids.allocate(&section.id);
            item.normalize_arrays(template);
            items.push(item);
            format!("{}: added a new entry", section.name)
        }
        SectionBody::NestedList { categories } => {
            push_category(categories, "New Category", ids);
            format!("{}: added a new category", section.name)
        }
        _ => {
            return Err(PatchError::FieldNotFound {
                section: section.id.clone(),
                field: "new_item".to_string(),
            })
        }
    };

    Ok(AppliedPatch {
        kind: ChangeKind::ItemAdded,
        section_id: section.id.clone(),
        description,
        before,
    })
}

/// Removes one item (or category). Its id is never handed out again.
pub fn remove_item(
    document: &mut Document,
    section_label: &str,
    index: usize,
) -> Result<AppliedPatch, PatchError> {
    let section = locate_mut(document, section_label)?;
    let before = section.clone();
    let out_of_range = |len: usize| PatchError::IndexOutOfRange {
        section: before.id.clone(),
        index,
        len,
    };
    let label = match &mut section.body {
        SectionBody::List { items, .. } => {
            if index >= items.len() {
                return Err(out_of_range(items.len()));
            }
            items.remove(index).label()
        }
        SectionBody::NestedList { categories } => {
            if index >= categories.len() {
                return Err(out_of_range(categories.len()));
            }
            categories.remove(index).name
        }
        SectionBody::Interests { items } => {
            if index >= items.len() {
                return Err(out_of_range(items.len()));
            }
            items.remove(index)
        }
        _ => {
            return Err(PatchError::FieldNotFound {
                section: section.id.clone(),
                field: index.to_string(),
            })
        }
    };

    Ok(AppliedPatch {
        kind: ChangeKind::ItemRemoved,
        section_id: section.id.clone(),
        description: format!("{}: removed {label}", section.name),
        before,
    })
}

type EditResult = Result<(ChangeKind, String), PatchError>;

/// Runs `edit` against one item of a `list` section, capturing the pre-edit section.
fn edit_list_item<F>(
    document: &mut Document,
    section_label: &str,
    item: usize,
    edit: F,
) -> Result<AppliedPatch, PatchError>
where
    F: FnOnce(&str, &mut ListItem) -> EditResult,
{
    let section = locate_mut(document, section_label)?;
    let before = section.clone();
    let SectionBody::List { items, .. } = &mut section.body else {
        return Err(PatchError::FieldNotFound {
            section: section.id.clone(),
            field: format!("{item}"),
        });
    };
    let len = items.len();
    let entry = items.get_mut(item).ok_or(PatchError::IndexOutOfRange {
        section: section.id.clone(),
        index: item,
        len,
    })?;
    let (kind, description) = edit(&section.name, entry)?;

    Ok(AppliedPatch {
        kind,
        section_id: section.id.clone(),
        description,
        before,
    })
}

fn locate_mut<'a>(
    document: &'a mut Document,
    section_label: &str,
) -> Result<&'a mut EditableSection, PatchError> {
    let index = document
        .locate(section_label)
        .ok_or_else(|| PatchError::SectionNotFound(section_label.to_string()))?;
    Ok(&mut document.sections[index])
}

fn push_category(categories: &mut Vec<SkillCategory>, name: &str, ids: &mut IdAllocator) -> usize {
    categories.push(SkillCategory {
        id: ids.allocate("category"),
        name: name.to_string(),
        items: Vec::new(),
    });
    categories.len() - 1
}

fn writable_field(section: &str, field: &str) -> Result<(), PatchError> {
    if ListItem::is_reserved(field) {
        return Err(PatchError::FieldNotFound {
            section: section.to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Bounds check against the field as it reads now. Nothing is created or promoted on
/// failure.
fn check_entry_index(section: &str, entry: &ListItem, field: &str, index: usize) -> Result<(), PatchError> {
    let len = entry.array_len(field);
    if index >= len {
        return Err(PatchError::IndexOutOfRange {
            section: section.to_string(),
            index,
            len,
        });
    }
    Ok(())
}

fn non_empty<'t>(section: &str, text: &'t str) -> Result<&'t str, PatchError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(PatchError::MalformedPayload {
            section: section.to_string(),
            message: "empty value".to_string(),
        })
    } else {
        Ok(trimmed)
    }
}
