#![allow(dead_code)]

//! CV document model: a section-typed document where every section is one variant
//! of a tagged union, discriminated by `type` on the wire.
//!
//! The model carries no mutation logic. All writes go through `patch::applier` and
//! `patch::edits`, which match exhaustively on [`SectionBody`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Item fields that always hold string arrays, even when upstream data omits them.
pub const ARRAY_FIELDS: &[&str] = &["achievements", "technologies", "contributions"];

/// Field addressed by the interactive achievement operations when none is given.
pub const DEFAULT_ARRAY_FIELD: &str = "achievements";

/// Key that holds a list item's stable id. It is never writable as an item field.
pub const ITEM_ID_FIELD: &str = "id";

/// Section id of the skills block. The unified skill list is derived from it.
pub const SKILLS_SECTION_ID: &str = "skills";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Object,
    List,
    NestedList,
    Textarea,
    Interests,
}

impl SectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Object => "object",
            SectionKind::List => "list",
            SectionKind::NestedList => "nested_list",
            SectionKind::Textarea => "textarea",
            SectionKind::Interests => "interests",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "object" => Some(SectionKind::Object),
            "list" => Some(SectionKind::List),
            "nested_list" => Some(SectionKind::NestedList),
            "textarea" => Some(SectionKind::Textarea),
            "interests" => Some(SectionKind::Interests),
            _ => None,
        }
    }
}

/// One key/value pair of the header block (name, email, phone, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderField {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// A list item field is either a scalar string or a string array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            FieldValue::Text(_) => None,
            FieldValue::List(items) => Some(items),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, FieldValue::List(_))
    }

    /// Same shape, zero value. Used when building templates from sample items.
    pub fn zeroed(&self) -> Self {
        match self {
            FieldValue::Text(_) => FieldValue::Text(String::new()),
            FieldValue::List(_) => FieldValue::List(Vec::new()),
        }
    }
}

/// One entry of a `list` section (an experience, a degree, a project...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListItem {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl ListItem {
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(FieldValue::as_text)
    }

    /// Array view of a field. Missing fields read as empty.
    pub fn array(&self, field: &str) -> &[String] {
        self.fields
            .get(field)
            .and_then(FieldValue::as_list)
            .unwrap_or(&[])
    }

    /// Length of the field as [`ListItem::array_mut`] would see it, without
    /// creating or promoting anything.
    pub fn array_len(&self, field: &str) -> usize {
        match self.fields.get(field) {
            Some(FieldValue::List(items)) => items.len(),
            Some(FieldValue::Text(text)) if !text.trim().is_empty() => 1,
            _ => 0,
        }
    }

    pub fn is_reserved(field: &str) -> bool {
        field == ITEM_ID_FIELD
    }

    /// Returns false, and writes nothing, for the reserved id key.
    pub fn set_text(&mut self, field: &str, value: impl Into<String>) -> bool {
        if Self::is_reserved(field) {
            return false;
        }
        self.fields
            .insert(field.to_string(), FieldValue::Text(value.into()));
        true
    }

    /// Returns false, and writes nothing, for the reserved id key.
    pub fn set_array(&mut self, field: &str, values: Vec<String>) -> bool {
        if Self::is_reserved(field) {
            return false;
        }
        self.fields
            .insert(field.to_string(), FieldValue::List(values));
        true
    }

    /// Mutable array access. A missing field is created as `[]`; a scalar is
    /// promoted to a one-element array (empty scalars become `[]`).
    pub fn array_mut(&mut self, field: &str) -> &mut Vec<String> {
        let slot = self
            .fields
            .entry(field.to_string())
            .or_insert_with(|| FieldValue::List(Vec::new()));
        if let FieldValue::Text(text) = &mut *slot {
            let promoted = if text.trim().is_empty() {
                Vec::new()
            } else {
                vec![std::mem::take(text)]
            };
            *slot = FieldValue::List(promoted);
        }
        match slot {
            FieldValue::List(items) => items,
            FieldValue::Text(_) => unreachable!("scalar promoted above"),
        }
    }

    /// True when the field should be written as an array: it already is one, the
    /// template declares it as one, or it is a well-known array field.
    pub fn is_array_field(&self, field: &str, template: &ListItem) -> bool {
        self.fields.get(field).is_some_and(FieldValue::is_list)
            || template.fields.get(field).is_some_and(FieldValue::is_list)
            || ARRAY_FIELDS.contains(&field)
    }

    /// Back-fills every array field declared by the template or the well-known set,
    /// so no array field is ever left absent.
    pub fn normalize_arrays(&mut self, template: &ListItem) {
        let declared: Vec<String> = template
            .fields
            .iter()
            .filter(|(_, v)| v.is_list())
            .map(|(k, _)| k.clone())
            .collect();
        for field in declared {
            self.array_mut(&field);
        }
        for field in ARRAY_FIELDS {
            if self.fields.contains_key(*field) {
                self.array_mut(field);
            }
        }
    }

    /// A short human label for ledger descriptions.
    pub fn label(&self) -> String {
        for key in ["title", "position", "name", "degree", "language", "company"] {
            if let Some(text) = self.text(key).filter(|t| !t.trim().is_empty()) {
                return text.to_string();
            }
        }
        self.id.clone()
    }
}

/// One category of the skills block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub items: Vec<String>,
}

/// The typed payload of a section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionBody {
    Object {
        #[serde(default)]
        fields: Vec<HeaderField>,
    },
    List {
        #[serde(default)]
        items: Vec<ListItem>,
        #[serde(default)]
        template: ListItem,
    },
    NestedList {
        #[serde(default, rename = "items")]
        categories: Vec<SkillCategory>,
    },
    Textarea {
        #[serde(default)]
        value: String,
    },
    Interests {
        #[serde(default)]
        items: Vec<String>,
    },
}

impl SectionBody {
    pub fn kind(&self) -> SectionKind {
        match self {
            SectionBody::Object { .. } => SectionKind::Object,
            SectionBody::List { .. } => SectionKind::List,
            SectionBody::NestedList { .. } => SectionKind::NestedList,
            SectionBody::Textarea { .. } => SectionKind::Textarea,
            SectionBody::Interests { .. } => SectionKind::Interests,
        }
    }
}

/// A named, typed block of the CV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableSection {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub body: SectionBody,
}

impl EditableSection {
    pub fn kind(&self) -> SectionKind {
        self.body.kind()
    }

    /// Whether a section label (as written by upstream analysis) addresses this section:
    /// the lower-cased label equals the id, or the label equals the display name exactly.
    pub fn answers_to(&self, label: &str) -> bool {
        self.id == label.to_lowercase() || self.name == label
    }
}

/// The whole CV: an ordered list of sections with unique ids.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    pub sections: Vec<EditableSection>,
}

impl Document {
    pub fn new(sections: Vec<EditableSection>) -> Self {
        Self { sections }
    }

    pub fn section(&self, id: &str) -> Option<&EditableSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Lookup by `(id, type)`. A section with the right id but another type is `None`.
    pub fn section_of_kind(&self, id: &str, kind: SectionKind) -> Option<&EditableSection> {
        self.section(id).filter(|s| s.kind() == kind)
    }

    /// Position of the section a label addresses (see [`EditableSection::answers_to`]).
    pub fn locate(&self, label: &str) -> Option<usize> {
        self.sections.iter().position(|s| s.answers_to(label))
    }

    /// Categories of the skills block, or an empty slice when there is none.
    pub fn skill_categories(&self) -> &[SkillCategory] {
        match self
            .section_of_kind(SKILLS_SECTION_ID, SectionKind::NestedList)
            .map(|s| &s.body)
        {
            Some(SectionBody::NestedList { categories }) => categories,
            _ => &[],
        }
    }

    /// The unified skill list: every category's items flattened in order.
    pub fn unified_skills(&self) -> Vec<&str> {
        self.skill_categories()
            .iter()
            .flat_map(|c| c.items.iter().map(String::as_str))
            .collect()
    }

    /// Case-insensitive exact membership in the unified skill list.
    pub fn has_skill(&self, skill: &str) -> bool {
        let wanted = skill.trim().to_lowercase();
        self.unified_skills()
            .iter()
            .any(|s| s.trim().to_lowercase() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn skills_doc() -> Document {
        Document::new(vec![EditableSection {
            id: "skills".to_string(),
            name: "Skills".to_string(),
            body: SectionBody::NestedList {
                categories: vec![
                    SkillCategory {
                        id: "category_0".to_string(),
                        name: "Languages".to_string(),
                        items: vec!["Python".to_string(), "SQL".to_string()],
                    },
                    SkillCategory {
                        id: "category_1".to_string(),
                        name: "Tools".to_string(),
                        items: vec!["Docker".to_string()],
                    },
                ],
            },
        }])
    }

    #[test]
    fn test_section_serializes_with_type_tag() {
        let section = EditableSection {
            id: "summary".to_string(),
            name: "Summary".to_string(),
            body: SectionBody::Textarea {
                value: "Backend engineer".to_string(),
            },
        };
        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(
            value,
            json!({"id": "summary", "name": "Summary", "type": "textarea", "value": "Backend engineer"})
        );
    }

    #[test]
    fn test_list_section_deserializes_items_and_template() {
        let value = json!({
            "id": "experience",
            "name": "Experience",
            "type": "list",
            "items": [{"id": "experience_0", "company": "Acme", "achievements": ["Shipped v2"]}],
            "template": {"company": "", "achievements": []}
        });
        let section: EditableSection = serde_json::from_value(value).unwrap();
        let SectionBody::List { items, template } = &section.body else {
            panic!("expected list section");
        };
        assert_eq!(items[0].id, "experience_0");
        assert_eq!(items[0].text("company"), Some("Acme"));
        assert_eq!(items[0].array("achievements"), ["Shipped v2".to_string()]);
        assert!(template.fields["achievements"].is_list());
    }

    #[test]
    fn test_nested_list_uses_items_key_for_categories() {
        let value = serde_json::to_value(&skills_doc()).unwrap();
        assert_eq!(value[0]["type"], "nested_list");
        assert_eq!(value[0]["items"][1]["name"], "Tools");
    }

    #[test]
    fn test_unified_skills_flattens_in_order() {
        let doc = skills_doc();
        assert_eq!(doc.unified_skills(), vec!["Python", "SQL", "Docker"]);
    }

    #[test]
    fn test_has_skill_is_case_insensitive_exact() {
        let doc = skills_doc();
        assert!(doc.has_skill("docker"));
        assert!(doc.has_skill("  PYTHON "));
        assert!(!doc.has_skill("Dock"));
    }

    #[test]
    fn test_section_of_kind_rejects_type_mismatch() {
        let doc = skills_doc();
        assert!(doc.section_of_kind("skills", SectionKind::NestedList).is_some());
        assert!(doc.section_of_kind("skills", SectionKind::List).is_none());
    }

    #[test]
    fn test_locate_matches_lowercased_id_or_exact_name() {
        let doc = skills_doc();
        assert_eq!(doc.locate("Skills"), Some(0));
        assert_eq!(doc.locate("SKILLS"), Some(0));
        assert_eq!(doc.locate("Technical Skills"), None);
    }

    #[test]
    fn test_array_mut_creates_missing_field() {
        let mut item = ListItem::default();
        item.array_mut("achievements").push("Led migration".to_string());
        assert_eq!(item.array("achievements"), ["Led migration".to_string()]);
    }

    #[test]
    fn test_array_mut_promotes_scalar() {
        let mut item = ListItem::default();
        item.set_text("technologies", "Rust");
        assert_eq!(item.array_mut("technologies"), &vec!["Rust".to_string()]);

        item.set_text("contributions", "  ");
        assert!(item.array_mut("contributions").is_empty());
    }

    #[test]
    fn test_normalize_arrays_backfills_template_fields() {
        let mut template = ListItem::default();
        template.set_array("highlights", vec![]);
        template.set_text("title", "");
        let mut item = ListItem::default();
        item.set_text("title", "Engineer");
        item.normalize_arrays(&template);
        assert_eq!(item.fields.get("highlights"), Some(&FieldValue::List(vec![])));
        assert!(!item.fields.contains_key("achievements"));
    }

    #[test]
    fn test_id_is_not_writable_as_a_field() {
        let mut item = ListItem {
            id: "experience_0".to_string(),
            ..Default::default()
        };
        assert!(!item.set_text("id", "hijack"));
        assert!(!item.set_array("id", vec!["hijack".to_string()]));
        assert!(item.fields.is_empty());

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value, json!({"id": "experience_0"}));
    }

    #[test]
    fn test_template_serializes_without_empty_id() {
        let mut template = ListItem::default();
        template.set_text("company", "");
        assert_eq!(serde_json::to_value(&template).unwrap(), json!({"company": ""}));
    }

    #[test]
    fn test_array_len_matches_promotion_without_mutating() {
        let mut item = ListItem::default();
        item.set_text("technologies", "Rust");
        item.set_text("contributions", " ");
        assert_eq!(item.array_len("technologies"), 1);
        assert_eq!(item.array_len("contributions"), 0);
        assert_eq!(item.array_len("achievements"), 0);
        assert!(!item.fields.contains_key("achievements"));
        assert_eq!(item.text("technologies"), Some("Rust"));
    }

    #[test]
    fn test_label_prefers_title() {
        let mut item = ListItem {
            id: "experience_3".to_string(),
            ..Default::default()
        };
        assert_eq!(item.label(), "experience_3");
        item.set_text("company", "Acme");
        item.set_text("title", "Staff Engineer");
        assert_eq!(item.label(), "Staff Engineer");
    }
}
