use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::cv::hydrate::value_to_text;

/// Sentinel field: append a new item to a `list` section.
pub const NEW_ITEM: &str = "new_item";
/// Sentinel field: append a new category to a `nested_list` section.
pub const NEW_CATEGORY: &str = "new_category";

/// An upstream-suggested change, addressed by `section` + `field`.
///
/// `field` is a bare name (`"email"`), a dotted path (`"experience.0.company"`),
/// a category/skill index pair (`"1.3"`), or one of the insertion sentinels.
/// `suggested` is always text; insertion payloads carry JSON inside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(default = "generated_id", deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(deserialize_with = "lenient_text")]
    pub section: String,
    #[serde(deserialize_with = "lenient_text")]
    pub field: String,
    #[serde(deserialize_with = "lenient_text")]
    pub suggested: String,
    #[serde(default, deserialize_with = "lenient_opt_text")]
    pub current: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub reason: String,
}

impl Recommendation {
    pub fn new(section: &str, field: &str, suggested: &str) -> Self {
        Self {
            id: generated_id(),
            section: section.to_string(),
            field: field.to_string(),
            suggested: suggested.to_string(),
            current: None,
            reason: String::new(),
        }
    }
}

fn generated_id() -> String {
    format!("rec_{}", Uuid::new_v4().simple())
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value_to_text(&value))
}

fn lenient_opt_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => None,
        other => Some(value_to_text(&other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_non_string_suggestion_becomes_json_text() {
        let rec: Recommendation = serde_json::from_value(json!({
            "id": 7,
            "section": "skills",
            "field": "new_category",
            "suggested": {"name": "Tools", "items": ["Git"]},
            "current": null
        }))
        .unwrap();
        assert_eq!(rec.id, "7");
        assert_eq!(rec.current, None);
        let payload: Value = serde_json::from_str(&rec.suggested).unwrap();
        assert_eq!(payload["items"][0], "Git");
    }

    #[test]
    fn test_missing_id_is_generated() {
        let rec: Recommendation = serde_json::from_value(json!({
            "section": "header",
            "field": "email",
            "suggested": "ada@example.com",
            "reason": "Use a professional address"
        }))
        .unwrap();
        assert!(rec.id.starts_with("rec_"));
        assert_eq!(rec.reason, "Use a professional address");
    }

    #[test]
    fn test_missing_field_is_an_error() {
        let result: Result<Recommendation, _> =
            serde_json::from_value(json!({"section": "header", "suggested": "x"}));
        assert!(result.is_err());
    }
}
