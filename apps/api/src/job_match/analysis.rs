//! Job analysis: the comparison output of the upstream JD analysis, as consumed here.
//!
//! `matches` / `missing` entries arrive either as flat strings (current format) or as
//! `{description, category, skill}` objects (legacy format). Anything else is kept as
//! an opaque value so one odd entry does not reject the whole analysis. An explicit
//! `null` reads the same as an absent key.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("job analysis has an unexpected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyEntry {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub skill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisEntry {
    Text(String),
    Legacy(LegacyEntry),
    Other(Value),
}

impl AnalysisEntry {
    /// The flat-string form, if this entry is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnalysisEntry::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Every text this entry offers for skill comparison.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            AnalysisEntry::Text(s) => vec![s.as_str()],
            AnalysisEntry::Legacy(entry) => [&entry.description, &entry.category, &entry.skill]
                .into_iter()
                .filter_map(|t| t.as_deref())
                .collect(),
            AnalysisEntry::Other(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Weakness {
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobAnalysis {
    #[serde(default, deserialize_with = "null_as_default")]
    pub matches: Vec<AnalysisEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missing: Vec<AnalysisEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub missing_requirements: Vec<AnalysisEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub weaknesses: Vec<Weakness>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub recommended_courses: Vec<Value>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl JobAnalysis {
    pub fn from_value(value: &Value) -> Result<Self, AnalysisError> {
        Ok(Self::deserialize(value)?)
    }
}
