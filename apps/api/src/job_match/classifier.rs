//! Skill Classifier: places one skill against a job analysis.
//!
//! Comparison is case-insensitive bidirectional substring containment, not equality:
//! "React" matches "React.js" and "Experience with React". Short skills over-match
//! ("C" is contained in "C++"); that is a known limitation of the heuristic.

use serde::{Deserialize, Serialize};

use crate::job_match::analysis::{AnalysisEntry, JobAnalysis};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillStatus {
    Match,
    Missing,
    Neutral,
}

/// `a` contains `b` or `b` contains `a`, ignoring case and surrounding whitespace.
/// Blank strings never match anything.
pub fn contains_either_way(a: &str, b: &str) -> bool {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

fn any_entry_matches(skill: &str, entries: &[AnalysisEntry]) -> bool {
    entries
        .iter()
        .any(|entry| entry.texts().into_iter().any(|text| contains_either_way(skill, text)))
}

/// Classifies one skill.
///
/// With `exclude_missing` set (used for skills already in the CV) the outcome is only
/// ever `Match` or `Neutral`: "missing" is meaningful only for skills not yet added.
pub fn classify_skill(skill: &str, analysis: &JobAnalysis, exclude_missing: bool) -> SkillStatus {
    if any_entry_matches(skill, &analysis.matches) {
        SkillStatus::Match
    } else if !exclude_missing && any_entry_matches(skill, &analysis.missing) {
        SkillStatus::Missing
    } else {
        SkillStatus::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn analysis(value: serde_json::Value) -> JobAnalysis {
        JobAnalysis::from_value(&value).unwrap()
    }

    #[test]
    fn test_containment_is_bidirectional_and_case_insensitive() {
        assert!(contains_either_way("react", "React.js"));
        assert!(contains_either_way("Experience with PYTHON", "python"));
        assert!(!contains_either_way("Go", "Rust"));
    }

    #[test]
    fn test_blank_never_matches() {
        assert!(!contains_either_way("", "Rust"));
        assert!(!contains_either_way("Rust", "   "));
    }

    #[test]
    fn test_short_skill_false_positive_is_accepted() {
        assert!(contains_either_way("C", "C++"));
    }

    #[test]
    fn test_match_wins_over_missing() {
        let job = analysis(json!({"matches": ["Python"], "missing": ["Python 3"]}));
        assert_eq!(classify_skill("python", &job, false), SkillStatus::Match);
    }

    #[test]
    fn test_missing_and_neutral() {
        let job = analysis(json!({"matches": [], "missing": ["Python", "React"]}));
        assert_eq!(classify_skill("React", &job, false), SkillStatus::Missing);
        assert_eq!(classify_skill("SQL", &job, false), SkillStatus::Neutral);
    }

    #[test]
    fn test_current_skills_mode_never_reports_missing() {
        let job = analysis(json!({"matches": [], "missing": ["Python", "React"]}));
        assert_eq!(classify_skill("Python", &job, true), SkillStatus::Neutral);
        assert_eq!(classify_skill("react", &job, true), SkillStatus::Neutral);
    }

    #[test]
    fn test_legacy_entries_match_on_any_field() {
        let job = analysis(json!({
            "matches": [{"description": "Built REST APIs", "category": "Backend", "skill": "Django"}]
        }));
        assert_eq!(classify_skill("django", &job, false), SkillStatus::Match);
        assert_eq!(classify_skill("REST APIs", &job, false), SkillStatus::Match);
        assert_eq!(classify_skill("backend", &job, false), SkillStatus::Match);
        assert_eq!(classify_skill("Flask", &job, false), SkillStatus::Neutral);
    }

    #[test]
    fn test_classification_agrees_with_containment() {
        let skills = ["Rust", "rust-analyzer", "TypeScript", "Script", "SQL", "PostgreSQL"];
        for skill in skills {
            for entry in skills {
                let job = analysis(json!({"matches": [entry]}));
                let expected = if contains_either_way(skill, entry) {
                    SkillStatus::Match
                } else {
                    SkillStatus::Neutral
                };
                assert_eq!(classify_skill(skill, &job, false), expected, "{skill} vs {entry}");
                assert_eq!(
                    contains_either_way(skill, entry),
                    contains_either_way(entry, skill)
                );
            }
        }
    }
}
