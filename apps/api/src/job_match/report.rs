//! Skill report: the skills panel view. Each current skill with its
//! classification, the job's missing skills that could still be added, and the score.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::cv::model::Document;
use crate::job_match::analysis::{AnalysisEntry, JobAnalysis};
use crate::job_match::classifier::{classify_skill, SkillStatus};
use crate::job_match::score::{MatchScore, MatchScorer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedSkill {
    pub skill: String,
    pub status: SkillStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillReport {
    pub current: Vec<ClassifiedSkill>,
    /// Missing skills not yet in the CV, in analysis order.
    pub addable: Vec<String>,
    pub score: MatchScore,
    pub scorer: &'static str,
}

fn candidate_name(entry: &AnalysisEntry) -> Option<&str> {
    match entry {
        AnalysisEntry::Text(text) => Some(text),
        AnalysisEntry::Legacy(legacy) => legacy.skill.as_deref(),
        AnalysisEntry::Other(_) => None,
    }
}

pub fn build_skill_report(
    document: &Document,
    analysis: &JobAnalysis,
    scorer: &dyn MatchScorer,
) -> SkillReport {
    let skills = document.unified_skills();

    let current = skills
        .iter()
        .map(|skill| ClassifiedSkill {
            skill: skill.to_string(),
            status: classify_skill(skill, analysis, true),
        })
        .collect();

    let mut seen = HashSet::new();
    let addable = analysis
        .missing
        .iter()
        .filter_map(candidate_name)
        .map(str::trim)
        .filter(|name| !name.is_empty() && !document.has_skill(name))
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(String::from)
        .collect();

    SkillReport {
        current,
        addable,
        score: scorer.score(&skills, analysis),
        scorer: scorer.backend(),
    }
}

/// Report against a raw analysis value. An unreadable analysis classifies every
/// skill as neutral and reports the worst-case score.
pub fn skill_report_from_value(
    document: &Document,
    analysis: &Value,
    scorer: &dyn MatchScorer,
) -> SkillReport {
    match JobAnalysis::from_value(analysis) {
        Ok(analysis) => build_skill_report(document, &analysis, scorer),
        Err(e) => {
            warn!("Skill report without job analysis: {e}");
            SkillReport {
                score: MatchScore::fallback(),
                ..build_skill_report(document, &JobAnalysis::default(), scorer)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cv::hydrate::hydrate_document;
    use crate::job_match::score::{ContainmentScorer, MatchLevel};
    use serde_json::json;

    fn document() -> Document {
        hydrate_document(&json!([
            {"id": "skills", "name": "Skills", "type": "nested_list",
             "items": [
                {"id": "category_0", "name": "Languages", "items": ["Python", "SQL"]},
                {"id": "category_1", "name": "Tools", "items": ["Docker"]}
             ]}
        ]))
    }

    #[test]
    fn test_current_skills_are_match_or_neutral() {
        let analysis = JobAnalysis::from_value(&json!({
            "matches": ["Docker"],
            "missing": ["Python", "React"]
        }))
        .unwrap();
        let report = build_skill_report(&document(), &analysis, &ContainmentScorer);

        let statuses: Vec<_> = report.current.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![SkillStatus::Neutral, SkillStatus::Neutral, SkillStatus::Match]
        );
        assert_eq!(report.scorer, "containment");
    }

    #[test]
    fn test_addable_excludes_present_and_duplicates() {
        let analysis = JobAnalysis::from_value(&json!({
            "missing": ["python", "React", "react ", {"skill": "Kubernetes"}, {"description": "Leadership"}, 3]
        }))
        .unwrap();
        let report = build_skill_report(&document(), &analysis, &ContainmentScorer);
        assert_eq!(report.addable, vec!["React", "Kubernetes"]);
    }

    #[test]
    fn test_unreadable_analysis_reports_fallback() {
        let report =
            skill_report_from_value(&document(), &json!({"missing": "React"}), &ContainmentScorer);
        assert_eq!(report.score.level, MatchLevel::NotRecommend);
        assert_eq!(report.score.score, 0);
        assert!(report.addable.is_empty());
        assert!(report
            .current
            .iter()
            .all(|c| c.status == SkillStatus::Neutral));
    }
}
