//! Score Calculator: a 0–100 job-match score and a three-level verdict, re-derived
//! from scratch after every document mutation.
//!
//! Algorithm:
//! 1. matching = current skills classified `Match` (current-skills mode)
//! 2. still_missing = `missing` entries whose lower-cased text is not exactly one of the
//!    current skills; non-string legacy entries always count
//! 3. total = matching + still_missing; zero → 100 / PASS
//! 4. match_rate = matching / total × 100, score = round(match_rate)
//! 5. PASS ≥ 80, NEGOTIABLE ≥ 60, else NOT_RECOMMEND (inclusive)

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::job_match::analysis::JobAnalysis;
use crate::job_match::classifier::{classify_skill, SkillStatus};

pub const PASS_THRESHOLD: f64 = 80.0;
pub const NEGOTIABLE_THRESHOLD: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchLevel {
    Pass,
    Negotiable,
    NotRecommend,
}

impl MatchLevel {
    pub fn from_rate(match_rate: f64) -> Self {
        if match_rate >= PASS_THRESHOLD {
            MatchLevel::Pass
        } else if match_rate >= NEGOTIABLE_THRESHOLD {
            MatchLevel::Negotiable
        } else {
            MatchLevel::NotRecommend
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub score: u32,
    pub match_rate: f64,
    pub level: MatchLevel,
    pub matching_count: usize,
    pub still_missing_count: usize,
}

impl MatchScore {
    /// Worst-case display value used when the analysis cannot be read.
    pub fn fallback() -> Self {
        Self {
            score: 0,
            match_rate: 0.0,
            level: MatchLevel::NotRecommend,
            matching_count: 0,
            still_missing_count: 0,
        }
    }
}

/// Pluggable scorer seam. Held in `AppState` as `Arc<dyn MatchScorer>`.
pub trait MatchScorer: Send + Sync {
    fn score(&self, skills: &[&str], analysis: &JobAnalysis) -> MatchScore;

    /// Label reported alongside scores, for transparency.
    fn backend(&self) -> &'static str;

    /// Scores against a raw analysis value, falling back to the worst-case score
    /// when the value has an unexpected shape.
    fn score_value(&self, skills: &[&str], analysis: &Value) -> MatchScore {
        match JobAnalysis::from_value(analysis) {
            Ok(analysis) => self.score(skills, &analysis),
            Err(e) => {
                warn!("Falling back to worst-case match score: {e}");
                MatchScore::fallback()
            }
        }
    }
}

/// Default scorer: substring-containment classification.
pub struct ContainmentScorer;

impl MatchScorer for ContainmentScorer {
    fn score(&self, skills: &[&str], analysis: &JobAnalysis) -> MatchScore {
        compute_match_score(skills, analysis)
    }

    fn backend(&self) -> &'static str {
        "containment"
    }
}

pub fn compute_match_score(skills: &[&str], analysis: &JobAnalysis) -> MatchScore {
    let matching_count = skills
        .iter()
        .filter(|skill| classify_skill(skill, analysis, true) == SkillStatus::Match)
        .count();

    let present: HashSet<String> = skills.iter().map(|s| s.to_lowercase()).collect();
    let still_missing_count = analysis
        .missing
        .iter()
        .filter(|entry| match entry.as_text() {
            Some(text) => !present.contains(&text.to_lowercase()),
            None => true,
        })
        .count();

    let total_required = matching_count + still_missing_count;
    if total_required == 0 {
        return MatchScore {
            score: 100,
            match_rate: 100.0,
            level: MatchLevel::Pass,
            matching_count,
            still_missing_count,
        };
    }

    let match_rate = matching_count as f64 / total_required as f64 * 100.0;
    MatchScore {
        score: match_rate.round() as u32,
        match_rate,
        level: MatchLevel::from_rate(match_rate),
        matching_count,
        still_missing_count,
    }
}
