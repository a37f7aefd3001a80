//! Axum route handlers for stateless scoring.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::job_match::score::MatchScore;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub skills: Vec<String>,
    pub job_analysis: Value,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub score: MatchScore,
    pub scorer: &'static str,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/score
///
/// Scores a bare skill list against a job analysis without creating a session.
/// A job analysis of the wrong shape yields the worst-case score, not an error.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoreResponse>, AppError> {
    if request.job_analysis.is_null() {
        return Err(AppError::Validation(
            "job_analysis is required".to_string(),
        ));
    }

    let skills: Vec<&str> = request.skills.iter().map(String::as_str).collect();
    let score = state.scorer.score_value(&skills, &request.job_analysis);

    Ok(Json(ScoreResponse {
        score,
        scorer: state.scorer.backend(),
    }))
}
