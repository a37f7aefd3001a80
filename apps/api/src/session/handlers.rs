//! Axum route handlers for editing sessions.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::cv::hydrate::CvAnalysis;
use crate::cv::model::Document;
use crate::cv::recommendation::Recommendation;
use crate::cv::submission::to_submission_fields;
use crate::errors::AppError;
use crate::job_match::report::{skill_report_from_value, SkillReport};
use crate::job_match::score::{MatchScore, MatchScorer};
use crate::patch::ledger::LedgerEntry;
use crate::patch::reducer::{Action, ActionOutcome, EditorState};
use crate::session::store::Session;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub cv_analysis: CvAnalysis,
    #[serde(default)]
    pub job_analysis: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct JobAnalysisRequest {
    pub job_analysis: Value,
}

/// Everything the editor view renders. The score is derived on every read and is
/// absent until a job analysis is attached.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub document: Document,
    pub ledger: Vec<LedgerEntry>,
    pub skills: Vec<String>,
    pub score: Option<MatchScore>,
    pub pending_recommendations: Vec<Recommendation>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub outcomes: Vec<ActionOutcome>,
    pub snapshot: SessionSnapshot,
}

impl SessionSnapshot {
    fn capture(session: &Session, scorer: &dyn MatchScorer) -> Self {
        let document = &session.editor.document;
        let skills = document.unified_skills();
        let score = session
            .job_analysis
            .as_ref()
            .map(|analysis| scorer.score_value(&skills, analysis));

        Self {
            session_id: session.id,
            document: document.clone(),
            ledger: session.editor.ledger.entries().to_vec(),
            skills: skills.into_iter().map(String::from).collect(),
            score,
            pending_recommendations: session.pending.clone(),
        }
    }
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("session {id}"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Hydrates the CV analysis into a document and opens an editing session on it.
/// Upstream recommendations start out pending.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let document = request.cv_analysis.document();
    if document.sections.is_empty() {
        return Err(AppError::UnprocessableEntity(
            "cv_analysis.editable_sections has no usable sections".to_string(),
        ));
    }

    let pending = request.cv_analysis.recommendations();
    let session = Session::new(EditorState::new(document), request.job_analysis, pending);
    let snapshot = SessionSnapshot::capture(&session, state.scorer.as_ref());

    let id = state.sessions.insert(session).await;
    info!(
        "Opened session {id} with {} sections, {} pending recommendations",
        snapshot.document.sections.len(),
        snapshot.pending_recommendations.len()
    );

    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let scorer = state.scorer.as_ref();
    state
        .sessions
        .with_session(id, |session| SessionSnapshot::capture(session, scorer))
        .await
        .map(Json)
        .ok_or_else(|| session_not_found(id))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.sessions.remove(id).await {
        info!("Closed session {id}");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(id))
    }
}

/// POST /api/v1/sessions/:id/actions
///
/// Dispatches one editor action. Failed changes come back as `skipped` outcomes,
/// not as errors; the snapshot always reflects the document after the action.
pub async fn handle_dispatch_action(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(action): Json<Action>,
) -> Result<Json<ActionResponse>, AppError> {
    let scorer = state.scorer.as_ref();
    state
        .sessions
        .with_session(id, |session| {
            let outcomes = session.dispatch(action);
            ActionResponse {
                outcomes,
                snapshot: SessionSnapshot::capture(session, scorer),
            }
        })
        .await
        .map(Json)
        .ok_or_else(|| session_not_found(id))
}

/// PUT /api/v1/sessions/:id/job-analysis
///
/// Attaches (or replaces) the job analysis the session is scored against.
pub async fn handle_put_job_analysis(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<JobAnalysisRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    if !request.job_analysis.is_object() {
        return Err(AppError::Validation(
            "job_analysis must be an object".to_string(),
        ));
    }

    let scorer = state.scorer.as_ref();
    state
        .sessions
        .with_session(id, |session| {
            session.job_analysis = Some(request.job_analysis);
            SessionSnapshot::capture(session, scorer)
        })
        .await
        .map(Json)
        .ok_or_else(|| session_not_found(id))
}

/// GET /api/v1/sessions/:id/skills
///
/// Skills panel: current skills classified against the job, plus addable ones.
pub async fn handle_skill_report(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SkillReport>, AppError> {
    let scorer = state.scorer.as_ref();
    let report = state
        .sessions
        .with_session(id, |session| {
            session.job_analysis.as_ref().map(|analysis| {
                skill_report_from_value(&session.editor.document, analysis, scorer)
            })
        })
        .await
        .ok_or_else(|| session_not_found(id))?;

    report.map(Json).ok_or_else(|| {
        AppError::Validation("session has no job analysis attached".to_string())
    })
}

/// GET /api/v1/sessions/:id/submission
///
/// The flat form-field map sent when the edited CV is submitted.
pub async fn handle_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<BTreeMap<String, String>>, AppError> {
    state
        .sessions
        .with_session(id, |session| to_submission_fields(&session.editor.document))
        .await
        .map(Json)
        .ok_or_else(|| session_not_found(id))
}
