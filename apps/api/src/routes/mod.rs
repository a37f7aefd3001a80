pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::job_match::handlers as scoring;
use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Editing sessions
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/actions",
            post(handlers::handle_dispatch_action),
        )
        .route(
            "/api/v1/sessions/:id/job-analysis",
            put(handlers::handle_put_job_analysis),
        )
        .route(
            "/api/v1/sessions/:id/skills",
            get(handlers::handle_skill_report),
        )
        .route(
            "/api/v1/sessions/:id/submission",
            get(handlers::handle_submission),
        )
        // Stateless scoring
        .route("/api/v1/score", post(scoring::handle_score))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        build_router(AppState::new(Config::default()))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn cv_analysis() -> Value {
        json!({
            "editable_sections": [
                {"id": "header", "name": "Header", "type": "object",
                 "fields": [{"id": "email", "name": "Email", "value": "ada@example.com"}]},
                {"id": "summary", "name": "Summary", "type": "textarea", "value": "Engineer."},
                {"id": "skills", "name": "Skills", "type": "nested_list",
                 "items": [{"id": "category_0", "name": "Languages", "items": ["Python", "SQL"]}]}
            ],
            "detailed_analysis": {
                "recommendations": [
                    {"id": "r1", "section": "header", "field": "email", "suggested": "ada@lovelace.dev"}
                ]
            }
        })
    }

    fn job_analysis() -> Value {
        json!({"matches": ["SQL"], "missing": ["Python", "React"]})
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send(&app(), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "cvtailor-api");
        assert_eq!(body["sessions"]["live"], 0);
    }

    #[tokio::test]
    async fn test_session_edit_flow_rescores_after_each_action() {
        let app = app();
        let (status, created) = send(
            &app,
            "POST",
            "/api/v1/sessions",
            Some(json!({"cv_analysis": cv_analysis(), "job_analysis": job_analysis()})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["score"]["score"], 50);
        assert_eq!(created["score"]["level"], "NOT_RECOMMEND");
        assert_eq!(created["pending_recommendations"][0]["id"], "r1");
        let id = created["session_id"].as_str().unwrap().to_string();

        let (_, report) = send(&app, "GET", &format!("/api/v1/sessions/{id}/skills"), None).await;
        assert_eq!(report["addable"], json!(["React"]));
        assert_eq!(report["current"][1], json!({"skill": "SQL", "status": "match"}));

        let (status, added) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/actions"),
            Some(json!({"action": "add_skill", "skill": "React"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(added["outcomes"][0]["status"], "applied");
        assert_eq!(added["snapshot"]["score"]["score"], 100);
        assert_eq!(added["snapshot"]["score"]["level"], "PASS");
        assert_eq!(added["snapshot"]["skills"], json!(["Python", "SQL", "React"]));

        let (_, applied) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/actions"),
            Some(json!({
                "action": "apply_recommendation",
                "recommendation": created["pending_recommendations"][0]
            })),
        )
        .await;
        assert_eq!(applied["outcomes"][0]["status"], "applied");
        assert_eq!(applied["snapshot"]["pending_recommendations"], json!([]));
        assert_eq!(applied["snapshot"]["ledger"].as_array().unwrap().len(), 2);

        let (_, fields) = send(&app, "GET", &format!("/api/v1/sessions/{id}/submission"), None).await;
        assert_eq!(fields["header.email"], "ada@lovelace.dev");
        assert_eq!(fields["summary"], "Engineer.");

        let entry_id = applied["outcomes"][0]["entry_id"].clone();
        let (_, undone) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/actions"),
            Some(json!({"action": "undo", "entry_id": entry_id})),
        )
        .await;
        assert_eq!(undone["outcomes"][0]["status"], "undone");
        assert_eq!(undone["snapshot"]["ledger"][1]["applied"], false);
        assert_eq!(undone["snapshot"]["ledger"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_action_is_skipped_not_an_error() {
        let app = app();
        let (_, created) = send(
            &app,
            "POST",
            "/api/v1/sessions",
            Some(json!({"cv_analysis": cv_analysis()})),
        )
        .await;
        assert!(created["score"].is_null());
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            "POST",
            &format!("/api/v1/sessions/{id}/actions"),
            Some(json!({"action": "add_skill", "skill": "python"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcomes"][0]["status"], "skipped");
        assert_eq!(body["snapshot"]["ledger"], json!([]));

        let (status, _) = send(&app, "GET", &format!("/api/v1/sessions/{id}/skills"), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_attaching_job_analysis_scores_session() {
        let app = app();
        let (_, created) = send(
            &app,
            "POST",
            "/api/v1/sessions",
            Some(json!({"cv_analysis": cv_analysis()})),
        )
        .await;
        let id = created["session_id"].as_str().unwrap().to_string();

        let (status, snapshot) = send(
            &app,
            "PUT",
            &format!("/api/v1/sessions/{id}/job-analysis"),
            Some(json!({"job_analysis": job_analysis()})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(snapshot["score"]["score"], 50);

        let (status, _) = send(
            &app,
            "PUT",
            &format!("/api/v1/sessions/{id}/job-analysis"),
            Some(json!({"job_analysis": ["SQL"]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_and_deleted_sessions_are_not_found() {
        let app = app();
        let (status, body) = send(
            &app,
            "GET",
            "/api/v1/sessions/00000000-0000-0000-0000-000000000000",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");

        let (_, created) = send(
            &app,
            "POST",
            "/api/v1/sessions",
            Some(json!({"cv_analysis": cv_analysis()})),
        )
        .await;
        let id = created["session_id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/sessions/{id}");

        let (status, _) = send(&app, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, "GET", &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cv_without_usable_sections_is_rejected() {
        let (status, body) = send(
            &app(),
            "POST",
            "/api/v1/sessions",
            Some(json!({"cv_analysis": {"editable_sections": [{"id": "x", "type": "table"}]}})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "UNPROCESSABLE_ENTITY");
    }

    #[tokio::test]
    async fn test_stateless_score_with_fallback() {
        let app = app();
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/score",
            Some(json!({"skills": ["Python", "SQL"], "job_analysis": {"missing": ["Python", "React"], "matches": []}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"]["score"], 0);
        assert_eq!(body["score"]["still_missing_count"], 1);
        assert_eq!(body["scorer"], "containment");

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/score",
            Some(json!({"skills": ["Python"], "job_analysis": {"matches": 7}})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"]["level"], "NOT_RECOMMEND");
    }
}
