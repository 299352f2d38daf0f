//! JSON API routes.
//!
//! - `POST  /api/calls`             — ingest a call (optional `Idempotency-Key` header)
//! - `POST  /api/rules`             — create a rule
//! - `GET   /api/rules?enabled=true` — list rules, optionally enabled-only
//! - `PATCH /api/rules/{id}`        — partial rule update
//! - `POST  /api/rules/{id}/toggle` — flip a rule's enabled flag
//! - `GET   /api/alerts?ruleId=&callId=` — list alerts with optional filters

use std::fmt::Display;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info};

use callwatch_core::domain::call::NewCall;
use callwatch_core::domain::rule::{NewRule, Rule, RuleId, RuleUpdate};
use callwatch_core::domain::{alert::Alert, call::CallId};
use callwatch_db::repositories::{
    AlertFilter, AlertRepository, CallRepository, RuleRepository, SqlAlertRepository,
    SqlCallRepository, SqlRuleRepository,
};
use callwatch_db::DbPool;

use crate::ingest::{IngestError, IngestOutcome, IngestionService};

const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

#[derive(Clone)]
pub struct ApiState {
    ingestion: Arc<IngestionService>,
    rules: Arc<dyn RuleRepository>,
    alerts: Arc<dyn AlertRepository>,
}

impl ApiState {
    pub fn with_sqlite(pool: DbPool) -> Self {
        Self::with_repositories(
            Arc::new(SqlCallRepository::new(pool.clone())),
            Arc::new(SqlRuleRepository::new(pool.clone())),
            Arc::new(SqlAlertRepository::new(pool)),
        )
    }

    pub fn with_repositories(
        calls: Arc<dyn CallRepository>,
        rules: Arc<dyn RuleRepository>,
        alerts: Arc<dyn AlertRepository>,
    ) -> Self {
        let ingestion = Arc::new(IngestionService::new(calls, rules.clone(), alerts.clone()));
        Self { ingestion, rules, alerts }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/calls", post(submit_call))
        .route("/api/rules", post(create_rule).get(list_rules))
        .route("/api/rules/{id}", patch(update_rule))
        .route("/api/rules/{id}/toggle", post(toggle_rule))
        .route("/api/alerts", get(list_alerts))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Fields default to empty strings so absent and blank inputs both surface
/// as a validation error (400) rather than a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubmitCallRequest {
    timestamp: String,
    phone: String,
    location: String,
    transcript: String,
}

impl From<SubmitCallRequest> for NewCall {
    fn from(request: SubmitCallRequest) -> Self {
        Self {
            timestamp: request.timestamp,
            phone: request.phone,
            location: request.location,
            transcript: request.transcript,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct CreateRuleRequest {
    name: String,
    keywords: Vec<String>,
    enabled: bool,
}

impl Default for CreateRuleRequest {
    fn default() -> Self {
        Self { name: String::new(), keywords: Vec::new(), enabled: true }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ListRulesQuery {
    enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ListAlertsQuery {
    #[serde(rename = "ruleId")]
    rule_id: Option<String>,
    #[serde(rename = "callId")]
    call_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}

/// Logs the underlying failure and returns the generic server error; storage
/// details never reach the client.
fn internal(context: &str, error: impl Display) -> ApiError {
    error!(event_name = "api.internal_error", context, error = %error, "request failed");
    ApiError::Internal
}

impl From<IngestError> for ApiError {
    fn from(error: IngestError) -> Self {
        match error {
            IngestError::Validation(error) => Self::BadRequest(error.to_string()),
            IngestError::Repository(error) => internal("ingest", error),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn submit_call(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<SubmitCallRequest>,
) -> Result<(StatusCode, Json<IngestOutcome>), ApiError> {
    let idempotency_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    let outcome = state.ingestion.ingest(body.into(), idempotency_key).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn create_rule(
    State(state): State<ApiState>,
    Json(body): Json<CreateRuleRequest>,
) -> Result<(StatusCode, Json<Rule>), ApiError> {
    let input = NewRule { name: body.name, keywords: body.keywords, enabled: body.enabled };
    input.validate().map_err(|error| ApiError::BadRequest(error.to_string()))?;

    let rule =
        state.rules.create(input).await.map_err(|error| internal("create rule", error))?;

    info!(event_name = "rules.created", rule_id = %rule.id.0, "rule created");
    Ok((StatusCode::CREATED, Json(rule)))
}

async fn list_rules(
    State(state): State<ApiState>,
    Query(query): Query<ListRulesQuery>,
) -> Result<Json<Vec<Rule>>, ApiError> {
    let only_enabled = query.enabled == Some(true);
    let rules = state
        .rules
        .list(only_enabled)
        .await
        .map_err(|error| internal("list rules", error))?;
    Ok(Json(rules))
}

async fn update_rule(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(update): Json<RuleUpdate>,
) -> Result<Json<Rule>, ApiError> {
    if update.is_empty() {
        return Err(ApiError::BadRequest(
            "update must supply at least one field".to_string(),
        ));
    }
    update.validate().map_err(|error| ApiError::BadRequest(error.to_string()))?;

    let updated = state
        .rules
        .update(&RuleId(id.clone()), update)
        .await
        .map_err(|error| internal("update rule", error))?
        .ok_or_else(|| ApiError::NotFound(format!("rule `{id}` not found")))?;

    info!(event_name = "rules.updated", rule_id = %updated.id.0, "rule updated");
    Ok(Json(updated))
}

async fn toggle_rule(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<Rule>, ApiError> {
    let toggled = state
        .rules
        .toggle(&RuleId(id.clone()))
        .await
        .map_err(|error| internal("toggle rule", error))?
        .ok_or_else(|| ApiError::NotFound(format!("rule `{id}` not found")))?;

    info!(
        event_name = "rules.toggled",
        rule_id = %toggled.id.0,
        enabled = toggled.enabled,
        "rule toggled"
    );
    Ok(Json(toggled))
}

async fn list_alerts(
    State(state): State<ApiState>,
    Query(query): Query<ListAlertsQuery>,
) -> Result<Json<Vec<Alert>>, ApiError> {
    let filter = AlertFilter {
        rule_id: query.rule_id.map(RuleId),
        call_id: query.call_id.map(CallId),
    };
    let alerts =
        state.alerts.list(filter).await.map_err(|error| internal("list alerts", error))?;
    Ok(Json(alerts))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use callwatch_db::repositories::{
        InMemoryAlertRepository, InMemoryCallRepository, InMemoryRuleRepository,
    };

    use super::{router, ApiState};

    fn app() -> axum::Router {
        router(ApiState::with_repositories(
            Arc::new(InMemoryCallRepository::default()),
            Arc::new(InMemoryRuleRepository::default()),
            Arc::new(InMemoryAlertRepository::default()),
        ))
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("build request")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("read body");
        serde_json::from_slice(&bytes).expect("parse body")
    }

    async fn create_rule(app: &axum::Router, name: &str, keywords: Value, enabled: bool) -> Value {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/rules",
                json!({"name": name, "keywords": keywords, "enabled": enabled}),
            ))
            .await
            .expect("send request");
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    #[tokio::test]
    async fn create_rule_returns_created_rule_with_prefixed_id() {
        let app = app();
        let rule = create_rule(&app, "distress", json!(["help", "emergency"]), true).await;

        assert!(rule["id"].as_str().expect("id").starts_with("rule_"));
        assert_eq!(rule["name"], "distress");
        assert_eq!(rule["enabled"], true);
    }

    #[tokio::test]
    async fn create_rule_rejects_invalid_keyword_lists() {
        let app = app();
        for keywords in [json!([]), json!([""]), json!([" "])] {
            let response = app
                .clone()
                .oneshot(json_request(
                    "POST",
                    "/api/rules",
                    json!({"name": "bad", "keywords": keywords}),
                ))
                .await
                .expect("send request");
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let body = body_json(response).await;
            assert!(body["error"].as_str().expect("error").contains("keywords"));
        }
    }

    #[tokio::test]
    async fn list_rules_supports_enabled_filter() {
        let app = app();
        create_rule(&app, "on", json!(["help"]), true).await;
        create_rule(&app, "off", json!(["fire"]), false).await;

        let all = app
            .clone()
            .oneshot(Request::builder().uri("/api/rules").body(Body::empty()).expect("request"))
            .await
            .expect("send request");
        assert_eq!(body_json(all).await.as_array().expect("array").len(), 2);

        let enabled = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/rules?enabled=true")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("send request");
        let body = body_json(enabled).await;
        assert_eq!(body.as_array().expect("array").len(), 1);
        assert_eq!(body[0]["name"], "on");
    }

    #[tokio::test]
    async fn submit_call_creates_call_and_alerts() {
        let app = app();
        create_rule(&app, "distress", json!(["help", "emergency"]), true).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/calls",
                json!({
                    "timestamp": "2026-08-30T10:00:00Z",
                    "phone": "+15550100",
                    "location": "Sector 7",
                    "transcript": "please send help now"
                }),
            ))
            .await
            .expect("send request");
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        assert!(body["call"]["id"].as_str().expect("call id").starts_with("call_"));
        assert_eq!(body["alerts"].as_array().expect("alerts").len(), 1);
        assert_eq!(body["alerts"][0]["matchedKeywords"], json!(["help"]));
    }

    #[tokio::test]
    async fn submit_call_with_missing_field_is_a_client_error() {
        let app = app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/calls",
                json!({"timestamp": "t", "phone": "p", "location": "l"}),
            ))
            .await
            .expect("send request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().expect("error").contains("transcript"));
    }

    #[tokio::test]
    async fn repeated_idempotency_key_replays_byte_identical_outcome() {
        let app = app();
        create_rule(&app, "distress", json!(["help"]), true).await;

        let payload = json!({
            "timestamp": "2026-08-30T10:00:00Z",
            "phone": "+15550100",
            "location": "Sector 7",
            "transcript": "please send help now"
        });

        let mut bodies = Vec::new();
        for _ in 0..2 {
            let request = Request::builder()
                .method("POST")
                .uri("/api/calls")
                .header("content-type", "application/json")
                .header("idempotency-key", "abc-123")
                .body(Body::from(payload.to_string()))
                .expect("build request");
            let response = app.clone().oneshot(request).await.expect("send request");
            assert_eq!(response.status(), StatusCode::CREATED);
            bodies.push(
                to_bytes(response.into_body(), usize::MAX).await.expect("read body"),
            );
        }

        assert_eq!(bodies[0], bodies[1]);
    }

    #[tokio::test]
    async fn empty_update_body_is_rejected() {
        let app = app();
        let rule = create_rule(&app, "distress", json!(["help"]), true).await;
        let id = rule["id"].as_str().expect("id");

        let response = app
            .clone()
            .oneshot(json_request("PATCH", &format!("/api/rules/{id}"), json!({})))
            .await
            .expect("send request");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_alone() {
        let app = app();
        let rule = create_rule(&app, "distress", json!(["help"]), true).await;
        let id = rule["id"].as_str().expect("id");

        let response = app
            .clone()
            .oneshot(json_request(
                "PATCH",
                &format!("/api/rules/{id}"),
                json!({"enabled": false}),
            ))
            .await
            .expect("send request");
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["name"], "distress");
        assert_eq!(body["keywords"], json!(["help"]));
        assert_eq!(body["enabled"], false);
    }

    #[tokio::test]
    async fn update_of_unknown_rule_is_not_found() {
        let app = app();
        let response = app
            .clone()
            .oneshot(json_request("PATCH", "/api/rules/rule_missing", json!({"name": "x"})))
            .await
            .expect("send request");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn toggle_flips_enabled_and_404s_on_unknown_id() {
        let app = app();
        let rule = create_rule(&app, "distress", json!(["help"]), true).await;
        let id = rule["id"].as_str().expect("id");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/api/rules/{id}/toggle"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("send request");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["enabled"], false);

        let missing = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/rules/rule_missing/toggle")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("send request");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_alerts_filters_by_rule_and_call() {
        let app = app();
        let rule = create_rule(&app, "distress", json!(["help"]), true).await;
        let rule_id = rule["id"].as_str().expect("rule id");

        let submit = |transcript: &str| {
            json_request(
                "POST",
                "/api/calls",
                json!({
                    "timestamp": "2026-08-30T10:00:00Z",
                    "phone": "+15550100",
                    "location": "Sector 7",
                    "transcript": transcript
                }),
            )
        };

        let first = body_json(
            app.clone().oneshot(submit("help here")).await.expect("send request"),
        )
        .await;
        body_json(app.clone().oneshot(submit("help there")).await.expect("send request")).await;
        let first_call_id = first["call"]["id"].as_str().expect("call id");

        let by_rule = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/alerts?ruleId={rule_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("send request");
        assert_eq!(body_json(by_rule).await.as_array().expect("array").len(), 2);

        let by_both = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/alerts?ruleId={rule_id}&callId={first_call_id}"))
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("send request");
        let body = body_json(by_both).await;
        assert_eq!(body.as_array().expect("array").len(), 1);
        assert_eq!(body[0]["callId"], first_call_id);
    }
}
