use std::net::SocketAddr;

use axum::{
    Form, Json, Router, async_trait,
    extract::{FromRequest, Path, Query, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

mod ui;

use crate::{
    audit::{self, AuditEvent},
    error::TrackerError,
    service::RawExercise,
    state::AppContext,
};

const DEFAULT_AUDIT_LIMIT: usize = 50;
const MAX_AUDIT_LIMIT: usize = 200;

#[derive(Clone)]
pub struct ServerState {
    ctx: AppContext,
}

impl ServerState {
    pub fn new(ctx: AppContext) -> Self {
        Self { ctx }
    }

    fn ctx(&self) -> &AppContext {
        &self.ctx
    }
}

pub async fn serve(state: ServerState) -> anyhow::Result<()> {
    let addr: SocketAddr = state.ctx().config().server.addr().parse()?;
    let listener = TcpListener::bind(addr).await?;
    serve_with_listener(listener, state).await
}

pub async fn serve_with_listener(listener: TcpListener, state: ServerState) -> anyhow::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "server listening");

    let app = router(state.clone());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state.ctx().clone()))
        .await?;

    Ok(())
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/healthcheck", get(health))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:id/exercises", post(add_exercise))
        .route("/api/users/:id/logs", get(exercise_log))
        .route("/api/audit", get(audit_events))
        .merge(ui::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal(ctx: AppContext) {
    ctx.shutdown_notifier().notified().await;
}

impl IntoResponse for TrackerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            TrackerError::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            TrackerError::InvalidInput(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            TrackerError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store failure".to_string(),
            ),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Body extractor accepting either `application/json` or a urlencoded form,
/// the two shapes the bundled HTML page and API clients send.
struct JsonOrForm<T>(T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonOrForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));

        if is_json {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        } else {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(IntoResponse::into_response)?;
            Ok(Self(value))
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    message: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { message: "OK" })
}

async fn list_users(State(state): State<ServerState>) -> Response {
    match state.ctx().tracker().list_users().await {
        Ok(users) => Json(users).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct NewUserRequest {
    #[serde(default)]
    username: Option<String>,
}

async fn create_user(
    State(state): State<ServerState>,
    JsonOrForm(payload): JsonOrForm<NewUserRequest>,
) -> Response {
    match state
        .ctx()
        .tracker()
        .create_user(payload.username.as_deref())
        .await
    {
        Ok(user) => Json(user).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Durations arrive as JSON numbers or as strings from forms.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DurationField {
    Number(serde_json::Number),
    Text(String),
}

impl DurationField {
    fn into_raw(self) -> String {
        match self {
            DurationField::Number(number) => number.to_string(),
            DurationField::Text(text) => text,
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewExerciseRequest {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    duration: Option<DurationField>,
    #[serde(default)]
    date: Option<String>,
}

async fn add_exercise(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    JsonOrForm(payload): JsonOrForm<NewExerciseRequest>,
) -> Response {
    let input = RawExercise {
        description: payload.description,
        duration: payload.duration.map(DurationField::into_raw),
        date: payload.date,
    };

    match state.ctx().tracker().add_exercise(&id, input).await {
        Ok(receipt) => Json(receipt).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct LogQueryParams {
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    limit: Option<String>,
}

async fn exercise_log(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Query(params): Query<LogQueryParams>,
) -> Response {
    let result = state
        .ctx()
        .tracker()
        .exercise_log(
            &id,
            params.from.as_deref(),
            params.to.as_deref(),
            params.limit.as_deref(),
        )
        .await;

    match result {
        Ok(log) => Json(log).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct AuditQueryParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct AuditEventsResponse {
    entries: Vec<AuditEvent>,
}

async fn audit_events(
    State(state): State<ServerState>,
    Query(params): Query<AuditQueryParams>,
) -> Response {
    let config = state.ctx().config();
    let data_dir = config.data_dir.clone();
    drop(config);

    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT);

    match audit::read_audit_events(&data_dir, limit).await {
        Ok(entries) => Json(AuditEventsResponse { entries }).into_response(),
        Err(err) => {
            warn!(error = ?err, "failed to read audit events");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
