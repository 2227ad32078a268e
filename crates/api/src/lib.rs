mod page;
mod session;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Form, Json, State};
use axum::http::{header, HeaderMap, HeaderValue, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{body::Body, Router};
use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};
use uuid::Uuid;
use wayfinder_agents::{PlannerConfig, TripPlanner};
use wayfinder_core::{MapStatus, PlanOutcome, PlannerError, SessionView, TripForm};
use wayfinder_observability::{AppMetrics, MetricsSnapshot};
use wayfinder_storage::{MemoryStore, PlanSession, SessionRepository};

pub use page::{Notice, Page, PageRenderer};
pub use session::{build_session_cookie, read_cookie_value};

pub const SESSION_COOKIE_NAME: &str = "wayfinder_session";
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 60 * 60 * 24;
const SESSION_SWEEP_INTERVAL_SECONDS: u64 = 300;
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

const PAGE_CONTENT_SECURITY_POLICY: &str = "default-src 'self'; \
     script-src 'self' 'unsafe-inline' https://unpkg.com; \
     style-src 'self' 'unsafe-inline' https://unpkg.com; \
     img-src 'self' data: https://unpkg.com https://tile.openstreetmap.org; \
     form-action 'self'; frame-ancestors 'none'; base-uri 'none'";

#[derive(Debug, Clone)]
pub struct ApiSettings {
    pub session_ttl: Duration,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS),
            cookie_name: SESSION_COOKIE_NAME.to_string(),
            cookie_secure: false,
        }
    }
}

impl ApiSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            session_ttl: env::var("WAYFINDER_SESSION_TTL_SECONDS")
                .ok()
                .and_then(|value| value.trim().parse::<u64>().ok())
                .filter(|value| *value > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            cookie_name: defaults.cookie_name,
            cookie_secure: env::var("WAYFINDER_COOKIE_SECURE")
                .ok()
                .map(|value| matches!(value.trim(), "1" | "true" | "TRUE" | "yes"))
                .unwrap_or(defaults.cookie_secure),
        }
    }

    fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.session_ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_SESSION_TTL_SECONDS as i64))
    }
}

#[derive(Clone)]
pub struct ApiState {
    planner: Arc<TripPlanner>,
    sessions: MemoryStore,
    metrics: Arc<AppMetrics>,
    pages: Arc<PageRenderer>,
    settings: ApiSettings,
}

impl ApiState {
    pub fn new(planner: TripPlanner, sessions: MemoryStore, settings: ApiSettings) -> Result<Self> {
        Ok(Self {
            metrics: planner.metrics().clone(),
            planner: Arc::new(planner),
            sessions,
            pages: Arc::new(PageRenderer::new()?),
            settings,
        })
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp_utc: String,
    metrics: MetricsSnapshot,
}

#[derive(Debug, Serialize)]
struct PlanResponse<'a> {
    session_id: &'a str,
    map_status: MapStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    map_error: Option<String>,
    outcome: &'a PlanOutcome,
}

#[derive(Debug, Serialize)]
struct SessionResponse<'a> {
    session_id: Option<&'a str>,
    submissions: u32,
    view: &'a SessionView,
}

/// Builds the production app from `WAYFINDER_*` environment variables.
pub fn build_app() -> Result<Router> {
    let metrics = AppMetrics::shared();
    let config = PlannerConfig::from_env();
    let planner =
        TripPlanner::from_config(&config, metrics).context("failed to initialize trip planner")?;

    let sessions = MemoryStore::new();
    spawn_session_sweeper(
        sessions.clone(),
        Duration::from_secs(SESSION_SWEEP_INTERVAL_SECONDS),
    );

    let state = ApiState::new(planner, sessions, ApiSettings::from_env())?;
    Ok(build_router(state))
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/plan", post(plan_page))
        .route("/health", get(health))
        .route("/v1/plan", post(plan_json))
        .route("/v1/session", get(session_json))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(RequestBodyLimitLayer::new(MAX_REQUEST_BODY_BYTES))
        .with_state(state)
}

fn spawn_session_sweeper(sessions: MemoryStore, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match sessions.purge_expired(Utc::now()).await {
                Ok(0) => {}
                Ok(removed) => debug!(removed, "purged expired sessions"),
                Err(error) => warn!(error = %error, "session purge failed"),
            }
        }
    });
}

async fn health(State(state): State<ApiState>) -> impl IntoResponse {
    let payload = HealthResponse {
        status: "ok",
        timestamp_utc: Utc::now().to_rfc3339(),
        metrics: state.metrics.snapshot(),
    };
    (StatusCode::OK, Json(payload))
}

async fn index(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let today = today();
    let session = load_session(&state, &headers).await;
    let form = session
        .as_ref()
        .and_then(|session| session.last_form.clone())
        .unwrap_or_else(|| TripForm::defaults(today));
    let view = session
        .map(|session| session.view)
        .unwrap_or_default();

    render_page(
        &state,
        StatusCode::OK,
        &Page {
            today,
            form: &form,
            view: &view,
            notice: None,
        },
    )
}

async fn plan_page(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Form(form): Form<TripForm>,
) -> Response {
    let today = today();
    let submission = run_submission(&state, &headers, form, today).await;

    let (status, notice) = match &submission.result {
        Ok(_) => (StatusCode::OK, None),
        Err(error) => (error_status(error), Some(Notice::from_error(error))),
    };
    let form = submission.session.last_form.clone().unwrap_or_default();

    let mut response = render_page(
        &state,
        status,
        &Page {
            today,
            form: &form,
            view: &submission.session.view,
            notice,
        },
    );
    attach_session_cookie(&state, &mut response, &submission.session);
    response
}

async fn plan_json(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<TripForm>, JsonRejection>,
) -> Response {
    let form = match payload {
        Ok(Json(form)) => form,
        Err(rejection) => {
            debug!(status = rejection.status().as_u16(), "rejected plan body");
            return error_response(&PlannerError::invalid("body", rejection.body_text()));
        }
    };
    let submission = run_submission(&state, &headers, form, today()).await;

    let mut response = match &submission.result {
        Ok(outcome) => {
            let map_status = outcome.map_status();
            let payload = PlanResponse {
                session_id: &submission.session.session_id,
                map_status,
                map_error: map_status
                    .is_error()
                    .then(|| PlannerError::EmptyMap.to_string()),
                outcome,
            };
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    };
    attach_session_cookie(&state, &mut response, &submission.session);
    response
}

async fn session_json(State(state): State<ApiState>, headers: HeaderMap) -> Response {
    let session = load_session(&state, &headers).await;
    let idle = SessionView::Idle;

    let payload = match &session {
        Some(session) => SessionResponse {
            session_id: Some(&session.session_id),
            submissions: session.submissions,
            view: &session.view,
        },
        None => SessionResponse {
            session_id: None,
            submissions: 0,
            view: &idle,
        },
    };
    (StatusCode::OK, Json(payload)).into_response()
}

struct Submission {
    session: PlanSession,
    result: Result<PlanOutcome, PlannerError>,
}

/// Runs one submission against the caller's session. A successful run replaces
/// the shown plan; a rejected or failed one leaves the previous view in place.
async fn run_submission(
    state: &ApiState,
    headers: &HeaderMap,
    form: TripForm,
    today: NaiveDate,
) -> Submission {
    let ttl = state.settings.session_ttl();
    let mut session = match load_session(state, headers).await {
        Some(session) => session,
        None => PlanSession::new(Uuid::new_v4().to_string(), ttl),
    };

    let result = state.planner.submit(&form, today).await;
    if let Ok(outcome) = &result {
        session.show_plan(outcome.clone());
    }
    session.record_form(form);
    session.touch(ttl);

    if let Err(error) = state.sessions.upsert_session(&session).await {
        warn!(error = %error, session_id = %session.session_id, "failed to store session");
    }

    Submission { session, result }
}

async fn load_session(state: &ApiState, headers: &HeaderMap) -> Option<PlanSession> {
    let session_id = read_cookie_value(headers, &state.settings.cookie_name)?;
    match state.sessions.load_session(&session_id).await {
        Ok(session) => session,
        Err(error) => {
            warn!(error = %error, "failed to load session");
            None
        }
    }
}

fn render_page(state: &ApiState, status: StatusCode, page: &Page<'_>) -> Response {
    match state.pages.render(page) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(render_error) => {
            error!(error = %render_error, "page rendering failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "The page could not be rendered.",
            )
                .into_response()
        }
    }
}

fn attach_session_cookie(state: &ApiState, response: &mut Response, session: &PlanSession) {
    let cookie = build_session_cookie(
        &state.settings.cookie_name,
        &session.session_id,
        state.settings.session_ttl.as_secs(),
        state.settings.cookie_secure,
    );
    match HeaderValue::from_str(&cookie) {
        Ok(value) => {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
        Err(error) => warn!(error = %error, "session cookie was not a valid header"),
    }
}

fn error_status(error: &PlannerError) -> StatusCode {
    match error {
        error if error.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
        PlannerError::Service { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: &PlannerError) -> Response {
    let mut payload = serde_json::json!({
        "error": error.code(),
        "message": error.to_string(),
    });
    if let PlannerError::MissingInput { fields } = error {
        payload["fields"] = serde_json::json!(fields);
    }
    (error_status(error), Json(payload)).into_response()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn security_headers_middleware(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;

    response.headers_mut().insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    response.headers_mut().insert(
        header::HeaderName::from_static("content-security-policy"),
        HeaderValue::from_static(PAGE_CONTENT_SECURITY_POLICY),
    );
    if state.settings.cookie_secure {
        response.headers_mut().insert(
            header::HeaderName::from_static("strict-transport-security"),
            HeaderValue::from_static("max-age=31536000; includeSubDomains"),
        );
    }

    response
}
