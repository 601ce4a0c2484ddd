//! # API REST
//!
//! REST API for Wardboard.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, the `x-api-key` guard)
//!
//! Every endpoint is a thin wrapper over a `wardboard-core` loader. Store failures answer
//! `502 Bad Gateway` with the friendly message and are posted to the notice board.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{validate_api_key, AuthError, HealthRes, HealthService, API_KEY_HEADER};
use records::{
    Admission, AdmissionStatus, AuditLog, AuditStatus, Bed, BedStatus, Condition, LogType,
};
use wardboard_core::{
    audit::{self, AlertSeverity, AuditFilter, AuditStats, AuditTab, AuditView, SecurityAlert},
    badge::badge_label,
    dashboard::{self, CountSlot, DashboardReport, DashboardStats, SlotFailure, Trend},
    notices::{Notice, NoticeBoard, NoticeLevel},
    notifications::{self, Notification, NotificationKind, Severity},
    occupancy::{self, DepartmentOccupancy, OccupancyLevel},
    search::{self, SearchKind, SearchResult},
    view::ViewSlot,
    wards::{
        self, BedFilter, BedWithAdmission, DepartmentStatus, WardAlert, WardBoard, WardSummary,
        WardTotals,
    },
    CoreConfig, RecordStore, WardError,
};
use wardboard_types::SearchTerm;

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub store: Arc<dyn RecordStore>,
    pub notices: Arc<NoticeBoard>,
    /// Notification feed kept by the badge refresher, when one runs. Read for the badge only.
    pub feed: Option<Arc<ViewSlot<Vec<Notification>>>>,
}

impl AppState {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn RecordStore>) -> Self {
        let notices = Arc::new(NoticeBoard::new(cfg.notice_limit()));
        Self {
            cfg,
            store,
            notices,
            feed: None,
        }
    }

    pub fn with_feed(mut self, feed: Arc<ViewSlot<Vec<Notification>>>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Post upstream failures to the notice board and turn the error into a response.
    fn fail(&self, context: &str, error: WardError) -> ApiError {
        if error.is_upstream() {
            self.notices.report(context, &error);
        } else {
            tracing::warn!("{}: {}", context, error);
        }
        ApiError::from(error)
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    Store(WardError),
    BadRequest(String),
    Auth(AuthError),
    NotFound(String),
}

impl From<WardError> for ApiError {
    fn from(error: WardError) -> Self {
        match error {
            WardError::InvalidInput(message) => ApiError::BadRequest(message),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Store(e) => (StatusCode::BAD_GATEWAY, e.user_message().to_owned()),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Auth(e) => (StatusCode::UNAUTHORIZED, e.to_string()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        };
        (status, Json(ErrorRes { error })).into_response()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NotificationsRes {
    pub notifications: Vec<Notification>,
    /// Badge text: absent when empty, "9+" above nine.
    pub badge: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BadgeRes {
    pub count: usize,
    /// Badge text: absent when empty, "9+" above nine.
    pub badge: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WardsQuery {
    /// Only list beds of this department.
    pub department: Option<String>,
    /// Only list beds in this state (wire value, e.g. "Ocupado").
    pub status: Option<BedStatus>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuditQuery {
    /// "todos", "seguranca", "acessos" or "modificacoes".
    pub tab: Option<String>,
    /// Matched against user, action and resource.
    pub q: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub status: Option<AuditStatus>,
    pub log_type: Option<LogType>,
    pub resource: Option<String>,
}

impl AuditQuery {
    fn into_filter(self) -> Result<AuditFilter, ApiError> {
        let tab = match self.tab.as_deref() {
            Some(tab) => tab.parse::<AuditTab>()?,
            None => AuditTab::default(),
        };
        Ok(AuditFilter {
            search: self.q.as_deref().and_then(SearchTerm::parse),
            tab,
            date_from: self.from,
            date_to: self.to,
            status: self.status,
            log_type: self.log_type,
            resource: self.resource.filter(|r| !r.is_empty()),
        })
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        get_dashboard,
        get_occupancy,
        get_wards,
        get_notifications,
        get_badge,
        get_search,
        get_audit,
        get_audit_stats,
        list_notices,
        remove_notice,
        clear_notices,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        DashboardReport,
        DashboardStats,
        Trend,
        SlotFailure,
        CountSlot,
        DepartmentOccupancy,
        OccupancyLevel,
        WardBoard,
        WardSummary,
        WardTotals,
        DepartmentStatus,
        WardAlert,
        BedWithAdmission,
        Bed,
        BedStatus,
        Admission,
        AdmissionStatus,
        Condition,
        NotificationsRes,
        BadgeRes,
        Notification,
        NotificationKind,
        Severity,
        SearchResult,
        SearchKind,
        AuditView,
        AuditLog,
        AuditStatus,
        LogType,
        AuditTab,
        SecurityAlert,
        AlertSeverity,
        AuditStats,
        Notice,
        NoticeLevel,
    ))
)]
pub struct ApiDoc;

/// Build the REST router.
///
/// `/health` and the Swagger UI stay open; everything else requires the configured API key.
pub fn router(state: AppState) -> Router {
    let guarded = Router::new()
        .route("/dashboard", get(get_dashboard))
        .route("/occupancy", get(get_occupancy))
        .route("/wards", get(get_wards))
        .route("/notifications", get(get_notifications))
        .route("/notifications/badge", get(get_badge))
        .route("/search", get(get_search))
        .route("/audit", get(get_audit))
        .route("/audit/stats", get(get_audit_stats))
        .route("/notices", get(list_notices).delete(clear_notices))
        .route("/notices/:id", delete(remove_notice))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(guarded)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn require_api_key(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok());
    validate_api_key(state.cfg.api_key(), provided).map_err(|e| {
        tracing::warn!("rejected request to {}: {}", req.uri().path(), e);
        ApiError::Auth(e)
    })?;
    Ok(next.run(req).await)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Does not touch the record store.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "KPIs, occupancy and any failed requests", body = DashboardReport)
    )
)]
/// Dashboard KPIs and occupancy
///
/// Never fails as a whole: each failed request is listed in `failures`, posted to the notice
/// board, and its figure is zero.
async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardReport> {
    let report = dashboard::load_dashboard(state.store.as_ref(), state.cfg.now()).await;
    for failure in &report.failures {
        state
            .notices
            .push(failure.message.clone(), None, NoticeLevel::Error);
    }
    Json(report)
}

#[utoipa::path(
    get,
    path = "/occupancy",
    responses(
        (status = 200, description = "Departments by descending occupancy", body = [DepartmentOccupancy]),
        (status = 502, description = "Record store failure", body = ErrorRes)
    )
)]
async fn get_occupancy(
    State(state): State<AppState>,
) -> Result<Json<Vec<DepartmentOccupancy>>, ApiError> {
    occupancy::load_occupancy(state.store.as_ref())
        .await
        .map(Json)
        .map_err(|e| state.fail("load_occupancy", e))
}

#[utoipa::path(
    get,
    path = "/wards",
    params(WardsQuery),
    responses(
        (status = 200, description = "Ward summary and filtered bed listing", body = WardBoard),
        (status = 502, description = "Record store failure", body = ErrorRes)
    )
)]
async fn get_wards(
    State(state): State<AppState>,
    Query(query): Query<WardsQuery>,
) -> Result<Json<WardBoard>, ApiError> {
    let filter = BedFilter {
        department: query.department.filter(|d| !d.is_empty()),
        status: query.status,
    };
    wards::load_ward_board(state.store.as_ref(), state.cfg.departments(), &filter)
        .await
        .map(Json)
        .map_err(|e| state.fail("load_ward_board", e))
}

#[utoipa::path(
    get,
    path = "/notifications",
    responses(
        (status = 200, description = "Current notification feed", body = NotificationsRes),
        (status = 502, description = "Record store failure", body = ErrorRes)
    )
)]
/// Notification feed and badge
///
/// Always recomputed against the current time so windows and look-backs age out.
async fn get_notifications(
    State(state): State<AppState>,
) -> Result<Json<NotificationsRes>, ApiError> {
    let notifications = notifications::fetch_notifications(state.store.as_ref(), state.cfg.now())
        .await
        .map_err(|e| state.fail("fetch_notifications", e))?;
    let badge = badge_label(notifications.len());
    Ok(Json(NotificationsRes {
        notifications,
        badge,
    }))
}

#[utoipa::path(
    get,
    path = "/notifications/badge",
    responses(
        (status = 200, description = "Notification count and badge text", body = BadgeRes),
        (status = 502, description = "Record store failure", body = ErrorRes)
    )
)]
/// Notification badge
///
/// Read from the badge refresher once it has published, which recomputes on changes and on a
/// fixed period. Computed on demand otherwise.
async fn get_badge(State(state): State<AppState>) -> Result<Json<BadgeRes>, ApiError> {
    let cached = state.feed.as_ref().and_then(|slot| slot.current());
    let count = match cached {
        Some(feed) => feed.len(),
        None => notifications::fetch_notifications(state.store.as_ref(), state.cfg.now())
            .await
            .map_err(|e| state.fail("fetch_notifications", e))?
            .len(),
    };
    Ok(Json(BadgeRes {
        count,
        badge: badge_label(count),
    }))
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Patients, professionals and records, five of each at most", body = [SearchResult]),
        (status = 502, description = "Record store failure", body = ErrorRes)
    )
)]
async fn get_search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchResult>>, ApiError> {
    search::search(state.store.as_ref(), &query.q)
        .await
        .map(Json)
        .map_err(|e| state.fail("global_search", e))
}

#[utoipa::path(
    get,
    path = "/audit",
    params(AuditQuery),
    responses(
        (status = 200, description = "Filtered audit entries with alerts and resources", body = AuditView),
        (status = 400, description = "Unknown tab", body = ErrorRes),
        (status = 502, description = "Record store failure", body = ErrorRes)
    )
)]
async fn get_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
) -> Result<Json<AuditView>, ApiError> {
    let filter = query.into_filter()?;
    let logs = audit::fetch_audit_logs(state.store.as_ref())
        .await
        .map_err(|e| state.fail("fetch_audit_logs", e))?;
    Ok(Json(audit::audit_view(&logs, &filter)))
}

#[utoipa::path(
    get,
    path = "/audit/stats",
    responses(
        (status = 200, description = "Audit statistics", body = AuditStats),
        (status = 502, description = "Record store failure", body = ErrorRes)
    )
)]
async fn get_audit_stats(State(state): State<AppState>) -> Result<Json<AuditStats>, ApiError> {
    audit::load_audit_stats(state.store.as_ref(), state.cfg.now())
        .await
        .map(Json)
        .map_err(|e| state.fail("load_audit_stats", e))
}

#[utoipa::path(
    get,
    path = "/notices",
    responses(
        (status = 200, description = "Notices, newest first", body = [Notice])
    )
)]
async fn list_notices(State(state): State<AppState>) -> Json<Vec<Notice>> {
    Json(state.notices.notices())
}

#[utoipa::path(
    delete,
    path = "/notices/{id}",
    params(("id" = u64, Path, description = "Notice id")),
    responses(
        (status = 204, description = "Notice removed"),
        (status = 404, description = "No such notice", body = ErrorRes)
    )
)]
async fn remove_notice(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    if state.notices.remove(Some(id)) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("notice {id} not found")))
    }
}

#[utoipa::path(
    delete,
    path = "/notices",
    responses(
        (status = 204, description = "Board cleared")
    )
)]
async fn clear_notices(State(state): State<AppState>) -> StatusCode {
    state.notices.remove(None);
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request as HttpRequest;
    use http_body_util::BodyExt;
    use async_trait::async_trait;
    use chrono::{Duration, SecondsFormat, Utc};
    use records::Row;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wardboard_core::store::{Filter, Query as StoreQuery, Table};
    use wardboard_core::{MemoryStore, WardResult};

    /// A record store whose backend is unreachable.
    struct DownStore;

    #[async_trait]
    impl RecordStore for DownStore {
        async fn query(&self, _table: Table, _query: &StoreQuery) -> WardResult<Vec<Row>> {
            Err(WardError::Backend {
                status: 503,
                message: "network down".into(),
            })
        }

        async fn count(&self, _table: Table, _filters: &[Filter]) -> WardResult<u64> {
            Err(WardError::Backend {
                status: 503,
                message: "network down".into(),
            })
        }
    }

    /// Two registrations: one from a few minutes ago, one past the 24 hour look-back.
    fn recent_patients() -> MemoryStore {
        let ago = |d: Duration| (Utc::now() - d).to_rfc3339_opts(SecondsFormat::Secs, true);
        let snapshot = json!({
            "patients": [
                {"id": "0b0e3a6c-8c4d-4f7c-9a51-2b8f7e1d0011", "name": "Helena", "status": "Ativo", "created_at": ago(Duration::minutes(5))},
                {"id": "0b0e3a6c-8c4d-4f7c-9a51-2b8f7e1d0012", "name": "Otto", "status": "Ativo", "created_at": ago(Duration::hours(25))}
            ]
        });
        MemoryStore::from_snapshot_json(&snapshot.to_string()).unwrap()
    }

    fn stale_feed() -> Arc<ViewSlot<Vec<Notification>>> {
        let slot: Arc<ViewSlot<Vec<Notification>>> = Arc::new(ViewSlot::new());
        let ticket = slot.begin();
        slot.publish(ticket, Vec::new());
        slot
    }

    fn snapshot() -> String {
        json!({
            "beds": [
                {"id": "7d6a1c5e-2f5a-4a57-9d0e-3f1f6b1c0001", "bed_number": "01", "department": "UTI", "status": "Ocupado"},
                {"id": "7d6a1c5e-2f5a-4a57-9d0e-3f1f6b1c0002", "bed_number": "02", "department": "UTI", "status": "Disponível"},
                {"id": "7d6a1c5e-2f5a-4a57-9d0e-3f1f6b1c0003", "bed_number": "03", "department": "Pediatria", "status": "Ocupado"}
            ],
            "patients": [
                {"id": "0b0e3a6c-8c4d-4f7c-9a51-2b8f7e1d0001", "name": "Joana Silva", "cpf": "123.456.789-00", "status": "Ativo", "created_at": "2026-01-05T10:00:00Z"}
            ],
            "professionals": [
                {"id": "5c9f2e1a-7b3d-4e6f-8a2c-1d4b6e8f0001", "name": "Dra. Lia Silva", "specialty": "Cardiologia"}
            ],
            "audit_logs": [
                {"id": "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b0001", "created_at": "2026-01-05T10:00:00Z", "user_name": "ana", "action": "login", "resource": "auth", "status": "sucesso", "log_type": "autenticacao"},
                {"id": "9a8b7c6d-5e4f-4a3b-8c2d-1e0f9a8b0002", "created_at": "2026-01-05T11:00:00Z", "user_name": "rui", "action": "export", "resource": "patients", "status": "bloqueado", "log_type": "seguranca"}
            ]
        })
        .to_string()
    }

    fn app_with(cfg: CoreConfig) -> (Router, AppState) {
        let store = MemoryStore::from_snapshot_json(&snapshot()).unwrap();
        let state = AppState::new(Arc::new(cfg), Arc::new(store));
        (router(state.clone()), state)
    }

    fn app() -> Router {
        app_with(CoreConfig::for_snapshot("snapshot.json")).0
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let res = app
            .oneshot(HttpRequest::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = res.status();
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn health_is_open() {
        let (status, body) = get_json(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn occupancy_is_sorted() {
        let (status, body) = get_json(app(), "/occupancy").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["name"], "Pediatria");
        assert_eq!(body[0]["percentage"], 100);
        assert_eq!(body[0]["level"], "critical");
        assert_eq!(body[1]["percentage"], 50);
    }

    #[tokio::test]
    async fn dashboard_reports_counts() {
        let (status, body) = get_json(app(), "/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["total_patients"], 1);
        assert_eq!(body["stats"]["occupancy_percentage"], 67);
        assert_eq!(body["failures"], json!([]));
    }

    #[tokio::test]
    async fn wards_filter_by_status() {
        let (status, body) = get_json(app(), "/wards?status=Ocupado").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["totals"]["total_beds"], 3);
        assert_eq!(body["beds"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_merges_categories() {
        let (status, body) = get_json(app(), "/search?q=silva").await;
        assert_eq!(status, StatusCode::OK);
        let kinds: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, ["patient", "professional"]);

        let (_, empty) = get_json(app(), "/search?q=").await;
        assert_eq!(empty, json!([]));
    }

    #[tokio::test]
    async fn audit_tab_and_unknown_tab() {
        let (status, body) = get_json(app(), "/audit?tab=seguranca").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logs"].as_array().unwrap().len(), 1);
        assert_eq!(body["alerts"][0]["severity"], "alta");
        assert_eq!(body["resources"], json!(["patients", "auth"]));

        let (status, body) = get_json(app(), "/audit?tab=nope").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("nope"));
    }

    #[tokio::test]
    async fn audit_stats() {
        let (status, body) = get_json(app(), "/audit/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success_rate"], 50.0);
        assert_eq!(body["blocked_attempts"], 1);
    }

    #[tokio::test]
    async fn api_key_guards_everything_but_health() {
        let cfg = CoreConfig::new(
            wardboard_core::StoreBackend::Snapshot("snapshot.json".into()),
            chrono::FixedOffset::east_opt(0).unwrap(),
            vec!["UTI".into()],
            1,
            Some("s3cret".into()),
        )
        .unwrap();
        let (app, _) = app_with(cfg);

        let (status, _) = get_json(app.clone(), "/occupancy").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = get_json(app.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);

        let res = app
            .oneshot(
                HttpRequest::get("/occupancy")
                    .header(API_KEY_HEADER, "s3cret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn notices_can_be_removed() {
        let (app, state) = app_with(CoreConfig::for_snapshot("snapshot.json"));
        let id = state.notices.report(
            "fetch_dashboard_stats",
            &WardError::Backend {
                status: 503,
                message: "network down".into(),
            },
        );

        let (_, body) = get_json(app.clone(), "/notices").await;
        assert_eq!(
            body[0]["title"],
            "Erro de conexão. Verifique sua internet e tente novamente."
        );

        let uri = format!("/notices/{id}");
        let res = app
            .clone()
            .oneshot(HttpRequest::delete(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);

        let res = app
            .oneshot(HttpRequest::delete(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn notifications_are_computed_against_now() {
        let cfg = Arc::new(CoreConfig::for_snapshot("snapshot.json"));
        let state = AppState::new(cfg, Arc::new(recent_patients())).with_feed(stale_feed());

        let (status, body) = get_json(router(state), "/notifications").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["badge"], "1");
        let feed = body["notifications"].as_array().unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0]["message"], "Helena foi cadastrado");
    }

    #[tokio::test]
    async fn badge_follows_the_refresher_when_present() {
        let cfg = Arc::new(CoreConfig::for_snapshot("snapshot.json"));
        let store: Arc<dyn RecordStore> = Arc::new(recent_patients());

        let on_demand = AppState::new(cfg.clone(), store.clone());
        let (status, body) = get_json(router(on_demand), "/notifications/badge").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"count": 1, "badge": "1"}));

        let refreshed = AppState::new(cfg, store).with_feed(stale_feed());
        let (_, body) = get_json(router(refreshed), "/notifications/badge").await;
        assert_eq!(body, json!({"count": 0, "badge": null}));
    }

    #[tokio::test]
    async fn notification_failures_become_bad_gateway() {
        let cfg = Arc::new(CoreConfig::for_snapshot("snapshot.json"));
        let state = AppState::new(cfg, Arc::new(DownStore));

        let (status, body) = get_json(router(state.clone()), "/notifications").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(state.notices.notices()[0].title, body["error"]);
    }

    #[tokio::test]
    async fn dashboard_failures_reach_the_notice_board() {
        let cfg = Arc::new(CoreConfig::for_snapshot("snapshot.json"));
        let state = AppState::new(cfg, Arc::new(DownStore));

        let (status, body) = get_json(router(state.clone()), "/dashboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["stats"]["total_patients"], 0);
        let failures = body["failures"].as_array().unwrap();
        assert!(!failures.is_empty());

        let notices = state.notices.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, failures[0]["message"]);
    }

    #[tokio::test]
    async fn store_failures_become_bad_gateway() {
        let error = ApiError::from(WardError::Backend {
            status: 500,
            message: "duplicate key value violates unique constraint".into(),
        });
        let res = error.into_response();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Este registro já existe no sistema.");
    }
}
