use axum::{
    Router,
    extract::FromRef,
    http::HeaderName,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Identity: auth service client, per-client session stores and their provider.
pub mod auth;
pub mod backend;
pub mod registry;
pub mod session;

// Access control: route table, guard, chrome.
pub mod guard;
pub mod layout;
pub mod routes;

// HTTP surface.
pub mod handlers;
pub mod pages;

pub mod config;
pub mod error;
pub mod models;

// --- Public Re-exports ---

pub use backend::{AuthBackend, AuthBackendState, MockAuthBackend, RemoteAuthBackend};
pub use config::AppConfig;
pub use layout::ChromePolicy;
pub use registry::{SessionRegistry, SessionRegistryState};
pub use routes::RouteTable;

/// ApiDoc
///
/// OpenAPI document for the portal's non-page endpoints, served at
/// `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::login, handlers::logout, handlers::session_status, handlers::health),
    components(schemas(
        models::Role,
        models::Session,
        models::SessionStatus,
        models::SessionView,
        models::Credentials,
    )),
    tags((name = "brokerage-portal", description = "Brokerage customer, agent and admin portal"))
)]
struct ApiDoc;

/// AppState
///
/// The single shared container handed to every handler: the client registry that
/// owns all Session Stores, the static route table, the chrome policy and the config.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionRegistryState,
    pub routes: Arc<RouteTable>,
    pub chrome: Arc<ChromePolicy>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the standard route table and chrome policy around a registry.
    pub fn new(sessions: SessionRegistryState, routes: RouteTable, config: AppConfig) -> Self {
        Self {
            sessions,
            routes: Arc::new(routes),
            chrome: Arc::new(ChromePolicy::default()),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionRegistryState {
    fn from_ref(app_state: &AppState) -> SessionRegistryState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the portal: the few fixed endpoints first, then every other path
/// falls through to `navigate`, which runs the route table and the guard.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(handlers::health))
        .route("/api/session", get(handlers::session_status))
        // GET /login is an ordinary page; only the form post is special.
        .route("/login", get(handlers::navigate).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .fallback(handlers::navigate)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one request, correlated by its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
