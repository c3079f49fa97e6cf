use crate::{
    AppState,
    auth::{ClientSession, TOKEN_COOKIE, clear_token_cookie, session_cookie},
    guard::Decision,
    models::{Credentials, SessionView},
    pages::{self, Frame},
};
use axum::{
    Form, Json,
    extract::{Query, State},
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

// --- Query Structs ---

/// SessionQuery
///
/// Query parameters for `GET /api/session`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SessionQuery {
    /// Block until a pending restore finishes (bounded by `SESSION_WAIT_TIMEOUT_SECS`).
    #[serde(default)]
    pub wait: bool,
}

// --- Handlers ---

/// navigate
///
/// Every browser navigation lands here: the path is matched against the route
/// table, the Access Guard decides, and the Layout Shell picks the chrome.
///
/// Unauthorized navigations are plain `303` redirects (to `/login` without a
/// session, to `/` for a wrong role). The requested path is not carried along.
pub async fn navigate(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    client: ClientSession,
    jar: CookieJar,
) -> Response {
    let jar = client.remember(jar, state.config.secure_cookies);

    if method != Method::GET && method != Method::HEAD {
        return (jar, StatusCode::METHOD_NOT_ALLOWED).into_response();
    }

    let path = uri.path();
    let session = client.store.current();

    let response = match state.routes.resolve(path) {
        Some(matched) => match matched.decide(&session) {
            Decision::Loading => pages::loading(),
            Decision::Redirect(target) => {
                tracing::debug!(
                    client_id = ?client.id,
                    path,
                    to = target.path(),
                    "navigation redirected by access guard"
                );
                Redirect::to(target.path()).into_response()
            }
            Decision::Render => {
                let frame = Frame::new(&state.routes, &state.chrome, path, &session);
                pages::page(&matched, frame)
            }
        },
        // The standard table ends in a catch-all, so this only happens for custom tables.
        None => StatusCode::NOT_FOUND.into_response(),
    };

    (jar, response).into_response()
}

/// login
///
/// Login form submission. On success the token cookie is set and the browser goes
/// home; on failure the login page is shown again with the reason, and the
/// client's session is left exactly as it was.
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in, redirected to /"),
        (status = 401, description = "Invalid credentials"),
        (status = 502, description = "Auth service unavailable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    client: ClientSession,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Response {
    let secure = state.config.secure_cookies;

    match client.store.login(&credentials).await {
        Ok(_) => {
            // A signed-in client is worth remembering.
            let client = client.register(&state.sessions).await;
            let jar = client.remember(jar, secure);
            let jar = match client.store.token().await {
                Some(token) => jar.add(session_cookie(TOKEN_COOKIE, token, secure)),
                None => jar,
            };
            (jar, Redirect::to("/")).into_response()
        }
        Err(err) => {
            tracing::info!(client_id = ?client.id, error = %err, "login failed");
            let jar = client.remember(jar, secure);
            let frame = Frame::new(&state.routes, &state.chrome, "/login", &client.store.current());
            (jar, pages::login(frame, Some(&err))).into_response()
        }
    }
}

/// logout
///
/// Always succeeds from the browser's point of view: the session is cleared
/// locally and the token cookie removed even if the auth service cannot be reached.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 303, description = "Signed out, redirected to /login"))
)]
pub async fn logout(State(state): State<AppState>, client: ClientSession, jar: CookieJar) -> Response {
    client.store.logout().await;
    let jar = client
        .remember(jar, state.config.secure_cookies)
        .remove(clear_token_cookie());
    (jar, Redirect::to("/login")).into_response()
}

/// session_status
///
/// The client's session as JSON, for the browser bundle. With `?wait=true` the
/// call holds until a pending restore has finished.
#[utoipa::path(
    get,
    path = "/api/session",
    params(SessionQuery),
    responses((status = 200, description = "Current session", body = SessionView))
)]
pub async fn session_status(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    client: ClientSession,
    jar: CookieJar,
) -> Response {
    let current = if query.wait {
        client.store.resolved(state.config.session_wait_timeout).await
    } else {
        client.store.current()
    };

    (client.remember(jar, state.config.secure_cookies), Json(current.view())).into_response()
}

/// health
///
/// Liveness probe for load balancers.
#[utoipa::path(get, path = "/health", responses((status = 200, description = "Alive")))]
pub async fn health() -> &'static str {
    "ok"
}
