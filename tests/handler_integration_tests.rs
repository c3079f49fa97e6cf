use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use brokerage_portal::{
    AppConfig, AppState, MockAuthBackend, RouteTable, SessionRegistry, SessionRegistryState,
    backend::AuthBackendState,
    create_router, models::ApiUser, models::SessionStatus, models::SessionView,
};
use std::{collections::BTreeMap, sync::Arc};
use tower::ServiceExt;

// --- Test Harness ---

fn user(id: &str, name: &str, role: Option<&str>, is_admin: bool) -> ApiUser {
    ApiUser {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@example.com"),
        role: role.map(str::to_string),
        is_admin,
    }
}

/// Accounts: an agent, a customer, and a customer carrying the admin flag.
fn backend() -> MockAuthBackend {
    MockAuthBackend::new()
        .with_account("agent@example.com", "pw", user("agent-1", "Alex Agent", Some("agent"), false))
        .with_account("customer@example.com", "pw", user("cust-1", "Casey Customer", Some("customer"), false))
        .with_account("boss@example.com", "pw", user("boss-1", "Blair Boss", Some("customer"), true))
}

fn app(backend: MockAuthBackend) -> Router {
    app_with_registry(backend).0
}

fn app_with_registry(backend: MockAuthBackend) -> (Router, SessionRegistryState) {
    let registry = Arc::new(SessionRegistry::new(Arc::new(backend) as AuthBackendState));
    let routes = RouteTable::standard().unwrap();
    let router = create_router(AppState::new(registry.clone(), routes, AppConfig::default()));
    (router, registry)
}

/// Minimal browser cookie jar: remembers what the portal sets, honours removals.
#[derive(Default)]
struct Browser {
    cookies: BTreeMap<String, String>,
}

impl Browser {
    fn with_cookie(name: &str, value: &str) -> Self {
        let mut browser = Self::default();
        browser.cookies.insert(name.to_string(), value.to_string());
        browser
    }

    fn absorb(&mut self, response: &Response<Body>) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() || raw.contains("Max-Age=0") {
                self.cookies.remove(name.trim());
            } else {
                self.cookies.insert(name.trim().to_string(), value.to_string());
            }
        }
    }

    fn request(&self, method: &str, path: &str, body: Body) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(path);
        if !self.cookies.is_empty() {
            let header_value = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, header_value);
        }
        if method == "POST" {
            builder = builder.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        }
        builder.body(body).unwrap()
    }

    async fn get(&mut self, app: &Router, path: &str) -> Response<Body> {
        let response = app
            .clone()
            .oneshot(self.request("GET", path, Body::empty()))
            .await
            .unwrap();
        self.absorb(&response);
        response
    }

    async fn post(&mut self, app: &Router, path: &str, form: &str) -> Response<Body> {
        let response = app
            .clone()
            .oneshot(self.request("POST", path, Body::from(form.to_string())))
            .await
            .unwrap();
        self.absorb(&response);
        response
    }

    async fn login(&mut self, app: &Router, email: &str) -> Response<Body> {
        let form = format!("email={}&password=pw", email.replace('@', "%40"));
        self.post(app, "/login", &form).await
    }
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("redirect without location")
        .to_str()
        .unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// --- Scenarios ---

#[tokio::test]
async fn test_anonymous_admin_redirects_to_login() {
    let app = app(backend());
    let mut browser = Browser::default();

    let response = browser.get(&app, "/admin").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    // Nothing to remember about an anonymous visitor.
    assert!(!browser.cookies.contains_key("brokerage_client"));
}

#[tokio::test]
async fn test_agent_on_admin_resource_redirects_home() {
    let app = app(backend());
    let mut browser = Browser::default();
    browser.login(&app, "agent@example.com").await;

    let response = browser.get(&app, "/admin/manage-users").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_agent_opens_policy_form() {
    let app = app(backend());
    let mut browser = Browser::default();
    browser.login(&app, "agent@example.com").await;

    let response = browser.get(&app, "/agent/policies/add").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"data-page="policies-form""#));
    assert!(body.contains(r#"data-section="agent""#));
    assert!(body.contains("Create"));
}

#[tokio::test]
async fn test_admin_flag_opens_admin_dashboard_without_chrome() {
    let app = app(backend());
    let mut browser = Browser::default();
    browser.login(&app, "boss@example.com").await;

    let response = browser.get(&app, "/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"data-page="admin-dashboard""#));
    assert!(!body.contains("site-header"));
}

#[tokio::test]
async fn test_pending_restore_shows_loading_placeholder() {
    let app = app(backend().stalling());
    let mut browser = Browser::with_cookie("brokerage_token", "token-agent-1");

    let response = browser.get(&app, "/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CACHE_CONTROL).unwrap(),
        "no-store"
    );
    let body = body_text(response).await;
    assert!(body.contains(r#"data-page="loading""#));

    // Public pages do not wait for the session.
    let about = browser.get(&app, "/about").await;
    assert_eq!(about.status(), StatusCode::OK);
    assert!(body_text(about).await.contains(r#"data-page="about""#));
}

// --- Session Lifecycle Over HTTP ---

#[tokio::test]
async fn test_login_sets_token_and_redirects_home() {
    let app = app(backend());
    let mut browser = Browser::default();

    let response = browser.login(&app, "agent@example.com").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert_eq!(
        browser.cookies.get("brokerage_token").map(String::as_str),
        Some("token-agent-1")
    );

    let response = browser.get(&app, "/profile").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"data-page="profile""#));
    assert!(body.contains("Alex Agent"));
}

#[tokio::test]
async fn test_failed_login_shows_error_and_keeps_session() {
    let app = app(backend());
    let mut browser = Browser::default();

    let response = browser
        .post(&app, "/login", "email=agent%40example.com&password=nope")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_text(response).await;
    assert!(body.contains("Invalid email or password."));
    assert!(!browser.cookies.contains_key("brokerage_token"));

    let session = browser.get(&app, "/api/session").await;
    let view: SessionView = serde_json::from_str(&body_text(session).await).unwrap();
    assert_eq!(view.status, SessionStatus::Anonymous);
}

#[tokio::test]
async fn test_login_with_backend_down_is_bad_gateway() {
    let app = app(backend().unavailable());
    let mut browser = Browser::default();

    let response = browser.login(&app, "agent@example.com").await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(body_text(response).await.contains("could not reach the sign-in service"));
}

#[tokio::test]
async fn test_logout_clears_session_and_token_cookie() {
    let app = app(backend().failing_logout());
    let mut browser = Browser::default();
    browser.login(&app, "agent@example.com").await;

    let response = browser.post(&app, "/logout", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(!browser.cookies.contains_key("brokerage_token"));

    let response = browser.get(&app, "/profile").await;
    assert_eq!(location(&response), "/login");

    // Logging out again is harmless.
    let response = browser.post(&app, "/logout", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_token_cookie_restores_session_for_new_client() {
    let app = app(backend());
    let mut browser = Browser::with_cookie("brokerage_token", "token-agent-1");

    let response = browser.get(&app, "/api/session?wait=true").await;
    assert_eq!(response.status(), StatusCode::OK);
    let view: SessionView = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(view.status, SessionStatus::Authenticated);
    assert_eq!(view.user.unwrap().display_name, "Alex Agent");

    let response = browser.get(&app, "/agent").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains(r#"data-page="agent-dashboard""#));
}

#[tokio::test]
async fn test_rejected_token_cookie_ends_anonymous() {
    let app = app(backend());
    let mut browser = Browser::with_cookie("brokerage_token", "forged");

    let response = browser.get(&app, "/api/session?wait=true").await;
    let view: SessionView = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(view.status, SessionStatus::Anonymous);
    assert!(view.user.is_none());
}

// --- Pages & Chrome ---

#[tokio::test]
async fn test_home_header_links_follow_access() {
    let app = app(backend());

    let mut anonymous = Browser::default();
    let body = body_text(anonymous.get(&app, "/").await).await;
    assert!(body.contains("site-header"));
    assert!(body.contains("Sign in"));
    assert!(!body.contains(r#"href="/profile""#));
    assert!(!body.contains(r#"href="/admin""#));

    let mut agent = Browser::default();
    agent.login(&app, "agent@example.com").await;
    let body = body_text(agent.get(&app, "/").await).await;
    assert!(body.contains(r#"href="/profile""#));
    assert!(body.contains(r#"href="/agent""#));
    assert!(body.contains(r#"href="/management""#));
    assert!(!body.contains(r#"href="/admin""#));
    assert!(body.contains("Sign out"));
}

#[tokio::test]
async fn test_login_page_has_no_chrome() {
    let app = app(backend());
    let mut browser = Browser::default();

    let response = browser.get(&app, "/login").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"action="/login""#));
    assert!(!body.contains("site-header"));
}

#[tokio::test]
async fn test_unknown_path_renders_not_found() {
    let app = app(backend());
    let mut browser = Browser::default();

    let response = browser.get(&app, "/no/such/page").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains(r#"data-page="not-found""#));
}

#[tokio::test]
async fn test_detail_route_shows_bound_id() {
    let app = app(backend());
    let mut browser = Browser::default();

    let response = browser.get(&app, "/insurance/term-life-7").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"data-page="insurance-detail""#));
    assert!(body.contains("term-life-7"));
}

#[tokio::test]
async fn test_non_get_navigation_is_rejected() {
    let app = app(backend());
    let mut browser = Browser::default();

    let response = browser.post(&app, "/about", "").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_client_cookie_is_reused() {
    let (app, registry) = app_with_registry(backend());
    let mut browser = Browser::default();

    browser.login(&app, "agent@example.com").await;
    let first = browser.cookies.get("brokerage_client").cloned().unwrap();
    assert_eq!(registry.len().await, 1);

    let response = browser.get(&app, "/about").await;
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(browser.cookies.get("brokerage_client"), Some(&first));
    assert_eq!(registry.len().await, 1);
}

#[tokio::test]
async fn test_cookieless_traffic_registers_no_clients() {
    let (app, registry) = app_with_registry(backend());

    for path in ["/", "/about", "/admin", "/api/session", "/no/such/page"] {
        for _ in 0..20 {
            let response = Browser::default().get(&app, path).await;
            assert!(response.headers().get(header::SET_COOKIE).is_none(), "{path}");
        }
    }
    assert!(registry.is_empty().await);

    // A failed sign-in is not worth remembering either.
    Browser::default()
        .post(&app, "/login", "email=agent%40example.com&password=nope")
        .await;
    assert!(registry.is_empty().await);
}

#[tokio::test]
async fn test_chrome_follows_case_insensitive_routing() {
    let app = app(backend());
    let mut browser = Browser::default();
    browser.login(&app, "boss@example.com").await;

    let response = browser.get(&app, "/ADMIN").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains(r#"data-page="admin-dashboard""#));
    assert!(!body.contains("site-header"));
}

#[tokio::test]
async fn test_health_check() {
    let app = app(backend());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "ok");
}
