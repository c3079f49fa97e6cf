use brokerage_portal::{
    error::AuthError,
    models::{ApiUser, Credentials, Role, Session, SessionStatus, SessionView, UnknownRole},
    session::SessionState,
};
use serde_json::json;

// --- Wire Format ---

#[test]
fn test_api_user_accepts_mongo_style_fields() {
    let user: ApiUser = serde_json::from_value(json!({
        "_id": "65f0c2",
        "displayName": "Dana Doe",
        "email": "dana@example.com",
        "role": "agent",
        "isAdmin": true
    }))
    .unwrap();

    assert_eq!(user.id, "65f0c2");
    assert_eq!(user.name, "Dana Doe");
    assert_eq!(user.role.as_deref(), Some("agent"));
    assert!(user.is_admin);
}

#[test]
fn test_api_user_optional_fields_default() {
    let user: ApiUser = serde_json::from_value(json!({
        "id": "u-1",
        "email": "u@example.com"
    }))
    .unwrap();

    assert_eq!(user.name, "");
    assert_eq!(user.role, None);
    assert!(!user.is_admin);
}

// --- Roles ---

#[test]
fn test_role_parsing_is_case_insensitive() {
    assert_eq!("Agent".parse::<Role>(), Ok(Role::Agent));
    assert_eq!(" ADMIN ".parse::<Role>(), Ok(Role::Admin));
    assert_eq!("user".parse::<Role>(), Ok(Role::Customer));
    assert_eq!(
        "underwriter".parse::<Role>(),
        Err(UnknownRole("underwriter".to_string()))
    );
}

#[test]
fn test_unknown_role_yields_session_without_role() {
    let session = Session::from_api_user(ApiUser {
        id: "u-2".to_string(),
        name: "Sam".to_string(),
        email: "sam@example.com".to_string(),
        role: Some("underwriter".to_string()),
        is_admin: false,
    });
    assert_eq!(session.role, None);
    assert_eq!(session.display_name, "Sam");
}

// --- Browser Views ---

#[test]
fn test_session_view_serializes_lowercase_status() {
    let loading = serde_json::to_value(SessionState::Loading.view()).unwrap();
    assert_eq!(loading, json!({ "status": "loading", "user": null }));

    let session = Session::from_api_user(ApiUser {
        id: "u-3".to_string(),
        name: "Robin".to_string(),
        email: "robin@example.com".to_string(),
        role: Some("customer".to_string()),
        is_admin: false,
    });
    let view = SessionState::Active(session).view();
    assert_eq!(view.status, SessionStatus::Authenticated);

    let value = serde_json::to_value(&view).unwrap();
    assert_eq!(value["status"], "authenticated");
    assert_eq!(value["user"]["role"], "customer");

    let back: SessionView = serde_json::from_value(value).unwrap();
    assert_eq!(back, view);
}

#[test]
fn test_credentials_debug_hides_password() {
    let credentials = Credentials {
        email: "a@example.com".to_string(),
        password: "hunter2".to_string(),
    };
    let printed = format!("{credentials:?}");
    assert!(printed.contains("a@example.com"));
    assert!(!printed.contains("hunter2"));
}

// --- Errors ---

#[test]
fn test_auth_error_status_mapping() {
    use axum::http::StatusCode;

    assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AuthError::TokenRejected.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(AuthError::Timeout.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(
        AuthError::Transport("refused".to_string()).status(),
        StatusCode::BAD_GATEWAY
    );
    assert_eq!(
        AuthError::UnexpectedStatus(500).user_message(),
        AuthError::Timeout.user_message()
    );
}
