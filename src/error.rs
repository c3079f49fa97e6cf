use axum::http::StatusCode;
use thiserror::Error;

/// AuthError
///
/// Everything that can go wrong while talking to the authentication endpoints or
/// validating a session token. Restore swallows these (the client simply ends up
/// anonymous); login surfaces them on the login page.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("session token was rejected by the auth service")]
    TokenRejected,

    #[error("session token failed local validation: {0}")]
    InvalidToken(String),

    #[error("auth service answered with unexpected status {0}")]
    UnexpectedStatus(u16),

    #[error("auth service unreachable: {0}")]
    Transport(String),

    #[error("auth service sent a malformed response: {0}")]
    Malformed(String),

    #[error("auth service did not answer in time")]
    Timeout,
}

impl AuthError {
    /// HTTP status used when the error ends a login attempt.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidCredentials | AuthError::TokenRejected | AuthError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AuthError::UnexpectedStatus(_) | AuthError::Transport(_) | AuthError::Malformed(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    /// Message shown to the person on the login page. Never leaks backend detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Invalid email or password.",
            AuthError::TokenRejected | AuthError::InvalidToken(_) => {
                "Your session has expired. Please sign in again."
            }
            AuthError::Timeout
            | AuthError::UnexpectedStatus(_)
            | AuthError::Transport(_)
            | AuthError::Malformed(_) => "We could not reach the sign-in service. Please try again.",
        }
    }
}
