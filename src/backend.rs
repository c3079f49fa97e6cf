use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::{
    error::AuthError,
    models::{ApiUser, Credentials, LoginResponse},
};

// 1. AuthBackend Contract
/// AuthBackend
///
/// The authentication endpoints of the brokerage REST API, seen from the portal.
/// The Session Store only ever talks to this trait, so tests swap the HTTP client
/// for `MockAuthBackend` without touching session or handler code.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchanges credentials for a bearer token and the identity it belongs to.
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError>;

    /// Resolves the identity behind a previously issued token ("me").
    async fn current_user(&self, token: &str) -> Result<ApiUser, AuthError>;

    /// Invalidates the token on the server side.
    async fn logout(&self, token: &str) -> Result<(), AuthError>;
}

/// AuthBackendState
///
/// The shared handle stored in the client registry and every Session Store.
pub type AuthBackendState = Arc<dyn AuthBackend>;

// 2. The Real Implementation
/// RemoteAuthBackend
///
/// `reqwest` client for `{API_BASE_URL}/auth/*`.
#[derive(Clone)]
pub struct RemoteAuthBackend {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteAuthBackend {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/{}", self.base_url, path)
    }
}

fn transport(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::Timeout
    } else {
        AuthError::Transport(err.to_string())
    }
}

#[async_trait]
impl AuthBackend for RemoteAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        let response = self
            .client
            .post(self.endpoint("login"))
            .json(credentials)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => response
                .json::<LoginResponse>()
                .await
                .map_err(|e| AuthError::Malformed(e.to_string())),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(AuthError::InvalidCredentials)
            }
            status => Err(AuthError::UnexpectedStatus(status.as_u16())),
        }
    }

    async fn current_user(&self, token: &str) -> Result<ApiUser, AuthError> {
        let response = self
            .client
            .get(self.endpoint("me"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;

        match response.status() {
            status if status.is_success() => response
                .json::<ApiUser>()
                .await
                .map_err(|e| AuthError::Malformed(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(AuthError::TokenRejected),
            status => Err(AuthError::UnexpectedStatus(status.as_u16())),
        }
    }

    async fn logout(&self, token: &str) -> Result<(), AuthError> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(transport)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AuthError::UnexpectedStatus(response.status().as_u16()))
        }
    }
}

// 3. The Mock Implementation (For Tests)
/// MockAccount
///
/// One account known to `MockAuthBackend`.
#[derive(Debug, Clone)]
pub struct MockAccount {
    pub email: String,
    pub password: String,
    pub token: String,
    pub user: ApiUser,
}

/// MockAuthBackend
///
/// In-memory stand-in for the auth endpoints, used by the unit and integration tests.
/// Accounts are matched by email and password; tokens are matched exactly.
#[derive(Default)]
pub struct MockAuthBackend {
    accounts: Vec<MockAccount>,
    /// Every call fails as if the network were down.
    unavailable: bool,
    /// `current_user` never completes.
    stall_current_user: bool,
    /// `logout` reaches the server but the server errors.
    fail_logout: bool,
    logout_calls: AtomicUsize,
    current_user_calls: AtomicUsize,
}

impl MockAuthBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account whose token is `token-<user id>`.
    pub fn with_account(mut self, email: &str, password: &str, user: ApiUser) -> Self {
        self.accounts.push(MockAccount {
            email: email.to_string(),
            password: password.to_string(),
            token: format!("token-{}", user.id),
            user,
        });
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    pub fn stalling(mut self) -> Self {
        self.stall_current_user = true;
        self
    }

    pub fn failing_logout(mut self) -> Self {
        self.fail_logout = true;
        self
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn current_user_calls(&self) -> usize {
        self.current_user_calls.load(Ordering::SeqCst)
    }

    fn offline(&self) -> Result<(), AuthError> {
        if self.unavailable {
            return Err(AuthError::Transport("Mock Auth Error: Simulation requested".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, AuthError> {
        self.offline()?;
        self.accounts
            .iter()
            .find(|a| a.email == credentials.email && a.password == credentials.password)
            .map(|a| LoginResponse {
                token: a.token.clone(),
                user: a.user.clone(),
            })
            .ok_or(AuthError::InvalidCredentials)
    }

    async fn current_user(&self, token: &str) -> Result<ApiUser, AuthError> {
        self.current_user_calls.fetch_add(1, Ordering::SeqCst);
        if self.stall_current_user {
            std::future::pending::<()>().await;
        }
        self.offline()?;
        self.accounts
            .iter()
            .find(|a| a.token == token)
            .map(|a| a.user.clone())
            .ok_or(AuthError::TokenRejected)
    }

    async fn logout(&self, _token: &str) -> Result<(), AuthError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.offline()?;
        if self.fail_logout {
            return Err(AuthError::UnexpectedStatus(500));
        }
        Ok(())
    }
}
