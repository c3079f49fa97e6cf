use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};
use tokio::sync::{Mutex, watch};

use crate::{
    auth::TokenVerifier,
    backend::AuthBackendState,
    error::AuthError,
    models::{Credentials, Session, SessionStatus, SessionView},
};

/// SessionState
///
/// Resolution state of one client's identity. `Loading` until the first restore
/// finishes; afterwards either `Anonymous` or `Active`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Anonymous,
    Active(Session),
}

impl SessionState {
    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Active(session) => Some(session),
            _ => None,
        }
    }

    pub fn view(&self) -> SessionView {
        let (status, user) = match self {
            SessionState::Loading => (SessionStatus::Loading, None),
            SessionState::Anonymous => (SessionStatus::Anonymous, None),
            SessionState::Active(session) => (SessionStatus::Authenticated, Some(session.clone())),
        };
        SessionView { status, user }
    }
}

/// SessionStore
///
/// Owns the identity of exactly one client. Every transition is published on a
/// watch channel, so anything holding a receiver sees login, logout and restore
/// completion as they happen.
pub struct SessionStore {
    backend: AuthBackendState,
    verifier: Option<TokenVerifier>,
    restore_timeout: Option<Duration>,
    state: watch::Sender<SessionState>,
    // The persisted credential, mirrored from the token cookie.
    token: Mutex<Option<String>>,
    // Bumped under the token lock by every restore, login and logout. A restore
    // only publishes if nothing else has bumped it since the restore started.
    generation: AtomicU64,
    // Serializes login attempts from the same client.
    login_gate: Mutex<()>,
}

impl SessionStore {
    /// Creates a store in the `Loading` state holding the client's persisted token.
    /// Nothing is resolved until `restore_session` runs.
    pub fn new(backend: AuthBackendState, token: Option<String>) -> Self {
        Self::with_state(backend, token, SessionState::Loading)
    }

    /// A store that is already resolved to `Anonymous`, for a client with no
    /// persisted token. There is nothing to restore.
    pub fn anonymous(backend: AuthBackendState) -> Self {
        Self::with_state(backend, None, SessionState::Anonymous)
    }

    fn with_state(backend: AuthBackendState, token: Option<String>, initial: SessionState) -> Self {
        let (state, _) = watch::channel(initial);
        Self {
            backend,
            verifier: None,
            restore_timeout: None,
            state,
            token: Mutex::new(token),
            generation: AtomicU64::new(0),
            login_gate: Mutex::new(()),
        }
    }

    pub fn with_verifier(mut self, verifier: Option<TokenVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_restore_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.restore_timeout = timeout;
        self
    }

    pub fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub async fn token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    /// Waits until the state is no longer `Loading`, or `timeout` elapses, and
    /// returns whatever the state is at that point.
    pub async fn resolved(&self, timeout: Duration) -> SessionState {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so `wait_for` only fails on timeout.
        match tokio::time::timeout(timeout, rx.wait_for(|state| !state.is_loading())).await {
            Ok(Ok(state)) => (*state).clone(),
            _ => self.current(),
        }
    }

    /// restore_session
    ///
    /// Recovers the identity behind the persisted token. Every failure degrades to
    /// `Anonymous` and drops the token; nothing is surfaced to the caller.
    ///
    /// The outcome is only published if no login, logout or newer restore happened
    /// while this one was in flight, so a fresher state is never overwritten.
    pub async fn restore_session(&self) -> Option<Session> {
        self.restore(false).await
    }

    /// Initial restore for a freshly provided client. Does nothing if the store has
    /// already left `Loading`, e.g. because a login finished before this ran.
    pub async fn restore_if_pending(&self) -> Option<Session> {
        self.restore(true).await
    }

    async fn restore(&self, only_if_pending: bool) -> Option<Session> {
        let (started, token) = {
            let stored = self.token.lock().await;
            let current = self.state.borrow().clone();
            if only_if_pending && !current.is_loading() {
                return current.session().cloned();
            }
            self.state.send_replace(SessionState::Loading);
            (self.generation.fetch_add(1, Ordering::SeqCst) + 1, (*stored).clone())
        };

        let session = match token {
            None => None,
            Some(token) => match self.fetch_identity(&token).await {
                Ok(session) => Some(session),
                Err(err) => {
                    tracing::debug!(error = %err, "session restore failed, continuing unauthenticated");
                    None
                }
            },
        };

        let outcome = match &session {
            Some(session) => SessionState::Active(session.clone()),
            None => SessionState::Anonymous,
        };

        // Login and logout change token, state and generation under this same lock.
        let mut stored = self.token.lock().await;
        if self.generation.load(Ordering::SeqCst) != started {
            tracing::debug!("session restore superseded, result discarded");
            return session;
        }
        self.state.send_replace(outcome);
        if session.is_none() {
            *stored = None;
        }

        session
    }

    async fn fetch_identity(&self, token: &str) -> Result<Session, AuthError> {
        if let Some(verifier) = &self.verifier {
            verifier.verify(token)?;
        }

        let user = match self.restore_timeout {
            Some(limit) => tokio::time::timeout(limit, self.backend.current_user(token))
                .await
                .map_err(|_| AuthError::Timeout)??,
            None => self.backend.current_user(token).await?,
        };

        Ok(Session::from_api_user(user))
    }

    /// login
    ///
    /// Exchanges credentials for an identity. On success the session and token are
    /// replaced; on failure neither changes and the error is returned.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let _gate = self.login_gate.lock().await;

        let response = self.backend.login(credentials).await?;
        let session = Session::from_api_user(response.user);

        {
            let mut token = self.token.lock().await;
            *token = Some(response.token);
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.state.send_replace(SessionState::Active(session.clone()));
        }

        tracing::info!(user_id = %session.user_id, role = ?session.role, "login succeeded");
        Ok(session)
    }

    /// logout
    ///
    /// Clears the session and the token locally first, then asks the auth service to
    /// invalidate the token. A remote failure is logged and otherwise ignored.
    pub async fn logout(&self) {
        let token = {
            let mut stored = self.token.lock().await;
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.state.send_replace(SessionState::Anonymous);
            stored.take()
        };

        if let Some(token) = token {
            if let Err(err) = self.backend.logout(&token).await {
                tracing::warn!(error = %err, "remote logout failed; local session already cleared");
            }
        }
    }
}
