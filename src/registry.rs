use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{auth::TokenVerifier, backend::AuthBackendState, session::SessionStore};

struct ClientEntry {
    store: Arc<SessionStore>,
    last_seen: Instant,
}

/// SessionRegistry
///
/// Provider of Session Stores, one per browser client. A client's store is created
/// on its first request (its "application start"), reused for every request that
/// carries the client cookie, and torn down explicitly or once it has been idle too long.
pub struct SessionRegistry {
    backend: AuthBackendState,
    verifier: Option<TokenVerifier>,
    restore_timeout: Option<Duration>,
    clients: RwLock<HashMap<Uuid, ClientEntry>>,
}

/// SessionRegistryState
///
/// Shared handle pulled out of `AppState` by the `ClientSession` extractor.
pub type SessionRegistryState = Arc<SessionRegistry>;

impl SessionRegistry {
    pub fn new(backend: AuthBackendState) -> Self {
        Self {
            backend,
            verifier: None,
            restore_timeout: None,
            clients: RwLock::new(HashMap::new()),
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

    /// Looks up a known client and marks it as seen.
    pub async fn attach(&self, id: Uuid) -> Option<Arc<SessionStore>> {
        let mut clients = self.clients.write().await;
        let entry = clients.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.store.clone())
    }

    /// provide
    ///
    /// Registers a new client and starts its session restore. Without a token there
    /// is nothing to ask the auth service, so the store resolves before this returns.
    /// With a token the restore runs on its own task and the store stays `Loading`
    /// until it completes.
    pub async fn provide(&self, token: Option<String>) -> (Uuid, Arc<SessionStore>) {
        let id = Uuid::new_v4();
        let has_token = token.is_some();
        let store = Arc::new(
            SessionStore::new(self.backend.clone(), token)
                .with_verifier(self.verifier.clone())
                .with_restore_timeout(self.restore_timeout),
        );

        self.clients.write().await.insert(
            id,
            ClientEntry {
                store: store.clone(),
                last_seen: Instant::now(),
            },
        );

        if has_token {
            let pending = store.clone();
            tokio::spawn(async move {
                pending.restore_if_pending().await;
            });
        } else {
            store.restore_session().await;
        }

        tracing::debug!(client_id = %id, restoring = has_token, "client session provided");
        (id, store)
    }

    /// ephemeral
    ///
    /// An anonymous store that is not registered. Serves clients that have neither
    /// a client cookie nor a token, so cookieless traffic leaves no trace here.
    /// Call `adopt` once such a client has something worth remembering.
    pub fn ephemeral(&self) -> Arc<SessionStore> {
        Arc::new(
            SessionStore::anonymous(self.backend.clone())
                .with_verifier(self.verifier.clone())
                .with_restore_timeout(self.restore_timeout),
        )
    }

    /// Registers an existing store under a new client id.
    pub async fn adopt(&self, store: Arc<SessionStore>) -> Uuid {
        let id = Uuid::new_v4();
        self.clients.write().await.insert(
            id,
            ClientEntry {
                store,
                last_seen: Instant::now(),
            },
        );
        tracing::debug!(client_id = %id, "client session adopted");
        id
    }

    /// Drops a client's store. Returns whether the client was known.
    pub async fn teardown(&self, id: Uuid) -> bool {
        self.clients.write().await.remove(&id).is_some()
    }

    /// Tears down every client not seen within `max_idle`. Returns how many were removed.
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut clients = self.clients.write().await;
        let before = clients.len();
        clients.retain(|_, entry| entry.last_seen.elapsed() < max_idle);
        before - clients.len()
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
