use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, sync::Arc};
use uuid::Uuid;

use crate::{error::AuthError, registry::SessionRegistryState, session::SessionStore};

/// Cookie holding the client id that keys the client's Session Store.
pub const CLIENT_COOKIE: &str = "brokerage_client";
/// Cookie holding the persisted bearer token used for session restore.
pub const TOKEN_COOKIE: &str = "brokerage_token";

/// Claims
///
/// Payload the brokerage API signs into its session tokens. Only `exp` is required;
/// the subject is informational here because identity always comes from `/auth/me`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: usize,
    #[serde(default)]
    pub iat: Option<usize>,
}

/// TokenVerifier
///
/// Local pre-check for session tokens, enabled when `AUTH_TOKEN_SECRET` is shared
/// with the API. A token with a bad signature or a past `exp` never reaches the
/// network during restore.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Ok(data.claims),
            Err(e) => match e.kind() {
                ErrorKind::ExpiredSignature => Err(AuthError::InvalidToken("expired".to_string())),
                _ => Err(AuthError::InvalidToken(e.to_string())),
            },
        }
    }
}

/// ClientSession Extractor Result
///
/// Binds a request to the Session Store of the browser that sent it.
pub struct ClientSession {
    /// `None` while the client is not registered (no client cookie, no token).
    pub id: Option<Uuid>,
    pub store: Arc<SessionStore>,
    /// True when this request registered the client, so the client cookie must be set.
    pub is_new: bool,
}

/// ClientSession Extractor Implementation
///
/// 1. Known client: the `brokerage_client` cookie names a live store in the registry.
/// 2. Token only (no cookie, unparseable id, or a store that has since been torn
///    down): a fresh store is registered, seeded with the `brokerage_token` cookie
///    for restore.
/// 3. Neither: an unregistered anonymous store. It is only registered if the
///    request signs in (see `register`).
///
/// Never rejects. An unknown browser is simply a new, possibly anonymous, client.
impl<S> FromRequestParts<S> for ClientSession
where
    S: Send + Sync,
    SessionRegistryState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let registry = SessionRegistryState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);

        let known = jar
            .get(CLIENT_COOKIE)
            .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());

        if let Some(id) = known {
            if let Some(store) = registry.attach(id).await {
                return Ok(ClientSession {
                    id: Some(id),
                    store,
                    is_new: false,
                });
            }
        }

        let token = jar
            .get(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty());

        Ok(match token {
            Some(token) => {
                let (id, store) = registry.provide(Some(token)).await;
                ClientSession {
                    id: Some(id),
                    store,
                    is_new: true,
                }
            }
            None => ClientSession {
                id: None,
                store: registry.ephemeral(),
                is_new: false,
            },
        })
    }
}

impl ClientSession {
    /// Registers the client's store if it is not registered yet.
    pub async fn register(self, registry: &SessionRegistryState) -> Self {
        match self.id {
            Some(_) => self,
            None => {
                let id = registry.adopt(self.store.clone()).await;
                ClientSession {
                    id: Some(id),
                    store: self.store,
                    is_new: true,
                }
            }
        }
    }

    /// Adds the client cookie to the jar when this request registered the client.
    pub fn remember(&self, jar: CookieJar, secure: bool) -> CookieJar {
        match self.id {
            Some(id) if self.is_new => jar.add(session_cookie(CLIENT_COOKIE, id.to_string(), secure)),
            _ => jar,
        }
    }
}

/// Builds an HttpOnly, site-wide cookie.
pub fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Removal cookie for the persisted token. Path must match the one it was set with.
pub fn clear_token_cookie() -> Cookie<'static> {
    Cookie::build(TOKEN_COOKIE).path("/").build()
}
