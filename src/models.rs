use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Identity ---

/// Role
///
/// The closed set of roles a brokerage account can hold. Route requirements are
/// expressed as sets over this enum (see `guard::RoleSet`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    Customer,
    Agent,
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Customer, Role::Agent, Role::Admin];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when the auth service hands back a role string outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            // Older accounts were created with the generic "user" role.
            "customer" | "user" => Ok(Role::Customer),
            "agent" => Ok(Role::Agent),
            "admin" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Session
///
/// The authenticated identity of one client. Created on login or a successful
/// restore; `role` is absent when the auth service sent no role, or one we do not know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Session {
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub role: Option<Role>,
    pub is_admin: bool,
    #[ts(type = "string")]
    pub signed_in_at: DateTime<Utc>,
}

impl Session {
    /// Builds the session from the auth service's user record.
    pub fn from_api_user(user: ApiUser) -> Self {
        let role = match user.role.as_deref().map(str::parse::<Role>) {
            Some(Ok(role)) => Some(role),
            Some(Err(UnknownRole(raw))) => {
                tracing::warn!(user_id = %user.id, role = %raw, "auth service returned an unknown role");
                None
            }
            None => None,
        };

        Session {
            user_id: user.id,
            display_name: user.name,
            email: user.email,
            role,
            is_admin: user.is_admin,
            signed_in_at: Utc::now(),
        }
    }
}

// --- Auth Service Wire Types ---

/// ApiUser
///
/// User record as the brokerage API sends it from `/auth/login` and `/auth/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, alias = "displayName")]
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

/// LoginResponse
///
/// Successful credential exchange: the bearer token plus the identity it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: ApiUser,
}

/// Credentials
///
/// Login form payload. The password is passed straight through to the auth service
/// and never logged.
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

// --- Browser-Facing Views ---

/// SessionStatus
///
/// Coarse resolution state shown to the browser bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SessionStatus {
    Loading,
    Anonymous,
    Authenticated,
}

/// SessionView
///
/// Output schema for `GET /api/session`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct SessionView {
    pub status: SessionStatus,
    pub user: Option<Session>,
}
