//! Access Guard: decides, per navigation, whether a route renders, shows the
//! loading placeholder, or redirects.

use std::fmt;

use crate::{models::Role, session::SessionState};

/// RoleSet
///
/// Set of roles a route requires. The empty set means "any authenticated user".
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub const fn of(roles: &[Role]) -> RoleSet {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= Self::bit(roles[i]);
            i += 1;
        }
        RoleSet(bits)
    }

    const fn bit(role: Role) -> u8 {
        match role {
            Role::Customer => 1,
            Role::Agent => 1 << 1,
            Role::Admin => 1 << 2,
        }
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Access
///
/// `Public` routes are never guarded. `Protected` routes run the full guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Protected(RoleSet),
}

/// Where an unauthorized navigation ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    Login,
    Home,
}

impl RedirectTarget {
    pub fn path(self) -> &'static str {
        match self {
            RedirectTarget::Login => "/login",
            RedirectTarget::Home => "/",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Render,
    Loading,
    Redirect(RedirectTarget),
}

/// evaluate
///
/// The checks run strictly in this order and the first one that decides wins:
///
/// 1. session still resolving: loading placeholder, never a redirect
/// 2. no session: redirect to login (the requested path is not kept)
/// 3. admin flag on a route that allows the override: render
/// 4. role requirement not met: redirect home
/// 5. render
///
/// There is no "forbidden" outcome. A wrong role looks the same as any other
/// bounce to the home page.
pub fn evaluate(access: Access, allow_admin_override: bool, session: &SessionState) -> Decision {
    let required = match access {
        Access::Public => return Decision::Render,
        Access::Protected(required) => required,
    };

    let session = match session {
        SessionState::Loading => return Decision::Loading,
        SessionState::Anonymous => return Decision::Redirect(RedirectTarget::Login),
        SessionState::Active(session) => session,
    };

    if allow_admin_override && session.is_admin {
        return Decision::Render;
    }

    let role_ok = session.role.is_some_and(|role| required.contains(role));
    if !required.is_empty() && !role_ok {
        return Decision::Redirect(RedirectTarget::Home);
    }

    Decision::Render
}
