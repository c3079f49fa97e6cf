use super::{Page, RouteTree, Section};
use crate::guard::{Access, RoleSet};

/// Account Route Tree
///
/// Requires a signed-in user of any role. Anonymous visitors are sent to the login page.
pub fn account_routes() -> RouteTree {
    RouteTree::new(Section::Account, "/", Access::Protected(RoleSet::EMPTY))
        .route("profile", Page::Profile)
        // Policy browsing.
        .route("policies", Page::PolicyCatalog)
        .route("policies/:id", Page::PolicyDetail)
        // Quote booking, optionally pre-selected for one policy.
        .route("quote/:policyId?", Page::QuoteBooking)
}
