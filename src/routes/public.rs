use super::{Page, RouteTree, Section};
use crate::guard::Access;

/// Public Route Tree
///
/// Pages any visitor can open, signed in or not. No guard runs for these routes,
/// so they render even while a session is still being restored.
pub fn public_routes() -> RouteTree {
    RouteTree::new(Section::Public, "/", Access::Public)
        // Marketing pages.
        .route("", Page::Home)
        .route("about", Page::About)
        .route("blog", Page::Blog)
        .route("contact", Page::Contact)
        // Identity flow. Rendered without header and footer (see `layout`).
        .route("login", Page::Login)
        .route("register", Page::Register)
        .route("not-found", Page::NotFound)
        // Parametrized detail pages.
        .route("visitor-news/:id", Page::VisitorNews)
        .route("insurance/:id", Page::InsuranceDetail)
}

/// Fallback Tree
///
/// The catch-all. Must be the last tree in the table: it matches every path.
pub fn fallback_routes() -> RouteTree {
    RouteTree::new(Section::Public, "/", Access::Public).route("*", Page::NotFound)
}
