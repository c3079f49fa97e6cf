use super::{Page, Resource, RouteTree, Section};
use crate::{
    guard::{Access, RoleSet},
    models::Role,
};

pub const MANAGEMENT_ROLES: RoleSet = RoleSet::of(&[Role::Admin, Role::Agent]);

/// Management Route Tree
///
/// Views shared by admins and agents under one layout.
pub fn management_routes() -> RouteTree {
    RouteTree::new(Section::Management, "/management", Access::Protected(MANAGEMENT_ROLES))
        .route("", Page::Dashboard(Section::Management))
        .route("applications", Page::ResourceList(Resource::Applications))
        .route("payments", Page::ResourceList(Resource::Payments))
        .route("visitors", Page::ResourceList(Resource::Visitors))
        .route("contacts", Page::ResourceList(Resource::Contacts))
}
