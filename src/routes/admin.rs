use super::{Page, Resource, RouteTree, Section};
use crate::{
    guard::{Access, RoleSet},
    models::Role,
};

pub const ADMIN_ROLES: RoleSet = RoleSet::of(&[Role::Admin]);

/// Resources the admin panel manages, in menu order.
pub const ADMIN_RESOURCES: [Resource; 7] = [
    Resource::Users,
    Resource::Blogs,
    Resource::Policies,
    Resource::Reviews,
    Resource::HeroCarousel,
    Resource::InsuranceCarousel,
    Resource::Applications,
];

/// Admin Route Tree
///
/// The largest tree: the admin dashboard and, for every managed resource, its
/// listing, tabular edit view and add/edit form.
///
/// Unauthorized visitors are redirected like anywhere else. The panel's existence
/// is never confirmed to them.
pub fn admin_routes() -> RouteTree {
    ADMIN_RESOURCES.into_iter().fold(
        RouteTree::new(Section::Admin, "/admin", Access::Protected(ADMIN_ROLES))
            .route("", Page::Dashboard(Section::Admin)),
        RouteTree::resource,
    )
}
