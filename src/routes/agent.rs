use super::{Page, Resource, RouteTree, Section};
use crate::{
    guard::{Access, RoleSet},
    models::Role,
};

pub const AGENT_ROLES: RoleSet = RoleSet::of(&[Role::Agent]);

/// Agent Route Tree
///
/// The agent panel: a dashboard plus the agent's own policy catalogue and the
/// applications and reviews routed to them.
pub fn agent_routes() -> RouteTree {
    RouteTree::new(Section::Agent, "/agent", Access::Protected(AGENT_ROLES))
        .route("", Page::Dashboard(Section::Agent))
        .resource(Resource::Policies)
        .route("applications", Page::ResourceList(Resource::Applications))
        .route("reviews", Page::ResourceList(Resource::Reviews))
}
