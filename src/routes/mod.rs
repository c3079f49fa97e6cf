/// Route Table Module Index
///
/// The portal's static route table, split into security-segregated trees the same
/// way access is granted: public pages, the signed-in account area, the agent
/// panel, the shared management views and the admin panel. Every tree carries one
/// access requirement that applies to all of its routes.
///
/// The trees are flattened in a fixed order and matched first-match-wins, with the
/// not-found catch-all appended last.
pub mod pattern;

/// Marketing pages, login/register and the two public detail pages.
pub mod public;

/// Any signed-in user: profile, policy browsing, quote booking.
pub mod authenticated;

/// Agent panel (`{agent}`).
pub mod agent;

/// Cross-role management views (`{admin, agent}`).
pub mod management;

/// Admin panel (`{admin}`).
pub mod admin;

pub use pattern::{PatternError, RouteParams, RoutePattern};

use crate::{
    guard::{self, Access, Decision},
    session::SessionState,
};

/// Section
///
/// Which tree a route belongs to. Drives the page heading and the header links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Public,
    Account,
    Agent,
    Management,
    Admin,
}

impl Section {
    pub fn label(self) -> &'static str {
        match self {
            Section::Public => "Home",
            Section::Account => "My Account",
            Section::Agent => "Agent Panel",
            Section::Management => "Management",
            Section::Admin => "Admin Panel",
        }
    }

    /// Entry point of the section.
    pub fn root(self) -> &'static str {
        match self {
            Section::Public => "/",
            Section::Account => "/profile",
            Section::Agent => "/agent",
            Section::Management => "/management",
            Section::Admin => "/admin",
        }
    }
}

/// Resource
///
/// Records managed through the agent, management and admin dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Users,
    Blogs,
    Policies,
    Reviews,
    HeroCarousel,
    InsuranceCarousel,
    Applications,
    Payments,
    Visitors,
    Contacts,
}

impl Resource {
    pub fn slug(self) -> &'static str {
        match self {
            Resource::Users => "manage-users",
            Resource::Blogs => "blogs",
            Resource::Policies => "policies",
            Resource::Reviews => "reviews",
            Resource::HeroCarousel => "hero-carousel",
            Resource::InsuranceCarousel => "insurance-carousel",
            Resource::Applications => "applications",
            Resource::Payments => "payments",
            Resource::Visitors => "visitors",
            Resource::Contacts => "contacts",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Resource::Users => "Users",
            Resource::Blogs => "Blog Posts",
            Resource::Policies => "Policies",
            Resource::Reviews => "Reviews",
            Resource::HeroCarousel => "Hero Carousel",
            Resource::InsuranceCarousel => "Insurance Carousel",
            Resource::Applications => "Applications",
            Resource::Payments => "Payments",
            Resource::Visitors => "Visitors",
            Resource::Contacts => "Contact Requests",
        }
    }
}

/// Page
///
/// The component a route renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    About,
    Blog,
    Contact,
    Login,
    Register,
    NotFound,
    VisitorNews,
    InsuranceDetail,
    Profile,
    PolicyCatalog,
    PolicyDetail,
    QuoteBooking,
    Dashboard(Section),
    ResourceList(Resource),
    ResourceTable(Resource),
    ResourceForm(Resource),
}

impl Page {
    pub fn title(self) -> String {
        match self {
            Page::Home => "Home".to_string(),
            Page::About => "About Us".to_string(),
            Page::Blog => "Blog".to_string(),
            Page::Contact => "Contact".to_string(),
            Page::Login => "Sign In".to_string(),
            Page::Register => "Create an Account".to_string(),
            Page::NotFound => "Page Not Found".to_string(),
            Page::VisitorNews => "News".to_string(),
            Page::InsuranceDetail => "Insurance Details".to_string(),
            Page::Profile => "My Profile".to_string(),
            Page::PolicyCatalog => "Browse Policies".to_string(),
            Page::PolicyDetail => "Policy Details".to_string(),
            Page::QuoteBooking => "Book a Quote".to_string(),
            Page::Dashboard(section) => format!("{} Dashboard", section.label()),
            Page::ResourceList(resource) => resource.title().to_string(),
            Page::ResourceTable(resource) => format!("Edit {}", resource.title()),
            Page::ResourceForm(resource) => format!("{} Form", resource.title()),
        }
    }
}

/// RouteDescriptor
///
/// One entry of the route table. Built once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    pub pattern: RoutePattern,
    pub page: Page,
    pub section: Section,
    pub access: Access,
    pub allow_admin_override: bool,
}

impl RouteDescriptor {
    /// Runs the Access Guard for this route.
    pub fn decide(&self, session: &SessionState) -> Decision {
        guard::evaluate(self.access, self.allow_admin_override, session)
    }
}

/// RouteTree
///
/// A nested group of routes sharing a path prefix and one access requirement.
/// Child paths are relative to the prefix; `""` is the prefix itself.
#[derive(Debug, Clone)]
pub struct RouteTree {
    section: Section,
    prefix: &'static str,
    access: Access,
    allow_admin_override: bool,
    routes: Vec<(String, Page)>,
}

impl RouteTree {
    pub fn new(section: Section, prefix: &'static str, access: Access) -> Self {
        Self {
            section,
            prefix,
            access,
            allow_admin_override: true,
            routes: Vec::new(),
        }
    }

    /// Opts the whole tree out of the admin override.
    pub fn without_admin_override(mut self) -> Self {
        self.allow_admin_override = false;
        self
    }

    pub fn route(mut self, path: &str, page: Page) -> Self {
        self.routes.push((path.to_string(), page));
        self
    }

    /// Adds the three routes every managed resource gets: the listing, the tabular
    /// edit view and the add/edit form. The tabular view is registered before the
    /// form so `resource/edit/:id` is not swallowed by `resource/:mode/:id?`.
    pub fn resource(self, resource: Resource) -> Self {
        let slug = resource.slug();
        self.route(slug, Page::ResourceList(resource))
            .route(&format!("{slug}/edit/:id"), Page::ResourceTable(resource))
            .route(&format!("{slug}/:mode/:id?"), Page::ResourceForm(resource))
    }

    fn into_descriptors(self) -> Result<Vec<RouteDescriptor>, PatternError> {
        let prefix = self.prefix.trim_end_matches('/');
        self.routes
            .into_iter()
            .map(|(path, page)| {
                let full = if path.is_empty() {
                    format!("{prefix}/")
                } else {
                    format!("{prefix}/{}", path.trim_start_matches('/'))
                };
                Ok(RouteDescriptor {
                    pattern: RoutePattern::parse(&full)?,
                    page,
                    section: self.section,
                    access: self.access,
                    allow_admin_override: self.allow_admin_override,
                })
            })
            .collect()
    }
}

/// Form intent derived from a form route's optional `:id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormIntent {
    Create,
    Edit { id: String },
}

/// A resolved navigation: the winning route and the parameters it bound.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteDescriptor,
    pub params: RouteParams,
}

impl RouteMatch<'_> {
    /// `Some` only for form routes: create when no id was given, edit otherwise.
    pub fn form_intent(&self) -> Option<FormIntent> {
        match self.route.page {
            Page::ResourceForm(_) => Some(match self.params.get("id") {
                Some(id) => FormIntent::Edit { id: id.to_string() },
                None => FormIntent::Create,
            }),
            _ => None,
        }
    }

    pub fn decide(&self, session: &SessionState) -> Decision {
        self.route.decide(session)
    }
}

/// RouteTable
///
/// The flattened, ordered list of every route the portal serves.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// standard
    ///
    /// The brokerage's route table. The catch-all goes last so it only sees paths
    /// that no tree claimed.
    pub fn standard() -> Result<Self, PatternError> {
        Self::from_trees([
            public::public_routes(),
            authenticated::account_routes(),
            agent::agent_routes(),
            management::management_routes(),
            admin::admin_routes(),
            public::fallback_routes(),
        ])
    }

    pub fn from_trees(trees: impl IntoIterator<Item = RouteTree>) -> Result<Self, PatternError> {
        let mut routes = Vec::new();
        for tree in trees {
            routes.extend(tree.into_descriptors()?);
        }
        Ok(Self { routes })
    }

    /// First route, top to bottom, whose pattern matches `path`.
    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        self.routes.iter().find_map(|route| {
            route
                .pattern
                .matches(path)
                .map(|params| RouteMatch { route, params })
        })
    }

    pub fn routes(&self) -> &[RouteDescriptor] {
        &self.routes
    }
}
