//! HTML rendering for decided navigations. Page bodies are placeholders naming the
//! component and the parameters it was routed with; the chrome follows the Layout
//! Shell and the header only links to sections the session may open.

use askama::Template;
use axum::{
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use crate::{
    error::AuthError,
    guard::Decision,
    layout::ChromePolicy,
    routes::{FormIntent, Page, RouteMatch, RouteTable, Section},
    session::SessionState,
};

pub struct NavLink {
    pub href: &'static str,
    pub label: &'static str,
}

pub struct Param {
    pub name: String,
    pub value: String,
}

/// Frame
///
/// Everything around a page body: whether chrome is shown, the header links and
/// the signed-in user's name.
pub struct Frame {
    pub chrome: bool,
    pub nav: Vec<NavLink>,
    pub user_name: Option<String>,
}

impl Frame {
    pub fn new(routes: &RouteTable, chrome: &ChromePolicy, path: &str, session: &SessionState) -> Self {
        let mut nav = vec![
            NavLink { href: "/about", label: "About" },
            NavLink { href: "/blog", label: "Blog" },
            NavLink { href: "/contact", label: "Contact" },
        ];

        for section in [Section::Account, Section::Agent, Section::Management, Section::Admin] {
            let reachable = routes
                .resolve(section.root())
                .is_some_and(|matched| matched.decide(session) == Decision::Render);
            if reachable {
                nav.push(NavLink {
                    href: section.root(),
                    label: section.label(),
                });
            }
        }

        Self {
            chrome: chrome.shows_chrome(path),
            nav,
            user_name: session.session().map(|s| s.display_name.clone()),
        }
    }

    fn bare() -> Self {
        Self {
            chrome: false,
            nav: Vec::new(),
            user_name: None,
        }
    }
}

#[derive(Template)]
#[template(path = "page.html")]
struct PageTemplate {
    title: String,
    page_id: String,
    section: String,
    intent: Option<String>,
    params: Vec<Param>,
    chrome: bool,
    nav: Vec<NavLink>,
    user_name: Option<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
struct LoginTemplate {
    title: String,
    error: Option<String>,
    chrome: bool,
    nav: Vec<NavLink>,
    user_name: Option<String>,
}

#[derive(Template)]
#[template(path = "loading.html")]
struct LoadingTemplate {
    title: String,
    chrome: bool,
    nav: Vec<NavLink>,
    user_name: Option<String>,
}

/// Stable identifier of a page, exposed as `data-page` for the browser bundle.
pub fn page_id(page: Page) -> String {
    match page {
        Page::Home => "home".to_string(),
        Page::About => "about".to_string(),
        Page::Blog => "blog".to_string(),
        Page::Contact => "contact".to_string(),
        Page::Login => "login".to_string(),
        Page::Register => "register".to_string(),
        Page::NotFound => "not-found".to_string(),
        Page::VisitorNews => "visitor-news".to_string(),
        Page::InsuranceDetail => "insurance-detail".to_string(),
        Page::Profile => "profile".to_string(),
        Page::PolicyCatalog => "policy-catalog".to_string(),
        Page::PolicyDetail => "policy-detail".to_string(),
        Page::QuoteBooking => "quote-booking".to_string(),
        Page::Dashboard(section) => format!("{}-dashboard", section_id(section)),
        Page::ResourceList(resource) => format!("{}-list", resource.slug()),
        Page::ResourceTable(resource) => format!("{}-table", resource.slug()),
        Page::ResourceForm(resource) => format!("{}-form", resource.slug()),
    }
}

fn section_id(section: Section) -> &'static str {
    match section {
        Section::Public => "public",
        Section::Account => "account",
        Section::Agent => "agent",
        Section::Management => "management",
        Section::Admin => "admin",
    }
}

fn respond<T: Template>(status: StatusCode, template: &T) -> Response {
    match template.render() {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "template rendering failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed").into_response()
        }
    }
}

/// Renders the component a route resolved to.
pub fn page(matched: &RouteMatch<'_>, frame: Frame) -> Response {
    let page = matched.route.page;
    if page == Page::Login {
        return login(frame, None);
    }

    let intent = matched.form_intent().map(|intent| match intent {
        FormIntent::Create => "Create".to_string(),
        FormIntent::Edit { id } => format!("Edit {id}"),
    });
    let params = matched
        .params
        .iter()
        .map(|(name, value)| Param {
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect();

    let status = match page {
        Page::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };

    respond(
        status,
        &PageTemplate {
            title: page.title(),
            page_id: page_id(page),
            section: section_id(matched.route.section).to_string(),
            intent,
            params,
            chrome: frame.chrome,
            nav: frame.nav,
            user_name: frame.user_name,
        },
    )
}

/// Login page, optionally showing why the last attempt failed.
pub fn login(frame: Frame, error: Option<&AuthError>) -> Response {
    let status = error.map_or(StatusCode::OK, AuthError::status);
    respond(
        status,
        &LoginTemplate {
            title: Page::Login.title(),
            error: error.map(|e| e.user_message().to_string()),
            chrome: frame.chrome,
            nav: frame.nav,
            user_name: frame.user_name,
        },
    )
}

/// Placeholder shown while a guarded route waits for the session to resolve. It
/// refreshes itself and is never cached.
pub fn loading() -> Response {
    let frame = Frame::bare();
    let response = respond(
        StatusCode::OK,
        &LoadingTemplate {
            title: "Loading".to_string(),
            chrome: frame.chrome,
            nav: frame.nav,
            user_name: frame.user_name,
        },
    );
    ([(header::CACHE_CONTROL, "no-store")], response).into_response()
}
