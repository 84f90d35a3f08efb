//! Access gate for page navigation.
//!
//! Every page request is classified by path, its credential (if any) is
//! verified, and [`decide`] turns the pair into either "allow" or a redirect.
//! The decision is a pure function; [`access_gate`] is the middleware that
//! applies it before any page handler runs.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::{
    auth::{AuthUser, extract_credential},
    models::Role,
    token::TokenState,
};

pub const LOGIN_PATH: &str = "/login";
pub const REGISTER_PATH: &str = "/register";
pub const PROFILE_PATH: &str = "/profile";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const ADMIN_PATH: &str = "/admin";

/// RouteClass
///
/// How a path is treated by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable by anyone.
    Public,
    /// Login and registration; signed-in subjects are sent to their landing page.
    GuestOnly,
    /// Requires any valid credential.
    Authenticated,
    /// Requires a valid credential with the admin role.
    AdminOnly,
}

impl RouteClass {
    /// Classifies a request path. `/admin` and `/admin/...` are admin-only
    /// (but not `/administrator`); `/api/...` is always public here because
    /// the API enforces 401/403 itself.
    pub fn classify(path: &str) -> Self {
        if under(path, ADMIN_PATH) {
            RouteClass::AdminOnly
        } else if path == LOGIN_PATH || path == REGISTER_PATH {
            RouteClass::GuestOnly
        } else if path == PROFILE_PATH || under(path, DASHBOARD_PATH) {
            RouteClass::Authenticated
        } else {
            RouteClass::Public
        }
    }
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// GateDecision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Redirect(&'static str),
}

/// Where a signed-in subject lands: admins on the admin dashboard, everyone
/// else on the user dashboard.
pub fn landing_page(role: Role) -> &'static str {
    match role {
        Role::Admin => ADMIN_PATH,
        Role::User => DASHBOARD_PATH,
    }
}

/// decide
///
/// `subject` is the verified credential, or `None` when it was absent or
/// failed verification; the gate treats both the same way.
pub fn decide(class: RouteClass, subject: Option<&AuthUser>) -> GateDecision {
    match (class, subject) {
        (RouteClass::AdminOnly, None) => GateDecision::Redirect(LOGIN_PATH),
        (RouteClass::AdminOnly, Some(user)) if user.role != Role::Admin => {
            GateDecision::Redirect(DASHBOARD_PATH)
        }
        (RouteClass::AdminOnly, Some(_)) => GateDecision::Allow,

        (RouteClass::GuestOnly, Some(user)) => GateDecision::Redirect(landing_page(user.role)),
        (RouteClass::GuestOnly, None) => GateDecision::Allow,

        (RouteClass::Authenticated, None) => GateDecision::Redirect(LOGIN_PATH),
        (RouteClass::Authenticated, Some(_)) => GateDecision::Allow,

        (RouteClass::Public, _) => GateDecision::Allow,
    }
}

/// access_gate
///
/// Middleware form of [`decide`]. On "allow" the verified subject (if any) is
/// stored in the request extensions so downstream extractors reuse it
/// instead of verifying the credential a second time.
pub async fn access_gate(
    State(tokens): State<TokenState>,
    mut request: Request,
    next: Next,
) -> Response {
    let class = RouteClass::classify(request.uri().path());
    let subject = extract_credential(request.headers()).and_then(|token| tokens.verify(&token));

    match decide(class, subject.as_ref()) {
        GateDecision::Allow => {
            if let Some(user) = subject {
                request.extensions_mut().insert(user);
            }
            next.run(request).await
        }
        GateDecision::Redirect(target) => {
            tracing::debug!(
                path = %request.uri().path(),
                ?class,
                target,
                "access gate redirect"
            );
            Redirect::temporary(target).into_response()
        }
    }
}
