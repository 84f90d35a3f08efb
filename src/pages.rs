//! Page handlers.
//!
//! Rendering is out of scope: each page answers with the context a renderer
//! would receive. All of these sit behind [`crate::gate::access_gate`], so by
//! the time a handler runs the navigation has already been allowed.

use axum::{Json, extract::Path};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthUser, MaybeAuthUser};

/// PageContext
///
/// What a page would render with: the page name, the signed-in subject (if
/// any) and the slug for post pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageContext {
    pub page: String,
    pub viewer: Option<AuthUser>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl PageContext {
    fn new(page: impl Into<String>, viewer: Option<AuthUser>) -> Json<Self> {
        Json(Self {
            page: page.into(),
            viewer,
            slug: None,
        })
    }
}

pub async fn home(MaybeAuthUser(viewer): MaybeAuthUser) -> Json<PageContext> {
    PageContext::new("home", viewer)
}

pub async fn feed(MaybeAuthUser(viewer): MaybeAuthUser) -> Json<PageContext> {
    PageContext::new("feed", viewer)
}

pub async fn blog(
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(slug): Path<String>,
) -> Json<PageContext> {
    Json(PageContext {
        page: "blog".to_string(),
        viewer,
        slug: Some(slug),
    })
}

pub async fn login() -> Json<PageContext> {
    PageContext::new("login", None)
}

pub async fn register() -> Json<PageContext> {
    PageContext::new("register", None)
}

pub async fn profile(MaybeAuthUser(viewer): MaybeAuthUser) -> Json<PageContext> {
    PageContext::new("profile", viewer)
}

pub async fn dashboard(MaybeAuthUser(viewer): MaybeAuthUser) -> Json<PageContext> {
    PageContext::new("dashboard", viewer)
}

/// `/dashboard/new`, `/dashboard/edit/{id}` and friends.
pub async fn dashboard_section(
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(rest): Path<String>,
) -> Json<PageContext> {
    PageContext::new(format!("dashboard/{rest}"), viewer)
}

pub async fn admin(MaybeAuthUser(viewer): MaybeAuthUser) -> Json<PageContext> {
    PageContext::new("admin", viewer)
}

pub async fn admin_section(
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(rest): Path<String>,
) -> Json<PageContext> {
    PageContext::new(format!("admin/{rest}"), viewer)
}
