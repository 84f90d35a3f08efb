use crate::{AppState, pages};
use axum::{Router, routing::get};

/// Page Router Module
///
/// Browser navigation. `create_router` wraps this router in the access gate,
/// which classifies each path and redirects (307) instead of answering with
/// a 401/403 body.
pub fn page_routes() -> Router<AppState> {
    Router::new()
        // --- Public ---
        .route("/", get(pages::home))
        .route("/feed", get(pages::feed))
        .route("/blog/{slug}", get(pages::blog))
        // --- Guest-only ---
        .route("/login", get(pages::login))
        .route("/register", get(pages::register))
        // --- Authenticated ---
        .route("/profile", get(pages::profile))
        .route("/dashboard", get(pages::dashboard))
        .route("/dashboard/{*rest}", get(pages::dashboard_section))
        // --- Admin-only ---
        .route("/admin", get(pages::admin))
        .route("/admin/{*rest}", get(pages::admin_section))
}
