use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Admin Router Module
///
/// The dashboard API. Nested under `/api/admin` and wrapped in
/// `require_admin`, so every route answers `401` without a credential and
/// `403` for a non-admin one. Handlers still take `AdminUser` as well.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /api/admin/stats
        // Users, posts, published posts, drafts and comments.
        .route("/stats", get(handlers::get_admin_stats))
        // --- Posts (any author, any status) ---
        .route(
            "/blogs",
            get(handlers::admin_list_posts).post(handlers::admin_create_post),
        )
        .route(
            "/blogs/{id}",
            put(handlers::admin_update_post).delete(handlers::admin_delete_post),
        )
        // --- Users ---
        // GET lists `user`-role subjects only.
        .route(
            "/users",
            get(handlers::admin_list_users).post(handlers::admin_create_user),
        )
        .route(
            "/users/{id}",
            get(handlers::admin_get_user)
                .put(handlers::admin_update_user)
                .delete(handlers::admin_delete_user),
        )
}
