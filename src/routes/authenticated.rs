use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Routes for any subject with a valid credential. The whole router is
/// wrapped in `require_auth`, which answers `401` before a handler runs.
///
/// Ownership is not checked by the layer: handlers that mutate a post or a
/// comment call the ownership guard themselves, after the lookup, so a
/// missing resource is a `404` rather than a `403`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PUT /api/profile
        .route(
            "/api/profile",
            get(handlers::get_profile).put(handlers::update_profile),
        )
        // POST /api/blogs
        // The caller becomes the author.
        .route("/api/blogs", post(handlers::create_post))
        // PUT/DELETE /api/blogs/{id}
        // Author or admin only.
        .route(
            "/api/blogs/{id}",
            put(handlers::update_post).delete(handlers::delete_post),
        )
        // POST /api/blogs/{id}/comments
        .route("/api/blogs/{id}/comments", post(handlers::add_comment))
        // DELETE /api/comments/{id}
        // Comment author or admin only.
        .route("/api/comments/{id}", delete(handlers::delete_comment))
}
