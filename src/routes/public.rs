use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints any client may call. Handlers that behave differently for a
/// signed-in caller (`GET /api/blogs?author=me`) resolve the caller
/// themselves through `MaybeAuthUser`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- Session ---
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/logout", post(handlers::logout))
        // --- Reading ---
        // GET /api/blogs?author=&status=&search=&tags=&page=&limit=
        .route("/api/blogs", get(handlers::list_posts))
        .route("/api/blogs/tags", get(handlers::list_tags))
        // {id} is a post id or a slug.
        .route("/api/blogs/{id}", get(handlers::get_post))
        .route("/api/blogs/{id}/comments", get(handlers::list_comments))
}
