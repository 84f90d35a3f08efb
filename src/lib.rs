use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core: credentials, route gating, ownership.
pub mod auth;
pub mod gate;
pub mod ownership;
pub mod token;

// Application services and components.
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod repository;
pub mod validation;

// Module for routing segregation (Public, Authenticated, Admin, Pages).
pub mod routes;
use auth::{AdminUser, AuthUser};
use routes::{admin, authenticated, pages as page_router, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use token::{TokenCodec, TokenState};

/// ApiDoc
///
/// Auto-generates the OpenAPI document for the JSON API from the
/// `#[utoipa::path]` and `ToSchema` annotations. Served at
/// `/api-docs/openapi.json` with Swagger UI at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::logout,
        handlers::get_profile, handlers::update_profile,
        handlers::list_posts, handlers::create_post, handlers::get_post,
        handlers::update_post, handlers::delete_post, handlers::list_tags,
        handlers::list_comments, handlers::add_comment, handlers::delete_comment,
        handlers::admin_list_posts, handlers::admin_create_post,
        handlers::admin_update_post, handlers::admin_delete_post,
        handlers::admin_list_users, handlers::admin_create_user, handlers::admin_get_user,
        handlers::admin_update_user, handlers::admin_delete_user, handlers::get_admin_stats
    ),
    components(
        schemas(
            models::Role, models::PostStatus, models::UserResponse, models::Post, models::Comment,
            models::RegisterRequest, models::LoginRequest, models::UpdateProfileRequest,
            models::CreatePostRequest, models::UpdatePostRequest, models::CreateCommentRequest,
            models::CreateUserRequest, models::UpdateUserRequest,
            models::RegisterResponse, models::LoginResponse, models::ProfileResponse,
            models::MessageResponse, models::Pagination, models::PostListResponse,
            models::PostsResponse, models::PostEnvelope, models::TagsResponse,
            models::UsersResponse, models::UserEnvelope, models::AdminDashboardStats,
        )
    ),
    tags(
        (name = "blog-portal", description = "Blog publishing API")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, immutable container of shared services. Cloned per request;
/// every field is a cheap handle.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: credential store plus post and comment storage.
    pub repo: RepositoryState,
    /// Signs and verifies session credentials.
    pub tokens: TokenState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let handlers and extractors pull individual components out of AppState.
// `TokenState` in particular is what the credential extractors require.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for TokenState {
    fn from_ref(app_state: &AppState) -> TokenState {
        app_state.tokens.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// require_auth
///
/// Layer for the authenticated API routes. The `AuthUser` extractor rejects
/// with `401` before the handler runs; on success the subject is stored in
/// the request extensions so the handler's own extractor reuses it.
async fn require_auth(user: AuthUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// require_admin
///
/// Layer for `/api/admin`: `401` without a valid credential, `403` for a
/// non-admin one.
async fn require_admin(AdminUser(user): AdminUser, mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(user);
    next.run(request).await
}

/// create_router
///
/// Assembles the routing structure, applies global and scoped middleware,
/// and registers the application state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public API: no layer.
        .merge(public::public_routes())
        // Authenticated API: 401 before any handler runs.
        .merge(
            authenticated::authenticated_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        )
        // Admin API: 401/403 before any handler runs.
        .nest(
            "/api/admin",
            admin::admin_routes()
                .route_layer(middleware::from_fn_with_state(state.clone(), require_admin)),
        )
        // Pages: the access gate redirects instead of refusing.
        .merge(
            page_router::page_routes().route_layer(middleware::from_fn_with_state(
                state.tokens.clone(),
                gate::access_gate,
            )),
        )
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                // 3a. A UUID for every incoming request.
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                // 3b. One span per request, tagged with the request id.
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                // 3c. Echo x-request-id back to the client.
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        // 4. CORS Layer
        .layer(cors)
}

/// trace_span_logger
///
/// Builds the per-request span with method, URI and the `x-request-id`
/// header so every log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
