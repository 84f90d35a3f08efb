use crate::{
    AppState,
    auth::{self, AdminUser, AuthUser, MaybeAuthUser},
    error::ApiError,
    models::{
        self, AdminDashboardStats, Comment, CreateCommentRequest, CreatePostRequest,
        CreateUserRequest, LoginRequest, LoginResponse, MessageResponse, NewComment, NewPost,
        NewUser, Pagination, Post, PostChanges, PostEnvelope, PostListResponse, PostStatus,
        PostsResponse, ProfileResponse, RegisterRequest, RegisterResponse, Role, TagsResponse,
        UpdatePostRequest, UpdateProfileRequest, UpdateUserRequest, User, UserChanges,
        UserEnvelope, UserResponse, UsersResponse,
    },
    ownership::{self, Action},
    repository::{PostQuery, RepoError},
    validation,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use axum_extra::extract::{WithRejection, cookie::CookieJar};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

// A JSON body whose parse failures are reported as `ApiError`s.
type JsonBody<T> = WithRejection<Json<T>, ApiError>;

const DEFAULT_PAGE_SIZE: u32 = 10;
const MAX_PAGE_SIZE: u32 = 100;

// Attempts at finding a free slug before giving up on a create.
const SLUG_ATTEMPTS: usize = 3;

// --- Filter Structs ---

/// PostFilter
///
/// Query parameters accepted by the public post listing (GET /api/blogs).
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct PostFilter {
    /// `me` for the caller's own posts, or an author id.
    pub author: Option<String>,
    /// Restricts the listing to one status. Unset lists every status.
    pub status: Option<PostStatus>,
    /// Case-insensitive substring over title, content and excerpt.
    pub search: Option<String>,
    /// Comma-separated tag list; a post matches if it carries any of them.
    pub tags: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

// --- Shared helpers ---

fn post_not_found() -> ApiError {
    ApiError::NotFound("Blog not found")
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found")
}

/// Looks a post up by id first, then by slug.
async fn resolve_post(state: &AppState, id_or_slug: &str) -> Result<Post, ApiError> {
    if let Ok(id) = Uuid::parse_str(id_or_slug) {
        if let Some(post) = state.repo.find_post(id).await? {
            return Ok(post);
        }
    }
    state
        .repo
        .find_post_by_slug(id_or_slug)
        .await?
        .ok_or_else(post_not_found)
}

async fn find_post_or_404(state: &AppState, id: Uuid) -> Result<Post, ApiError> {
    state.repo.find_post(id).await?.ok_or_else(post_not_found)
}

/// insert_post
///
/// Validates the request and stores a new post for `author_id`. The slug is
/// derived from the title once; a taken slug gets a short random suffix.
async fn insert_post(
    state: &AppState,
    author_id: Uuid,
    payload: CreatePostRequest,
) -> Result<Post, ApiError> {
    let tags = validation::validate_new_post(&payload)?;
    let title = payload.title.trim().to_string();
    let content = payload.content.trim().to_string();
    let base_slug = models::slugify(&title, Utc::now());
    let excerpt = models::derive_excerpt(&content);

    let mut slug = base_slug.clone();
    for _ in 0..SLUG_ATTEMPTS {
        let new_post = NewPost {
            title: title.clone(),
            content: content.clone(),
            author_id,
            status: payload.status.unwrap_or_default(),
            slug: slug.clone(),
            excerpt: excerpt.clone(),
            tags: tags.clone(),
        };

        match state.repo.create_post(new_post).await {
            Ok(post) => {
                tracing::info!(post_id = %post.id, %author_id, slug = %post.slug, "post created");
                return Ok(post);
            }
            Err(RepoError::DuplicateSlug) => {
                let suffix: String = Uuid::new_v4().simple().to_string().chars().take(6).collect();
                slug = format!("{base_slug}-{suffix}");
            }
            Err(other) => return Err(other.into()),
        }
    }

    Err(ApiError::validation("Slug is already in use"))
}

/// Applies a validated partial update. Author and slug are never changed.
async fn apply_post_update(
    state: &AppState,
    id: Uuid,
    payload: UpdatePostRequest,
) -> Result<Post, ApiError> {
    let tags = validation::validate_post_update(&payload)?;
    let changes = PostChanges {
        title: payload.title.map(|t| t.trim().to_string()),
        content: payload.content.map(|c| c.trim().to_string()),
        status: payload.status,
        tags,
    };
    state
        .repo
        .update_post(id, changes)
        .await?
        .ok_or_else(post_not_found)
}

/// Signs a credential for `user` and adds it to the cookie jar.
fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<(CookieJar, String), ApiError> {
    let token = state.tokens.sign(user.id, user.role)?;
    let jar = jar.add(auth::session_cookie(token.clone(), state.tokens.ttl()));
    Ok((jar, token))
}

fn duplicate_email_as(message: &'static str) -> impl FnOnce(RepoError) -> ApiError {
    move |error| match error {
        RepoError::DuplicateEmail => ApiError::validation(message),
        other => other.into(),
    }
}

// --- Auth Handlers ---

/// register
///
/// [Public Route] Creates a subject with the `user` role and starts a session
/// for it: the credential is returned in the body and set as the `token` cookie.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = RegisterResponse),
        (status = 400, description = "Validation failed or email taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<RegisterResponse>), ApiError> {
    if payload.name.trim().is_empty() || payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("All fields are required"));
    }
    validation::validate_registration(&payload)?;

    let email = payload.email.trim().to_string();
    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(ApiError::validation("User already exists"));
    }

    let password_hash = auth::hash_password(payload.password, state.config.bcrypt_cost).await?;
    let user = state
        .repo
        .create_user(NewUser {
            name: payload.name.trim().to_string(),
            email,
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(duplicate_email_as("User already exists"))?;

    let (jar, token) = start_session(&state, jar, &user)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        jar,
        Json(RegisterResponse {
            message: "User registered successfully".to_string(),
            token,
            user: UserResponse::from(&user),
        }),
    ))
}

/// login
///
/// [Public Route] Exchanges email and password for a credential. An unknown
/// email and a wrong password are answered identically.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(payload), _): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), ApiError> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::validation("Email and password required"));
    }

    let invalid = ApiError::Unauthenticated("Invalid credentials");
    let Some(user) = state.repo.find_user_by_email(payload.email.trim()).await? else {
        return Err(invalid);
    };
    if !auth::verify_password(payload.password, user.password_hash.clone()).await? {
        tracing::debug!(user_id = %user.id, "login rejected");
        return Err(invalid);
    }

    let (jar, token) = start_session(&state, jar, &user)?;
    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user: UserResponse::from(&user),
        }),
    ))
}

/// logout
///
/// [Public Route] Clears the session cookie. The credential itself stays
/// valid until it expires.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<MessageResponse>) {
    (
        jar.add(auth::cleared_session_cookie()),
        Json(MessageResponse::new("Logged out successfully")),
    )
}

// --- Profile Handlers ---

/// get_profile
///
/// [Authenticated Route] The caller's own subject record, without the hash.
#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 401, description = "Unauthenticated"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.repo.find_user_by_id(id).await?.ok_or_else(user_not_found)?;
    Ok(Json(ProfileResponse {
        message: None,
        user: UserResponse::from(&user),
    }))
}

/// update_profile
///
/// [Authenticated Route] Updates name, email or password. A name change is
/// free; an email or password change needs the current password.
#[utoipa::path(
    put,
    path = "/api/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated", body = ProfileResponse),
        (status = 400, description = "Validation failed")
    )
)]
pub async fn update_profile(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, ApiError> {
    let user = state.repo.find_user_by_id(id).await?.ok_or_else(user_not_found)?;
    let mut changes = UserChanges::default();

    if let Some(name) = payload.name.filter(|name| *name != user.name) {
        validation::validate_name(&name)?;
        changes.name = Some(name.trim().to_string());
    }

    if let Some(email) = payload.email.filter(|email| *email != user.email) {
        validation::validate_email(&email)?;
        let email = email.trim().to_string();
        if let Some(other) = state.repo.find_user_by_email(&email).await? {
            if other.id != user.id {
                return Err(ApiError::validation("Email is already taken"));
            }
        }
        let current = payload
            .current_password
            .clone()
            .ok_or_else(|| ApiError::validation("Current password is required to change email"))?;
        if !auth::verify_password(current, user.password_hash.clone()).await? {
            return Err(ApiError::validation("Current password is incorrect"));
        }
        changes.email = Some(email);
    }

    if let Some(new_password) = payload.new_password.filter(|p| !p.is_empty()) {
        let current = payload
            .current_password
            .clone()
            .ok_or_else(|| ApiError::validation("Current password is required to change password"))?;
        if !auth::verify_password(current, user.password_hash.clone()).await? {
            return Err(ApiError::validation("Current password is incorrect"));
        }
        validation::validate_password(&new_password, true)?;
        changes.password_hash =
            Some(auth::hash_password(new_password, state.config.bcrypt_cost).await?);
    }

    if changes.is_empty() {
        return Ok(Json(ProfileResponse {
            message: Some("No changes made".to_string()),
            user: UserResponse::from(&user),
        }));
    }

    let updated = state
        .repo
        .update_user(id, changes)
        .await
        .map_err(duplicate_email_as("Email is already taken"))?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %id, "profile updated");
    Ok(Json(ProfileResponse {
        message: Some("Profile updated successfully".to_string()),
        user: UserResponse::from(&updated),
    }))
}

// --- Post Handlers ---

/// list_posts
///
/// [Public Route] Paginated, newest-first listing. `author=me` needs a valid
/// credential. Drafts are included unless `status` says otherwise.
#[utoipa::path(
    get,
    path = "/api/blogs",
    params(PostFilter),
    responses(
        (status = 200, description = "Posts", body = PostListResponse),
        (status = 401, description = "author=me without a credential")
    )
)]
pub async fn list_posts(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
) -> Result<Json<PostListResponse>, ApiError> {
    let author_id = match filter.author.as_deref().map(str::trim) {
        None | Some("") => None,
        Some("me") => Some(
            viewer
                .ok_or(ApiError::Unauthenticated("Authentication required"))?
                .id,
        ),
        Some(raw) => Some(
            Uuid::parse_str(raw).map_err(|_| ApiError::validation("Invalid author id"))?,
        ),
    };

    let page = filter.page.unwrap_or(1).max(1);
    let limit = filter.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let tags = filter
        .tags
        .as_deref()
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect()
        })
        .unwrap_or_default();

    let query = PostQuery {
        author_id,
        status: filter.status,
        search: filter
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        tags,
        limit: Some(limit),
        offset: (page - 1).saturating_mul(limit),
    };

    let result = state.repo.list_posts(&query).await?;
    Ok(Json(PostListResponse {
        blogs: result.posts,
        pagination: Pagination::new(page, limit, result.total),
    }))
}

/// create_post
///
/// [Authenticated Route] The caller becomes the post's author.
#[utoipa::path(
    post,
    path = "/api/blogs",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Created", body = Post),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthenticated")
    )
)]
pub async fn create_post(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    let post = insert_post(&state, id, payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// get_post
///
/// [Public Route] Fetches one post by id or slug.
#[utoipa::path(
    get,
    path = "/api/blogs/{id}",
    params(("id" = String, Path, description = "Post id or slug")),
    responses(
        (status = 200, description = "Found", body = Post),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<Post>, ApiError> {
    Ok(Json(resolve_post(&state, &id_or_slug).await?))
}

/// update_post
///
/// [Authenticated Route] Ownership Guard: author or admin. A missing post is
/// reported before any ownership decision.
#[utoipa::path(
    put,
    path = "/api/blogs/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = Post),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    let post = find_post_or_404(&state, id).await?;
    ownership::ensure_authorized(&user, &post, Action::Edit)?;
    Ok(Json(apply_post_update(&state, id, payload).await?))
}

/// delete_post
///
/// [Authenticated Route] Ownership Guard: author or admin. Comments on the
/// post are removed with it.
#[utoipa::path(
    delete,
    path = "/api/blogs/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_post(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let post = find_post_or_404(&state, id).await?;
    ownership::ensure_authorized(&user, &post, Action::Delete)?;

    if !state.repo.delete_post(id).await? {
        return Err(post_not_found());
    }
    tracing::info!(post_id = %id, subject_id = %user.id, "post deleted");
    Ok(Json(MessageResponse::new("Blog deleted successfully")))
}

/// list_tags
///
/// [Public Route] Sorted unique tags of published posts.
#[utoipa::path(
    get,
    path = "/api/blogs/tags",
    responses((status = 200, description = "Tags", body = TagsResponse))
)]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<TagsResponse>, ApiError> {
    let tags = state.repo.published_tags().await?;
    Ok(Json(TagsResponse { tags }))
}

// --- Comment Handlers ---

/// list_comments
///
/// [Public Route] Comments on a post, oldest first.
#[utoipa::path(
    get,
    path = "/api/blogs/{id}/comments",
    params(("id" = String, Path, description = "Post id or slug")),
    responses(
        (status = 200, description = "Comments", body = [Comment]),
        (status = 404, description = "Post not found")
    )
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let post = resolve_post(&state, &id_or_slug).await?;
    Ok(Json(state.repo.list_comments(post.id).await?))
}

/// add_comment
///
/// [Authenticated Route] Comments on a post. A reply's parent must be a
/// comment on the same post.
#[utoipa::path(
    post,
    path = "/api/blogs/{id}/comments",
    params(("id" = String, Path, description = "Post id or slug")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment Added", body = Comment),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn add_comment(
    AuthUser { id: author_id, .. }: AuthUser,
    State(state): State<AppState>,
    Path(id_or_slug): Path<String>,
    WithRejection(Json(payload), _): JsonBody<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let post = resolve_post(&state, &id_or_slug).await?;
    let content = validation::normalize_comment(&payload.content)?;

    if let Some(parent_id) = payload.parent_comment {
        let parent = state.repo.find_comment(parent_id).await?;
        if parent.is_none_or(|parent| parent.post_id != post.id) {
            return Err(ApiError::validation("Parent comment not found"));
        }
    }

    let comment = state
        .repo
        .create_comment(NewComment {
            content,
            author_id,
            post_id: post.id,
            parent_comment_id: payload.parent_comment,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// delete_comment
///
/// [Authenticated Route] Ownership Guard on the comment author, with the
/// admin override.
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = Uuid, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let comment = state
        .repo
        .find_comment(id)
        .await?
        .ok_or(ApiError::NotFound("Comment not found"))?;
    ownership::ensure_authorized(&user, &comment, Action::Delete)?;

    if !state.repo.delete_comment(id).await? {
        return Err(ApiError::NotFound("Comment not found"));
    }
    Ok(Json(MessageResponse::new("Comment deleted successfully")))
}

// --- Admin Handlers ---

/// admin_list_posts
///
/// [Admin Route] Every post, any status, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/blogs",
    responses(
        (status = 200, description = "All posts", body = PostsResponse),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn admin_list_posts(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<PostsResponse>, ApiError> {
    let page = state.repo.list_posts(&PostQuery::default()).await?;
    Ok(Json(PostsResponse { blogs: page.posts }))
}

/// admin_create_post
///
/// [Admin Route] Creates a post authored by the calling admin.
#[utoipa::path(
    post,
    path = "/api/admin/blogs",
    request_body = CreatePostRequest,
    responses((status = 201, description = "Created", body = PostEnvelope))
)]
pub async fn admin_create_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostEnvelope>), ApiError> {
    let blog = insert_post(&state, admin.id, payload).await?;
    Ok((StatusCode::CREATED, Json(PostEnvelope { blog })))
}

#[utoipa::path(
    put,
    path = "/api/admin/blogs/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Updated", body = PostEnvelope),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_update_post(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UpdatePostRequest>,
) -> Result<Json<PostEnvelope>, ApiError> {
    let blog = apply_post_update(&state, id, payload).await?;
    Ok(Json(PostEnvelope { blog }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/blogs/{id}",
    params(("id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_delete_post(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.repo.delete_post(id).await? {
        return Err(post_not_found());
    }
    tracing::info!(post_id = %id, admin_id = %admin.id, "post deleted by admin");
    Ok(Json(MessageResponse::new("Blog deleted successfully")))
}

/// admin_list_users
///
/// [Admin Route] Subjects with the `user` role, newest first.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    responses((status = 200, description = "Users", body = UsersResponse))
)]
pub async fn admin_list_users(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.repo.list_users(Some(Role::User)).await?;
    Ok(Json(UsersResponse {
        users: users.iter().map(UserResponse::from).collect(),
    }))
}

/// admin_create_user
///
/// [Admin Route] Creates a subject with an explicitly chosen role.
#[utoipa::path(
    post,
    path = "/api/admin/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Created", body = UserEnvelope),
        (status = 400, description = "Validation failed or email taken")
    )
)]
pub async fn admin_create_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), ApiError> {
    validation::validate_new_user(&payload)?;

    let password_hash = auth::hash_password(payload.password, state.config.bcrypt_cost).await?;
    let user = state
        .repo
        .create_user(NewUser {
            name: payload.name.trim().to_string(),
            email: payload.email.trim().to_string(),
            password_hash,
            role: payload.role,
        })
        .await
        .map_err(duplicate_email_as("User already exists"))?;

    tracing::info!(user_id = %user.id, role = %user.role, "user created by admin");
    Ok((
        StatusCode::CREATED,
        Json(UserEnvelope {
            user: UserResponse::from(&user),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Found", body = UserEnvelope),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_get_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserEnvelope>, ApiError> {
    let user = state.repo.find_user_by_id(id).await?.ok_or_else(user_not_found)?;
    Ok(Json(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

/// admin_update_user
///
/// [Admin Route] Partial update; a supplied password is re-hashed.
#[utoipa::path(
    put,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserEnvelope),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_update_user(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    WithRejection(Json(payload), _): JsonBody<UpdateUserRequest>,
) -> Result<Json<UserEnvelope>, ApiError> {
    if let Some(name) = &payload.name {
        validation::validate_name(name)?;
    }
    if let Some(email) = &payload.email {
        validation::validate_email(email)?;
    }

    let password_hash = match payload.password.filter(|p| !p.is_empty()) {
        Some(password) => {
            validation::validate_password(&password, true)?;
            Some(auth::hash_password(password, state.config.bcrypt_cost).await?)
        }
        None => None,
    };

    let changes = UserChanges {
        name: payload.name.map(|n| n.trim().to_string()),
        email: payload.email.map(|e| e.trim().to_string()),
        password_hash,
        role: payload.role,
    };

    let user = state
        .repo
        .update_user(id, changes)
        .await
        .map_err(duplicate_email_as("Email is already taken"))?
        .ok_or_else(user_not_found)?;

    Ok(Json(UserEnvelope {
        user: UserResponse::from(&user),
    }))
}

/// admin_delete_user
///
/// [Admin Route] Removes the subject along with their posts and comments.
#[utoipa::path(
    delete,
    path = "/api/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found")
    )
)]
pub async fn admin_delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    if !state.repo.delete_user(id).await? {
        return Err(user_not_found());
    }
    tracing::info!(user_id = %id, admin_id = %admin.id, "user deleted by admin");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// get_admin_stats
///
/// [Admin Route] Core counters for the dashboard.
#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Stats", body = AdminDashboardStats),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn get_admin_stats(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> Result<Json<AdminDashboardStats>, ApiError> {
    Ok(Json(state.repo.get_stats().await?))
}
