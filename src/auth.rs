use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::ApiError,
    models::{NewUser, Role, User},
    repository::Repository,
    token::TokenState,
};

/// Name of the cookie carrying the session credential.
pub const TOKEN_COOKIE: &str = "token";

/// AuthUser
///
/// The resolved identity of a request: the subject id and role decoded from a
/// verified credential. Handlers use it for ownership and role checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// extract_credential
///
/// Reads the bearer credential from the `token` cookie, falling back to the
/// `Authorization: Bearer <token>` header. A non-empty cookie wins even when
/// the header is also present.
pub fn extract_credential(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_owned());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

/// Resolves the caller without rejecting: a subject already placed in the
/// request extensions by the access gate is reused, otherwise the credential
/// is verified here.
fn resolve<S>(parts: &Parts, state: &S) -> Result<AuthUser, ApiError>
where
    TokenState: FromRef<S>,
{
    if let Some(user) = parts.extensions.get::<AuthUser>() {
        return Ok(*user);
    }

    let token = extract_credential(&parts.headers)
        .ok_or(ApiError::Unauthenticated("Authentication required"))?;

    TokenState::from_ref(state)
        .verify(&token)
        .ok_or(ApiError::Unauthenticated("Invalid token"))
}

/// AuthUser Extractor Implementation
///
/// Makes `AuthUser` usable as a handler argument. Verification is purely
/// cryptographic; no store lookup happens here.
///
/// Rejection: `401` with a structured error body when the credential is
/// absent, malformed, tampered with, or expired.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        resolve(parts, state)
    }
}

/// AdminUser
///
/// An [`AuthUser`] whose role is `admin`. Rejects with `401` for a missing or
/// invalid credential and `403` for a valid non-admin credential.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
    TokenState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = resolve(parts, state)?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}

/// MaybeAuthUser
///
/// The caller's identity if a valid credential was presented, `None`
/// otherwise. Never rejects.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    TokenState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(resolve(parts, state).ok()))
    }
}

// --- Session cookie ---

/// The cookie set on login and registration. Its lifetime matches the
/// credential's validity window.
pub fn session_cookie(token: String, ttl: chrono::Duration) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(ttl.num_seconds()))
        .build()
}

/// An already-expired `token` cookie on the same path as [`session_cookie`].
/// Sent on logout whether or not the request carried a session.
pub fn cleared_session_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::build((TOKEN_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie
}

// --- Password hashing ---

/// Hashes a password with bcrypt off the async executor.
pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Compares a password against a stored bcrypt hash off the async executor.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash))
        .await
        .map_err(|e| ApiError::Internal(format!("password check task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("password check failed: {e}")))
}

/// ensure_bootstrap_admin
///
/// Creates the administrator named by `ADMIN_EMAIL` / `ADMIN_PASSWORD` when
/// both are configured and no subject with that email exists yet. Returns
/// the created subject, if any.
pub async fn ensure_bootstrap_admin(
    repo: &dyn Repository,
    config: &AppConfig,
) -> Result<Option<User>, ApiError> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(None);
    };

    if let Some(existing) = repo.find_user_by_email(email).await? {
        if existing.role != Role::Admin {
            tracing::warn!(user_id = %existing.id, "bootstrap admin email belongs to a non-admin user");
        }
        return Ok(None);
    }

    let password_hash = hash_password(password.clone(), config.bcrypt_cost).await?;
    let admin = repo
        .create_user(NewUser {
            name: "Administrator".to_string(),
            email: email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await?;

    tracing::info!(user_id = %admin.id, "bootstrap admin user created");
    Ok(Some(admin))
}
