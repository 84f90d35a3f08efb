/// Router Module Index
///
/// Splits the HTTP surface by who may call it. Access control is attached at
/// the module level (via Axum layers) in `create_router`, so a handler added
/// to the wrong module is exposed with the wrong guard, never without one.

/// Anonymous API routes plus liveness.
pub mod public;

/// API routes that need a verified credential.
pub mod authenticated;

/// API routes restricted to the admin role, nested under `/api/admin`.
pub mod admin;

/// Browser navigation, gated by the access gate with redirects.
pub mod pages;
