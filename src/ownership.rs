//! Ownership guard for mutations on owned resources.

use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{Comment, Post},
};

/// A resource with exactly one recorded owner.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Post {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Edit,
    Delete,
}

impl Action {
    pub fn is_mutation(self) -> bool {
        matches!(self, Action::Edit | Action::Delete)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

/// authorize
///
/// Reads are never ownership-checked. Mutations are allowed for the owner
/// and for admins, denied for everyone else.
pub fn authorize<R: Owned + ?Sized>(subject: &AuthUser, resource: &R, action: Action) -> Decision {
    if !action.is_mutation() || subject.is_admin() || resource.owner_id() == subject.id {
        Decision::Allow
    } else {
        Decision::Deny
    }
}

/// [`authorize`] for handlers: a denial becomes [`ApiError::Forbidden`].
pub fn ensure_authorized<R: Owned + ?Sized>(
    subject: &AuthUser,
    resource: &R,
    action: Action,
) -> Result<(), ApiError> {
    match authorize(subject, resource, action) {
        Decision::Allow => Ok(()),
        Decision::Deny => {
            tracing::warn!(
                subject_id = %subject.id,
                owner_id = %resource.owner_id(),
                ?action,
                "ownership check denied"
            );
            Err(ApiError::Forbidden)
        }
    }
}
