//! Input validation for the JSON surface.
//!
//! Each check returns the first problem it finds for its field. Form-level
//! helpers run the field checks in a fixed order and stop at the first
//! failure, which is what the API reports back.

use crate::models::{CreatePostRequest, CreateUserRequest, RegisterRequest, UpdatePostRequest};

pub const MAX_EMAIL_LENGTH: usize = 254;
pub const MAX_NAME_LENGTH: usize = 50;
pub const MAX_TITLE_LENGTH: usize = 200;
pub const MAX_CONTENT_LENGTH: usize = 50_000;
pub const MAX_COMMENT_LENGTH: usize = 1_000;
pub const MAX_TAGS: usize = 10;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

type Check = Result<(), ValidationError>;

pub fn validate_email(email: &str) -> Check {
    if email.is_empty() {
        return Err(ValidationError::new("email", "Email is required"));
    }
    if !looks_like_email(email) {
        return Err(ValidationError::new(
            "email",
            "Please enter a valid email address",
        ));
    }
    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::new(
            "email",
            "Email is too long (maximum 254 characters)",
        ));
    }
    Ok(())
}

// local@domain.tld: one '@', no whitespace, and a dot inside the domain with
// something on both sides of it.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let last = domain.len().saturating_sub(1);
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i < last)
}

/// Checks a password. Registration-strength rules apply only when
/// `is_new` is set; login only needs a non-empty value.
pub fn validate_password(password: &str, is_new: bool) -> Check {
    if password.is_empty() {
        return Err(ValidationError::new("password", "Password is required"));
    }
    if !is_new {
        return Ok(());
    }

    let length = password.chars().count();
    if length < 8 {
        return Err(ValidationError::new(
            "password",
            "Password must be at least 8 characters long",
        ));
    }
    if length > 128 {
        return Err(ValidationError::new(
            "password",
            "Password is too long (maximum 128 characters)",
        ));
    }

    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_upper && has_lower && has_digit) {
        return Err(ValidationError::new(
            "password",
            "Password must contain at least one uppercase letter, one lowercase letter, and one number",
        ));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Check {
    if name.is_empty() {
        return Err(ValidationError::new("name", "Name is required"));
    }
    if name.trim().chars().count() < 2 {
        return Err(ValidationError::new(
            "name",
            "Name must be at least 2 characters long",
        ));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::new(
            "name",
            "Name is too long (maximum 50 characters)",
        ));
    }
    let allowed = |c: char| c.is_ascii_alphabetic() || c.is_whitespace() || c == '-' || c == '\'';
    if !name.chars().all(allowed) {
        return Err(ValidationError::new(
            "name",
            "Name can only contain letters, spaces, hyphens, and apostrophes",
        ));
    }
    Ok(())
}

pub fn validate_title(title: &str) -> Check {
    if title.is_empty() {
        return Err(ValidationError::new("title", "Title is required"));
    }
    if title.trim().chars().count() < 3 {
        return Err(ValidationError::new(
            "title",
            "Title must be at least 3 characters long",
        ));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::new(
            "title",
            "Title is too long (maximum 200 characters)",
        ));
    }
    Ok(())
}

pub fn validate_content(content: &str) -> Check {
    if content.is_empty() {
        return Err(ValidationError::new("content", "Content is required"));
    }
    if content.trim().chars().count() < 10 {
        return Err(ValidationError::new(
            "content",
            "Content must be at least 10 characters long",
        ));
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(ValidationError::new(
            "content",
            "Content is too long (maximum 50,000 characters)",
        ));
    }
    Ok(())
}

/// Trims the tags, drops blank entries and checks what remains.
/// Returns the cleaned list on success.
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, ValidationError> {
    let cleaned: Vec<String> = tags
        .iter()
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(str::to_owned)
        .collect();

    if cleaned.len() > MAX_TAGS {
        return Err(ValidationError::new("tags", "Maximum 10 tags allowed"));
    }

    for tag in &cleaned {
        let length = tag.chars().count();
        if length < 2 {
            return Err(ValidationError::new(
                "tags",
                "Each tag must be at least 2 characters long",
            ));
        }
        if length > 20 {
            return Err(ValidationError::new(
                "tags",
                "Each tag must be no more than 20 characters long",
            ));
        }
        if !tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(ValidationError::new(
                "tags",
                "Tags can only contain letters, numbers, hyphens, and underscores",
            ));
        }
    }

    Ok(cleaned)
}

/// Trims a comment body and checks it. Returns the trimmed text.
pub fn normalize_comment(content: &str) -> Result<String, ValidationError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            "content",
            "Comment content is required",
        ));
    }
    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err(ValidationError::new(
            "content",
            "Comment is too long (maximum 1,000 characters)",
        ));
    }
    Ok(trimmed.to_owned())
}

pub fn validate_registration(request: &RegisterRequest) -> Check {
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password, true)
}

pub fn validate_new_user(request: &CreateUserRequest) -> Check {
    validate_name(&request.name)?;
    validate_email(&request.email)?;
    validate_password(&request.password, true)
}

/// Validates a new post and returns its cleaned tag list.
pub fn validate_new_post(request: &CreatePostRequest) -> Result<Vec<String>, ValidationError> {
    validate_title(&request.title)?;
    validate_content(&request.content)?;
    normalize_tags(request.tags.as_deref().unwrap_or_default())
}

/// Validates the fields present in a post update and returns the cleaned
/// tag list, if tags were supplied.
pub fn validate_post_update(
    request: &UpdatePostRequest,
) -> Result<Option<Vec<String>>, ValidationError> {
    if let Some(title) = &request.title {
        validate_title(title)?;
    }
    if let Some(content) = &request.content {
        validate_content(content)?;
    }
    request.tags.as_deref().map(normalize_tags).transpose()
}
