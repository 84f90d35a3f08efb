use crate::models::{
    AdminDashboardStats, Comment, NewComment, NewPost, NewUser, Post, PostChanges, PostStatus,
    Role, User, UserChanges,
};
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

mod memory;

pub use memory::InMemoryRepository;

/// RepoError
///
/// Persistence failures. Uniqueness violations are surfaced as their own
/// variants so handlers can answer with a validation error instead of a 500.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepoError {
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("slug is already in use")]
    DuplicateSlug,
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(error: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &error {
            if db.is_unique_violation() {
                match db.constraint() {
                    Some(c) if c.contains("email") => return RepoError::DuplicateEmail,
                    Some(c) if c.contains("slug") => return RepoError::DuplicateSlug,
                    _ => {}
                }
            }
        }
        RepoError::Database(error.to_string())
    }
}

/// PostQuery
///
/// Filters for post listings. Every filter is optional; an empty query lists
/// every post regardless of status.
#[derive(Debug, Clone, Default)]
pub struct PostQuery {
    pub author_id: Option<Uuid>,
    pub status: Option<PostStatus>,
    /// Case-insensitive substring matched against title, content and excerpt.
    pub search: Option<String>,
    /// Matches posts carrying any of these tags.
    pub tags: Vec<String>,
    /// `None` returns all matching posts.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// One page of a post listing plus the total number of matches.
#[derive(Debug, Clone, Default)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: u64,
}

/// Repository Trait
///
/// The persistence contract consumed by the handlers: the credential store
/// for subjects plus post and comment storage. Implementations must enforce
/// email and slug uniqueness at write time.
///
/// **Send + Sync + async_trait** keep the trait object (`Arc<dyn Repository>`)
/// shareable across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Subjects ---
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError>;
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError>;
    /// Removes the subject together with their posts and comments.
    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError>;
    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, RepoError>;

    // --- Posts ---
    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, RepoError>;
    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, RepoError>;
    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;
    async fn create_post(&self, post: NewPost) -> Result<Post, RepoError>;
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, RepoError>;
    async fn delete_post(&self, id: Uuid) -> Result<bool, RepoError>;
    /// Sorted, de-duplicated, non-blank tags of published posts.
    async fn published_tags(&self) -> Result<Vec<String>, RepoError>;

    // --- Comments ---
    /// Comments on a post, oldest first.
    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError>;
    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, RepoError>;
    async fn create_comment(&self, comment: NewComment) -> Result<Comment, RepoError>;
    async fn delete_comment(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- Dashboard ---
    async fn get_stats(&self) -> Result<AdminDashboardStats, RepoError>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer held in the application state.
pub type RepositoryState = Arc<dyn Repository>;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.author_id, p.status, p.slug, p.excerpt, \
     p.tags, p.created_at, p.updated_at, u.name AS author_name, u.email AS author_email";

const COMMENT_COLUMNS: &str =
    "c.id, c.content, c.author_id, c.post_id, c.parent_comment_id, c.created_at, u.name AS author_name";

/// PostgresRepository
///
/// The `Repository` backed by PostgreSQL. The pool is created lazily by the
/// caller and handed in explicitly; nothing is cached globally.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_post_where(&self, column: &str, bind: PostKey<'_>) -> Result<Option<Post>, RepoError> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts p LEFT JOIN users u ON u.id = p.author_id WHERE p.{column} = $1"
        );
        let query = sqlx::query_as::<_, Post>(&sql);
        let query = match bind {
            PostKey::Id(id) => query.bind(id),
            PostKey::Slug(slug) => query.bind(slug),
        };
        Ok(query.fetch_optional(&self.pool).await?)
    }
}

enum PostKey<'a> {
    Id(Uuid),
    Slug(&'a str),
}

/// Escapes `\`, `%` and `_` so a search term matches literally inside an
/// `ILIKE ... ESCAPE '\'` pattern.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Appends the WHERE clause shared by the listing and its count query.
fn push_post_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    builder.push(" WHERE TRUE");

    if let Some(author_id) = query.author_id {
        builder.push(" AND p.author_id = ");
        builder.push_bind(author_id);
    }

    if let Some(status) = query.status {
        builder.push(" AND p.status = ");
        builder.push_bind(status.as_str());
    }

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", escape_like(search));
        builder.push(" AND (p.title ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR p.content ILIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR p.excerpt ILIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\')");
    }

    if !query.tags.is_empty() {
        builder.push(" AND p.tags && ");
        builder.push_bind(query.tags.clone());
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// create_user
    ///
    /// Relies on the `users_email_key` constraint for email uniqueness.
    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(user.name)
            .bind(user.email)
            .bind(user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await?)
    }

    /// update_user
    ///
    /// COALESCE keeps every column whose change is `None`.
    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let sql = format!(
            "UPDATE users SET name = COALESCE($2, name), email = COALESCE($3, email), \
             password_hash = COALESCE($4, password_hash), role = COALESCE($5, role), \
             updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.role.map(|role| role.as_str()))
            .fetch_optional(&self.pool)
            .await?)
    }

    /// delete_user
    ///
    /// Posts and comments go with the user through `ON DELETE CASCADE`.
    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, RepoError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE ($1::TEXT IS NULL OR role = $1) ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(role.map(|role| role.as_str()))
            .fetch_all(&self.pool)
            .await?)
    }

    /// list_posts
    ///
    /// Builds the filtered query with QueryBuilder so every user-supplied value
    /// is bound, never interpolated.
    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, RepoError> {
        let mut count: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM posts p");
        push_post_filters(&mut count, query);
        let total = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {POST_COLUMNS} FROM posts p LEFT JOIN users u ON u.id = p.author_id"
        ));
        push_post_filters(&mut builder, query);
        builder.push(" ORDER BY p.created_at DESC");

        if let Some(limit) = query.limit {
            builder.push(" LIMIT ");
            builder.push_bind(i64::from(limit));
            builder.push(" OFFSET ");
            builder.push_bind(i64::from(query.offset));
        }

        let posts = builder.build_query_as::<Post>().fetch_all(&self.pool).await?;

        Ok(PostPage {
            posts,
            total: u64::try_from(total).unwrap_or_default(),
        })
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.fetch_post_where("id", PostKey::Id(id)).await
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        self.fetch_post_where("slug", PostKey::Slug(slug)).await
    }

    /// create_post
    ///
    /// Inserts and joins the author in one round trip using a CTE.
    async fn create_post(&self, post: NewPost) -> Result<Post, RepoError> {
        let sql = format!(
            "WITH p AS ( \
                INSERT INTO posts (id, title, content, author_id, status, slug, excerpt, tags, created_at, updated_at) \
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW(), NOW()) RETURNING * \
             ) \
             SELECT {POST_COLUMNS} FROM p LEFT JOIN users u ON u.id = p.author_id"
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(Uuid::new_v4())
            .bind(post.title)
            .bind(post.content)
            .bind(post.author_id)
            .bind(post.status.as_str())
            .bind(post.slug)
            .bind(post.excerpt)
            .bind(post.tags)
            .fetch_one(&self.pool)
            .await?)
    }

    /// update_post
    ///
    /// Only title, content, status and tags are writable; author and slug are
    /// never part of the statement.
    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, RepoError> {
        let sql = format!(
            "WITH p AS ( \
                UPDATE posts SET title = COALESCE($2, title), content = COALESCE($3, content), \
                status = COALESCE($4, status), tags = COALESCE($5, tags), updated_at = NOW() \
                WHERE id = $1 RETURNING * \
             ) \
             SELECT {POST_COLUMNS} FROM p LEFT JOIN users u ON u.id = p.author_id"
        );
        Ok(sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.content)
            .bind(changes.status.map(|status| status.as_str()))
            .bind(changes.tags)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn published_tags(&self) -> Result<Vec<String>, RepoError> {
        Ok(sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT tag FROM posts, UNNEST(tags) AS tag \
             WHERE status = 'published' AND btrim(tag) <> '' ORDER BY tag",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c LEFT JOIN users u ON u.id = c.author_id \
             WHERE c.post_id = $1 ORDER BY c.created_at ASC"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let sql = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c LEFT JOIN users u ON u.id = c.author_id WHERE c.id = $1"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let sql = format!(
            "WITH c AS ( \
                INSERT INTO comments (id, content, author_id, post_id, parent_comment_id, created_at) \
                VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING * \
             ) \
             SELECT {COMMENT_COLUMNS} FROM c LEFT JOIN users u ON u.id = c.author_id"
        );
        Ok(sqlx::query_as::<_, Comment>(&sql)
            .bind(Uuid::new_v4())
            .bind(comment.content)
            .bind(comment.author_id)
            .bind(comment.post_id)
            .bind(comment.parent_comment_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// get_stats
    ///
    /// Compiles all dashboard counters in a single statement.
    async fn get_stats(&self) -> Result<AdminDashboardStats, RepoError> {
        Ok(sqlx::query_as::<_, AdminDashboardStats>(
            "SELECT \
                (SELECT COUNT(*) FROM users) AS total_users, \
                (SELECT COUNT(*) FROM posts) AS total_posts, \
                (SELECT COUNT(*) FROM posts WHERE status = 'published') AS published_posts, \
                (SELECT COUNT(*) FROM posts WHERE status = 'draft') AS draft_posts, \
                (SELECT COUNT(*) FROM comments) AS total_comments",
        )
        .fetch_one(&self.pool)
        .await?)
    }
}
