use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use super::{PostPage, PostQuery, RepoError, Repository};
use crate::models::{
    AdminDashboardStats, Comment, NewComment, NewPost, NewUser, Post, PostChanges, PostStatus,
    Role, User, UserChanges,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl Tables {
    fn author_of(&self, author_id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == author_id)
    }

    /// Fills the joined author columns the way the SQL adapter does.
    fn hydrate_post(&self, post: &Post) -> Post {
        let mut post = post.clone();
        let author = self.author_of(post.author_id);
        post.author_name = author.map(|u| u.name.clone());
        post.author_email = author.map(|u| u.email.clone());
        post
    }

    fn hydrate_comment(&self, comment: &Comment) -> Comment {
        let mut comment = comment.clone();
        comment.author_name = self.author_of(comment.author_id).map(|u| u.name.clone());
        comment
    }

    fn remove_post_cascade(&mut self, id: Uuid) -> bool {
        let before = self.posts.len();
        self.posts.retain(|p| p.id != id);
        if self.posts.len() == before {
            return false;
        }
        self.comments.retain(|c| c.post_id != id);
        true
    }
}

fn matches(post: &Post, query: &PostQuery) -> bool {
    if query.author_id.is_some_and(|author| post.author_id != author) {
        return false;
    }
    if query.status.is_some_and(|status| post.status != status) {
        return false;
    }
    if let Some(search) = &query.search {
        let needle = search.to_lowercase();
        let hit = [&post.title, &post.content, &post.excerpt]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    if !query.tags.is_empty() && !post.tags.iter().any(|t| query.tags.contains(t)) {
        return false;
    }
    true
}

/// InMemoryRepository
///
/// A process-local `Repository` used by the test suite and by local runs
/// without `DATABASE_URL`. Mirrors the SQL adapter's constraints: unique
/// email and slug, cascading deletes, newest-first listings.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read();
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::DuplicateEmail);
        }

        let now = Utc::now();
        let record = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(record.clone());
        Ok(record)
    }

    async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, RepoError> {
        let mut tables = self.tables.write();

        if let Some(email) = &changes.email {
            if tables.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(RepoError::DuplicateEmail);
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write();
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }

        let owned: Vec<Uuid> = tables
            .posts
            .iter()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in owned {
            tables.remove_post_cascade(post_id);
        }
        tables.comments.retain(|c| c.author_id != id);
        Ok(true)
    }

    async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>, RepoError> {
        let tables = self.tables.read();
        let mut users: Vec<User> = tables
            .users
            .iter()
            .rev()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn list_posts(&self, query: &PostQuery) -> Result<PostPage, RepoError> {
        let tables = self.tables.read();

        // Reverse insertion order first so equal timestamps still come out newest first.
        let mut found: Vec<&Post> = tables.posts.iter().rev().filter(|p| matches(p, query)).collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = found.len() as u64;
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        let posts = found
            .into_iter()
            .skip(query.offset as usize)
            .take(limit)
            .map(|p| tables.hydrate_post(p))
            .collect();

        Ok(PostPage { posts, total })
    }

    async fn find_post(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read();
        Ok(tables.posts.iter().find(|p| p.id == id).map(|p| tables.hydrate_post(p)))
    }

    async fn find_post_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read();
        Ok(tables.posts.iter().find(|p| p.slug == slug).map(|p| tables.hydrate_post(p)))
    }

    async fn create_post(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write();
        if tables.posts.iter().any(|p| p.slug == post.slug) {
            return Err(RepoError::DuplicateSlug);
        }

        let now = Utc::now();
        let record = Post {
            id: Uuid::new_v4(),
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            status: post.status,
            slug: post.slug,
            excerpt: post.excerpt,
            tags: post.tags,
            created_at: now,
            updated_at: now,
            author_name: None,
            author_email: None,
        };
        tables.posts.push(record.clone());
        Ok(tables.hydrate_post(&record))
    }

    async fn update_post(&self, id: Uuid, changes: PostChanges) -> Result<Option<Post>, RepoError> {
        let mut tables = self.tables.write();
        let Some(post) = tables.posts.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(status) = changes.status {
            post.status = status;
        }
        if let Some(tags) = changes.tags {
            post.tags = tags;
        }
        post.updated_at = Utc::now();

        let updated = post.clone();
        Ok(Some(tables.hydrate_post(&updated)))
    }

    async fn delete_post(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.tables.write().remove_post_cascade(id))
    }

    async fn published_tags(&self) -> Result<Vec<String>, RepoError> {
        let tables = self.tables.read();
        let mut tags: Vec<String> = tables
            .posts
            .iter()
            .filter(|p| p.status == PostStatus::Published)
            .flat_map(|p| p.tags.iter())
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect();
        tags.sort();
        tags.dedup();
        Ok(tags)
    }

    async fn list_comments(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let tables = self.tables.read();
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| tables.hydrate_comment(c))
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }

    async fn find_comment(&self, id: Uuid) -> Result<Option<Comment>, RepoError> {
        let tables = self.tables.read();
        Ok(tables
            .comments
            .iter()
            .find(|c| c.id == id)
            .map(|c| tables.hydrate_comment(c)))
    }

    async fn create_comment(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let mut tables = self.tables.write();
        let record = Comment {
            id: Uuid::new_v4(),
            content: comment.content,
            author_id: comment.author_id,
            post_id: comment.post_id,
            parent_comment_id: comment.parent_comment_id,
            created_at: Utc::now(),
            author_name: None,
        };
        tables.comments.push(record.clone());
        Ok(tables.hydrate_comment(&record))
    }

    async fn delete_comment(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.tables.write();
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        if tables.comments.len() == before {
            return Ok(false);
        }
        // Replies lose their back-reference (ON DELETE SET NULL).
        for reply in tables.comments.iter_mut().filter(|c| c.parent_comment_id == Some(id)) {
            reply.parent_comment_id = None;
        }
        Ok(true)
    }

    async fn get_stats(&self) -> Result<AdminDashboardStats, RepoError> {
        let tables = self.tables.read();
        let count = |status: PostStatus| {
            tables.posts.iter().filter(|p| p.status == status).count() as i64
        };
        Ok(AdminDashboardStats {
            total_users: tables.users.len() as i64,
            total_posts: tables.posts.len() as i64,
            published_posts: count(PostStatus::Published),
            draft_posts: count(PostStatus::Draft),
            total_comments: tables.comments.len() as i64,
        })
    }
}
