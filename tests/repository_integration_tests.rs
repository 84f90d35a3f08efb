use blog_portal::{
    InMemoryRepository,
    models::{NewComment, NewPost, NewUser, PostChanges, PostStatus, Role, UserChanges},
    repository::{PostQuery, RepoError, Repository, escape_like},
};
use uuid::Uuid;

// --- Fixtures ---

fn new_user(email: &str, role: Role) -> NewUser {
    NewUser {
        name: "Test User".to_string(),
        email: email.to_string(),
        password_hash: "$2b$04$not-a-real-hash".to_string(),
        role,
    }
}

fn new_post(author_id: Uuid, slug: &str, status: PostStatus, tags: &[&str]) -> NewPost {
    NewPost {
        title: format!("Title for {slug}"),
        content: format!("Body text for {slug}"),
        author_id,
        status,
        slug: slug.to_string(),
        excerpt: format!("Body text for {slug}..."),
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

fn reply(author_id: Uuid, post_id: Uuid, parent: Option<Uuid>) -> NewComment {
    NewComment {
        content: "A comment".to_string(),
        author_id,
        post_id,
        parent_comment_id: parent,
    }
}

// --- Users ---

#[tokio::test]
async fn test_user_email_is_unique() {
    let repo = InMemoryRepository::new();
    let first = repo.create_user(new_user("a@x.com", Role::User)).await.unwrap();
    let second = repo.create_user(new_user("b@x.com", Role::User)).await.unwrap();

    let duplicate = repo.create_user(new_user("a@x.com", Role::Admin)).await;
    assert_eq!(duplicate.unwrap_err(), RepoError::DuplicateEmail);

    let changes = UserChanges {
        email: Some("a@x.com".to_string()),
        ..UserChanges::default()
    };
    assert_eq!(
        repo.update_user(second.id, changes).await.unwrap_err(),
        RepoError::DuplicateEmail
    );

    // Keeping one's own email is not a conflict.
    let same = UserChanges {
        email: Some("a@x.com".to_string()),
        ..UserChanges::default()
    };
    assert!(repo.update_user(first.id, same).await.unwrap().is_some());
}

#[tokio::test]
async fn test_user_lookup_and_partial_update() {
    let repo = InMemoryRepository::new();
    let user = repo.create_user(new_user("a@x.com", Role::User)).await.unwrap();

    assert_eq!(repo.find_user_by_email("a@x.com").await.unwrap(), Some(user.clone()));
    assert_eq!(repo.find_user_by_id(user.id).await.unwrap(), Some(user.clone()));
    assert_eq!(repo.find_user_by_email("nobody@x.com").await.unwrap(), None);

    let updated = repo
        .update_user(
            user.id,
            UserChanges {
                role: Some(Role::Admin),
                ..UserChanges::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.role, Role::Admin);
    assert_eq!(updated.email, user.email);
    assert_eq!(updated.password_hash, user.password_hash);

    assert_eq!(
        repo.update_user(Uuid::new_v4(), UserChanges::default()).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_list_users_filters_by_role() {
    let repo = InMemoryRepository::new();
    repo.create_user(new_user("admin@x.com", Role::Admin)).await.unwrap();
    let older = repo.create_user(new_user("a@x.com", Role::User)).await.unwrap();
    let newer = repo.create_user(new_user("b@x.com", Role::User)).await.unwrap();

    let users = repo.list_users(Some(Role::User)).await.unwrap();
    let ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    assert_eq!(repo.list_users(None).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_deleting_user_removes_their_content() {
    let repo = InMemoryRepository::new();
    let ann = repo.create_user(new_user("a@x.com", Role::User)).await.unwrap();
    let bob = repo.create_user(new_user("b@x.com", Role::User)).await.unwrap();

    let ann_post = repo
        .create_post(new_post(ann.id, "ann-post", PostStatus::Published, &[]))
        .await
        .unwrap();
    let bob_post = repo
        .create_post(new_post(bob.id, "bob-post", PostStatus::Published, &[]))
        .await
        .unwrap();
    // Bob comments on Ann's post, Ann comments on Bob's.
    repo.create_comment(reply(bob.id, ann_post.id, None)).await.unwrap();
    repo.create_comment(reply(ann.id, bob_post.id, None)).await.unwrap();

    assert!(repo.delete_user(ann.id).await.unwrap());
    assert!(!repo.delete_user(ann.id).await.unwrap());

    assert_eq!(repo.find_post(ann_post.id).await.unwrap(), None);
    assert!(repo.list_comments(bob_post.id).await.unwrap().is_empty());

    let stats = repo.get_stats().await.unwrap();
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.total_posts, 1);
    assert_eq!(stats.total_comments, 0);
}

// --- Posts ---

#[tokio::test]
async fn test_post_slug_is_unique() {
    let repo = InMemoryRepository::new();
    let author = Uuid::new_v4();
    repo.create_post(new_post(author, "same", PostStatus::Draft, &[])).await.unwrap();

    let duplicate = repo.create_post(new_post(author, "same", PostStatus::Draft, &[])).await;
    assert_eq!(duplicate.unwrap_err(), RepoError::DuplicateSlug);
}

#[tokio::test]
async fn test_post_reads_carry_author_details() {
    let repo = InMemoryRepository::new();
    let author = repo.create_user(new_user("a@x.com", Role::User)).await.unwrap();
    let post = repo
        .create_post(new_post(author.id, "with-author", PostStatus::Draft, &[]))
        .await
        .unwrap();

    assert_eq!(post.author_name.as_deref(), Some("Test User"));
    let found = repo.find_post_by_slug("with-author").await.unwrap().unwrap();
    assert_eq!(found.author_email.as_deref(), Some("a@x.com"));
    assert_eq!(found.id, post.id);
}

#[tokio::test]
async fn test_update_post_keeps_author_and_slug() {
    let repo = InMemoryRepository::new();
    let author = Uuid::new_v4();
    let post = repo
        .create_post(new_post(author, "stable-slug", PostStatus::Draft, &["old"]))
        .await
        .unwrap();

    let updated = repo
        .update_post(
            post.id,
            PostChanges {
                title: Some("A brand new title".to_string()),
                status: Some(PostStatus::Published),
                tags: Some(vec![]),
                ..PostChanges::default()
            },
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.title, "A brand new title");
    assert_eq!(updated.status, PostStatus::Published);
    assert!(updated.tags.is_empty());
    assert_eq!(updated.content, post.content);
    assert_eq!(updated.slug, "stable-slug");
    assert_eq!(updated.author_id, author);
    assert!(updated.updated_at >= post.updated_at);

    assert_eq!(
        repo.update_post(Uuid::new_v4(), PostChanges::default()).await.unwrap(),
        None
    );
}

#[tokio::test]
async fn test_list_posts_filters_and_pages() {
    let repo = InMemoryRepository::new();
    let ann = Uuid::new_v4();
    let bob = Uuid::new_v4();

    repo.create_post(new_post(ann, "ann-one", PostStatus::Draft, &["rust"])).await.unwrap();
    repo.create_post(new_post(ann, "ann-two", PostStatus::Published, &["go"])).await.unwrap();
    repo.create_post(new_post(bob, "bob-one", PostStatus::Published, &["rust", "web"]))
        .await
        .unwrap();

    let all = repo.list_posts(&PostQuery::default()).await.unwrap();
    assert_eq!(all.total, 3);
    let slugs: Vec<&str> = all.posts.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, vec!["bob-one", "ann-two", "ann-one"]);

    let by_author = PostQuery {
        author_id: Some(ann),
        ..PostQuery::default()
    };
    assert_eq!(repo.list_posts(&by_author).await.unwrap().total, 2);

    let published = PostQuery {
        status: Some(PostStatus::Published),
        ..PostQuery::default()
    };
    assert_eq!(repo.list_posts(&published).await.unwrap().total, 2);

    let tagged = PostQuery {
        tags: vec!["web".to_string(), "go".to_string()],
        ..PostQuery::default()
    };
    assert_eq!(repo.list_posts(&tagged).await.unwrap().total, 2);

    let searched = PostQuery {
        search: Some("BOB-ONE".to_string()),
        ..PostQuery::default()
    };
    assert_eq!(repo.list_posts(&searched).await.unwrap().total, 1);

    let second_page = PostQuery {
        limit: Some(2),
        offset: 2,
        ..PostQuery::default()
    };
    let page = repo.list_posts(&second_page).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.posts.len(), 1);
    assert_eq!(page.posts[0].slug, "ann-one");
}

#[test]
fn test_search_wildcards_are_escaped() {
    assert_eq!(escape_like("rust"), "rust");
    assert_eq!(escape_like("50%_off"), "50\\%\\_off");
    assert_eq!(escape_like("C:\\dir"), "C:\\\\dir");
}

#[tokio::test]
async fn test_search_matches_wildcard_characters_literally() {
    let repo = InMemoryRepository::new();
    let author = Uuid::new_v4();
    repo.create_post(new_post(author, "plain", PostStatus::Published, &[]))
        .await
        .unwrap();
    let mut discounted = new_post(author, "discount", PostStatus::Published, &[]);
    discounted.title = "Save 50% today".to_string();
    repo.create_post(discounted).await.unwrap();

    for (term, expected) in [("%", 1), ("50%", 1), ("_", 0)] {
        let query = PostQuery {
            search: Some(term.to_string()),
            ..PostQuery::default()
        };
        assert_eq!(repo.list_posts(&query).await.unwrap().total, expected, "term {term:?}");
    }
}

#[tokio::test]
async fn test_published_tags_are_sorted_and_unique() {
    let repo = InMemoryRepository::new();
    let author = Uuid::new_v4();
    repo.create_post(new_post(author, "p1", PostStatus::Published, &["web", "rust"]))
        .await
        .unwrap();
    repo.create_post(new_post(author, "p2", PostStatus::Published, &["rust"]))
        .await
        .unwrap();
    repo.create_post(new_post(author, "p3", PostStatus::Draft, &["hidden"]))
        .await
        .unwrap();

    assert_eq!(repo.published_tags().await.unwrap(), vec!["rust", "web"]);
}

// --- Comments ---

#[tokio::test]
async fn test_deleting_post_removes_its_comments() {
    let repo = InMemoryRepository::new();
    let author = Uuid::new_v4();
    let post = repo
        .create_post(new_post(author, "doomed", PostStatus::Published, &[]))
        .await
        .unwrap();
    let comment = repo.create_comment(reply(author, post.id, None)).await.unwrap();

    assert!(repo.delete_post(post.id).await.unwrap());
    assert!(!repo.delete_post(post.id).await.unwrap());
    assert_eq!(repo.find_comment(comment.id).await.unwrap(), None);
}

#[tokio::test]
async fn test_comments_are_oldest_first_and_replies_survive_parent() {
    let repo = InMemoryRepository::new();
    let author = Uuid::new_v4();
    let post = repo
        .create_post(new_post(author, "discussed", PostStatus::Published, &[]))
        .await
        .unwrap();

    let parent = repo.create_comment(reply(author, post.id, None)).await.unwrap();
    let child = repo
        .create_comment(reply(author, post.id, Some(parent.id)))
        .await
        .unwrap();

    let listed = repo.list_comments(post.id).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![parent.id, child.id]);

    assert!(repo.delete_comment(parent.id).await.unwrap());
    let orphan = repo.find_comment(child.id).await.unwrap().unwrap();
    assert_eq!(orphan.parent_comment_id, None);
    assert!(!repo.delete_comment(parent.id).await.unwrap());
}

#[tokio::test]
async fn test_stats_count_by_status() {
    let repo = InMemoryRepository::new();
    let author = repo.create_user(new_user("a@x.com", Role::User)).await.unwrap();
    repo.create_post(new_post(author.id, "d1", PostStatus::Draft, &[])).await.unwrap();
    repo.create_post(new_post(author.id, "d2", PostStatus::Draft, &[])).await.unwrap();
    let live = repo
        .create_post(new_post(author.id, "p1", PostStatus::Published, &[]))
        .await
        .unwrap();
    repo.create_comment(reply(author.id, live.id, None)).await.unwrap();

    let stats = repo.get_stats().await.unwrap();
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.total_posts, 3);
    assert_eq!(stats.published_posts, 1);
    assert_eq!(stats.draft_posts, 2);
    assert_eq!(stats.total_comments, 1);
}
