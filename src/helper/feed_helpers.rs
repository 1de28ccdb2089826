use crate::helper::policy_helpers;
use crate::helper::upload_helpers::PostForm;
use crate::models::db_operations::{
    accounts_db_operations, comments_db_operations, likes_db_operations, posts_db_operations,
};
use crate::models::{Account, AuthorSummary, CommentDetail, FeedAction, Post, PostView};
use crate::DbPool;
use actix_web::web;
use chrono::{DateTime, Utc};
use rusqlite::Connection;
use thiserror::Error;

/// Minimum interval between successive posts by the same account.
pub const POST_COOLDOWN_SECONDS: i64 = 10;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Please wait {0} more seconds before posting again")]
    RateLimited(i64),
    #[error("You must provide a title, content, image, or video")]
    EmptyPost,
    #[error("Comment content required")]
    EmptyComment,
    #[error("Post not found")]
    PostNotFound,
    #[error("Comment not found")]
    CommentNotFound,
    #[error("You are not allowed to delete this post")]
    PostDeleteForbidden,
    #[error("You are not allowed to delete this comment")]
    CommentDeleteForbidden,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

pub enum LikeOutcome {
    Liked,
    Unliked,
}

/// Whole seconds left of the posting cooldown, or None when the account may
/// post. A skewed future timestamp still yields a bounded positive value.
pub fn cooldown_remaining(account: &Account, now: DateTime<Utc>) -> Option<i64> {
    let last = account.last_post_time?;
    let elapsed = (now - last).num_seconds();
    if elapsed < POST_COOLDOWN_SECONDS {
        Some(POST_COOLDOWN_SECONDS - elapsed.max(0))
    } else {
        None
    }
}

/// Creates a post and stamps the author's last-post time. Absent title and
/// content are stored as empty strings.
pub fn create_post(
    pool: &web::Data<DbPool>,
    account: &Account,
    form: PostForm,
) -> Result<PostView, FeedError> {
    let now = Utc::now();
    if let Some(remaining) = cooldown_remaining(account, now) {
        return Err(FeedError::RateLimited(remaining));
    }
    if form.is_empty() {
        return Err(FeedError::EmptyPost);
    }

    let title = form.title.unwrap_or_default();
    let content = form.content.unwrap_or_default();
    let (media, media_type) = match &form.media {
        Some(saved) => (Some(saved.filename.clone()), Some(saved.kind.as_str())),
        None => (None, None),
    };

    let conn = pool.get()?;
    let post_id = posts_db_operations::create_post(
        &conn,
        &title,
        &content,
        media.as_deref(),
        media_type,
        account.id,
        now,
    )?;
    accounts_db_operations::update_last_post_time(&conn, account.id, now)?;

    Ok(PostView {
        id: post_id,
        title,
        content,
        media,
        media_type: media_type.map(str::to_string),
        created_at: now,
        author: AuthorSummary {
            id: account.id,
            username: account.username.clone(),
            image: account.profile_image.clone(),
        },
        comments: Vec::new(),
        likes: 0,
        liked_by_me: false,
    })
}

/// Projects one post with its author summary, nested comments, like count
/// and the viewer's like flag. A post whose author row has vanished is
/// skipped rather than failing the whole listing.
pub fn project_post(
    conn: &Connection,
    post: Post,
    viewer_id: i64,
) -> Result<Option<PostView>, rusqlite::Error> {
    let author = match accounts_db_operations::read_account_by_id(conn, post.user_id) {
        Some(author) => author,
        None => {
            log::warn!("Post {} has no author row and will be skipped.", post.id);
            return Ok(None);
        }
    };

    let comments = comments_db_operations::read_views_for_post(conn, post.id)?;
    let likes = likes_db_operations::count_for_post(conn, post.id)?;
    let liked_by_me = likes_db_operations::account_likes_post(conn, viewer_id, post.id)?;

    Ok(Some(PostView {
        id: post.id,
        title: post.title,
        content: post.content,
        media: post.media,
        media_type: post.media_type,
        created_at: post.created_at,
        author: AuthorSummary {
            id: author.id,
            username: author.username,
            image: author.profile_image,
        },
        comments,
        likes,
        liked_by_me,
    }))
}

/// The whole feed, newest first, projected for the viewing account.
pub fn fetch_feed(pool: &web::Data<DbPool>, viewer: &Account) -> Result<Vec<PostView>, FeedError> {
    let conn = pool.get()?;
    let posts = posts_db_operations::read_all_posts(&conn)?;

    let mut views = Vec::with_capacity(posts.len());
    for post in posts {
        if let Some(view) = project_post(&conn, post, viewer.id)? {
            views.push(view);
        }
    }
    Ok(views)
}

pub fn delete_post(
    pool: &web::Data<DbPool>,
    actor: &Account,
    post_id: i64,
) -> Result<(), FeedError> {
    let conn = pool.get()?;
    let post = posts_db_operations::read_post(&conn, post_id).ok_or(FeedError::PostNotFound)?;

    if !policy_helpers::can(actor, FeedAction::DeletePost, post.user_id) {
        return Err(FeedError::PostDeleteForbidden);
    }

    posts_db_operations::delete_post(&conn, post_id)?;
    Ok(())
}

/// Attaches a comment to an existing post; returns the new comment id.
pub fn add_comment(
    pool: &web::Data<DbPool>,
    actor: &Account,
    post_id: i64,
    content: &str,
) -> Result<i64, FeedError> {
    if content.is_empty() {
        return Err(FeedError::EmptyComment);
    }

    let conn = pool.get()?;
    if posts_db_operations::read_post(&conn, post_id).is_none() {
        return Err(FeedError::PostNotFound);
    }

    Ok(comments_db_operations::create_comment(
        &conn,
        content,
        actor.id,
        post_id,
        Utc::now(),
    )?)
}

pub fn list_comments(
    pool: &web::Data<DbPool>,
    post_id: i64,
) -> Result<Vec<CommentDetail>, FeedError> {
    let conn = pool.get()?;
    if posts_db_operations::read_post(&conn, post_id).is_none() {
        return Err(FeedError::PostNotFound);
    }
    Ok(comments_db_operations::read_details_for_post(&conn, post_id)?)
}

pub fn delete_comment(
    pool: &web::Data<DbPool>,
    actor: &Account,
    comment_id: i64,
) -> Result<(), FeedError> {
    let conn = pool.get()?;
    let comment =
        comments_db_operations::read_comment(&conn, comment_id).ok_or(FeedError::CommentNotFound)?;

    if !policy_helpers::can(actor, FeedAction::DeleteComment, comment.user_id) {
        return Err(FeedError::CommentDeleteForbidden);
    }

    comments_db_operations::delete_comment(&conn, comment_id)?;
    Ok(())
}

/// Flips the like state for (actor, post): an existing like is removed,
/// otherwise one is created.
pub fn toggle_like(
    pool: &web::Data<DbPool>,
    actor: &Account,
    post_id: i64,
) -> Result<LikeOutcome, FeedError> {
    let conn = pool.get()?;
    if posts_db_operations::read_post(&conn, post_id).is_none() {
        return Err(FeedError::PostNotFound);
    }

    match likes_db_operations::find_like_id(&conn, actor.id, post_id)? {
        Some(like_id) => {
            likes_db_operations::delete_like(&conn, like_id)?;
            Ok(LikeOutcome::Unliked)
        }
        None => {
            likes_db_operations::create_like(&conn, actor.id, post_id)?;
            Ok(LikeOutcome::Liked)
        }
    }
}

pub fn like_count(pool: &web::Data<DbPool>, post_id: i64) -> Result<i64, FeedError> {
    let conn = pool.get()?;
    if posts_db_operations::read_post(&conn, post_id).is_none() {
        return Err(FeedError::PostNotFound);
    }
    Ok(likes_db_operations::count_for_post(&conn, post_id)?)
}
