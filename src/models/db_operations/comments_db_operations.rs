use crate::models::{Comment, CommentDetail, CommentView};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Error as RusqliteError};

fn parse_created_at(value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            RusqliteError::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub fn create_comment(
    conn: &Connection,
    content: &str,
    user_id: i64,
    post_id: i64,
    created_at: DateTime<Utc>,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO comments (content, created_at, user_id, post_id) VALUES (?1, ?2, ?3, ?4)",
        params![content, created_at.to_rfc3339(), user_id, post_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_comment(conn: &Connection, comment_id: i64) -> Option<Comment> {
    conn.query_row(
        "SELECT id, content, created_at, user_id, post_id FROM comments WHERE id = ?1",
        [comment_id],
        |row| {
            Ok(Comment {
                id: row.get(0)?,
                content: row.get(1)?,
                created_at: parse_created_at(row.get(2)?)?,
                user_id: row.get(3)?,
                post_id: row.get(4)?,
            })
        },
    )
    .ok()
}

pub fn delete_comment(conn: &Connection, comment_id: i64) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM comments WHERE id = ?1", [comment_id])
}

/// Comments nested inside a post projection, in insertion order.
pub fn read_views_for_post(
    conn: &Connection,
    post_id: i64,
) -> Result<Vec<CommentView>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.content, u.username, u.id, u.profile_image
         FROM comments c JOIN users u ON u.id = c.user_id
         WHERE c.post_id = ?1 ORDER BY c.id",
    )?;
    let comment_iter = stmt.query_map([post_id], |row| {
        Ok(CommentView {
            id: row.get(0)?,
            content: row.get(1)?,
            user: row.get(2)?,
            user_id: row.get(3)?,
            user_pfp: row.get(4)?,
        })
    })?;

    let mut comments = Vec::new();
    for comment in comment_iter {
        comments.push(comment?);
    }
    Ok(comments)
}

/// Comments for the standalone per-post listing, in insertion order.
pub fn read_details_for_post(
    conn: &Connection,
    post_id: i64,
) -> Result<Vec<CommentDetail>, RusqliteError> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.content, u.username, u.id, c.created_at
         FROM comments c JOIN users u ON u.id = c.user_id
         WHERE c.post_id = ?1 ORDER BY c.id",
    )?;
    let comment_iter = stmt.query_map([post_id], |row| {
        Ok(CommentDetail {
            id: row.get(0)?,
            content: row.get(1)?,
            user: row.get(2)?,
            user_id: row.get(3)?,
            created_at: parse_created_at(row.get(4)?)?,
        })
    })?;

    let mut comments = Vec::new();
    for comment in comment_iter {
        comments.push(comment?);
    }
    Ok(comments)
}
