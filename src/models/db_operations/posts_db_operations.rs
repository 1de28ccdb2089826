use crate::models::Post;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Error as RusqliteError, Row};

const POST_COLUMNS: &str = "id, title, content, media, media_type, created_at, user_id";

fn parse_created_at(value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            RusqliteError::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn post_from_row(row: &Row) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        media: row.get(3)?,
        media_type: row.get(4)?,
        created_at: parse_created_at(row.get(5)?)?,
        user_id: row.get(6)?,
    })
}

pub fn create_post(
    conn: &Connection,
    title: &str,
    content: &str,
    media: Option<&str>,
    media_type: Option<&str>,
    user_id: i64,
    created_at: DateTime<Utc>,
) -> Result<i64, RusqliteError> {
    conn.execute(
        "INSERT INTO posts (title, content, media, media_type, created_at, user_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            title,
            content,
            media,
            media_type,
            created_at.to_rfc3339(),
            user_id
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_post(conn: &Connection, post_id: i64) -> Option<Post> {
    conn.query_row(
        &format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS),
        [post_id],
        post_from_row,
    )
    .ok()
}

/// All posts, newest first (descending id follows creation order).
pub fn read_all_posts(conn: &Connection) -> Result<Vec<Post>, RusqliteError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM posts ORDER BY id DESC",
        POST_COLUMNS
    ))?;
    let post_iter = stmt.query_map([], post_from_row)?;

    let mut posts = Vec::new();
    for post in post_iter {
        posts.push(post?);
    }
    Ok(posts)
}

pub fn read_posts_by_user(conn: &Connection, user_id: i64) -> Result<Vec<Post>, RusqliteError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM posts WHERE user_id = ?1 ORDER BY id",
        POST_COLUMNS
    ))?;
    let post_iter = stmt.query_map([user_id], post_from_row)?;

    let mut posts = Vec::new();
    for post in post_iter {
        posts.push(post?);
    }
    Ok(posts)
}

/// Deletes the post row; comments and likes go with it via ON DELETE CASCADE.
pub fn delete_post(conn: &Connection, post_id: i64) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM posts WHERE id = ?1", [post_id])
}
