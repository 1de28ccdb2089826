use rusqlite::{params, Connection, Error as RusqliteError, OptionalExtension};

pub fn find_like_id(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
) -> Result<Option<i64>, RusqliteError> {
    conn.query_row(
        "SELECT id FROM likes WHERE user_id = ?1 AND post_id = ?2",
        params![user_id, post_id],
        |row| row.get(0),
    )
    .optional()
}

/// The UNIQUE (user_id, post_id) constraint rejects a duplicate insert, so a
/// racing double-like fails at the storage layer rather than inserting twice.
pub fn create_like(conn: &Connection, user_id: i64, post_id: i64) -> Result<(), RusqliteError> {
    conn.execute(
        "INSERT INTO likes (user_id, post_id) VALUES (?1, ?2)",
        params![user_id, post_id],
    )?;
    Ok(())
}

pub fn delete_like(conn: &Connection, like_id: i64) -> Result<usize, RusqliteError> {
    conn.execute("DELETE FROM likes WHERE id = ?1", [like_id])
}

pub fn count_for_post(conn: &Connection, post_id: i64) -> Result<i64, RusqliteError> {
    conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
        [post_id],
        |row| row.get(0),
    )
}

pub fn account_likes_post(
    conn: &Connection,
    user_id: i64,
    post_id: i64,
) -> Result<bool, RusqliteError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2)",
        params![user_id, post_id],
        |row| row.get(0),
    )
}
