use crate::models::{Account, UserSummary};
use bcrypt::{hash, verify, BcryptError};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Error as RusqliteError, Row};

const ACCOUNT_COLUMNS: &str = "id, username, email, profile_image, bio, role, last_post_time";

fn bcrypt_to_rusqlite_error(e: BcryptError) -> RusqliteError {
    RusqliteError::ToSqlConversionFailure(Box::new(e))
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn account_from_row(row: &Row) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        profile_image: row.get(3)?,
        bio: row.get(4)?,
        role: row.get(5)?,
        last_post_time: parse_timestamp(row.get(6)?),
    })
}

/// Inserts a member account. The caller is responsible for lower-casing the
/// email beforehand; the password is stored only as a bcrypt hash.
pub fn create_account(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64, RusqliteError> {
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "INSERT INTO users (username, email, password_hash, role, bio) VALUES (?1, ?2, ?3, 'member', '')",
        params![username, email, hashed_password],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn read_account_by_id(conn: &Connection, account_id: i64) -> Option<Account> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", ACCOUNT_COLUMNS),
        [account_id],
        account_from_row,
    )
    .ok()
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, RusqliteError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        [email],
        |row| row.get(0),
    )
}

pub fn username_exists(conn: &Connection, username: &str) -> Result<bool, RusqliteError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
        [username],
        |row| row.get(0),
    )
}

/// True when another account already holds the username.
pub fn username_taken_by_other(
    conn: &Connection,
    username: &str,
    account_id: i64,
) -> Result<bool, RusqliteError> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1 AND id != ?2)",
        params![username, account_id],
        |row| row.get(0),
    )
}

pub fn verify_credentials(conn: &Connection, email: &str, password: &str) -> Option<Account> {
    let res: rusqlite::Result<(String, Account)> = conn.query_row(
        &format!(
            "SELECT password_hash, {} FROM users WHERE email = ?1",
            ACCOUNT_COLUMNS
        ),
        [email],
        |row| {
            let hash: String = row.get(0)?;
            let account = Account {
                id: row.get(1)?,
                username: row.get(2)?,
                email: row.get(3)?,
                profile_image: row.get(4)?,
                bio: row.get(5)?,
                role: row.get(6)?,
                last_post_time: parse_timestamp(row.get(7)?),
            };
            Ok((hash, account))
        },
    );

    if let Ok((hash, account)) = res {
        if verify(password, &hash).unwrap_or(false) {
            return Some(account);
        }
    }
    None
}

pub fn update_last_post_time(
    conn: &Connection,
    account_id: i64,
    when: DateTime<Utc>,
) -> Result<(), RusqliteError> {
    conn.execute(
        "UPDATE users SET last_post_time = ?1 WHERE id = ?2",
        params![when.to_rfc3339(), account_id],
    )?;
    Ok(())
}

pub fn update_username(
    conn: &Connection,
    account_id: i64,
    username: &str,
) -> Result<(), RusqliteError> {
    conn.execute(
        "UPDATE users SET username = ?1 WHERE id = ?2",
        params![username, account_id],
    )?;
    Ok(())
}

pub fn update_bio(conn: &Connection, account_id: i64, bio: &str) -> Result<(), RusqliteError> {
    conn.execute(
        "UPDATE users SET bio = ?1 WHERE id = ?2",
        params![bio, account_id],
    )?;
    Ok(())
}

pub fn update_profile_image(
    conn: &Connection,
    account_id: i64,
    filename: &str,
) -> Result<(), RusqliteError> {
    conn.execute(
        "UPDATE users SET profile_image = ?1 WHERE id = ?2",
        params![filename, account_id],
    )?;
    Ok(())
}

pub fn update_password(
    conn: &Connection,
    username: &str,
    new_password: &str,
) -> Result<usize, RusqliteError> {
    let hashed_password =
        hash(new_password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "UPDATE users SET password_hash = ?1 WHERE username = ?2",
        params![hashed_password, username],
    )
}

pub fn read_all_accounts(conn: &Connection) -> Result<Vec<UserSummary>, RusqliteError> {
    let mut stmt =
        conn.prepare("SELECT id, username, profile_image, role, bio FROM users ORDER BY id")?;
    let account_iter = stmt.query_map([], |row| {
        Ok(UserSummary {
            id: row.get(0)?,
            username: row.get(1)?,
            profile_image: row.get(2)?,
            role: row.get(3)?,
            bio: row.get(4)?,
        })
    })?;

    let accounts = account_iter.filter_map(|a| a.ok()).collect();
    Ok(accounts)
}

pub fn read_admin_usernames(conn: &Connection) -> Result<Vec<String>, RusqliteError> {
    let mut stmt =
        conn.prepare("SELECT username FROM users WHERE role = 'admin' ORDER BY username")?;
    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut usernames = Vec::new();
    for username in rows {
        usernames.push(username?);
    }
    Ok(usernames)
}

/// Inserts an admin account. Only reachable from the setup CLI; registration
/// always produces members.
pub fn create_admin_account(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
) -> Result<(), RusqliteError> {
    let hashed_password = hash(password, bcrypt::DEFAULT_COST).map_err(bcrypt_to_rusqlite_error)?;
    conn.execute(
        "INSERT INTO users (username, email, password_hash, role, bio) VALUES (?1, ?2, ?3, 'admin', '')",
        params![username, email, hashed_password],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::setup::db_setup;

    fn test_conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        db_setup::setup_feed_db(&mut conn).unwrap();
        conn
    }

    #[test]
    fn create_and_verify_credentials() {
        let conn = test_conn();
        create_account(&conn, "alice", "a@x.com", "password1").unwrap();

        let account = verify_credentials(&conn, "a@x.com", "password1").unwrap();
        assert_eq!(account.username, "alice");
        assert_eq!(account.role, "member");
        assert!(account.last_post_time.is_none());

        assert!(verify_credentials(&conn, "a@x.com", "wrong-password").is_none());
        assert!(verify_credentials(&conn, "b@x.com", "password1").is_none());
    }

    #[test]
    fn plaintext_password_is_never_stored() {
        let conn = test_conn();
        create_account(&conn, "alice", "a@x.com", "password1").unwrap();

        let stored: String = conn
            .query_row("SELECT password_hash FROM users WHERE username = 'alice'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_ne!(stored, "password1");
        assert!(stored.starts_with("$2"));
    }

    #[test]
    fn duplicate_email_and_username_are_rejected_by_schema() {
        let conn = test_conn();
        create_account(&conn, "alice", "a@x.com", "password1").unwrap();

        assert!(create_account(&conn, "alice2", "a@x.com", "password1").is_err());
        assert!(create_account(&conn, "alice", "other@x.com", "password1").is_err());
    }

    #[test]
    fn username_taken_by_other_ignores_self() {
        let conn = test_conn();
        let alice = create_account(&conn, "alice", "a@x.com", "password1").unwrap();
        create_account(&conn, "bob", "b@x.com", "password1").unwrap();

        assert!(!username_taken_by_other(&conn, "alice", alice).unwrap());
        assert!(username_taken_by_other(&conn, "bob", alice).unwrap());
        assert!(!username_taken_by_other(&conn, "carol", alice).unwrap());
    }

    #[test]
    fn last_post_time_round_trips() {
        let conn = test_conn();
        let alice = create_account(&conn, "alice", "a@x.com", "password1").unwrap();

        let when = Utc::now();
        update_last_post_time(&conn, alice, when).unwrap();

        let account = read_account_by_id(&conn, alice).unwrap();
        let stored = account.last_post_time.unwrap();
        assert!((stored - when).num_seconds().abs() < 1);
    }

    #[test]
    fn missing_account_reads_as_none() {
        let conn = test_conn();
        assert!(read_account_by_id(&conn, 42).is_none());
    }
}
