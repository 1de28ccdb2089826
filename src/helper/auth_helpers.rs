use crate::models::db_operations::accounts_db_operations;
use crate::models::Account;
use crate::DbPool;
use actix_web::web;
use thiserror::Error;

const MIN_PASSWORD_CHARS: usize = 8;

/// Registration/login failures. The display strings are the user-facing
/// response messages; the localized ones are part of the wire contract.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing fields")]
    MissingFields,
    #[error("ელფოსტა უკვე დარეგისტრირებულია")]
    EmailTaken,
    #[error("Username უკვე გამოყენებულია")]
    UsernameTaken,
    #[error("პაროლი უნდა შეიცავდეს მინიმუმ 8 სიმბოლოს")]
    PasswordTooShort,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Validates and creates a member account. The email is lower-cased before
/// both the duplicate lookup and storage, so uniqueness is case-insensitive.
pub fn register_account(
    pool: &web::Data<DbPool>,
    username: &str,
    email: &str,
    password: &str,
) -> Result<i64, AuthError> {
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(AuthError::MissingFields);
    }

    let email = email.to_lowercase();
    let conn = pool.get()?;

    if accounts_db_operations::email_exists(&conn, &email)? {
        return Err(AuthError::EmailTaken);
    }
    if accounts_db_operations::username_exists(&conn, username)? {
        return Err(AuthError::UsernameTaken);
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AuthError::PasswordTooShort);
    }

    Ok(accounts_db_operations::create_account(
        &conn, username, &email, password,
    )?)
}

/// Resolves a login attempt to the account, or None for bad credentials.
pub fn verify_login(pool: &web::Data<DbPool>, email: &str, password: &str) -> Option<Account> {
    let conn = pool.get().ok()?;
    accounts_db_operations::verify_credentials(&conn, &email.to_lowercase(), password)
}
