use crate::helper::feed_helpers;
use crate::helper::policy_helpers;
use crate::helper::upload_helpers::ProfileForm;
use crate::models::db_operations::{accounts_db_operations, posts_db_operations};
use crate::models::{Account, FeedAction, ProfileView, UserSummary};
use crate::DbPool;
use actix_web::web;
use thiserror::Error;

const MAX_BIO_CHARS: usize = 50;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("User not found")]
    UserNotFound,
    #[error("ეს username უკვე არსებობს")]
    UsernameTaken,
    #[error("ბიო უნდა შეიცავდეს მაქსიმუმ 50 სიმბოლოს")]
    BioTooLong,
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("R2D2 Pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Public profile plus the account's own posts, projected for the viewer.
pub fn fetch_profile(
    pool: &web::Data<DbPool>,
    viewer: &Account,
    user_id: i64,
) -> Result<ProfileView, ProfileError> {
    let conn = pool.get()?;
    let account =
        accounts_db_operations::read_account_by_id(&conn, user_id).ok_or(ProfileError::UserNotFound)?;

    let posts = posts_db_operations::read_posts_by_user(&conn, user_id)?;
    let mut views = Vec::with_capacity(posts.len());
    for post in posts {
        if let Some(view) = feed_helpers::project_post(&conn, post, viewer.id)? {
            views.push(view);
        }
    }

    Ok(ProfileView {
        id: account.id,
        username: account.username,
        email: account.email,
        bio: account.bio,
        profile_image: account.profile_image,
        posts: views,
    })
}

/// Applies a profile update for the owning account. Everything is validated
/// before the first write, so a rejected update leaves no partial changes.
/// The bio length rule only runs when a bio field was supplied; a supplied
/// empty bio clears the field.
pub fn update_profile(
    pool: &web::Data<DbPool>,
    actor: &Account,
    target_id: i64,
    form: ProfileForm,
) -> Result<(), ProfileError> {
    if !policy_helpers::can(actor, FeedAction::UpdateProfile, target_id) {
        return Err(ProfileError::Unauthorized);
    }

    let conn = pool.get()?;

    let new_username = match &form.username {
        Some(username) if *username != actor.username => {
            if accounts_db_operations::username_taken_by_other(&conn, username, actor.id)? {
                return Err(ProfileError::UsernameTaken);
            }
            Some(username.as_str())
        }
        _ => None,
    };

    if let Some(bio) = &form.bio {
        if bio.chars().count() > MAX_BIO_CHARS {
            return Err(ProfileError::BioTooLong);
        }
    }

    if let Some(username) = new_username {
        accounts_db_operations::update_username(&conn, actor.id, username)?;
    }
    if let Some(saved) = &form.profile_image {
        accounts_db_operations::update_profile_image(&conn, actor.id, &saved.filename)?;
    }
    if let Some(bio) = &form.bio {
        accounts_db_operations::update_bio(&conn, actor.id, bio)?;
    }

    Ok(())
}

pub fn fetch_all_users(pool: &web::Data<DbPool>) -> Result<Vec<UserSummary>, ProfileError> {
    let conn = pool.get()?;
    Ok(accounts_db_operations::read_all_accounts(&conn)?)
}
