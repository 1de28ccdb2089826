use crate::helper::feed_helpers::FeedError;
use crate::helper::profile_helpers::ProfileError;
use crate::helper::upload_helpers::UploadError;
use actix_web::HttpResponse;
use serde_json::json;

pub mod auth;
pub mod comments;
pub mod likes;
pub mod posts;
pub mod users;

/// Maps a feed failure to its response. Used by the post, comment and like
/// handlers so status codes cannot drift between them.
pub(crate) fn feed_error_response(err: FeedError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    match err {
        FeedError::RateLimited(_) => HttpResponse::TooManyRequests().json(body),
        FeedError::EmptyPost | FeedError::EmptyComment => HttpResponse::BadRequest().json(body),
        FeedError::PostNotFound | FeedError::CommentNotFound => {
            HttpResponse::NotFound().json(body)
        }
        FeedError::PostDeleteForbidden | FeedError::CommentDeleteForbidden => {
            HttpResponse::Forbidden().json(body)
        }
        FeedError::Database(_) | FeedError::Pool(_) => {
            log::error!("Feed operation failed: {}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub(crate) fn profile_error_response(err: ProfileError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    match err {
        ProfileError::Unauthorized => HttpResponse::Forbidden().json(body),
        ProfileError::UserNotFound => HttpResponse::NotFound().json(body),
        ProfileError::UsernameTaken => HttpResponse::Conflict().json(body),
        ProfileError::BioTooLong => HttpResponse::BadRequest().json(body),
        ProfileError::Database(_) | ProfileError::Pool(_) => {
            log::error!("Profile operation failed: {}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub(crate) fn upload_error_response(err: UploadError) -> HttpResponse {
    let body = json!({ "error": err.to_string() });
    match err {
        UploadError::UnsupportedExtension
        | UploadError::InvalidUtf8
        | UploadError::Multipart(_) => HttpResponse::BadRequest().json(body),
        UploadError::TooLarge(_) => HttpResponse::PayloadTooLarge().json(body),
        UploadError::Io(_) | UploadError::Blocking(_) => {
            log::error!("Upload failed: {}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}
