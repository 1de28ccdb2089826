use crate::config::Config;
use crate::helper::{feed_helpers, upload_helpers};
use crate::middleware::AuthenticatedAccount;
use crate::routes::{feed_error_response, upload_error_response};
use crate::DbPool;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

pub fn config_posts(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts", web::get().to(list_posts))
        .route("/posts", web::post().to(create_post))
        .route("/posts/{post_id}", web::delete().to(delete_post));
}

async fn list_posts(account: AuthenticatedAccount, pool: web::Data<DbPool>) -> impl Responder {
    match feed_helpers::fetch_feed(&pool, &account.0) {
        Ok(views) => HttpResponse::Ok().json(views),
        Err(err) => feed_error_response(err),
    }
}

async fn create_post(
    account: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    payload: Multipart,
) -> impl Responder {
    // The cooldown is checked before the payload is read, so a rate-limited
    // caller never streams an upload to disk.
    if let Some(remaining) = feed_helpers::cooldown_remaining(&account.0, Utc::now()) {
        return feed_error_response(feed_helpers::FeedError::RateLimited(remaining));
    }

    let form = match upload_helpers::read_post_form(&config, payload).await {
        Ok(form) => form,
        Err(err) => return upload_error_response(err),
    };

    match feed_helpers::create_post(&pool, &account.0, form) {
        Ok(view) => HttpResponse::Created().json(json!({
            "message": "Post created",
            "post": view,
        })),
        Err(err) => feed_error_response(err),
    }
}

async fn delete_post(
    account: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();
    match feed_helpers::delete_post(&pool, &account.0, post_id) {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Post deleted" })),
        Err(err) => feed_error_response(err),
    }
}
