use crate::helper::feed_helpers::{self, LikeOutcome};
use crate::middleware::AuthenticatedAccount;
use crate::routes::feed_error_response;
use crate::DbPool;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub fn config_likes(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts/{post_id}/like", web::post().to(toggle_like))
        .route("/posts/{post_id}/likes", web::get().to(like_count));
}

async fn toggle_like(
    account: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> impl Responder {
    let post_id = path.into_inner();
    match feed_helpers::toggle_like(&pool, &account.0, post_id) {
        Ok(LikeOutcome::Liked) => {
            HttpResponse::Created().json(json!({ "message": "Post liked" }))
        }
        Ok(LikeOutcome::Unliked) => HttpResponse::Ok().json(json!({ "message": "Post unliked" })),
        Err(err) => feed_error_response(err),
    }
}

async fn like_count(pool: web::Data<DbPool>, path: web::Path<i64>) -> impl Responder {
    let post_id = path.into_inner();
    match feed_helpers::like_count(&pool, post_id) {
        Ok(likes) => HttpResponse::Ok().json(json!({ "post_id": post_id, "likes": likes })),
        Err(err) => feed_error_response(err),
    }
}
