use crate::helper::feed_helpers;
use crate::middleware::AuthenticatedAccount;
use crate::routes::feed_error_response;
use crate::DbPool;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct CommentPayload {
    content: Option<String>,
}

pub fn config_comments(cfg: &mut web::ServiceConfig) {
    cfg.route("/posts/{post_id}/comments", web::post().to(add_comment))
        .route("/posts/{post_id}/comments", web::get().to(list_comments))
        .route("/comments/{comment_id}", web::delete().to(delete_comment));
}

async fn add_comment(
    account: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
    payload: web::Json<CommentPayload>,
) -> impl Responder {
    let post_id = path.into_inner();
    let content = payload.into_inner().content.unwrap_or_default();

    match feed_helpers::add_comment(&pool, &account.0, post_id, &content) {
        Ok(comment_id) => HttpResponse::Created().json(json!({
            "message": "Comment added",
            "comment": {
                "id": comment_id,
                "content": content,
                "user": account.0.username,
                "user_id": account.0.id,
            }
        })),
        Err(err) => feed_error_response(err),
    }
}

async fn list_comments(pool: web::Data<DbPool>, path: web::Path<i64>) -> impl Responder {
    let post_id = path.into_inner();
    match feed_helpers::list_comments(&pool, post_id) {
        Ok(comments) => HttpResponse::Ok().json(comments),
        Err(err) => feed_error_response(err),
    }
}

async fn delete_comment(
    account: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> impl Responder {
    let comment_id = path.into_inner();
    match feed_helpers::delete_comment(&pool, &account.0, comment_id) {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Comment deleted" })),
        Err(err) => feed_error_response(err),
    }
}
