use crate::config::Config;
use crate::helper::{policy_helpers, profile_helpers, upload_helpers};
use crate::middleware::AuthenticatedAccount;
use crate::models::FeedAction;
use crate::routes::{profile_error_response, upload_error_response};
use crate::DbPool;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

pub fn config_users(cfg: &mut web::ServiceConfig) {
    cfg.route("/users", web::get().to(list_users))
        .route("/users/{user_id}", web::get().to(get_profile))
        .route("/users/{user_id}", web::put().to(update_profile));
}

async fn list_users(pool: web::Data<DbPool>) -> impl Responder {
    match profile_helpers::fetch_all_users(&pool) {
        Ok(users) => HttpResponse::Ok().json(users),
        Err(err) => profile_error_response(err),
    }
}

async fn get_profile(
    account: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    path: web::Path<i64>,
) -> impl Responder {
    let user_id = path.into_inner();
    match profile_helpers::fetch_profile(&pool, &account.0, user_id) {
        Ok(profile) => HttpResponse::Ok().json(profile),
        Err(err) => profile_error_response(err),
    }
}

async fn update_profile(
    account: AuthenticatedAccount,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    path: web::Path<i64>,
    payload: Multipart,
) -> impl Responder {
    let user_id = path.into_inner();

    // Ownership is checked before the payload is read, so a foreign caller
    // never gets a file written on their behalf.
    if !policy_helpers::can(&account.0, FeedAction::UpdateProfile, user_id) {
        return HttpResponse::Forbidden().json(json!({ "error": "Unauthorized" }));
    }

    let form = match upload_helpers::read_profile_form(&config, payload).await {
        Ok(form) => form,
        Err(err) => return upload_error_response(err),
    };

    match profile_helpers::update_profile(&pool, &account.0, user_id, form) {
        Ok(()) => HttpResponse::Ok().json(json!({ "message": "Profile updated" })),
        Err(err) => profile_error_response(err),
    }
}
