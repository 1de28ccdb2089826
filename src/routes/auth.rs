use crate::helper::auth_helpers::{self, AuthError};
use crate::middleware::{self, AuthenticatedAccount};
use crate::DbPool;
use actix_session::Session;
use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
pub struct RegisterPayload {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    email: Option<String>,
    password: Option<String>,
}

pub fn config_auth(cfg: &mut web::ServiceConfig) {
    cfg.route("/register", web::post().to(register))
        .route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout))
        .route("/auth-status", web::get().to(auth_status));
}

async fn register(pool: web::Data<DbPool>, payload: web::Json<RegisterPayload>) -> impl Responder {
    let data = payload.into_inner();
    let username = data.username.unwrap_or_default();
    let email = data.email.unwrap_or_default();
    let password = data.password.unwrap_or_default();

    match auth_helpers::register_account(&pool, &username, &email, &password) {
        Ok(_) => HttpResponse::Created().json(json!({ "message": "Register successful" })),
        Err(err @ (AuthError::MissingFields | AuthError::PasswordTooShort)) => {
            HttpResponse::BadRequest().json(json!({ "error": err.to_string() }))
        }
        Err(err @ (AuthError::EmailTaken | AuthError::UsernameTaken)) => {
            HttpResponse::Conflict().json(json!({ "error": err.to_string() }))
        }
        Err(err) => {
            log::error!("Registration failed: {}", err);
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn login(
    session: Session,
    pool: web::Data<DbPool>,
    payload: web::Json<LoginPayload>,
) -> impl Responder {
    let data = payload.into_inner();
    let email = data.email.unwrap_or_default();
    let password = data.password.unwrap_or_default();

    match auth_helpers::verify_login(&pool, &email, &password) {
        Some(account) => {
            if let Err(err) = middleware::remember_identity(&session, &account) {
                log::error!("Failed to establish session: {}", err);
                return HttpResponse::InternalServerError().finish();
            }
            HttpResponse::Ok().json(json!({ "message": "Login successful" }))
        }
        None => HttpResponse::Unauthorized().json(json!({ "error": "მონაცემები არასწორია" })),
    }
}

async fn logout(_account: AuthenticatedAccount, session: Session) -> impl Responder {
    middleware::forget_identity(&session);
    HttpResponse::Ok().json(json!({ "message": "Logged out successfully" }))
}

async fn auth_status(session: Session, pool: web::Data<DbPool>) -> impl Responder {
    match middleware::resolve_identity(&session, &pool) {
        Some(account) => HttpResponse::Ok().json(json!({
            "logged_in": true,
            "user": {
                "id": account.id,
                "email": account.email,
                "username": account.username,
                "profile_image": account.profile_image,
                "role": account.role,
                "bio": account.bio,
            }
        })),
        None => HttpResponse::Ok().json(json!({ "logged_in": false })),
    }
}
