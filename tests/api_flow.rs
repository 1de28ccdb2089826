use actix_session::{storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::Key;
use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use chronicle_backend::config::{Config, WebConfig};
use chronicle_backend::setup::db_setup;
use chronicle_backend::{routes, DbPool};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use serde_json::{json, Value};
use std::path::PathBuf;
use uuid::Uuid;

const BOUNDARY: &str = "ChronicleTestBoundary";

fn test_pool() -> web::Data<DbPool> {
    let manager = SqliteConnectionManager::memory()
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));
    let pool = Pool::builder().max_size(1).build(manager).unwrap();
    {
        let mut conn = pool.get().unwrap();
        db_setup::setup_feed_db(&mut conn).unwrap();
    }
    web::Data::new(pool)
}

fn test_config(media_path: &PathBuf) -> web::Data<Config> {
    web::Data::new(Config {
        web: WebConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database_path: "/tmp".to_string(),
        media_path: media_path.to_string_lossy().into_owned(),
        allowed_origins: String::new(),
        log_level: "warn".to_string(),
        session_secret_key: "0".repeat(128),
        use_secure_cookies: false,
        max_upload_size_mb: 4,
    })
}

macro_rules! init_app {
    ($pool:expr, $config:expr) => {
        test::init_service(
            App::new()
                .app_data($config.clone())
                .app_data($pool.clone())
                .service(
                    web::scope("")
                        .wrap(SessionMiddleware::builder(
                            CookieSessionStore::default(),
                            Key::from(&[0u8; 64]),
                        )
                        .cookie_secure(false)
                        .build())
                        .configure(routes::auth::config_auth)
                        .configure(routes::posts::config_posts)
                        .configure(routes::comments::config_comments)
                        .configure(routes::likes::config_likes)
                        .configure(routes::users::config_users),
                ),
        )
        .await
    };
}

fn multipart_body(text_fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in text_fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn multipart_content_type() -> (&'static str, String) {
    ("content-type", format!("multipart/form-data; boundary={}", BOUNDARY))
}

macro_rules! register_and_login {
    ($app:expr, $username:expr, $email:expr) => {{
        let res = test::call_service(
            $app,
            test::TestRequest::post()
                .uri("/register")
                .set_json(json!({ "username": $username, "email": $email, "password": "password1" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = test::call_service(
            $app,
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "email": $email, "password": "password1" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);

        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .expect("login sets a session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }};
}

#[actix_web::test]
async fn registration_rules_are_enforced() {
    let pool = test_pool();
    let media_path = std::env::temp_dir().join(format!("chronicle_test_{}", Uuid::new_v4()));
    let config = test_config(&media_path);
    let app = init_app!(pool, config);

    // Short password: no account is created.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_json(json!({ "username": "alice", "email": "a@x.com", "password": "short" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Missing fields.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_json(json!({ "username": "alice" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Valid registration, then duplicates in either unique field conflict.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_json(json!({ "username": "alice", "email": "A@X.com", "password": "password1" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_json(json!({ "username": "alice2", "email": "a@x.COM", "password": "password1" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/register")
            .set_json(json!({ "username": "alice", "email": "new@x.com", "password": "password1" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // Bad credentials stay out.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/login")
            .set_json(json!({ "email": "a@x.com", "password": "password2" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn session_flow_covers_posts_likes_and_comments() {
    let pool = test_pool();
    let media_path = std::env::temp_dir().join(format!("chronicle_test_{}", Uuid::new_v4()));
    let config = test_config(&media_path);
    let app = init_app!(pool, config);

    // The feed requires authentication.
    let res = test::call_service(&app, test::TestRequest::get().uri("/posts").to_request()).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let cookie = register_and_login!(&app, "alice", "A@X.com");

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth-status")
            .insert_header(("cookie", cookie.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["logged_in"], json!(true));
    assert_eq!(body["user"]["username"], json!("alice"));
    assert_eq!(body["user"]["email"], json!("a@x.com"));

    // Content-only post.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts")
            .insert_header(("cookie", cookie.clone()))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(&[("content", "hi")], None))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    let post_id = body["post"]["id"].as_i64().unwrap();
    assert_eq!(body["post"]["content"], json!("hi"));
    assert_eq!(body["post"]["media"], Value::Null);
    assert_eq!(body["post"]["likes"], json!(0));

    // An immediate second post is rate limited with a positive remainder.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts")
            .insert_header(("cookie", cookie.clone()))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(&[("content", "again")], None))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = test::read_body_json(res).await;
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Please wait "));

    // An empty post is rejected outright.
    {
        let conn = pool.get().unwrap();
        conn.execute("UPDATE users SET last_post_time = NULL", []).unwrap();
    }
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts")
            .insert_header(("cookie", cookie.clone()))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(&[("title", ""), ("content", "")], None))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Like toggle pair: liked, then unliked, count back to zero.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/like", post_id))
            .insert_header(("cookie", cookie.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], json!("Post liked"));

    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/like", post_id))
            .insert_header(("cookie", cookie.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["message"], json!("Post unliked"));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/likes", post_id))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["likes"], json!(0));

    // Comments: add as a second account, listing is public.
    let bob_cookie = register_and_login!(&app, "bob", "b@x.com");
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri(&format!("/posts/{}/comments", post_id))
            .insert_header(("cookie", bob_cookie.clone()))
            .set_json(json!({ "content": "nice" }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    let comment_id = body["comment"]["id"].as_i64().unwrap();
    assert_eq!(body["comment"]["user"], json!("bob"));

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/comments", post_id))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Only the author may delete a comment.
    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/comments/{}", comment_id))
            .insert_header(("cookie", cookie.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // The feed shows the comment and author projections.
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/posts")
            .insert_header(("cookie", cookie.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    let feed = body.as_array().unwrap();
    assert_eq!(feed.len(), 1);
    assert_eq!(feed[0]["author"]["username"], json!("alice"));
    assert_eq!(feed[0]["comments"][0]["user"], json!("bob"));
    assert_eq!(feed[0]["liked_by_me"], json!(false));

    // A foreign account may not delete the post; the owner may, and the
    // cascade empties its comments.
    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/posts/{}", post_id))
            .insert_header(("cookie", bob_cookie.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = test::call_service(
        &app,
        test::TestRequest::delete()
            .uri(&format!("/posts/{}", post_id))
            .insert_header(("cookie", cookie.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/comments", post_id))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn uploads_and_profiles_round_trip() {
    let pool = test_pool();
    let media_path = std::env::temp_dir().join(format!("chronicle_test_{}", Uuid::new_v4()));
    let config = test_config(&media_path);
    let app = init_app!(pool, config);

    let cookie = register_and_login!(&app, "alice", "a@x.com");
    let bob_cookie = register_and_login!(&app, "bob", "b@x.com");

    // Image upload: classified, stored under a UUID key in the media dir.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts")
            .insert_header(("cookie", cookie.clone()))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(
                &[("title", "pic")],
                Some(("image", "holiday.PNG", b"not-really-a-png")),
            ))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["post"]["media_type"], json!("image"));
    let stored = body["post"]["media"].as_str().unwrap().to_string();
    assert!(stored.ends_with(".png"));
    assert_ne!(stored, "holiday.PNG");
    assert!(media_path.join(&stored).exists());

    // Unclassifiable extension is rejected, mkv included.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/posts")
            .insert_header(("cookie", bob_cookie.clone()))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(
                &[],
                Some(("video", "movie.mkv", b"bytes")),
            ))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Profile update is owner-only.
    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/users/1")
            .insert_header(("cookie", bob_cookie.clone()))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(&[("bio", "hijack")], None))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    // Bio over 50 characters is rejected; at 50 it sticks.
    let long_bio = "x".repeat(51);
    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/users/1")
            .insert_header(("cookie", cookie.clone()))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(&[("bio", &long_bio)], None))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let ok_bio = "y".repeat(50);
    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/users/1")
            .insert_header(("cookie", cookie.clone()))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(&[("bio", &ok_bio)], None))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    // Username collision with another account conflicts.
    let res = test::call_service(
        &app,
        test::TestRequest::put()
            .uri("/users/1")
            .insert_header(("cookie", cookie.clone()))
            .insert_header(multipart_content_type())
            .set_payload(multipart_body(&[("username", "bob")], None))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The profile projects the account's posts for the viewer.
    let res = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/users/1")
            .insert_header(("cookie", bob_cookie.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body["bio"], json!(ok_bio));
    assert_eq!(body["posts"].as_array().unwrap().len(), 1);
    assert_eq!(body["posts"][0]["media_type"], json!("image"));

    // The user listing is public.
    let res = test::call_service(&app, test::TestRequest::get().uri("/users").to_request()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = test::read_body_json(res).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    // Logout invalidates nothing server-side but clears the session cookie.
    let res = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/logout")
            .insert_header(("cookie", cookie.clone()))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let _ = std::fs::remove_dir_all(&media_path);
}
