//! Profile creation driven through the router with a fake object storage.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use cinema_core::accounts::store::AccountStore;
use cinema_core::auth::jwt::UserClaims;
use cinema_core::models::accounts::UserGroup;
use image::ImageFormat;

use common::{MultipartBody, TestApp, image_bytes, spawn_app};

fn profile_uri(user_id: i64) -> String {
    format!("/api/v1/profiles/users/{user_id}/profile/")
}

fn valid_form() -> MultipartBody {
    MultipartBody::new()
        .text("first_name", "John")
        .text("last_name", "Doe")
        .text("gender", "man")
        .text("date_of_birth", "1990-01-01")
        .text("info", "Fan of classic cinema.")
        .file("avatar", "avatar.jpg", "image/jpeg", &image_bytes(ImageFormat::Jpeg))
}

async fn active_user_with_token(app: &TestApp, email: &str, group: UserGroup) -> (i64, String) {
    let user = app.create_user(email, true, group).await;
    let (access, _) = app.login(email).await;
    (user.id, access)
}

#[tokio::test]
async fn owner_creates_profile_with_avatar() {
    let app = spawn_app();
    let (user_id, access) =
        active_user_with_token(&app, "owner@example.com", UserGroup::User).await;

    let (status, body) = app
        .send(valid_form().into_request(&profile_uri(user_id), Some(&access)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user_id"], user_id);
    assert_eq!(body["first_name"], "john");
    assert_eq!(body["last_name"], "doe");
    assert_eq!(body["gender"], "man");
    assert_eq!(body["date_of_birth"], "1990-01-01");
    assert_eq!(body["info"], "Fan of classic cinema.");

    let key = format!("avatars/{user_id}_avatar.jpg");
    assert_eq!(
        body["avatar"],
        format!("http://fake-s3.local/test-bucket/{key}")
    );
    assert!(app.storage.get(&key).is_some());

    let stored = app.store.find_profile_by_user(user_id).await.unwrap().unwrap();
    assert_eq!(stored.avatar, key);
}

#[tokio::test]
async fn second_profile_is_rejected() {
    let app = spawn_app();
    let (user_id, access) =
        active_user_with_token(&app, "twice@example.com", UserGroup::User).await;

    let (status, _) = app
        .send(valid_form().into_request(&profile_uri(user_id), Some(&access)))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .send(valid_form().into_request(&profile_uri(user_id), Some(&access)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already has a profile.");
}

#[tokio::test]
async fn bearer_token_is_required() {
    let app = spawn_app();
    let (user_id, _) = active_user_with_token(&app, "anon@example.com", UserGroup::User).await;

    let (status, body) = app
        .send(valid_form().into_request(&profile_uri(user_id), None))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Authorization header is missing");

    let req = Request::builder()
        .method("POST")
        .uri(profile_uri(user_id))
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body["message"],
        "Invalid Authorization header format. Expected 'Bearer <token>'"
    );

    let (status, body) = app
        .send(valid_form().into_request(&profile_uri(user_id), Some("not-a-jwt")))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token.");

    let expired = app
        .state
        .jwt
        .create_access_token(&UserClaims { user_id }, Some(Duration::seconds(-30)))
        .unwrap();
    let (status, body) = app
        .send(valid_form().into_request(&profile_uri(user_id), Some(&expired)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has expired.");
}

#[tokio::test]
async fn regular_user_cannot_edit_others() {
    let app = spawn_app();
    let (_, access) = active_user_with_token(&app, "nosy@example.com", UserGroup::User).await;
    let target = app
        .create_user("target@example.com", true, UserGroup::User)
        .await;

    let (status, body) = app
        .send(valid_form().into_request(&profile_uri(target.id), Some(&access)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        body["message"],
        "You don't have permission to edit this profile."
    );
}

#[tokio::test]
async fn moderator_creates_profile_for_another_user() {
    let app = spawn_app();
    let (_, access) =
        active_user_with_token(&app, "mod@example.com", UserGroup::Moderator).await;
    let target = app
        .create_user("member@example.com", true, UserGroup::User)
        .await;

    let (status, body) = app
        .send(valid_form().into_request(&profile_uri(target.id), Some(&access)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user_id"], target.id);
}

#[tokio::test]
async fn inactive_or_missing_target_is_unauthorized() {
    let app = spawn_app();
    let (_, access) = active_user_with_token(&app, "admin@example.com", UserGroup::Admin).await;
    let inactive = app
        .create_user("sleepy@example.com", false, UserGroup::User)
        .await;

    for user_id in [inactive.id, 9_999] {
        let (status, body) = app
            .send(valid_form().into_request(&profile_uri(user_id), Some(&access)))
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "User not found or not active.");
    }
}

#[tokio::test]
async fn invalid_fields_are_unprocessable() {
    let app = spawn_app();
    let (user_id, access) =
        active_user_with_token(&app, "form@example.com", UserGroup::User).await;
    let uri = profile_uri(user_id);

    let cases = [
        (
            MultipartBody::new()
                .text("first_name", "John1")
                .text("last_name", "Doe")
                .text("gender", "man")
                .text("date_of_birth", "1990-01-01")
                .text("info", "Bio")
                .file("avatar", "a.png", "image/png", &image_bytes(ImageFormat::Png)),
            "John1 contains non-english letters",
        ),
        (
            MultipartBody::new()
                .text("first_name", "John")
                .text("last_name", "Doe")
                .text("gender", "robot")
                .text("date_of_birth", "1990-01-01")
                .text("info", "Bio")
                .file("avatar", "a.png", "image/png", &image_bytes(ImageFormat::Png)),
            "Gender must be one of: man, woman",
        ),
        (
            MultipartBody::new()
                .text("first_name", "John")
                .text("last_name", "Doe")
                .text("gender", "man")
                .text("date_of_birth", "1800-01-01")
                .text("info", "Bio")
                .file("avatar", "a.png", "image/png", &image_bytes(ImageFormat::Png)),
            "Invalid birth date - year must be greater than 1900.",
        ),
        (
            MultipartBody::new()
                .text("first_name", "John")
                .text("last_name", "Doe")
                .text("gender", "man")
                .text("date_of_birth", "1990-01-01")
                .text("info", "   ")
                .file("avatar", "a.png", "image/png", &image_bytes(ImageFormat::Png)),
            "Info field cannot be empty or contain only spaces.",
        ),
        (
            MultipartBody::new()
                .text("first_name", "John")
                .text("last_name", "Doe")
                .text("gender", "man")
                .text("date_of_birth", "1990-01-01")
                .text("info", "Bio")
                .file("avatar", "a.txt", "text/plain", b"definitely not an image"),
            "Invalid image format",
        ),
        (
            MultipartBody::new()
                .text("first_name", "John")
                .text("last_name", "Doe")
                .text("gender", "man")
                .text("date_of_birth", "1990-01-01")
                .text("info", "Bio")
                .file("avatar", "big.png", "image/png", &vec![0u8; 1024 * 1024 + 1]),
            "Image size exceeds 1 MB",
        ),
    ];

    for (form, message) in cases {
        let (status, body) = app.send(form.into_request(&uri, Some(&access))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{message}");
        assert_eq!(body["message"], message);
    }
    assert_eq!(app.storage.len(), 0);
}

#[tokio::test]
async fn avatar_file_name_is_sanitized() {
    let app = spawn_app();
    let (user_id, access) =
        active_user_with_token(&app, "names@example.com", UserGroup::User).await;

    let form = MultipartBody::new()
        .text("first_name", "John")
        .text("last_name", "Doe")
        .text("gender", "man")
        .text("date_of_birth", "1990-01-01")
        .text("info", "Bio")
        .file(
            "avatar",
            "my photo?#1.png",
            "image/png",
            &image_bytes(ImageFormat::Png),
        );
    let (status, body) = app
        .send(form.into_request(&profile_uri(user_id), Some(&access)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let key = format!("avatars/{user_id}_my_photo__1.png");
    assert!(app.storage.get(&key).is_some());
    assert_eq!(
        body["avatar"],
        format!("http://fake-s3.local/test-bucket/{key}")
    );
}

#[tokio::test]
async fn avatar_over_body_limit_reports_image_size() {
    let app = spawn_app();
    let (user_id, access) =
        active_user_with_token(&app, "huge@example.com", UserGroup::User).await;

    let form = MultipartBody::new()
        .text("first_name", "John")
        .text("last_name", "Doe")
        .text("gender", "man")
        .text("date_of_birth", "1990-01-01")
        .text("info", "Bio")
        .file("avatar", "huge.png", "image/png", &vec![0u8; 3 * 1024 * 1024]);
    let (status, body) = app
        .send(form.into_request(&profile_uri(user_id), Some(&access)))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "Image size exceeds 1 MB");
    assert_eq!(app.storage.len(), 0);
}

#[tokio::test]
async fn upload_failure_is_server_error() {
    let app = spawn_app();
    let (user_id, access) =
        active_user_with_token(&app, "upload@example.com", UserGroup::User).await;
    app.storage.set_fail(true);

    let (status, body) = app
        .send(valid_form().into_request(&profile_uri(user_id), Some(&access)))
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body["message"],
        "Failed to upload avatar. Please try again later."
    );
    assert!(
        app.store
            .find_profile_by_user(user_id)
            .await
            .unwrap()
            .is_none()
    );
}
