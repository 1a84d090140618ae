//! Shared integration test harness: in-memory stores, recording mailer, fake storage.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use cinema_api::AppState;
use cinema_api::config::ApiConfig;
use cinema_core::accounts::memory::MemoryAccountStore;
use cinema_core::auth::jwt::JwtSettings;
use cinema_core::auth::password::hash_password;
use cinema_core::models::accounts::{NewUser, User, UserGroup};
use cinema_core::movies::memory::MemoryMovieStore;
use cinema_core::notifications::{EmailSender, NotificationError};
use cinema_core::storage::{FileStorage, StorageError};
use serde_json::Value;
use tower::ServiceExt;

pub const PASSWORD: &str = "StrongPass1!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Activation,
    ActivationComplete,
    PasswordReset,
    PasswordResetComplete,
}

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub kind: EmailKind,
    pub recipient: String,
    pub link: String,
}

/// Records every email instead of sending it.
#[derive(Default)]
pub struct StubEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    fail: AtomicBool,
}

impl StubEmailSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_of(&self, kind: EmailKind) -> Vec<SentEmail> {
        self.sent().into_iter().filter(|m| m.kind == kind).collect()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn record(&self, kind: EmailKind, recipient: &str, link: &str) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(SentEmail {
            kind,
            recipient: recipient.to_string(),
            link: link.to_string(),
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotificationError::Send {
                recipient: recipient.to_string(),
                reason: "smtp down".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl EmailSender for StubEmailSender {
    async fn send_activation_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError> {
        self.record(EmailKind::Activation, recipient, link)
    }

    async fn send_activation_complete_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError> {
        self.record(EmailKind::ActivationComplete, recipient, link)
    }

    async fn send_password_reset_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError> {
        self.record(EmailKind::PasswordReset, recipient, link)
    }

    async fn send_password_reset_complete_email(
        &self,
        recipient: &str,
        link: &str,
    ) -> Result<(), NotificationError> {
        self.record(EmailKind::PasswordResetComplete, recipient, link)
    }
}

/// Keeps uploaded files in memory.
#[derive(Default)]
pub struct FakeFileStorage {
    files: Mutex<HashMap<String, Vec<u8>>>,
    fail: AtomicBool,
}

impl FakeFileStorage {
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileStorage for FakeFileStorage {
    async fn upload_file(&self, file_name: &str, data: Vec<u8>) -> Result<(), StorageError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(StorageError::Upload("bucket unavailable".into()));
        }
        self.files
            .lock()
            .unwrap()
            .insert(file_name.to_string(), data);
        Ok(())
    }

    fn get_file_url(&self, file_name: &str) -> String {
        format!("http://fake-s3.local/test-bucket/{file_name}")
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryAccountStore>,
    pub movies: Arc<MemoryMovieStore>,
    pub mailer: Arc<StubEmailSender>,
    pub storage: Arc<FakeFileStorage>,
}

pub fn spawn_app() -> TestApp {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("cinema_api=debug,cinema_core=debug")
        .try_init();

    let store = Arc::new(MemoryAccountStore::new());
    let movies = Arc::new(MemoryMovieStore::new());
    let mailer = Arc::new(StubEmailSender::default());
    let storage = Arc::new(FakeFileStorage::default());

    let config = ApiConfig::local(JwtSettings::new(
        "test-access-secret",
        "test-refresh-secret",
    ));
    let state = AppState::new(
        config,
        store.clone(),
        movies.clone(),
        mailer.clone(),
        storage.clone(),
    )
    .expect("app state");

    TestApp {
        router: cinema_api::router(state.clone()),
        state,
        store,
        movies,
        mailer,
        storage,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let resp = self.router.clone().oneshot(req).await.expect("request");
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("read body");
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&body).into_owned())
            })
        };
        (status, json)
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send_json("POST", uri, body).await
    }

    pub async fn send_json(&self, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send_empty("GET", uri).await
    }

    pub async fn send_empty(&self, method: &str, uri: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    /// Insert a user directly, bypassing registration.
    pub async fn create_user(&self, email: &str, active: bool, group: UserGroup) -> User {
        self.store
            .insert_user(
                NewUser {
                    email: email.into(),
                    hashed_password: hash_password(PASSWORD).unwrap(),
                    group,
                },
                active,
            )
            .await
    }

    /// Log in and return `(access_token, refresh_token)`.
    pub async fn login(&self, email: &str) -> (String, String) {
        let (status, body) = self
            .post_json(
                "/api/v1/accounts/login/",
                serde_json::json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "login failed: {body}");
        (
            body["access_token"].as_str().unwrap().to_string(),
            body["refresh_token"].as_str().unwrap().to_string(),
        )
    }
}

/// Value of query parameter `name` in `link`.
pub fn query_param(link: &str, name: &str) -> Option<String> {
    url::Url::parse(link)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Encoded 2x2 image in `format`.
pub fn image_bytes(format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([30, 60, 90]));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// Minimal `multipart/form-data` body builder.
pub struct MultipartBody {
    boundary: String,
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self {
            boundary: "cinema-test-boundary".into(),
            body: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                self.boundary
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn into_request(mut self, uri: &str, bearer: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        let mut builder = Request::builder().method("POST").uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", self.boundary),
        );
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}
