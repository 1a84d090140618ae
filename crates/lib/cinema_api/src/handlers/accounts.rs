//! Account request handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::AppState;
use crate::error::AppResult;
use crate::models::{
    ActivationRequest, LoginRequest, LoginResponse, LogoutRequest, MessageResponse,
    PasswordResetCompleteRequest, PasswordResetRequest, RefreshRequest, RefreshResponse,
    RegisterRequest, RegisterResponse,
};
use crate::services::accounts;

/// `POST /accounts/register/`: create an inactive account.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    let resp = accounts::register(&state, &body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `POST /accounts/activate/`: redeem an activation token.
pub async fn activate_handler(
    State(state): State<AppState>,
    Json(body): Json<ActivationRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = accounts::activate(&state, &body.email, &body.token).await?;
    Ok(Json(resp))
}

/// `POST /accounts/password-reset/request/`
pub async fn password_reset_request_handler(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = accounts::request_password_reset(&state, &body.email).await?;
    Ok(Json(resp))
}

/// `POST /accounts/reset-password/complete/`
pub async fn password_reset_complete_handler(
    State(state): State<AppState>,
    Json(body): Json<PasswordResetCompleteRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp =
        accounts::reset_password(&state, &body.email, &body.token, &body.password).await?;
    Ok(Json(resp))
}

/// `POST /accounts/login/`: authenticate with email + password.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<LoginResponse>)> {
    let resp = accounts::login(&state, &body.email, &body.password).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

/// `POST /accounts/refresh/`: exchange a refresh token for a new access token.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> AppResult<Json<RefreshResponse>> {
    let resp = accounts::refresh(&state, &body.refresh_token).await?;
    Ok(Json(resp))
}

/// `POST /accounts/logout/`: revoke a refresh token.
pub async fn logout_handler(
    State(state): State<AppState>,
    Json(body): Json<LogoutRequest>,
) -> AppResult<Json<MessageResponse>> {
    let resp = accounts::logout(&state, &body.refresh_token).await?;
    Ok(Json(resp))
}
