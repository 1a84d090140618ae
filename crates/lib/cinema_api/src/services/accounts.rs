//! Account workflows: register, activate, reset password, login, refresh.
//!
//! Sequences the core components and sends notification emails once the
//! corresponding state change is committed. Email failures are logged and
//! never fail the request.

use cinema_core::accounts::AccountError;
use cinema_core::models::accounts::RecoveryKind;
use cinema_core::validation::{normalize_email, validate_password_strength};
use tracing::{info, warn};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{LoginResponse, MessageResponse, RefreshResponse, RegisterResponse};
use crate::routes::links;

pub const ACTIVATED_MESSAGE: &str = "User account activated successfully.";
pub const RESET_REQUESTED_MESSAGE: &str =
    "If you are registered, you will receive an email with instructions.";
pub const RESET_COMPLETE_MESSAGE: &str = "Password reset successfully.";
pub const LOGGED_OUT_MESSAGE: &str = "Logged out successfully.";

const INVALID_ACTIVATION_MESSAGE: &str = "Invalid or expired activation token.";
const INVALID_RESET_MESSAGE: &str = "Invalid email or token.";

fn email(raw: &str) -> AppResult<String> {
    normalize_email(raw).map_err(AppError::Validation)
}

fn password(raw: &str) -> AppResult<()> {
    validate_password_strength(raw).map_err(AppError::Validation)
}

/// Replace persistence failures with a client-facing 500 message.
fn persistence_as(message: &'static str) -> impl Fn(AccountError) -> AppError {
    move |e| match e {
        AccountError::Persistence(detail) => {
            warn!(error = %detail, "{message}");
            AppError::ServerError(message.to_string())
        }
        other => other.into(),
    }
}

/// Create an inactive account and email its activation link.
pub async fn register(
    state: &AppState,
    raw_email: &str,
    raw_password: &str,
) -> AppResult<RegisterResponse> {
    let email = email(raw_email)?;
    password(raw_password)?;

    let (user, token) = state
        .users
        .register(&email, raw_password)
        .await
        .map_err(persistence_as("An error occurred during user creation."))?;

    let link = state.config.link(
        links::ACTIVATE,
        &[("email", user.email.as_str()), ("token", token.token.as_str())],
    );
    if let Err(e) = state.mailer.send_activation_email(&user.email, &link).await {
        warn!(user_id = user.id, error = %e, "Failed to send activation email");
    }

    Ok(RegisterResponse {
        id: user.id,
        email: user.email,
    })
}

pub async fn activate(state: &AppState, raw_email: &str, token: &str) -> AppResult<MessageResponse> {
    let email = email(raw_email)?;

    let user = state
        .recovery
        .redeem_activation(&email, token)
        .await
        .map_err(|e| match e {
            AccountError::InvalidOrExpired => AppError::BadRequest(INVALID_ACTIVATION_MESSAGE.into()),
            other => other.into(),
        })?;

    let link = state.config.link(links::LOGIN, &[]);
    if let Err(e) = state
        .mailer
        .send_activation_complete_email(&user.email, &link)
        .await
    {
        warn!(user_id = user.id, error = %e, "Failed to send activation complete email");
    }

    Ok(MessageResponse::new(ACTIVATED_MESSAGE))
}

/// Issue a password-reset token for active accounts.
///
/// The response is identical whether or not the email belongs to an active
/// account.
pub async fn request_password_reset(
    state: &AppState,
    raw_email: &str,
) -> AppResult<MessageResponse> {
    let email = email(raw_email)?;

    let user = match state.users.find_by_email(&email).await? {
        Some(user) if user.is_active => user,
        _ => {
            info!("Password reset requested for unknown or inactive account");
            return Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE));
        }
    };

    let token = state
        .recovery
        .issue(RecoveryKind::PasswordReset, user.id)
        .await?;

    let link = state.config.link(
        links::PASSWORD_RESET_COMPLETE,
        &[("email", user.email.as_str()), ("token", token.token.as_str())],
    );
    if let Err(e) = state
        .mailer
        .send_password_reset_email(&user.email, &link)
        .await
    {
        warn!(user_id = user.id, error = %e, "Failed to send password reset email");
    }

    Ok(MessageResponse::new(RESET_REQUESTED_MESSAGE))
}

pub async fn reset_password(
    state: &AppState,
    raw_email: &str,
    token: &str,
    raw_password: &str,
) -> AppResult<MessageResponse> {
    let email = email(raw_email)?;
    password(raw_password)?;

    let user = state
        .recovery
        .redeem_password_reset(&email, token, raw_password)
        .await
        .map_err(|e| match e {
            AccountError::InvalidOrExpired => AppError::BadRequest(INVALID_RESET_MESSAGE.into()),
            other => persistence_as("An error occurred while resetting the password.")(other),
        })?;

    let link = state.config.link(links::LOGIN, &[]);
    if let Err(e) = state
        .mailer
        .send_password_reset_complete_email(&user.email, &link)
        .await
    {
        warn!(user_id = user.id, error = %e, "Failed to send password reset complete email");
    }

    Ok(MessageResponse::new(RESET_COMPLETE_MESSAGE))
}

pub async fn login(state: &AppState, raw_email: &str, raw_password: &str) -> AppResult<LoginResponse> {
    let email = email(raw_email)?;

    let pair = state
        .sessions
        .login(&email, raw_password)
        .await
        .map_err(persistence_as("An error occurred while processing the request."))?;

    Ok(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "bearer".to_string(),
    })
}

pub async fn refresh(state: &AppState, refresh_token: &str) -> AppResult<RefreshResponse> {
    let access_token = state.sessions.refresh(refresh_token).await?;
    Ok(RefreshResponse { access_token })
}

/// Revoke a refresh token. Unknown tokens succeed.
pub async fn logout(state: &AppState, refresh_token: &str) -> AppResult<MessageResponse> {
    state.sessions.revoke(refresh_token).await?;
    Ok(MessageResponse::new(LOGGED_OUT_MESSAGE))
}
