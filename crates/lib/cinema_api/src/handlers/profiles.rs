//! Profile request handlers.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::ProfileResponse;
use crate::services::profiles::{self, ProfileForm};

/// `POST /profiles/users/{user_id}/profile/`: create a profile with avatar.
pub async fn create_profile_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(claims)): Extension<AuthenticatedUser>,
    Path(user_id): Path<i64>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ProfileResponse>)> {
    let form = ProfileForm::from_multipart(multipart).await?;
    let resp = profiles::create_profile(&state, &claims, user_id, form).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
