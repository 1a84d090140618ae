//! Profile creation with avatar upload.

use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use chrono::{NaiveDate, Utc};
use cinema_core::accounts::store::StoreError;
use cinema_core::auth::jwt::{Claims, UserClaims};
use cinema_core::models::profiles::{Gender, NewProfile};
use cinema_core::validation::{
    AVATAR_TOO_LARGE, MAX_AVATAR_BYTES, validate_avatar, validate_birth_date, validate_gender,
    validate_info, validate_name,
};
use tracing::{error, info};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::ProfileResponse;

const PROFILE_EXISTS_MESSAGE: &str = "User already has a profile.";

/// Request body limit for profile forms: the largest avatar plus the text fields.
pub const PROFILE_BODY_LIMIT: usize = MAX_AVATAR_BYTES + 64 * 1024;

/// Validated multipart profile form.
#[derive(Debug, Clone)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub info: String,
    pub avatar_name: String,
    pub avatar: Vec<u8>,
}

#[derive(Default)]
struct RawForm {
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    date_of_birth: Option<String>,
    info: Option<String>,
    avatar: Option<(String, Vec<u8>)>,
}

/// Bodies cut off by [`PROFILE_BODY_LIMIT`] can only be oversized avatars.
fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::Validation(AVATAR_TOO_LARGE.into())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Last path segment of a client file name, limited to `[A-Za-z0-9._-]`.
fn avatar_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "avatar".to_string()
    } else {
        cleaned.to_string()
    }
}

fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("Field required: {field}")))
}

impl ProfileForm {
    /// Read and validate the multipart fields.
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut raw = RawForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(multipart_error)?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "avatar" {
                let file_name = field.file_name().unwrap_or("avatar").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(multipart_error)?;
                raw.avatar = Some((file_name, bytes.to_vec()));
                continue;
            }

            let text = field
                .text()
                .await
                .map_err(multipart_error)?;
            match name.as_str() {
                "first_name" => raw.first_name = Some(text),
                "last_name" => raw.last_name = Some(text),
                "gender" => raw.gender = Some(text),
                "date_of_birth" => raw.date_of_birth = Some(text),
                "info" => raw.info = Some(text),
                _ => {}
            }
        }
        Self::validate(raw, Utc::now().date_naive())
    }

    fn validate(raw: RawForm, today: NaiveDate) -> AppResult<Self> {
        let first_name =
            validate_name(&required(raw.first_name, "first_name")?).map_err(AppError::Validation)?;
        let last_name =
            validate_name(&required(raw.last_name, "last_name")?).map_err(AppError::Validation)?;
        let gender =
            validate_gender(&required(raw.gender, "gender")?).map_err(AppError::Validation)?;

        let date_of_birth = required(raw.date_of_birth, "date_of_birth")?;
        let date_of_birth = NaiveDate::parse_from_str(date_of_birth.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::Validation(format!("Invalid date: {date_of_birth}")))?;
        validate_birth_date(date_of_birth, today).map_err(AppError::Validation)?;

        let info = validate_info(&required(raw.info, "info")?).map_err(AppError::Validation)?;

        let (avatar_name, avatar) = required(raw.avatar, "avatar")?;
        validate_avatar(&avatar).map_err(AppError::Validation)?;

        Ok(Self {
            first_name,
            last_name,
            gender,
            date_of_birth,
            info,
            avatar_name: avatar_file_name(&avatar_name),
            avatar,
        })
    }
}

/// Create the profile of `user_id` on behalf of the token holder.
///
/// Only the owner or staff may create a profile; the target must be an
/// active user without one.
pub async fn create_profile(
    state: &AppState,
    caller: &Claims<UserClaims>,
    user_id: i64,
    form: ProfileForm,
) -> AppResult<ProfileResponse> {
    let caller_id = caller.data.user_id;
    if caller_id != user_id {
        let is_staff = state
            .users
            .find_by_id(caller_id)
            .await?
            .is_some_and(|u| u.group.is_staff());
        if !is_staff {
            return Err(AppError::Forbidden(
                "You don't have permission to edit this profile.".into(),
            ));
        }
    }

    let user = match state.users.find_by_id(user_id).await? {
        Some(user) if user.is_active => user,
        _ => {
            return Err(AppError::Unauthorized(
                "User not found or not active.".into(),
            ));
        }
    };

    if state
        .store
        .find_profile_by_user(user.id)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .is_some()
    {
        return Err(AppError::BadRequest(PROFILE_EXISTS_MESSAGE.into()));
    }

    let avatar_key = format!("avatars/{}_{}", user.id, form.avatar_name);
    state
        .storage
        .upload_file(&avatar_key, form.avatar)
        .await
        .map_err(|e| {
            error!(user_id = user.id, error = %e, "Avatar upload failed");
            AppError::ServerError("Failed to upload avatar. Please try again later.".into())
        })?;

    let profile = state
        .store
        .create_profile(NewProfile {
            user_id: user.id,
            first_name: form.first_name,
            last_name: form.last_name,
            gender: form.gender,
            date_of_birth: form.date_of_birth,
            info: form.info,
            avatar: avatar_key,
        })
        .await
        .map_err(|e| match e {
            StoreError::Duplicate(_) => AppError::BadRequest(PROFILE_EXISTS_MESSAGE.into()),
            other => AppError::Internal(other.to_string()),
        })?;

    info!(user_id = user.id, caller_id, "Created profile");
    Ok(ProfileResponse {
        id: profile.id,
        user_id: profile.user_id,
        avatar: state.storage.get_file_url(&profile.avatar),
        first_name: profile.first_name,
        last_name: profile.last_name,
        gender: profile.gender,
        date_of_birth: profile.date_of_birth,
        info: profile.info,
    })
}
