//! Input validation for account, profile and movie requests.
//!
//! Every validator returns the user-facing message as its error.

use std::io::Cursor;

use chrono::{Datelike, NaiveDate};
use image::{ImageFormat, ImageReader};
use lettre::Address;

use crate::models::profiles::Gender;

/// Maximum accepted avatar size in bytes.
pub const MAX_AVATAR_BYTES: usize = 1024 * 1024;

pub const AVATAR_TOO_LARGE: &str = "Image size exceeds 1 MB";

/// Minimum age for a profile owner.
pub const MIN_PROFILE_AGE_YEARS: i64 = 18;

/// Longest accepted movie name, in characters.
pub const MAX_MOVIE_NAME_CHARS: usize = 255;

/// Largest value a `NUMERIC(15, 2)` budget column holds.
pub const MAX_BUDGET: f64 = 9_999_999_999_999.99;

/// Longest accepted country code.
pub const MAX_COUNTRY_CODE_CHARS: usize = 3;

const PASSWORD_SPECIAL_CHARS: &[char] = &['@', '$', '!', '%', '*', '?', '&', '#'];

/// Parse an email address and lower-case its domain.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let address: Address = email
        .trim()
        .parse()
        .map_err(|e| format!("Invalid email address: {e}"))?;
    Ok(format!(
        "{}@{}",
        address.user(),
        address.domain().to_ascii_lowercase()
    ))
}

pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.chars().count() < 8 {
        return Err("Password must contain at least 8 characters.".into());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain at least one uppercase letter.".into());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain at least one lower letter.".into());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain at least one digit.".into());
    }
    if !password.contains(PASSWORD_SPECIAL_CHARS) {
        return Err(
            "Password must contain at least one special character: @, $, !, %, *, ?, #, &."
                .into(),
        );
    }
    Ok(())
}

/// Names are restricted to English letters and stored lower-cased.
pub fn validate_name(name: &str) -> Result<String, String> {
    if !name.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(format!("{name} contains non-english letters"));
    }
    Ok(name.to_ascii_lowercase())
}

pub fn validate_gender(gender: &str) -> Result<Gender, String> {
    gender.parse()
}

pub fn validate_birth_date(date_of_birth: NaiveDate, today: NaiveDate) -> Result<(), String> {
    if date_of_birth.year() < 1900 {
        return Err("Invalid birth date - year must be greater than 1900.".into());
    }
    let age = (today - date_of_birth).num_days() / 365;
    if age < MIN_PROFILE_AGE_YEARS {
        return Err("You must be at least 18 years old to register.".into());
    }
    Ok(())
}

/// Returns the trimmed text.
pub fn validate_info(info: &str) -> Result<String, String> {
    let trimmed = info.trim();
    if trimmed.is_empty() {
        return Err("Info field cannot be empty or contain only spaces.".into());
    }
    Ok(trimmed.to_string())
}

/// Accept JPEG or PNG images up to [`MAX_AVATAR_BYTES`].
pub fn validate_avatar(bytes: &[u8]) -> Result<ImageFormat, String> {
    if bytes.len() > MAX_AVATAR_BYTES {
        return Err(AVATAR_TOO_LARGE.into());
    }

    let format = image::guess_format(bytes).map_err(|_| "Invalid image format".to_string())?;
    if !matches!(format, ImageFormat::Jpeg | ImageFormat::Png) {
        let name = format!("{format:?}").to_uppercase();
        return Err(format!(
            "Unsupported image format: {name}. Use one of next: JPG, JPEG, PNG"
        ));
    }

    ImageReader::with_format(Cursor::new(bytes), format)
        .decode()
        .map_err(|_| "Invalid image format".to_string())?;
    Ok(format)
}

pub fn validate_movie_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("name must not be empty.".into());
    }
    if name.chars().count() > MAX_MOVIE_NAME_CHARS {
        return Err(format!(
            "name must be at most {MAX_MOVIE_NAME_CHARS} characters."
        ));
    }
    Ok(())
}

pub fn validate_score(score: f64) -> Result<(), String> {
    if !(0.0..=100.0).contains(&score) {
        return Err("score must be between 0 and 100.".into());
    }
    Ok(())
}

/// Budgets and revenues are non-negative; budgets also fit their column.
pub fn validate_amount(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{field} must be greater than or equal to 0."));
    }
    if field == "budget" && value > MAX_BUDGET {
        return Err(format!("budget must not exceed {MAX_BUDGET:.2}."));
    }
    Ok(())
}

/// Release dates may be at most one year ahead of `today`.
pub fn validate_release_date(date: NaiveDate, today: NaiveDate) -> Result<(), String> {
    let max_year = today.year() + 1;
    if date.year() > max_year {
        return Err(format!(
            "The year in 'date' cannot be greater than {max_year}."
        ));
    }
    Ok(())
}

/// Trimmed and upper-cased country code.
pub fn normalize_country_code(code: &str) -> Result<String, String> {
    let code = code.trim().to_uppercase();
    if code.is_empty() || code.chars().count() > MAX_COUNTRY_CODE_CHARS {
        return Err(format!(
            "country must be a code of 1 to {MAX_COUNTRY_CODE_CHARS} characters."
        ));
    }
    Ok(code)
}

/// Title-case every name, dropping repeats after normalization.
pub fn normalize_names(field: &str, names: &[String]) -> Result<Vec<String>, String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = title_case(name.trim());
        if name.is_empty() {
            return Err(format!("{field} must not contain empty names."));
        }
        if !out.contains(&name) {
            out.push(name);
        }
    }
    Ok(out)
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_word = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}
