//! Route paths.

pub const POST_ACCOUNTS_REGISTER: &str = "/api/v1/accounts/register/";
pub const POST_ACCOUNTS_ACTIVATE: &str = "/api/v1/accounts/activate/";
pub const POST_ACCOUNTS_PASSWORD_RESET_REQUEST: &str = "/api/v1/accounts/password-reset/request/";
pub const POST_ACCOUNTS_RESET_PASSWORD_COMPLETE: &str = "/api/v1/accounts/reset-password/complete/";
pub const POST_ACCOUNTS_LOGIN: &str = "/api/v1/accounts/login/";
pub const POST_ACCOUNTS_REFRESH: &str = "/api/v1/accounts/refresh/";
pub const POST_ACCOUNTS_LOGOUT: &str = "/api/v1/accounts/logout/";
pub const POST_PROFILES_USER_PROFILE: &str = "/api/v1/profiles/users/{user_id}/profile/";
/// `GET` lists, `POST` creates.
pub const THEATER_MOVIES: &str = "/api/v1/theater/movies/";
/// `GET`, `PATCH` and `DELETE` one movie.
pub const THEATER_MOVIE: &str = "/api/v1/theater/movies/{movie_id}/";

/// Pagination links in movie list responses, relative to the API prefix.
pub const MOVIE_LIST_LINK: &str = "/theater/movies/";

/// Front-end pages linked from emails, relative to the app base URL.
pub mod links {
    pub const ACTIVATE: &str = "accounts/activate/";
    pub const LOGIN: &str = "accounts/login/";
    pub const PASSWORD_RESET_COMPLETE: &str = "accounts/password-reset-complete/";
}
