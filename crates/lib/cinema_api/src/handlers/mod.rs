//! Request handlers.

pub mod accounts;
pub mod movies;
pub mod profiles;
