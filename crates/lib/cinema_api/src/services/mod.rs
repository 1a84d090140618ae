//! Request workflows behind the handlers.

pub mod accounts;
pub mod movies;
pub mod profiles;
