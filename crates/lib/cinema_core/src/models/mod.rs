//! Domain models shared by storage and services.

pub mod accounts;
pub mod movies;
pub mod profiles;
