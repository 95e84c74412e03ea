//! Business logic that sits between routes and repositories.

pub mod auth;
pub mod email;
pub mod sweep;
pub mod uploads;
