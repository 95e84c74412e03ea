//! User account model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use selempangku_core::{Email, Role, UserId};

/// A registered account, without its password hash.
///
/// This is the profile projection returned by `/auth/me`, `/profile`, the
/// login response and the admin member list.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: Email,
    pub username: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    /// Path under `/uploads`, e.g. `profil/<uuid>.png`.
    pub avatar: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields a user may change. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub gender: Option<String>,
    pub avatar: Option<String>,
}
