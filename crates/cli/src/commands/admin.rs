//! Admin account management.
//!
//! Admins cannot self-register through the API; this is the only way to
//! create one.
//!
//! # Usage
//!
//! ```bash
//! sk-cli admin create -e admin@example.com -u admin -p 'a-long-password'
//! ```

use selempangku_api::db::UserRepository;
use selempangku_api::db::users::NewUser;
use selempangku_api::services::auth::AuthError;
use selempangku_api::services::auth::password::{hash_password, validate_new_password};
use selempangku_core::{Email, Role, UserId};

use super::{CliError, connect};

/// Create a new admin account.
///
/// # Errors
///
/// Returns an error if the email or password is invalid, the email or
/// username is taken, or the database is unreachable.
pub async fn create_user(email: &str, username: &str, password: &str) -> Result<UserId, CliError> {
    let email = Email::parse(email).map_err(AuthError::from)?;
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::Validation("Username is required".to_owned()).into());
    }
    validate_new_password(password, password)?;
    let password_hash = hash_password(password)?;

    let pool = connect().await?;

    tracing::info!("Creating admin account: {} ({})", email, username);
    let user = UserRepository::new(&pool)
        .create(&NewUser {
            email: &email,
            username,
            password_hash: &password_hash,
            full_name: None,
            phone: None,
            role: Role::Admin,
        })
        .await?;

    tracing::info!(
        "Admin account created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id)
}
