//! Authentication service.
//!
//! Registration is two-phase: `register` stores a hashed OTP together with
//! the already-hashed password, and `verify_email` creates the account when
//! the code matches. Login issues a session token; admins log in through the
//! same credential check with a role requirement.

pub mod codes;
mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use token::{Session, TokenError, TokenService};

use chrono::{Duration, Utc};

use selempangku_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::db::verification::{PendingRegistration, VerificationRepository};
use crate::models::user::User;
use crate::services::email::reset_link;
use crate::state::AppState;

use codes::{OTP_TTL_MINUTES, RESET_TOKEN_TTL_MINUTES, generate_otp, generate_reset_token, hash_code};
use password::{hash_password, validate_new_password, verify_password};

/// Longest accepted username.
const MAX_USERNAME_LENGTH: usize = 50;

/// Fields submitted at registration.
#[derive(Debug, Clone)]
pub struct Registration<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
    pub full_name: Option<&'a str>,
    pub phone: Option<&'a str>,
}

/// Authentication service.
///
/// Borrows the shared state for the duration of one request.
pub struct AuthService<'a> {
    state: &'a AppState,
    users: UserRepository<'a>,
    codes: VerificationRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            state,
            users: UserRepository::new(state.pool()),
            codes: VerificationRepository::new(state.pool()),
        }
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Validate a registration, store it as pending and email the OTP.
    ///
    /// No account exists until [`Self::verify_email`] succeeds. Registering
    /// the same email again replaces the pending entry and its code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail`, `AuthError::Validation`,
    /// `AuthError::WeakPassword` or `AuthError::PasswordMismatch` for bad input,
    /// `AuthError::UserAlreadyExists` if the email or username is taken, and
    /// `AuthError::Email` if the code cannot be sent.
    #[tracing::instrument(skip_all, fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration<'_>) -> Result<Email, AuthError> {
        let email = Email::parse(registration.email)?;
        let username = validate_username(registration.username)?;
        validate_new_password(registration.password, registration.confirm_password)?;

        if self.users.email_exists(&email).await? {
            return Err(AuthError::UserAlreadyExists("Email"));
        }
        if self.users.username_exists(username).await? {
            return Err(AuthError::UserAlreadyExists("Username"));
        }

        let code = generate_otp();
        let pending = PendingRegistration {
            email: email.as_str().to_owned(),
            code_hash: hash_code(&code),
            username: username.to_owned(),
            password_hash: hash_password(registration.password)?,
            full_name: non_blank(registration.full_name),
            phone: non_blank(registration.phone),
            expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES),
        };
        self.codes.put_registration(&pending).await?;

        match self.state.email() {
            Some(mailer) => mailer.send_verification_code(email.as_str(), &code).await?,
            None if self.state.config().app_env.is_development() => {
                tracing::info!(code = %code, "Email delivery disabled; verification code logged");
            }
            None => tracing::warn!("Email delivery disabled; verification code not sent"),
        }

        tracing::info!("Registration pending email verification");
        Ok(email)
    }

    /// Create the account if the OTP matches and has not expired.
    ///
    /// A wrong, missing and expired code all produce the same error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidOrExpiredOtp` if the code does not verify
    /// and `AuthError::UserAlreadyExists` if the email or username was taken
    /// in the meantime.
    #[tracing::instrument(skip_all, fields(email = %email))]
    pub async fn verify_email(&self, email: &str, otp: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidOrExpiredOtp)?;
        let pending = self
            .codes
            .take_registration(&email, &hash_code(otp))
            .await?
            .ok_or(AuthError::InvalidOrExpiredOtp)?;

        let user = self
            .users
            .create(&NewUser {
                email: &email,
                username: &pending.username,
                password_hash: &pending.password_hash,
                full_name: pending.full_name.as_deref(),
                phone: pending.phone.as_deref(),
                role: Role::Customer,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists("Email or username"),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Account created");
        Ok(user)
    }

    // =========================================================================
    // Login
    // =========================================================================

    /// Check credentials and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password, without saying which.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, User), AuthError> {
        self.login_with_role(email, password, |_| true).await
    }

    /// Like [`Self::login`], but only admin accounts succeed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a non-admin account, exactly
    /// as for a wrong password.
    pub async fn admin_login(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(String, User), AuthError> {
        self.login_with_role(email, password, Role::is_admin).await
    }

    #[tracing::instrument(skip(self, password, allowed), fields(email = %email))]
    async fn login_with_role(
        &self,
        email: &str,
        password: &str,
        allowed: fn(Role) -> bool,
    ) -> Result<(String, User), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let (user, password_hash) = self
            .users
            .get_credentials(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;
        if !allowed(user.role) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.state.tokens().issue(user.id, user.role)?;
        tracing::info!(user_id = %user.id, role = %user.role, "Login successful");
        Ok((token, user))
    }

    // =========================================================================
    // Password recovery
    // =========================================================================

    /// Email a password reset link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account uses the email and
    /// `AuthError::Email` if the link cannot be sent.
    #[tracing::instrument(skip_all, fields(email = %email))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        if !self.users.email_exists(&email).await? {
            return Err(AuthError::UserNotFound);
        }

        let token = generate_reset_token();
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
        self.codes
            .put_reset_token(&email, &hash_code(&token), expires_at)
            .await?;

        let link = reset_link(&self.state.config().frontend_url, email.as_str(), &token);
        match self.state.email() {
            Some(mailer) => mailer.send_password_reset(email.as_str(), &link).await?,
            None if self.state.config().app_env.is_development() => {
                tracing::info!(link = %link, "Email delivery disabled; reset link logged");
            }
            None => tracing::warn!("Email delivery disabled; reset link not sent"),
        }
        Ok(())
    }

    /// Set a new password using a reset token. The token is consumed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` or `AuthError::PasswordMismatch` for a
    /// bad new password and `AuthError::InvalidOrExpiredToken` if the token
    /// does not verify.
    #[tracing::instrument(skip_all, fields(email = %email))]
    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(new_password, confirm_password)?;
        let email = Email::parse(email).map_err(|_| AuthError::InvalidOrExpiredToken)?;

        if !self.codes.take_reset_token(&email, &hash_code(token)).await? {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let password_hash = hash_password(new_password)?;
        self.users
            .update_password_by_email(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::InvalidOrExpiredToken,
                other => AuthError::Repository(other),
            })?;

        tracing::info!("Password reset");
        Ok(())
    }

    // =========================================================================
    // Signed-in user
    // =========================================================================

    /// Change the password of a signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongCurrentPassword` if `current` does not verify.
    #[tracing::instrument(skip(self, current, new_password, confirm_password))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        current: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        validate_new_password(new_password, confirm_password)?;

        let stored = self.users.get_password_hash(user_id).await.map_err(|e| match e {
            RepositoryError::NotFound => AuthError::UserNotFound,
            other => AuthError::Repository(other),
        })?;
        verify_password(current, &stored).map_err(|e| match e {
            AuthError::InvalidCredentials => AuthError::WrongCurrentPassword,
            other => other,
        })?;

        let password_hash = hash_password(new_password)?;
        self.users.update_password(user_id, &password_hash).await?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// The profile of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn current_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Trim a username and check its shape.
fn validate_username(username: &str) -> Result<&str, AuthError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AuthError::Validation("Username is required".to_owned()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::Validation(format!(
            "Username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    if username.chars().any(char::is_whitespace) {
        return Err(AuthError::Validation(
            "Username cannot contain spaces".to_owned(),
        ));
    }
    Ok(username)
}

/// Treat blank optional fields as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
