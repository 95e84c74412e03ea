//! Short-lived verification codes: registration OTPs and password reset tokens.
//!
//! Rows are keyed by lower-cased email and hold only a SHA-256 hash of the
//! code. A row past `expires_at` is treated as absent by every read, whether
//! or not the sweep has deleted it yet.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use selempangku_core::Email;

use super::RepositoryError;

/// Wrong OTPs accepted for one pending registration before it is discarded.
pub const MAX_OTP_ATTEMPTS: i32 = 5;

/// A registration waiting for its OTP.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingRegistration {
    pub email: String,
    pub code_hash: String,
    pub username: String,
    /// Argon2 hash; the plaintext password is never stored.
    pub password_hash: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Rows removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepCounts {
    pub registrations: u64,
    pub reset_tokens: u64,
}

/// Repository for verification code storage.
pub struct VerificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> VerificationRepository<'a> {
    /// Create a new verification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a pending registration, replacing any earlier one for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn put_registration(
        &self,
        pending: &PendingRegistration,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO pending_registration
                 (email, code_hash, username, password_hash, full_name, phone, expires_at)
             VALUES (lower($1), $2, $3, $4, $5, $6, $7)
             ON CONFLICT (email) DO UPDATE SET
                 code_hash = EXCLUDED.code_hash,
                 username = EXCLUDED.username,
                 password_hash = EXCLUDED.password_hash,
                 full_name = EXCLUDED.full_name,
                 phone = EXCLUDED.phone,
                 expires_at = EXCLUDED.expires_at,
                 attempts = 0,
                 created_at = now()",
        )
        .bind(&pending.email)
        .bind(&pending.code_hash)
        .bind(&pending.username)
        .bind(&pending.password_hash)
        .bind(pending.full_name.as_deref())
        .bind(pending.phone.as_deref())
        .bind(pending.expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Consume a pending registration if the code matches and has not expired.
    ///
    /// An expired or missing entry returns `None` exactly like a wrong code.
    /// A wrong code counts against the entry, which is deleted after
    /// [`MAX_OTP_ATTEMPTS`] misses so the code cannot be guessed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn take_registration(
        &self,
        email: &Email,
        code_hash: &str,
    ) -> Result<Option<PendingRegistration>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let pending = sqlx::query_as::<_, PendingRegistration>(
            "DELETE FROM pending_registration
             WHERE email = lower($1) AND code_hash = $2 AND expires_at > now()
               AND attempts < $3
             RETURNING email, code_hash, username, password_hash, full_name, phone, expires_at",
        )
        .bind(email)
        .bind(code_hash)
        .bind(MAX_OTP_ATTEMPTS)
        .fetch_optional(&mut *tx)
        .await?;

        if pending.is_none() {
            let attempts: Option<i32> = sqlx::query_scalar(
                "UPDATE pending_registration SET attempts = attempts + 1
                 WHERE email = lower($1)
                 RETURNING attempts",
            )
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;

            if attempts.is_some_and(|n| n >= MAX_OTP_ATTEMPTS) {
                sqlx::query("DELETE FROM pending_registration WHERE email = lower($1)")
                    .bind(email)
                    .execute(&mut *tx)
                    .await?;
                tracing::warn!("Pending registration discarded after repeated wrong OTPs");
            }
        }

        tx.commit().await?;
        Ok(pending)
    }

    /// Store a reset token hash, replacing any earlier one for the email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the write fails.
    pub async fn put_reset_token(
        &self,
        email: &Email,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO password_reset_token (email, token_hash, expires_at)
             VALUES (lower($1), $2, $3)
             ON CONFLICT (email) DO UPDATE SET
                 token_hash = EXCLUDED.token_hash,
                 expires_at = EXCLUDED.expires_at,
                 created_at = now()",
        )
        .bind(email)
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Consume a reset token if it matches and has not expired.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn take_reset_token(
        &self,
        email: &Email,
        token_hash: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM password_reset_token
             WHERE email = lower($1) AND token_hash = $2 AND expires_at > now()",
        )
        .bind(email)
        .bind(token_hash)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every expired registration and reset token.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a delete fails.
    pub async fn purge_expired(&self) -> Result<SweepCounts, RepositoryError> {
        let registrations = sqlx::query("DELETE FROM pending_registration WHERE expires_at <= now()")
            .execute(self.pool)
            .await?
            .rows_affected();
        let reset_tokens = sqlx::query("DELETE FROM password_reset_token WHERE expires_at <= now()")
            .execute(self.pool)
            .await?
            .rows_affected();

        Ok(SweepCounts {
            registrations,
            reset_tokens,
        })
    }
}
