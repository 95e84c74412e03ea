//! Background purge of expired registration codes and reset tokens.

use std::time::Duration;

use sqlx::PgPool;
use tokio::task::JoinHandle;

use crate::db::RepositoryError;
use crate::db::verification::{SweepCounts, VerificationRepository};

/// Delete expired verification rows once.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a delete fails.
#[tracing::instrument(skip(pool))]
pub async fn sweep_expired(pool: &PgPool) -> Result<SweepCounts, RepositoryError> {
    let counts = VerificationRepository::new(pool).purge_expired().await?;
    if counts != SweepCounts::default() {
        tracing::info!(
            registrations = counts.registrations,
            reset_tokens = counts.reset_tokens,
            "Expired verification codes purged"
        );
    }
    Ok(counts)
}

/// Run [`sweep_expired`] every `interval` until the runtime shuts down.
///
/// Failures are logged and retried on the next tick.
#[must_use]
pub fn spawn_sweeper(pool: PgPool, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = sweep_expired(&pool).await {
                tracing::warn!(error = %e, "Verification code sweep failed");
            }
        }
    })
}
