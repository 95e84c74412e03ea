//! On-demand purge of expired verification codes.

use selempangku_api::services::sweep::sweep_expired;

use super::{CliError, connect};

/// Delete expired pending registrations and reset tokens once.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the delete fails.
pub async fn run() -> Result<(), CliError> {
    let pool = connect().await?;
    let counts = sweep_expired(&pool).await?;
    tracing::info!(
        registrations = counts.registrations,
        reset_tokens = counts.reset_tokens,
        "Sweep complete"
    );
    Ok(())
}
