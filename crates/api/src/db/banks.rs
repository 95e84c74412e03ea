//! Bank account registry repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use selempangku_core::{BankAccountId, BankAccountStatus};

use super::{RepositoryError, parse_column};
use crate::models::bank::BankAccount;

const BANK_COLUMNS: &str =
    "id, bank_name, account_number, holder_name, status, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct BankAccountRow {
    id: BankAccountId,
    bank_name: String,
    account_number: String,
    holder_name: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BankAccountRow> for BankAccount {
    type Error = RepositoryError;

    fn try_from(row: BankAccountRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            bank_name: row.bank_name,
            account_number: row.account_number,
            holder_name: row.holder_name,
            status: parse_column(&row.status)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A validated bank account write.
#[derive(Debug, Clone)]
pub struct BankAccountFields<'a> {
    pub bank_name: &'a str,
    pub account_number: &'a str,
    pub holder_name: &'a str,
    pub status: BankAccountStatus,
}

/// Repository for bank account database operations.
pub struct BankAccountRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BankAccountRepository<'a> {
    /// Create a new bank account repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List accounts. With `only_active`, inactive accounts are hidden.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, only_active: bool) -> Result<Vec<BankAccount>, RepositoryError> {
        let rows = sqlx::query_as::<_, BankAccountRow>(&format!(
            "SELECT {BANK_COLUMNS} FROM bank_account
             WHERE (NOT $1 OR status = $2)
             ORDER BY bank_name, id"
        ))
        .bind(only_active)
        .bind(BankAccountStatus::Active.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(BankAccount::try_from).collect()
    }

    /// Get an account by ID. With `only_active`, an inactive account is not found.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: BankAccountId,
        only_active: bool,
    ) -> Result<Option<BankAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, BankAccountRow>(&format!(
            "SELECT {BANK_COLUMNS} FROM bank_account
             WHERE id = $1 AND (NOT $2 OR status = $3)"
        ))
        .bind(id)
        .bind(only_active)
        .bind(BankAccountStatus::Active.as_str())
        .fetch_optional(self.pool)
        .await?;

        row.map(BankAccount::try_from).transpose()
    }

    /// Insert an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, fields: &BankAccountFields<'_>) -> Result<BankAccount, RepositoryError> {
        let row = sqlx::query_as::<_, BankAccountRow>(&format!(
            "INSERT INTO bank_account (bank_name, account_number, holder_name, status)
             VALUES ($1, $2, $3, $4)
             RETURNING {BANK_COLUMNS}"
        ))
        .bind(fields.bank_name)
        .bind(fields.account_number)
        .bind(fields.holder_name)
        .bind(fields.status.as_str())
        .fetch_one(self.pool)
        .await?;

        BankAccount::try_from(row)
    }

    /// Replace an account's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn update(
        &self,
        id: BankAccountId,
        fields: &BankAccountFields<'_>,
    ) -> Result<BankAccount, RepositoryError> {
        let row = sqlx::query_as::<_, BankAccountRow>(&format!(
            "UPDATE bank_account SET
                 bank_name = $2, account_number = $3, holder_name = $4, status = $5,
                 updated_at = now()
             WHERE id = $1
             RETURNING {BANK_COLUMNS}"
        ))
        .bind(id)
        .bind(fields.bank_name)
        .bind(fields.account_number)
        .bind(fields.holder_name)
        .bind(fields.status.as_str())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        BankAccount::try_from(row)
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the account does not exist.
    pub async fn delete(&self, id: BankAccountId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bank_account WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
