//! Seed the catalog and destination bank accounts from a YAML file.
//!
//! Products are skipped when one with the same name exists; bank accounts
//! when the same account number exists. Running the command twice is safe.

use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;

use selempangku_api::db::banks::BankAccountFields;
use selempangku_api::db::{BankAccountRepository, ProductRepository};
use selempangku_api::models::ProductInput;
use selempangku_core::{BankAccountStatus, MAX_AMOUNT, check_amount};

use super::{CliError, connect};

/// Catalog file used when `--file` is not given.
pub const DEFAULT_CATALOG: &str = "crates/cli/seed/catalog.yaml";

#[derive(Debug, Deserialize)]
pub struct SeedCatalog {
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub banks: Vec<SeedBank>,
}

#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: String,
}

#[derive(Debug, Deserialize)]
pub struct SeedBank {
    pub bank_name: String,
    pub account_number: String,
    pub holder_name: String,
}

impl SeedCatalog {
    /// Parse and check a catalog.
    ///
    /// # Errors
    ///
    /// Returns `CliError::Yaml` for malformed YAML and `CliError::Seed` for
    /// blank names or prices that are not non-negative decimals.
    pub fn parse(content: &str) -> Result<Self, CliError> {
        let catalog: Self = serde_yaml::from_str(content)?;
        for product in &catalog.products {
            if product.name.trim().is_empty() {
                return Err(CliError::Seed("product name is blank".to_owned()));
            }
            product.price()?;
        }
        for bank in &catalog.banks {
            if bank.bank_name.trim().is_empty() || bank.account_number.trim().is_empty() {
                return Err(CliError::Seed("bank name or account number is blank".to_owned()));
            }
        }
        Ok(catalog)
    }
}

impl SeedProduct {
    fn price(&self) -> Result<Decimal, CliError> {
        Decimal::from_str(self.price.trim())
            .ok()
            .filter(|p| !p.is_sign_negative())
            .and_then(|p| check_amount("Price", p, MAX_AMOUNT).ok())
            .ok_or_else(|| CliError::Seed(format!("invalid price for {}", self.name)))
    }
}

/// Seed from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a database
/// operation fails.
pub async fn catalog(file_path: &str) -> Result<(), CliError> {
    let content = tokio::fs::read_to_string(Path::new(file_path))
        .await
        .map_err(|source| CliError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let catalog = SeedCatalog::parse(&content)?;
    tracing::info!(
        products = catalog.products.len(),
        banks = catalog.banks.len(),
        "Parsed seed file"
    );

    let pool = connect().await?;
    let products = seed_products(&pool, &catalog.products).await?;
    let banks = seed_banks(&pool, &catalog.banks).await?;

    tracing::info!(products, banks, "Seeding complete");
    Ok(())
}

async fn seed_products(pool: &PgPool, products: &[SeedProduct]) -> Result<usize, CliError> {
    let repo = ProductRepository::new(pool);
    let mut inserted = 0;
    for product in products {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM product WHERE name = $1)")
                .bind(product.name.trim())
                .fetch_one(pool)
                .await?;
        if exists {
            tracing::debug!(name = %product.name, "Product exists, skipping");
            continue;
        }
        repo.create(&ProductInput {
            name: product.name.trim().to_owned(),
            description: product.description.clone(),
            price: product.price()?,
            image: None,
        })
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}

async fn seed_banks(pool: &PgPool, banks: &[SeedBank]) -> Result<usize, CliError> {
    let repo = BankAccountRepository::new(pool);
    let mut inserted = 0;
    for bank in banks {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM bank_account WHERE account_number = $1)",
        )
        .bind(bank.account_number.trim())
        .fetch_one(pool)
        .await?;
        if exists {
            tracing::debug!(bank = %bank.bank_name, "Bank account exists, skipping");
            continue;
        }
        repo.create(&BankAccountFields {
            bank_name: bank.bank_name.trim(),
            account_number: bank.account_number.trim(),
            holder_name: bank.holder_name.trim(),
            status: BankAccountStatus::Active,
        })
        .await?;
        inserted += 1;
    }
    Ok(inserted)
}
