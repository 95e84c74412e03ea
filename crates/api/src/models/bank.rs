//! Destination bank account ("rekening") model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use selempangku_core::{BankAccountId, BankAccountStatus};

/// A bank account customers can transfer to.
#[derive(Debug, Clone, Serialize)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub bank_name: String,
    pub account_number: String,
    pub holder_name: String,
    pub status: BankAccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for creating or replacing a bank account.
#[derive(Debug, Clone, Deserialize)]
pub struct BankAccountInput {
    #[serde(default, alias = "nama_bank")]
    pub bank_name: String,
    #[serde(default, alias = "nomor_rekening")]
    pub account_number: String,
    #[serde(default, alias = "atas_nama", alias = "nama_pemilik")]
    pub holder_name: String,
    #[serde(default)]
    pub status: Option<String>,
}
