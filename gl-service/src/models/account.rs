//! Chart-of-accounts model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Account types following standard accounting categories.
///
/// The type is fixed at creation and determines the normal-balance
/// sign convention used by the reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountType {
    /// Get string representation for database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "asset",
            Self::Liability => "liability",
            Self::Equity => "equity",
            Self::Revenue => "revenue",
            Self::Expense => "expense",
        }
    }

    /// Parse the database representation.
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "asset" => Some(Self::Asset),
            "liability" => Some(Self::Liability),
            "equity" => Some(Self::Equity),
            "revenue" => Some(Self::Revenue),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }

    /// Debit-normal accounts (asset/expense) report `debits - credits`
    /// as a positive balance; credit-normal accounts the reverse.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, Self::Asset | Self::Expense)
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ledger account. `account_number` is the sortable, globally unique
/// key adapters use to address accounts symbolically.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Account {
    pub account_id: Uuid,
    pub account_number: String,
    pub name: String,
    pub account_type: String,
    pub sub_type: Option<String>,
    pub parent_account_id: Option<Uuid>,
    pub is_tax_deductible: bool,
    pub tax_category: Option<String>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
}

impl Account {
    /// Get parsed account type.
    pub fn parsed_type(&self) -> Option<AccountType> {
        AccountType::from_str(&self.account_type)
    }
}

/// Input for creating a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccount {
    pub account_number: String,
    pub name: String,
    pub account_type: AccountType,
    pub sub_type: Option<String>,
    pub parent_account_id: Option<Uuid>,
    pub is_tax_deductible: bool,
    pub tax_category: Option<String>,
}
