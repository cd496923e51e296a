//! Report models computed by the ledger query engine.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Account;

/// Query options for the per-account ledger.
#[derive(Debug, Clone)]
pub struct LedgerQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for LedgerQuery {
    fn default() -> Self {
        Self {
            start_date: None,
            end_date: None,
            limit: 100,
            offset: 0,
        }
    }
}

/// One ledger line for an account, annotated with a running balance.
///
/// The running balance accumulates `debit - credit` in chronological
/// order over the returned window only. With a limit/offset that does
/// not cover the full history it is window-relative, not an absolute
/// account balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerLine {
    pub line_id: Uuid,
    pub entry_id: Uuid,
    pub entry_date: NaiveDate,
    pub entry_description: String,
    pub description: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
    pub running_balance: Decimal,
}

/// Per-account ledger: matching lines in reverse chronological order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLedger {
    pub account: Account,
    pub lines: Vec<LedgerLine>,
}

/// Per-account debit/credit sums fetched for report assembly.
#[derive(Debug, Clone, FromRow)]
pub struct AccountBalanceRow {
    pub account_id: Uuid,
    pub account_number: String,
    pub name: String,
    pub account_type: String,
    pub debits: Decimal,
    pub credits: Decimal,
}

/// Query options for the trial balance.
#[derive(Debug, Clone)]
pub struct TrialBalanceQuery {
    pub as_of_date: NaiveDate,
    pub include_zero_balances: bool,
}

/// One account in the trial balance. `balance` is raw
/// `debits - credits`, no normal-balance sign adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account_id: Uuid,
    pub account_number: String,
    pub name: String,
    pub account_type: String,
    pub debits: Decimal,
    pub credits: Decimal,
    pub balance: Decimal,
}

/// Trial balance as of a date. `difference` is the global consistency
/// check and is zero for a correctly posted ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialBalance {
    pub as_of_date: NaiveDate,
    pub accounts: Vec<TrialBalanceRow>,
    pub total_debits: Decimal,
    pub total_credits: Decimal,
    pub difference: Decimal,
}

/// One account line in an income statement or balance sheet section,
/// already adjusted to the account type's normal balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRow {
    pub account_id: Uuid,
    pub account_number: String,
    pub name: String,
    pub amount: Decimal,
}

/// Income statement for a date range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub revenue: Vec<ReportRow>,
    pub expenses: Vec<ReportRow>,
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub net_income: Decimal,
}

/// Balance sheet as of a date. `difference` is
/// `assets - (liabilities + equity)`; non-zero until revenue and
/// expenses are closed to equity, which this engine does not automate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub as_of_date: NaiveDate,
    pub assets: Vec<ReportRow>,
    pub liabilities: Vec<ReportRow>,
    pub equity: Vec<ReportRow>,
    pub total_assets: Decimal,
    pub total_liabilities: Decimal,
    pub total_equity: Decimal,
    pub difference: Decimal,
}
