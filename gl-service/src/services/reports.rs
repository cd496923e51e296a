//! Ledger query engine: per-account ledger, trial balance, income
//! statement and balance sheet.
//!
//! Everything is computed from committed journal lines at query time;
//! no balances are materialized, so results always reflect the latest
//! committed entries at the cost of recomputation per query.

use crate::models::{
    AccountBalanceRow, AccountLedger, AccountType, BalanceSheet, IncomeStatement, LedgerLine,
    LedgerQuery, ReportRow, TrialBalance, TrialBalanceQuery, TrialBalanceRow,
};
use crate::services::database::Database;
use crate::services::metrics::DB_QUERY_DURATION;
use backhouse_core::error::AppError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::FromRow;
use tracing::instrument;
use uuid::Uuid;

const MAX_LEDGER_PAGE: i64 = 500;

#[derive(Debug, FromRow)]
struct LedgerLineRow {
    line_id: Uuid,
    entry_id: Uuid,
    entry_date: NaiveDate,
    entry_description: String,
    description: Option<String>,
    debit: Decimal,
    credit: Decimal,
}

/// Annotate a window of ledger lines (newest first, as fetched) with a
/// running balance accumulated in chronological order.
///
/// The balance is correct within the window only; a paginated window
/// does not see earlier history.
fn annotate_window(rows: Vec<LedgerLineRow>) -> Vec<LedgerLine> {
    let mut running = Decimal::ZERO;
    let mut lines: Vec<LedgerLine> = rows
        .into_iter()
        .rev()
        .map(|row| {
            running += row.debit - row.credit;
            LedgerLine {
                line_id: row.line_id,
                entry_id: row.entry_id,
                entry_date: row.entry_date,
                entry_description: row.entry_description,
                description: row.description,
                debit: row.debit,
                credit: row.credit,
                running_balance: running,
            }
        })
        .collect();
    lines.reverse();
    lines
}

/// Assemble a trial balance from per-account sums.
///
/// Grand totals cover every account, including zero-balance rows that
/// are omitted from the listing; the difference is the ledger-wide
/// consistency check.
fn build_trial_balance(query: &TrialBalanceQuery, rows: Vec<AccountBalanceRow>) -> TrialBalance {
    let mut total_debits = Decimal::ZERO;
    let mut total_credits = Decimal::ZERO;
    let mut accounts = Vec::with_capacity(rows.len());

    for row in rows {
        total_debits += row.debits;
        total_credits += row.credits;

        let balance = row.debits - row.credits;
        if balance.is_zero() && !query.include_zero_balances {
            continue;
        }
        accounts.push(TrialBalanceRow {
            account_id: row.account_id,
            account_number: row.account_number,
            name: row.name,
            account_type: row.account_type,
            debits: row.debits,
            credits: row.credits,
            balance,
        });
    }

    TrialBalance {
        as_of_date: query.as_of_date,
        accounts,
        total_debits,
        total_credits,
        difference: total_debits - total_credits,
    }
}

/// Net amount in the account type's normal-balance convention.
fn normal_balance(account_type: Option<AccountType>, debits: Decimal, credits: Decimal) -> Decimal {
    match account_type {
        Some(ty) if ty.is_debit_normal() => debits - credits,
        _ => credits - debits,
    }
}

/// Assemble an income statement from revenue/expense account sums.
/// Accounts with no activity in the range are left out.
fn build_income_statement(
    start_date: NaiveDate,
    end_date: NaiveDate,
    rows: Vec<AccountBalanceRow>,
) -> IncomeStatement {
    let mut revenue = Vec::new();
    let mut expenses = Vec::new();
    let mut total_revenue = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;

    for row in rows {
        if row.debits.is_zero() && row.credits.is_zero() {
            continue;
        }
        let account_type = AccountType::from_str(&row.account_type);
        let amount = normal_balance(account_type, row.debits, row.credits);
        let report_row = ReportRow {
            account_id: row.account_id,
            account_number: row.account_number,
            name: row.name,
            amount,
        };
        match account_type {
            Some(AccountType::Revenue) => {
                total_revenue += amount;
                revenue.push(report_row);
            }
            Some(AccountType::Expense) => {
                total_expenses += amount;
                expenses.push(report_row);
            }
            _ => {}
        }
    }

    IncomeStatement {
        start_date,
        end_date,
        revenue,
        expenses,
        total_revenue,
        total_expenses,
        net_income: total_revenue - total_expenses,
    }
}

/// Assemble a balance sheet from asset/liability/equity account sums.
/// Accounts with a zero balance are left out.
fn build_balance_sheet(as_of_date: NaiveDate, rows: Vec<AccountBalanceRow>) -> BalanceSheet {
    let mut assets = Vec::new();
    let mut liabilities = Vec::new();
    let mut equity = Vec::new();
    let mut total_assets = Decimal::ZERO;
    let mut total_liabilities = Decimal::ZERO;
    let mut total_equity = Decimal::ZERO;

    for row in rows {
        let account_type = AccountType::from_str(&row.account_type);
        let amount = normal_balance(account_type, row.debits, row.credits);
        if amount.is_zero() {
            continue;
        }
        let report_row = ReportRow {
            account_id: row.account_id,
            account_number: row.account_number,
            name: row.name,
            amount,
        };
        match account_type {
            Some(AccountType::Asset) => {
                total_assets += amount;
                assets.push(report_row);
            }
            Some(AccountType::Liability) => {
                total_liabilities += amount;
                liabilities.push(report_row);
            }
            Some(AccountType::Equity) => {
                total_equity += amount;
                equity.push(report_row);
            }
            _ => {}
        }
    }

    BalanceSheet {
        as_of_date,
        assets,
        liabilities,
        equity,
        total_assets,
        total_liabilities,
        total_equity,
        difference: total_assets - (total_liabilities + total_equity),
    }
}

impl Database {
    /// Per-account ledger: matching lines newest first, annotated with
    /// a window-relative running balance.
    #[instrument(skip(self, query), fields(account_id = %account_id))]
    pub async fn get_ledger_for_account(
        &self,
        account_id: Uuid,
        query: &LedgerQuery,
    ) -> Result<AccountLedger, AppError> {
        let account = self.get_account(account_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No account with id {}", account_id))
        })?;

        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_ledger_for_account"])
            .start_timer();

        let limit = query.limit.clamp(1, MAX_LEDGER_PAGE);
        let offset = query.offset.max(0);

        let rows = sqlx::query_as::<_, LedgerLineRow>(
            r#"
            SELECT l.line_id, l.entry_id, e.entry_date, e.description AS entry_description,
                   l.description, l.debit, l.credit
            FROM journal_entry_lines l
            JOIN journal_entries e ON e.entry_id = l.entry_id
            WHERE l.account_id = $1
              AND ($2::date IS NULL OR e.entry_date >= $2)
              AND ($3::date IS NULL OR e.entry_date <= $3)
            ORDER BY e.entry_date DESC, e.created_utc DESC, l.line_id DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(account_id)
        .bind(query.start_date)
        .bind(query.end_date)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to fetch ledger: {}", e)))?;

        timer.observe_duration();

        Ok(AccountLedger {
            account,
            lines: annotate_window(rows),
        })
    }

    /// Trial balance as of a date.
    #[instrument(skip(self, query), fields(as_of_date = %query.as_of_date))]
    pub async fn get_trial_balance(
        &self,
        query: &TrialBalanceQuery,
    ) -> Result<TrialBalance, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_trial_balance"])
            .start_timer();

        let rows = sqlx::query_as::<_, AccountBalanceRow>(
            r#"
            SELECT a.account_id, a.account_number, a.name, a.account_type,
                   COALESCE(s.debits, 0) AS debits,
                   COALESCE(s.credits, 0) AS credits
            FROM accounts a
            LEFT JOIN (
                SELECT l.account_id, SUM(l.debit) AS debits, SUM(l.credit) AS credits
                FROM journal_entry_lines l
                JOIN journal_entries e ON e.entry_id = l.entry_id
                WHERE e.entry_date <= $1
                GROUP BY l.account_id
            ) s ON s.account_id = a.account_id
            ORDER BY a.account_number
            "#,
        )
        .bind(query.as_of_date)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch trial balance: {}", e))
        })?;

        timer.observe_duration();

        Ok(build_trial_balance(query, rows))
    }

    /// Income statement for an inclusive date range.
    #[instrument(skip(self))]
    pub async fn get_income_statement(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<IncomeStatement, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_income_statement"])
            .start_timer();

        let rows = sqlx::query_as::<_, AccountBalanceRow>(
            r#"
            SELECT a.account_id, a.account_number, a.name, a.account_type,
                   COALESCE(s.debits, 0) AS debits,
                   COALESCE(s.credits, 0) AS credits
            FROM accounts a
            LEFT JOIN (
                SELECT l.account_id, SUM(l.debit) AS debits, SUM(l.credit) AS credits
                FROM journal_entry_lines l
                JOIN journal_entries e ON e.entry_id = l.entry_id
                WHERE e.entry_date >= $1 AND e.entry_date <= $2
                GROUP BY l.account_id
            ) s ON s.account_id = a.account_id
            WHERE a.account_type IN ('revenue', 'expense')
            ORDER BY a.account_number
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch income statement: {}", e))
        })?;

        timer.observe_duration();

        Ok(build_income_statement(start_date, end_date, rows))
    }

    /// Balance sheet as of a date.
    #[instrument(skip(self))]
    pub async fn get_balance_sheet(&self, as_of_date: NaiveDate) -> Result<BalanceSheet, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_balance_sheet"])
            .start_timer();

        let rows = sqlx::query_as::<_, AccountBalanceRow>(
            r#"
            SELECT a.account_id, a.account_number, a.name, a.account_type,
                   COALESCE(s.debits, 0) AS debits,
                   COALESCE(s.credits, 0) AS credits
            FROM accounts a
            LEFT JOIN (
                SELECT l.account_id, SUM(l.debit) AS debits, SUM(l.credit) AS credits
                FROM journal_entry_lines l
                JOIN journal_entries e ON e.entry_id = l.entry_id
                WHERE e.entry_date <= $1
                GROUP BY l.account_id
            ) s ON s.account_id = a.account_id
            WHERE a.account_type IN ('asset', 'liability', 'equity')
            ORDER BY a.account_number
            "#,
        )
        .bind(as_of_date)
        .fetch_all(self.pool())
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to fetch balance sheet: {}", e))
        })?;

        timer.observe_duration();

        Ok(build_balance_sheet(as_of_date, rows))
    }
}
