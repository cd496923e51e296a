//! Posting engine: validates candidate journal entries and commits
//! them atomically.
//!
//! Validation is fail-fast with no partial effects. Amounts are first
//! rounded to cent precision, the scale the store keeps, so an entry
//! accepted as balanced is stored balanced. The structural and
//! arithmetic checks are pure functions over the candidate lines; only
//! the final commit touches the store, inside a single transaction.

use crate::models::{JournalEntry, JournalEntryWithLines, JournalLine, NewJournalEntry, NewJournalLine};
use crate::services::database::Database;
use crate::services::metrics::{DB_QUERY_DURATION, ERRORS_TOTAL, POSTINGS_TOTAL};
use backhouse_core::error::AppError;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashSet;
use tracing::{info, instrument};
use uuid::Uuid;

/// Debit and credit sums of a validated line set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTotals {
    pub debits: Decimal,
    pub credits: Decimal,
}

impl EntryTotals {
    /// Raw difference `debits - credits`, before cent rounding.
    pub fn difference(&self) -> Decimal {
        self.debits - self.credits
    }
}

/// Round every line amount to cent precision, matching the scale of
/// the stored `NUMERIC(14,2)` columns (half away from zero, as the
/// store casts). The engine validates and inserts these values, never
/// the raw input, so the committed ledger agrees with what validation
/// accepted.
pub fn normalize_lines(lines: &[NewJournalLine]) -> Vec<NewJournalLine> {
    lines
        .iter()
        .map(|line| NewJournalLine {
            account_id: line.account_id,
            debit: line
                .debit
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            credit: line
                .credit
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            description: line.description.clone(),
        })
        .collect()
}

/// Validate the structural and arithmetic invariants of a candidate
/// line set:
///
/// 1. at least two lines;
/// 2. per line, debit and credit non-negative and exactly one of them
///    strictly positive;
/// 3. debit and credit sums equal to cent precision.
pub fn validate_lines(lines: &[NewJournalLine]) -> Result<EntryTotals, AppError> {
    if lines.len() < 2 {
        return Err(AppError::Validation(anyhow::anyhow!(
            "Journal entry needs at least 2 lines, got {}",
            lines.len()
        )));
    }

    let mut debits = Decimal::ZERO;
    let mut credits = Decimal::ZERO;

    for line in lines {
        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(AppError::Validation(anyhow::anyhow!(
                "Journal line amounts must be non-negative (debit {}, credit {})",
                line.debit,
                line.credit
            )));
        }
        let has_debit = line.debit > Decimal::ZERO;
        let has_credit = line.credit > Decimal::ZERO;
        if has_debit == has_credit {
            return Err(AppError::Validation(anyhow::anyhow!(
                "Journal line must be debit-only or credit-only (debit {}, credit {})",
                line.debit,
                line.credit
            )));
        }
        debits += line.debit;
        credits += line.credit;
    }

    let diff = (debits - credits).round_dp(2);
    if !diff.is_zero() {
        return Err(AppError::Validation(anyhow::anyhow!(
            "Journal entry not balanced: debits {} != credits {} (diff {})",
            debits,
            credits,
            diff
        )));
    }

    Ok(EntryTotals { debits, credits })
}

impl Database {
    /// Validate and commit a journal entry.
    ///
    /// The validation sequence is fail-fast: line shape and balance
    /// first, then fiscal period status, then account existence. Only
    /// after everything passes are the entry and its lines inserted in
    /// one transaction; any failure rolls the whole entry back.
    #[instrument(skip(self, input), fields(entry_date = %input.entry_date, line_count = input.lines.len()))]
    pub async fn create_journal_entry(
        &self,
        input: &NewJournalEntry,
    ) -> Result<JournalEntryWithLines, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_journal_entry"])
            .start_timer();

        let result = self.post_entry(input).await;

        timer.observe_duration();

        match &result {
            Ok(created) => {
                POSTINGS_TOTAL.with_label_values(&["ok"]).inc();
                info!(
                    entry_id = %created.entry.entry_id,
                    line_count = created.lines.len(),
                    "Journal entry posted"
                );
            }
            Err(e) => {
                let status = if e.is_validation() { "rejected" } else { "error" };
                POSTINGS_TOTAL.with_label_values(&[status]).inc();
                ERRORS_TOTAL.with_label_values(&[e.error_type()]).inc();
            }
        }

        result
    }

    async fn post_entry(
        &self,
        input: &NewJournalEntry,
    ) -> Result<JournalEntryWithLines, AppError> {
        let lines = normalize_lines(&input.lines);
        let totals = validate_lines(&lines)?;

        // Resolve the effective fiscal period: explicit override first,
        // otherwise the period covering the entry date (may be none).
        let period = match input.fiscal_period_id {
            Some(period_id) => Some(self.get_fiscal_period(period_id).await?.ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("No fiscal period with id {}", period_id))
            })?),
            None => self.find_period_covering(input.entry_date).await?,
        };

        if let Some(ref period) = period {
            if period.is_closed {
                return Err(AppError::Validation(anyhow::anyhow!(
                    "Fiscal period '{}' is closed",
                    period.period_name
                )));
            }
        }

        // Verify every referenced account exists before opening the
        // transaction; the FK constraint remains the backstop.
        let account_ids: Vec<Uuid> = lines.iter().map(|l| l.account_id).collect();
        let existing: Vec<Uuid> =
            sqlx::query_scalar("SELECT account_id FROM accounts WHERE account_id = ANY($1)")
                .bind(&account_ids)
                .fetch_all(self.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to fetch accounts: {}", e))
                })?;
        let existing: HashSet<Uuid> = existing.into_iter().collect();
        for account_id in &account_ids {
            if !existing.contains(account_id) {
                return Err(AppError::NotFound(anyhow::anyhow!(
                    "No account with id {}",
                    account_id
                )));
            }
        }

        let mut tx = self.pool().begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            INSERT INTO journal_entries (entry_id, entry_date, description, reference_type, reference_id, is_adjusting, is_closing, fiscal_period_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING entry_id, entry_date, description, reference_type, reference_id, is_adjusting, is_closing, fiscal_period_id, created_by, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(input.entry_date)
        .bind(&input.description)
        .bind(&input.reference_type)
        .bind(input.reference_id)
        .bind(input.is_adjusting)
        .bind(input.is_closing)
        .bind(period.as_ref().map(|p| p.period_id))
        .bind(&input.created_by)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to insert entry: {}", e)))?;

        let mut inserted_lines = Vec::with_capacity(lines.len());
        for line in &lines {
            let inserted = sqlx::query_as::<_, JournalLine>(
                r#"
                INSERT INTO journal_entry_lines (line_id, entry_id, account_id, debit, credit, description)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING line_id, entry_id, account_id, debit, credit, description, created_utc
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(entry.entry_id)
            .bind(line.account_id)
            .bind(line.debit)
            .bind(line.credit)
            .bind(&line.description)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                    AppError::NotFound(anyhow::anyhow!("No account with id {}", line.account_id))
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to insert line: {}", e)),
            })?;
            inserted_lines.push(inserted);
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit transaction: {}", e))
        })?;

        tracing::debug!(
            entry_id = %entry.entry_id,
            total_debits = %totals.debits,
            "Entry committed"
        );

        Ok(JournalEntryWithLines {
            entry,
            lines: inserted_lines,
        })
    }
}
