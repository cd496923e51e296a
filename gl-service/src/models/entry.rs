//! Journal entry and line models for double-entry posting.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Committed journal entry header. Immutable once written; the entry
/// and its lines are created atomically and there is no update or
/// delete path.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JournalEntry {
    pub entry_id: Uuid,
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub is_adjusting: bool,
    pub is_closing: bool,
    pub fiscal_period_id: Option<Uuid>,
    pub created_by: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Committed journal entry line. Exactly one of `debit`/`credit` is
/// strictly positive; the other is zero.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct JournalLine {
    pub line_id: Uuid,
    pub entry_id: Uuid,
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl JournalLine {
    /// Signed amount (positive for debit, negative for credit).
    pub fn signed_amount(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// A committed entry with its lines, as returned by the posting engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntryWithLines {
    pub entry: JournalEntry,
    pub lines: Vec<JournalLine>,
}

/// Candidate line for a new journal entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJournalLine {
    pub account_id: Uuid,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
}

impl NewJournalLine {
    /// Debit-only line.
    pub fn debit(account_id: Uuid, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Decimal::ZERO,
            description: None,
        }
    }

    /// Credit-only line.
    pub fn credit(account_id: Uuid, amount: Decimal) -> Self {
        Self {
            account_id,
            debit: Decimal::ZERO,
            credit: amount,
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Candidate journal entry submitted to the posting engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewJournalEntry {
    pub entry_date: NaiveDate,
    pub description: String,
    pub reference_type: Option<String>,
    pub reference_id: Option<i64>,
    pub is_adjusting: bool,
    pub is_closing: bool,
    /// Explicit period override; when `None` the engine resolves the
    /// period covering `entry_date`.
    pub fiscal_period_id: Option<Uuid>,
    pub created_by: Option<String>,
    pub lines: Vec<NewJournalLine>,
}

impl NewJournalEntry {
    /// Plain entry with no provenance reference or classification flags.
    pub fn new(
        entry_date: NaiveDate,
        description: impl Into<String>,
        lines: Vec<NewJournalLine>,
    ) -> Self {
        Self {
            entry_date,
            description: description.into(),
            reference_type: None,
            reference_id: None,
            is_adjusting: false,
            is_closing: false,
            fiscal_period_id: None,
            created_by: None,
            lines,
        }
    }

    pub fn with_reference(mut self, reference_type: impl Into<String>, reference_id: i64) -> Self {
        self.reference_type = Some(reference_type.into());
        self.reference_id = Some(reference_id);
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = Some(created_by.into());
        self
    }
}
