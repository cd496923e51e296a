//! AP invoice posting: debit mapped expense/inventory accounts, credit
//! Accounts Payable.

use crate::adapters::account_numbers;
use crate::models::{JournalEntryWithLines, NewJournalEntry, NewJournalLine};
use crate::services::Database;
use backhouse_core::error::AppError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// One mapped invoice line: which account the cost lands on.
#[derive(Debug, Clone)]
pub struct ApInvoiceLine {
    pub account_number: String,
    pub amount: Decimal,
    pub description: Option<String>,
}

/// A vendor invoice approved for posting.
#[derive(Debug, Clone)]
pub struct ApInvoice {
    pub invoice_id: i64,
    pub vendor_name: String,
    pub invoice_number: String,
    pub invoice_date: NaiveDate,
    pub lines: Vec<ApInvoiceLine>,
}

/// An invoice line with its account number resolved.
#[derive(Debug, Clone)]
pub struct ResolvedInvoiceLine {
    pub account_id: Uuid,
    pub amount: Decimal,
    pub description: Option<String>,
}

/// Build the journal lines for an invoice: one debit per mapped line,
/// one credit to Accounts Payable for the invoice total.
pub fn build_invoice_lines(
    items: &[ResolvedInvoiceLine],
    payable_account: Uuid,
) -> Vec<NewJournalLine> {
    let mut lines = Vec::with_capacity(items.len() + 1);
    let mut total = Decimal::ZERO;

    for item in items {
        total += item.amount;
        let mut line = NewJournalLine::debit(item.account_id, item.amount);
        line.description = item.description.clone();
        lines.push(line);
    }

    lines.push(NewJournalLine::credit(payable_account, total).with_description("Accounts payable"));
    lines
}

/// Post an AP invoice to the ledger.
pub async fn post_ap_invoice(
    db: &Database,
    invoice: &ApInvoice,
) -> Result<JournalEntryWithLines, AppError> {
    let mut resolved = Vec::with_capacity(invoice.lines.len());
    for line in &invoice.lines {
        resolved.push(ResolvedInvoiceLine {
            account_id: db.resolve_account_id(&line.account_number).await?,
            amount: line.amount,
            description: line.description.clone(),
        });
    }
    let payable_account = db
        .resolve_account_id(account_numbers::ACCOUNTS_PAYABLE)
        .await?;

    let entry = NewJournalEntry::new(
        invoice.invoice_date,
        format!(
            "AP invoice {} from {}",
            invoice.invoice_number, invoice.vendor_name
        ),
        build_invoice_lines(&resolved, payable_account),
    )
    .with_reference("ap_invoice", invoice.invoice_id);

    db.create_journal_entry(&entry).await
}
