//! Payment-batch posting: per paid invoice, debit Accounts Payable and
//! credit the operating bank account.

use crate::adapters::account_numbers;
use crate::models::{JournalEntryWithLines, NewJournalEntry, NewJournalLine};
use crate::services::Database;
use backhouse_core::error::AppError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// One vendor payment inside a batch.
#[derive(Debug, Clone)]
pub struct VendorPayment {
    pub invoice_id: i64,
    pub vendor_name: String,
    pub amount: Decimal,
}

/// A processed batch of vendor payments.
#[derive(Debug, Clone)]
pub struct PaymentBatch {
    pub payment_date: NaiveDate,
    pub payments: Vec<VendorPayment>,
}

/// Build the two journal lines for a single vendor payment.
pub fn build_payment_lines(
    payable_account: Uuid,
    bank_account: Uuid,
    amount: Decimal,
) -> Vec<NewJournalLine> {
    vec![
        NewJournalLine::debit(payable_account, amount).with_description("Accounts payable"),
        NewJournalLine::credit(bank_account, amount).with_description("Bank payment"),
    ]
}

/// Post a payment batch: one journal entry per paid invoice. Fails on
/// the first rejected payment; already-committed entries stay posted
/// (each payment is its own atomic entry).
pub async fn post_payment_batch(
    db: &Database,
    batch: &PaymentBatch,
) -> Result<Vec<JournalEntryWithLines>, AppError> {
    let payable_account = db
        .resolve_account_id(account_numbers::ACCOUNTS_PAYABLE)
        .await?;
    let bank_account = db.resolve_account_id(account_numbers::BANK).await?;

    let mut posted = Vec::with_capacity(batch.payments.len());
    for payment in &batch.payments {
        let entry = NewJournalEntry::new(
            batch.payment_date,
            format!("Payment to {}", payment.vendor_name),
            build_payment_lines(payable_account, bank_account, payment.amount),
        )
        .with_reference("ap_payment", payment.invoice_id);

        posted.push(db.create_journal_entry(&entry).await?);
    }

    Ok(posted)
}
