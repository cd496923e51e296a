//! POS settlement posting: debit tender receipts, credit sales, tax
//! and tips, with a balancing rounding line when the POS totals leave
//! a residual.

use crate::adapters::account_numbers;
use crate::models::{JournalEntryWithLines, NewJournalEntry, NewJournalLine};
use crate::services::Database;
use backhouse_core::error::AppError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

/// A day's settled POS totals.
#[derive(Debug, Clone)]
pub struct PosSettlement {
    pub settlement_id: i64,
    pub settlement_date: NaiveDate,
    pub cash_collected: Decimal,
    pub card_collected: Decimal,
    pub gift_card_redeemed: Decimal,
    pub net_sales: Decimal,
    pub sales_tax: Decimal,
    pub tips: Decimal,
}

/// Resolved account ids for settlement posting.
#[derive(Debug, Clone)]
pub struct SettlementAccounts {
    pub cash: Uuid,
    pub card_clearing: Uuid,
    pub gift_card_liability: Uuid,
    pub net_sales: Uuid,
    pub sales_tax_payable: Uuid,
    pub tips_payable: Uuid,
    pub rounding_adjustment: Uuid,
}

impl SettlementAccounts {
    /// Resolve the standard settlement accounts from the directory.
    pub async fn resolve(db: &Database) -> Result<Self, AppError> {
        Ok(Self {
            cash: db.resolve_account_id(account_numbers::CASH).await?,
            card_clearing: db.resolve_account_id(account_numbers::CARD_CLEARING).await?,
            gift_card_liability: db
                .resolve_account_id(account_numbers::GIFT_CARD_LIABILITY)
                .await?,
            net_sales: db.resolve_account_id(account_numbers::NET_SALES).await?,
            sales_tax_payable: db
                .resolve_account_id(account_numbers::SALES_TAX_PAYABLE)
                .await?,
            tips_payable: db.resolve_account_id(account_numbers::TIPS_PAYABLE).await?,
            rounding_adjustment: db
                .resolve_account_id(account_numbers::ROUNDING_ADJUSTMENT)
                .await?,
        })
    }
}

/// Build the journal lines for a settlement. Zero-amount components
/// are skipped; any residual between receipts and distributions posts
/// as one balancing line to the rounding-adjustment account.
pub fn build_settlement_lines(
    accounts: &SettlementAccounts,
    settlement: &PosSettlement,
) -> Vec<NewJournalLine> {
    let debit_legs = [
        (accounts.cash, settlement.cash_collected, "Cash receipts"),
        (accounts.card_clearing, settlement.card_collected, "Card receipts"),
        (
            accounts.gift_card_liability,
            settlement.gift_card_redeemed,
            "Gift card redemptions",
        ),
    ];
    let credit_legs = [
        (accounts.net_sales, settlement.net_sales, "Net sales"),
        (
            accounts.sales_tax_payable,
            settlement.sales_tax,
            "Sales tax collected",
        ),
        (accounts.tips_payable, settlement.tips, "Tips collected"),
    ];

    let mut lines = Vec::new();
    let mut debits = Decimal::ZERO;
    let mut credits = Decimal::ZERO;

    for (account, amount, what) in debit_legs {
        if amount > Decimal::ZERO {
            debits += amount;
            lines.push(NewJournalLine::debit(account, amount).with_description(what));
        }
    }
    for (account, amount, what) in credit_legs {
        if amount > Decimal::ZERO {
            credits += amount;
            lines.push(NewJournalLine::credit(account, amount).with_description(what));
        }
    }

    let residual = debits - credits;
    if residual > Decimal::ZERO {
        lines.push(
            NewJournalLine::credit(accounts.rounding_adjustment, residual)
                .with_description("Rounding adjustment"),
        );
    } else if residual < Decimal::ZERO {
        lines.push(
            NewJournalLine::debit(accounts.rounding_adjustment, -residual)
                .with_description("Rounding adjustment"),
        );
    }

    lines
}

/// Post a POS settlement to the ledger.
pub async fn post_pos_settlement(
    db: &Database,
    settlement: &PosSettlement,
) -> Result<JournalEntryWithLines, AppError> {
    let accounts = SettlementAccounts::resolve(db).await?;

    let entry = NewJournalEntry::new(
        settlement.settlement_date,
        format!("POS settlement for {}", settlement.settlement_date),
        build_settlement_lines(&accounts, settlement),
    )
    .with_reference("pos_settlement", settlement.settlement_id);

    db.create_journal_entry(&entry).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::posting::validate_lines;
    use rust_decimal_macros::dec;

    fn accounts() -> SettlementAccounts {
        SettlementAccounts {
            cash: Uuid::new_v4(),
            card_clearing: Uuid::new_v4(),
            gift_card_liability: Uuid::new_v4(),
            net_sales: Uuid::new_v4(),
            sales_tax_payable: Uuid::new_v4(),
            tips_payable: Uuid::new_v4(),
            rounding_adjustment: Uuid::new_v4(),
        }
    }

    fn settlement() -> PosSettlement {
        PosSettlement {
            settlement_id: 42,
            settlement_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            cash_collected: dec!(312.40),
            card_collected: dec!(1450.10),
            gift_card_redeemed: dec!(25.00),
            net_sales: dec!(1600.00),
            sales_tax: dec!(132.00),
            tips: dec!(55.50),
        }
    }

    #[test]
    fn exact_settlement_needs_no_rounding_line() {
        let accounts = accounts();
        let s = settlement();
        // 312.40 + 1450.10 + 25.00 == 1600.00 + 132.00 + 55.50
        let lines = build_settlement_lines(&accounts, &s);

        assert_eq!(lines.len(), 6);
        assert!(validate_lines(&lines).is_ok());
        assert!(!lines
            .iter()
            .any(|l| l.account_id == accounts.rounding_adjustment));
    }

    #[test]
    fn residual_posts_one_balancing_line() {
        let accounts = accounts();
        let mut s = settlement();
        s.cash_collected += dec!(0.01); // POS over-collected a cent

        let lines = build_settlement_lines(&accounts, &s);

        assert_eq!(lines.len(), 7);
        let rounding = lines
            .iter()
            .find(|l| l.account_id == accounts.rounding_adjustment)
            .expect("rounding line");
        assert_eq!(rounding.credit, dec!(0.01));
        assert!(validate_lines(&lines).is_ok());
    }

    #[test]
    fn short_collection_debits_the_rounding_account() {
        let accounts = accounts();
        let mut s = settlement();
        s.cash_collected -= dec!(0.02);

        let lines = build_settlement_lines(&accounts, &s);
        let rounding = lines
            .iter()
            .find(|l| l.account_id == accounts.rounding_adjustment)
            .expect("rounding line");
        assert_eq!(rounding.debit, dec!(0.02));
        assert!(validate_lines(&lines).is_ok());
    }

    #[test]
    fn zero_components_are_skipped() {
        let accounts = accounts();
        let mut s = settlement();
        s.gift_card_redeemed = Decimal::ZERO;
        s.cash_collected += dec!(25.00); // keep it balanced

        let lines = build_settlement_lines(&accounts, &s);
        assert_eq!(lines.len(), 5);
        assert!(!lines
            .iter()
            .any(|l| l.account_id == accounts.gift_card_liability));
        assert!(validate_lines(&lines).is_ok());
    }
}
