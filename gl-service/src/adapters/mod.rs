//! External posting adapters.
//!
//! Each adapter assembles a balanced journal-entry line set from its
//! own domain data and submits it through the single
//! `create_journal_entry` call. Accounts are addressed by symbolic
//! account number and resolved through the account directory, never by
//! embedded ids, so the chart of accounts can be reseeded without
//! touching adapter code.

pub mod ap_invoice;
pub mod payment_batch;
pub mod pos_settlement;

/// Well-known account numbers in the standard restaurant chart.
pub mod account_numbers {
    pub const CASH: &str = "1000";
    pub const BANK: &str = "1005";
    pub const CARD_CLEARING: &str = "1010";
    pub const ACCOUNTS_PAYABLE: &str = "2000";
    pub const SALES_TAX_PAYABLE: &str = "2200";
    pub const TIPS_PAYABLE: &str = "2210";
    pub const GIFT_CARD_LIABILITY: &str = "2300";
    pub const NET_SALES: &str = "4000";
    pub const ROUNDING_ADJUSTMENT: &str = "9200";
}
