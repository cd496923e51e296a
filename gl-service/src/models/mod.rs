//! Domain models for gl-service.

mod account;
mod entry;
mod period;
mod report;

pub use account::{Account, AccountType, CreateAccount};
pub use entry::{
    JournalEntry, JournalEntryWithLines, JournalLine, NewJournalEntry, NewJournalLine,
};
pub use period::{CreateFiscalPeriod, FiscalPeriod};
pub use report::{
    AccountBalanceRow, AccountLedger, BalanceSheet, IncomeStatement, LedgerLine, LedgerQuery,
    ReportRow, TrialBalance, TrialBalanceQuery, TrialBalanceRow,
};
