//! Ledger query engine integration tests: account ledger, trial
//! balance, income statement and balance sheet.

mod common;

use gl_service::models::{AccountType, LedgerQuery, NewJournalEntry, NewJournalLine, TrialBalanceQuery};
use gl_service::services::Database;
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn post(
    db: &Database,
    date: chrono::NaiveDate,
    description: &str,
    lines: Vec<NewJournalLine>,
) {
    db.create_journal_entry(&NewJournalEntry::new(date, description, lines))
        .await
        .unwrap();
}

#[tokio::test]
async fn trial_balance_stays_in_balance_across_postings() {
    let Some(db) = common::setup().await else {
        return;
    };

    let cash = common::create_account(&db, "1000", "Cash", AccountType::Asset).await;
    let sales = common::create_account(&db, "4000", "Net sales", AccountType::Revenue).await;
    let rent = common::create_account(&db, "6000", "Rent", AccountType::Expense).await;

    post(
        &db,
        common::date(2024, 3, 1),
        "Sales",
        vec![
            NewJournalLine::debit(cash.account_id, dec!(500.00)),
            NewJournalLine::credit(sales.account_id, dec!(500.00)),
        ],
    )
    .await;
    post(
        &db,
        common::date(2024, 3, 2),
        "Rent",
        vec![
            NewJournalLine::debit(rent.account_id, dec!(200.00)),
            NewJournalLine::credit(cash.account_id, dec!(200.00)),
        ],
    )
    .await;

    let tb = db
        .get_trial_balance(&TrialBalanceQuery {
            as_of_date: common::date(2024, 3, 31),
            include_zero_balances: false,
        })
        .await
        .unwrap();

    assert_eq!(tb.total_debits, dec!(700.00));
    assert_eq!(tb.total_credits, dec!(700.00));
    assert_eq!(tb.difference, dec!(0));

    let cash_row = tb
        .accounts
        .iter()
        .find(|r| r.account_number == "1000")
        .unwrap();
    assert_eq!(cash_row.balance, dec!(300.00));
}

#[tokio::test]
async fn trial_balance_as_of_date_excludes_later_entries() {
    let Some(db) = common::setup().await else {
        return;
    };

    let cash = common::create_account(&db, "1000", "Cash", AccountType::Asset).await;
    let sales = common::create_account(&db, "4000", "Net sales", AccountType::Revenue).await;

    post(
        &db,
        common::date(2024, 3, 10),
        "March sales",
        vec![
            NewJournalLine::debit(cash.account_id, dec!(100.00)),
            NewJournalLine::credit(sales.account_id, dec!(100.00)),
        ],
    )
    .await;
    post(
        &db,
        common::date(2024, 4, 10),
        "April sales",
        vec![
            NewJournalLine::debit(cash.account_id, dec!(50.00)),
            NewJournalLine::credit(sales.account_id, dec!(50.00)),
        ],
    )
    .await;

    let march_tb = db
        .get_trial_balance(&TrialBalanceQuery {
            as_of_date: common::date(2024, 3, 31),
            include_zero_balances: false,
        })
        .await
        .unwrap();
    assert_eq!(march_tb.total_debits, dec!(100.00));

    let april_tb = db
        .get_trial_balance(&TrialBalanceQuery {
            as_of_date: common::date(2024, 4, 30),
            include_zero_balances: false,
        })
        .await
        .unwrap();
    assert_eq!(april_tb.total_debits, dec!(150.00));
}

#[tokio::test]
async fn income_statement_covers_only_the_range() {
    let Some(db) = common::setup().await else {
        return;
    };

    let cash = common::create_account(&db, "1000", "Cash", AccountType::Asset).await;
    let sales = common::create_account(&db, "4000", "Net sales", AccountType::Revenue).await;
    let rent = common::create_account(&db, "6000", "Rent", AccountType::Expense).await;

    post(
        &db,
        common::date(2024, 3, 5),
        "Sales",
        vec![
            NewJournalLine::debit(cash.account_id, dec!(800.00)),
            NewJournalLine::credit(sales.account_id, dec!(800.00)),
        ],
    )
    .await;
    post(
        &db,
        common::date(2024, 3, 6),
        "Rent",
        vec![
            NewJournalLine::debit(rent.account_id, dec!(300.00)),
            NewJournalLine::credit(cash.account_id, dec!(300.00)),
        ],
    )
    .await;
    // Outside the queried range.
    post(
        &db,
        common::date(2024, 4, 1),
        "April sales",
        vec![
            NewJournalLine::debit(cash.account_id, dec!(999.00)),
            NewJournalLine::credit(sales.account_id, dec!(999.00)),
        ],
    )
    .await;

    let is = db
        .get_income_statement(common::date(2024, 3, 1), common::date(2024, 3, 31))
        .await
        .unwrap();

    assert_eq!(is.total_revenue, dec!(800.00));
    assert_eq!(is.total_expenses, dec!(300.00));
    assert_eq!(is.net_income, dec!(500.00));
    assert_eq!(is.revenue.len(), 1);
    assert_eq!(is.expenses.len(), 1);
}

#[tokio::test]
async fn balance_sheet_shows_unclosed_result_as_difference() {
    let Some(db) = common::setup().await else {
        return;
    };

    let cash = common::create_account(&db, "1000", "Cash", AccountType::Asset).await;
    let sales = common::create_account(&db, "4000", "Net sales", AccountType::Revenue).await;

    post(
        &db,
        common::date(2024, 3, 1),
        "Sales",
        vec![
            NewJournalLine::debit(cash.account_id, dec!(100.00)),
            NewJournalLine::credit(sales.account_id, dec!(100.00)),
        ],
    )
    .await;

    let bs = db.get_balance_sheet(common::date(2024, 3, 31)).await.unwrap();

    assert_eq!(bs.total_assets, dec!(100.00));
    assert_eq!(bs.total_liabilities, dec!(0));
    assert_eq!(bs.total_equity, dec!(0));
    // Revenue not closed to equity, so the equation differs by the
    // period result.
    assert_eq!(bs.difference, dec!(100.00));
}

#[tokio::test]
async fn ledger_paginates_newest_first() {
    let Some(db) = common::setup().await else {
        return;
    };

    let cash = common::create_account(&db, "1000", "Cash", AccountType::Asset).await;
    let sales = common::create_account(&db, "4000", "Net sales", AccountType::Revenue).await;

    for day in 1..=5u32 {
        post(
            &db,
            common::date(2024, 3, day),
            &format!("Day {}", day),
            vec![
                NewJournalLine::debit(cash.account_id, dec!(10.00)),
                NewJournalLine::credit(sales.account_id, dec!(10.00)),
            ],
        )
        .await;
    }

    let page = db
        .get_ledger_for_account(
            cash.account_id,
            &LedgerQuery {
                limit: 2,
                offset: 0,
                ..LedgerQuery::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(page.lines.len(), 2);
    assert_eq!(page.lines[0].entry_date, common::date(2024, 3, 5));
    assert_eq!(page.lines[1].entry_date, common::date(2024, 3, 4));
    // Window-relative running balance over the two fetched lines.
    assert_eq!(page.lines[0].running_balance, dec!(20.00));
    assert_eq!(page.lines[1].running_balance, dec!(10.00));

    let filtered = db
        .get_ledger_for_account(
            cash.account_id,
            &LedgerQuery {
                start_date: Some(common::date(2024, 3, 2)),
                end_date: Some(common::date(2024, 3, 3)),
                ..LedgerQuery::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(filtered.lines.len(), 2);
}

#[tokio::test]
async fn ledger_for_unknown_account_is_not_found() {
    let Some(db) = common::setup().await else {
        return;
    };

    let err = db
        .get_ledger_for_account(Uuid::new_v4(), &LedgerQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, backhouse_core::error::AppError::NotFound(_)));
}
