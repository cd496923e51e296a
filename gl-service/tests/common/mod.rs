//! Shared helpers for integration tests.
//!
//! Tests run against disposable PostgreSQL databases created from
//! TEST_DATABASE_URL. When the variable is not set the tests skip with
//! a message instead of failing, so the pure unit tests still run
//! without a database.

#![allow(dead_code)]

use chrono::NaiveDate;
use gl_service::models::{Account, AccountType, CreateAccount, CreateFiscalPeriod, FiscalPeriod};
use gl_service::services::metrics::init_metrics;
use gl_service::services::Database;
use sqlx::{Connection, Executor, PgConnection};
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();
    });
}

/// Connect to a fresh, isolated database and run migrations.
///
/// Returns `None` (after printing a skip notice) when
/// TEST_DATABASE_URL is not set.
pub async fn setup() -> Option<Database> {
    init_test_logging();
    init_metrics();

    let base_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping: TEST_DATABASE_URL is not set");
            return None;
        }
    };

    let db_name = format!("gl_test_{}", Uuid::new_v4().simple());
    let mut conn = PgConnection::connect(&base_url)
        .await
        .expect("Failed to connect to PostgreSQL");
    conn.execute(format!(r#"CREATE DATABASE "{}""#, db_name).as_str())
        .await
        .expect("Failed to create test database");

    let (server, _) = base_url
        .rsplit_once('/')
        .expect("TEST_DATABASE_URL must include a database path");
    let test_url = format!("{}/{}", server, db_name);

    let db = Database::new(&test_url, 5, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");

    Some(db)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Create an account with the given number, name and type.
pub async fn create_account(
    db: &Database,
    number: &str,
    name: &str,
    account_type: AccountType,
) -> Account {
    db.create_account(&CreateAccount {
        account_number: number.to_string(),
        name: name.to_string(),
        account_type,
        sub_type: None,
        parent_account_id: None,
        is_tax_deductible: false,
        tax_category: None,
    })
    .await
    .expect("Failed to create account")
}

/// Open a monthly fiscal period.
pub async fn create_period(
    db: &Database,
    name: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> FiscalPeriod {
    db.create_fiscal_period(&CreateFiscalPeriod {
        period_name: name.to_string(),
        period_type: "month".to_string(),
        start_date: start,
        end_date: end,
        notes: None,
    })
    .await
    .expect("Failed to create fiscal period")
}

/// Seed the standard restaurant chart of accounts used by the posting
/// adapters.
pub async fn seed_standard_chart(db: &Database) {
    use gl_service::adapters::account_numbers as an;

    let chart = [
        (an::CASH, "Cash on hand", AccountType::Asset),
        (an::BANK, "Operating bank account", AccountType::Asset),
        (an::CARD_CLEARING, "Card clearing", AccountType::Asset),
        (an::ACCOUNTS_PAYABLE, "Accounts payable", AccountType::Liability),
        (an::SALES_TAX_PAYABLE, "Sales tax payable", AccountType::Liability),
        (an::TIPS_PAYABLE, "Tips payable", AccountType::Liability),
        (an::GIFT_CARD_LIABILITY, "Gift card liability", AccountType::Liability),
        (an::NET_SALES, "Net sales", AccountType::Revenue),
        (an::ROUNDING_ADJUSTMENT, "Rounding adjustment", AccountType::Expense),
    ];
    for (number, name, account_type) in chart {
        create_account(db, number, name, account_type).await;
    }
}

/// Count committed journal entries, for atomicity assertions.
pub async fn entry_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM journal_entries")
        .fetch_one(db.pool())
        .await
        .expect("Failed to count entries")
}

/// Count committed journal lines.
pub async fn line_count(db: &Database) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM journal_entry_lines")
        .fetch_one(db.pool())
        .await
        .expect("Failed to count lines")
}
