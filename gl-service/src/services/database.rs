//! Database service for gl-service: connection pool, account
//! directory and fiscal period registry.

use crate::models::{Account, CreateAccount, CreateFiscalPeriod, FiscalPeriod};
use crate::services::metrics::{ACCOUNTS_CREATED, DB_QUERY_DURATION, PERIOD_STATE_CHANGES};
use backhouse_core::error::AppError;
use chrono::NaiveDate;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "gl-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Account Directory
    // -------------------------------------------------------------------------

    /// Create a new account in the chart of accounts.
    #[instrument(skip(self, input), fields(account_number = %input.account_number))]
    pub async fn create_account(&self, input: &CreateAccount) -> Result<Account, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_account"])
            .start_timer();

        let account_id = Uuid::new_v4();
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (account_id, account_number, name, account_type, sub_type, parent_account_id, is_tax_deductible, tax_category)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING account_id, account_number, name, account_type, sub_type, parent_account_id, is_tax_deductible, tax_category, is_active, created_utc
            "#,
        )
        .bind(account_id)
        .bind(&input.account_number)
        .bind(&input.name)
        .bind(input.account_type.as_str())
        .bind(&input.sub_type)
        .bind(input.parent_account_id)
        .bind(input.is_tax_deductible)
        .bind(&input.tax_category)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Account number '{}' already exists",
                    input.account_number
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create account: {}", e)),
        })?;

        timer.observe_duration();

        ACCOUNTS_CREATED
            .with_label_values(&[&account.account_type])
            .inc();

        info!(
            account_id = %account.account_id,
            account_type = %account.account_type,
            "Account created"
        );

        Ok(account)
    }

    /// Get an account by ID.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn get_account(&self, account_id: Uuid) -> Result<Option<Account>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_account"])
            .start_timer();

        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT account_id, account_number, name, account_type, sub_type, parent_account_id, is_tax_deductible, tax_category, is_active, created_utc
            FROM accounts
            WHERE account_id = $1
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get account: {}", e)))?;

        timer.observe_duration();

        Ok(account)
    }

    /// Resolve a symbolic account number to its internal id.
    ///
    /// Adapters use this instead of hard-coding ids so the chart of
    /// accounts stays the single source of truth.
    #[instrument(skip(self))]
    pub async fn resolve_account_id(&self, account_number: &str) -> Result<Uuid, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["resolve_account_id"])
            .start_timer();

        let account_id: Option<Uuid> =
            sqlx::query_scalar("SELECT account_id FROM accounts WHERE account_number = $1")
                .bind(account_number)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to resolve account: {}", e))
                })?;

        timer.observe_duration();

        account_id.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!(
                "No account with number '{}'",
                account_number
            ))
        })
    }

    /// List accounts ordered by account number.
    #[instrument(skip(self))]
    pub async fn list_accounts(&self) -> Result<Vec<Account>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_accounts"])
            .start_timer();

        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT account_id, account_number, name, account_type, sub_type, parent_account_id, is_tax_deductible, tax_category, is_active, created_utc
            FROM accounts
            ORDER BY account_number
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list accounts: {}", e)))?;

        timer.observe_duration();

        Ok(accounts)
    }

    // -------------------------------------------------------------------------
    // Fiscal Period Registry
    // -------------------------------------------------------------------------

    /// Open a new fiscal period. Overlapping ranges are not rejected;
    /// covering lookups break ties by latest start date.
    #[instrument(skip(self, input), fields(period_name = %input.period_name))]
    pub async fn create_fiscal_period(
        &self,
        input: &CreateFiscalPeriod,
    ) -> Result<FiscalPeriod, AppError> {
        if input.end_date < input.start_date {
            return Err(AppError::Validation(anyhow::anyhow!(
                "Fiscal period end date {} is before start date {}",
                input.end_date,
                input.start_date
            )));
        }

        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_fiscal_period"])
            .start_timer();

        let period = sqlx::query_as::<_, FiscalPeriod>(
            r#"
            INSERT INTO fiscal_periods (period_id, period_name, period_type, start_date, end_date, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING period_id, period_name, period_type, start_date, end_date, is_closed, closed_utc, notes, created_utc
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.period_name)
        .bind(&input.period_type)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(&input.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create period: {}", e)))?;

        timer.observe_duration();

        info!(
            period_id = %period.period_id,
            start_date = %period.start_date,
            end_date = %period.end_date,
            "Fiscal period opened"
        );

        Ok(period)
    }

    /// Get a fiscal period by ID.
    #[instrument(skip(self), fields(period_id = %period_id))]
    pub async fn get_fiscal_period(
        &self,
        period_id: Uuid,
    ) -> Result<Option<FiscalPeriod>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_fiscal_period"])
            .start_timer();

        let period = sqlx::query_as::<_, FiscalPeriod>(
            r#"
            SELECT period_id, period_name, period_type, start_date, end_date, is_closed, closed_utc, notes, created_utc
            FROM fiscal_periods
            WHERE period_id = $1
            "#,
        )
        .bind(period_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get period: {}", e)))?;

        timer.observe_duration();

        Ok(period)
    }

    /// Find the fiscal period covering `date`. When periods overlap the
    /// one with the latest start date wins.
    #[instrument(skip(self))]
    pub async fn find_period_covering(
        &self,
        date: NaiveDate,
    ) -> Result<Option<FiscalPeriod>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_period_covering"])
            .start_timer();

        let period = sqlx::query_as::<_, FiscalPeriod>(
            r#"
            SELECT period_id, period_name, period_type, start_date, end_date, is_closed, closed_utc, notes, created_utc
            FROM fiscal_periods
            WHERE start_date <= $1 AND end_date >= $1
            ORDER BY start_date DESC
            LIMIT 1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to find period: {}", e)))?;

        timer.observe_duration();

        Ok(period)
    }

    /// Whether a period is closed. Unknown ids are an error.
    pub async fn is_period_closed(&self, period_id: Uuid) -> Result<bool, AppError> {
        let period = self.get_fiscal_period(period_id).await?.ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No fiscal period with id {}", period_id))
        })?;
        Ok(period.is_closed)
    }

    /// Close a fiscal period. Idempotent: closing an already-closed
    /// period keeps the original `closed_utc`.
    #[instrument(skip(self), fields(period_id = %period_id))]
    pub async fn close_fiscal_period(&self, period_id: Uuid) -> Result<FiscalPeriod, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["close_fiscal_period"])
            .start_timer();

        let period = sqlx::query_as::<_, FiscalPeriod>(
            r#"
            UPDATE fiscal_periods
            SET is_closed = TRUE, closed_utc = COALESCE(closed_utc, now())
            WHERE period_id = $1
            RETURNING period_id, period_name, period_type, start_date, end_date, is_closed, closed_utc, notes, created_utc
            "#,
        )
        .bind(period_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to close period: {}", e)))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No fiscal period with id {}", period_id))
        })?;

        timer.observe_duration();

        PERIOD_STATE_CHANGES.with_label_values(&["close"]).inc();
        info!(period_name = %period.period_name, "Fiscal period closed");

        Ok(period)
    }

    /// Reopen a fiscal period. Idempotent.
    #[instrument(skip(self), fields(period_id = %period_id))]
    pub async fn reopen_fiscal_period(&self, period_id: Uuid) -> Result<FiscalPeriod, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["reopen_fiscal_period"])
            .start_timer();

        let period = sqlx::query_as::<_, FiscalPeriod>(
            r#"
            UPDATE fiscal_periods
            SET is_closed = FALSE, closed_utc = NULL
            WHERE period_id = $1
            RETURNING period_id, period_name, period_type, start_date, end_date, is_closed, closed_utc, notes, created_utc
            "#,
        )
        .bind(period_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to reopen period: {}", e)))?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("No fiscal period with id {}", period_id))
        })?;

        timer.observe_duration();

        PERIOD_STATE_CHANGES.with_label_values(&["reopen"]).inc();
        info!(period_name = %period.period_name, "Fiscal period reopened");

        Ok(period)
    }
}
