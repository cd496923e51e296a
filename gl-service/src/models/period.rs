//! Fiscal period model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A named date range that can be closed to block further postings.
///
/// `period_type` is a free-form label (month/quarter/year) and is not
/// checked against the actual span. Periods are never deleted; they
/// toggle between open and closed.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FiscalPeriod {
    pub period_id: Uuid,
    pub period_name: String,
    pub period_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub is_closed: bool,
    pub closed_utc: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
}

impl FiscalPeriod {
    /// True when `date` falls inside `[start_date, end_date]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Input for opening a new fiscal period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFiscalPeriod {
    pub period_name: String,
    pub period_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march() -> FiscalPeriod {
        FiscalPeriod {
            period_id: Uuid::new_v4(),
            period_name: "2024-03".to_string(),
            period_type: "month".to_string(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            is_closed: false,
            closed_utc: None,
            notes: None,
            created_utc: Utc::now(),
        }
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let period = march();
        assert!(period.contains(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(period.contains(NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()));
        assert!(!period.contains(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
    }
}
