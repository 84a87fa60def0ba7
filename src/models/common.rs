//! Request/response shapes shared by several resources.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Soft status for clients and suppliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Active,
    Inactive,
}

/// One page of a listing.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Full ordering of a sortable collection (branches, brands).
///
/// ```json
/// { "ids": ["<first>", "<second>", "..."] }
/// ```
#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

/// Inclusive date range used by listings and reports.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// Resolve open ends: `from` defaults to 1970-01-01, `to` to `today`.
    pub fn resolve(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let from = self
            .from
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN));
        let to = self.to.unwrap_or(today);
        (from, to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_defaults() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let (from, to) = DateRange { from: None, to: None }.resolve(today);
        assert_eq!(from, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
        assert_eq!(to, today);
    }
}
