//! Report query and result shapes.
//!
//! Reports are read-only aggregates. Each result can be returned as JSON or
//! rendered to PDF through `reports::ReportDocument`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    domain::{allocation::AccountStatus, inventory::MotorcycleState},
    models::common::DateRange,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Pdf,
}

/// Query string shared by every report endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub branch_id: Option<Uuid>,
}

impl ReportQuery {
    pub fn range(&self) -> DateRange {
        DateRange {
            from: self.from,
            to: self.to,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct InventoryRow {
    pub branch_name: String,
    pub state: MotorcycleState,
    pub currency: String,
    pub units: i64,
    pub cost_cents: i64,
    pub retail_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct InventoryReport {
    pub generated_at: DateTime<Utc>,
    pub rows: Vec<InventoryRow>,
    pub total_units: i64,
}

/// Units and revenue of one brand or branch.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SalesGroupRow {
    pub name: String,
    pub currency: String,
    pub units: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct SalesReport {
    pub generated_at: DateTime<Utc>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub by_brand: Vec<SalesGroupRow>,
    pub by_branch: Vec<SalesGroupRow>,
    pub total_units: i64,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct AccountReportRow {
    pub account_id: Uuid,
    pub client_name: String,
    pub chassis_number: String,
    pub status: AccountStatus,
    pub currency: String,
    pub paid_cents: i64,
    pub outstanding_cents: i64,
    pub overdue_cents: i64,
    pub overdue_installments: i64,
}

#[derive(Debug, Serialize)]
pub struct CurrentAccountsReport {
    pub generated_at: DateTime<Utc>,
    pub as_of: NaiveDate,
    pub rows: Vec<AccountReportRow>,
    pub open_accounts: usize,
    pub overdue_accounts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    Deposit,
    Withdrawal,
    Spend,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PettyCashMovement {
    pub date: NaiveDate,
    pub kind: MovementKind,
    pub branch_name: Option<String>,
    pub detail: String,
    pub amount_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct PettyCashReport {
    pub generated_at: DateTime<Utc>,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub movements: Vec<PettyCashMovement>,
    pub deposited_cents: i64,
    pub withdrawn_cents: i64,
    pub spent_cents: i64,
}

impl PettyCashReport {
    pub fn new(
        generated_at: DateTime<Utc>,
        from: NaiveDate,
        to: NaiveDate,
        movements: Vec<PettyCashMovement>,
    ) -> Self {
        let total = |kind: MovementKind| {
            movements
                .iter()
                .filter(|m| m.kind == kind)
                .map(|m| m.amount_cents)
                .sum()
        };
        Self {
            generated_at,
            from,
            to,
            deposited_cents: total(MovementKind::Deposit),
            withdrawn_cents: total(MovementKind::Withdrawal),
            spent_cents: total(MovementKind::Spend),
            movements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_defaults_to_json() {
        let query: ReportQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.format, ReportFormat::Json);
        let query: ReportQuery = serde_json::from_str(r#"{"format":"pdf"}"#).unwrap();
        assert_eq!(query.format, ReportFormat::Pdf);
    }

    #[test]
    fn test_petty_cash_totals_by_kind() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let movement = |kind, amount_cents| PettyCashMovement {
            date,
            kind,
            branch_name: None,
            detail: "x".into(),
            amount_cents,
        };
        let report = PettyCashReport::new(
            Utc::now(),
            date,
            date,
            vec![
                movement(MovementKind::Deposit, 50_000),
                movement(MovementKind::Withdrawal, 20_000),
                movement(MovementKind::Spend, 7_500),
                movement(MovementKind::Spend, 2_500),
            ],
        );
        assert_eq!(report.deposited_cents, 50_000);
        assert_eq!(report.withdrawn_cents, 20_000);
        assert_eq!(report.spent_cents, 10_000);
    }
}
