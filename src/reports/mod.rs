//! Presentation of report results.
//!
//! A report result is first turned into a `ReportDocument`: a title, a few
//! summary lines, and tables of already-formatted strings. `pdf::render`
//! lays that document out on A4 pages. Nothing here queries the database.

pub mod pdf;

use chrono::{DateTime, Utc};

use crate::{
    domain::money::format_cents,
    models::report::{
        CurrentAccountsReport, InventoryReport, MovementKind, PettyCashReport, SalesGroupRow,
        SalesReport,
    },
};

/// Petty cash has no currency column; floats are kept in pesos.
const PETTY_CASH_CURRENCY: &str = "ARS";

#[derive(Debug, Clone)]
pub struct Table {
    pub title: String,
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub summary: Vec<String>,
    pub tables: Vec<Table>,
}

impl ReportDocument {
    /// File name offered in `Content-Disposition`.
    pub fn file_name(&self) -> String {
        let slug: String = self
            .title
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        format!("{}-{}.pdf", slug, self.generated_at.format("%Y%m%d"))
    }
}

impl From<&InventoryReport> for ReportDocument {
    fn from(report: &InventoryReport) -> Self {
        let rows = report
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.branch_name.clone(),
                    row.state.to_string(),
                    row.units.to_string(),
                    format_cents(row.cost_cents, &row.currency),
                    format_cents(row.retail_cents, &row.currency),
                ]
            })
            .collect();

        Self {
            title: "Inventory".to_string(),
            generated_at: report.generated_at,
            summary: vec![format!("Units: {}", report.total_units)],
            tables: vec![Table {
                title: "Units by branch and state".to_string(),
                headers: vec!["Branch", "State", "Units", "Cost", "Retail"],
                rows,
            }],
        }
    }
}

fn sales_table(title: &str, header: &'static str, rows: &[SalesGroupRow]) -> Table {
    Table {
        title: title.to_string(),
        headers: vec![header, "Units", "Revenue"],
        rows: rows
            .iter()
            .map(|row| {
                vec![
                    row.name.clone(),
                    row.units.to_string(),
                    format_cents(row.revenue_cents, &row.currency),
                ]
            })
            .collect(),
    }
}

impl From<&SalesReport> for ReportDocument {
    fn from(report: &SalesReport) -> Self {
        Self {
            title: "Sales".to_string(),
            generated_at: report.generated_at,
            summary: vec![
                format!("Period: {} to {}", report.from, report.to),
                format!("Units sold: {}", report.total_units),
            ],
            tables: vec![
                sales_table("By brand", "Brand", &report.by_brand),
                sales_table("By branch", "Branch", &report.by_branch),
            ],
        }
    }
}

impl From<&CurrentAccountsReport> for ReportDocument {
    fn from(report: &CurrentAccountsReport) -> Self {
        let rows = report
            .rows
            .iter()
            .map(|row| {
                vec![
                    row.client_name.clone(),
                    row.chassis_number.clone(),
                    row.status.as_str().to_string(),
                    format_cents(row.paid_cents, &row.currency),
                    format_cents(row.outstanding_cents, &row.currency),
                    format_cents(row.overdue_cents, &row.currency),
                    row.overdue_installments.to_string(),
                ]
            })
            .collect();

        Self {
            title: "Current accounts".to_string(),
            generated_at: report.generated_at,
            summary: vec![
                format!("As of: {}", report.as_of),
                format!("Open accounts: {}", report.open_accounts),
                format!("Overdue accounts: {}", report.overdue_accounts),
            ],
            tables: vec![Table {
                title: "Open accounts".to_string(),
                headers: vec!["Client", "Chassis", "Status", "Paid", "Outstanding", "Overdue", "Late"],
                rows,
            }],
        }
    }
}

impl From<&PettyCashReport> for ReportDocument {
    fn from(report: &PettyCashReport) -> Self {
        let rows = report
            .movements
            .iter()
            .map(|m| {
                let kind = match m.kind {
                    MovementKind::Deposit => "Deposit",
                    MovementKind::Withdrawal => "Withdrawal",
                    MovementKind::Spend => "Spend",
                };
                vec![
                    m.date.to_string(),
                    kind.to_string(),
                    m.branch_name.clone().unwrap_or_else(|| "-".to_string()),
                    m.detail.clone(),
                    format_cents(m.amount_cents, PETTY_CASH_CURRENCY),
                ]
            })
            .collect();

        Self {
            title: "Petty cash".to_string(),
            generated_at: report.generated_at,
            summary: vec![
                format!("Period: {} to {}", report.from, report.to),
                format!("Deposited: {}", format_cents(report.deposited_cents, PETTY_CASH_CURRENCY)),
                format!("Withdrawn: {}", format_cents(report.withdrawn_cents, PETTY_CASH_CURRENCY)),
                format!("Spent: {}", format_cents(report.spent_cents, PETTY_CASH_CURRENCY)),
            ],
            tables: vec![Table {
                title: "Movements".to_string(),
                headers: vec!["Date", "Type", "Branch", "Detail", "Amount"],
                rows,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::inventory::MotorcycleState, models::report::InventoryRow};
    use chrono::TimeZone;

    #[test]
    fn test_inventory_document() {
        let report = InventoryReport {
            generated_at: Utc.with_ymd_and_hms(2025, 4, 2, 10, 0, 0).unwrap(),
            rows: vec![InventoryRow {
                branch_name: "Centro".into(),
                state: MotorcycleState::Stock,
                currency: "ARS".into(),
                units: 3,
                cost_cents: 900_000_00,
                retail_cents: 1_200_000_00,
            }],
            total_units: 3,
        };
        let doc = ReportDocument::from(&report);
        assert_eq!(doc.tables.len(), 1);
        assert_eq!(
            doc.tables[0].rows[0],
            vec!["Centro", "STOCK", "3", "ARS 900.000,00", "ARS 1.200.000,00"]
        );
        assert_eq!(doc.file_name(), "inventory-20250402.pdf");
    }
}
