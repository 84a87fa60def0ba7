//! Sale models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::amortization::PaymentFrequency;
use crate::models::current_account::CurrentAccountDetail;

/// How the buyer pays for the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalePaymentType {
    Cash,
    Transfer,
    Card,
    Mercadopago,
    /// Down payment now, balance through a current account.
    Financed,
}

/// Installment plan attached to a financed sale.
#[derive(Debug, Clone, Deserialize)]
pub struct FinancingRequest {
    #[serde(default)]
    pub down_payment_cents: i64,
    pub installments: u32,
    #[serde(default)]
    pub annual_interest_bps: u32,
    pub frequency: PaymentFrequency,
    /// Due date of the first installment.
    pub start_date: NaiveDate,
    pub notes: Option<String>,
}

/// Request body for `POST /api/v1/sales`.
///
/// ```json
/// {
///   "motorcycle_id": "…",
///   "client_id": "…",
///   "sale_price_cents": 450000000,
///   "payment_type": "FINANCED",
///   "financing": {
///     "down_payment_cents": 150000000,
///     "installments": 12,
///     "annual_interest_bps": 4500,
///     "frequency": "MONTHLY",
///     "start_date": "2025-04-10"
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub motorcycle_id: Uuid,
    pub client_id: Uuid,
    pub sale_price_cents: i64,
    pub payment_type: SalePaymentType,
    pub financing: Option<FinancingRequest>,
    pub observations: Option<String>,
}

/// One sold unit, as listed by `GET /api/v1/sales`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SaleSummary {
    pub motorcycle_id: Uuid,
    pub chassis_number: String,
    pub brand_name: String,
    pub model_name: String,
    pub branch_name: String,
    pub client_id: Uuid,
    pub client_name: String,
    pub sale_price_cents: i64,
    pub currency: String,
    pub payment_type: SalePaymentType,
    pub seller_id: Option<Uuid>,
    pub sold_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub sale: SaleSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_account: Option<CurrentAccountDetail>,
}

/// Query string for `GET /api/v1/sales`. Dates are inclusive.
#[derive(Debug, Default, Deserialize)]
pub struct SaleFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub branch_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
}
