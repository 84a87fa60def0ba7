//! Current account (installment financing) models.
//!
//! This module defines:
//! - `CurrentAccount`: financing record linking a client and a motorcycle
//! - `Installment`: one row of the account's schedule
//! - `Payment` and `PaymentAllocation`: money received and where it went
//! - Request/response types for the current-account endpoints

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    allocation::{AccountStatus, InstallmentBalance, InstallmentStatus},
    amortization::{PaymentFrequency, ScheduleTotals, ScheduledInstallment},
};

/// Represents a current account from the database.
///
/// `financed_amount_cents = total_amount_cents - down_payment_cents`,
/// enforced when the account is created.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct CurrentAccount {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub organization_id: Uuid,
    pub client_id: Uuid,
    pub motorcycle_id: Uuid,
    pub total_amount_cents: i64,
    pub down_payment_cents: i64,
    pub financed_amount_cents: i64,
    pub annual_interest_bps: i32,
    pub number_of_installments: i32,
    /// Amount of the first installment (the constant one under French amortization).
    pub installment_amount_cents: i64,
    pub payment_frequency: PaymentFrequency,
    pub start_date: NaiveDate,
    pub currency: String,
    pub status: AccountStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Installment {
    pub id: Uuid,
    pub current_account_id: Uuid,
    pub number: i32,
    pub due_date: NaiveDate,
    pub principal_cents: i64,
    pub interest_cents: i64,
    pub amount_cents: i64,
    pub paid_cents: i64,
    pub status: InstallmentStatus,
}

impl From<&Installment> for InstallmentBalance {
    fn from(i: &Installment) -> Self {
        Self {
            id: i.id,
            number: i.number,
            due_date: i.due_date,
            amount_cents: i.amount_cents,
            paid_cents: i.paid_cents,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Card,
    Check,
    /// Online checkout (preference) paid through MercadoPago.
    Mercadopago,
    /// Card payment on a Point Smart terminal.
    Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Completed,
    Annulled,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Payment {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub organization_id: Uuid,
    pub current_account_id: Uuid,
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub payment_date: NaiveDate,
    /// External reference (transfer id, MercadoPago payment id). Unique per
    /// method among completed payments, and across MERCADOPAGO and POINT.
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
    pub annulled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PaymentAllocation {
    pub payment_id: Uuid,
    pub installment_id: Uuid,
    pub amount_cents: i64,
}

/// Request body for `POST /api/v1/current-accounts`.
///
/// Used for units that were sold before financing was set up. Financed
/// sales create the account themselves.
#[derive(Debug, Deserialize)]
pub struct CreateCurrentAccountRequest {
    pub client_id: Uuid,
    pub motorcycle_id: Uuid,
    pub total_amount_cents: i64,
    #[serde(default)]
    pub down_payment_cents: i64,
    pub installments: u32,
    #[serde(default)]
    pub annual_interest_bps: u32,
    pub frequency: PaymentFrequency,
    pub start_date: NaiveDate,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub notes: Option<String>,
}

fn default_currency() -> String {
    "ARS".to_string()
}

/// Request body for `POST /api/v1/current-accounts/preview`.
#[derive(Debug, Deserialize)]
pub struct SchedulePreviewRequest {
    pub total_amount_cents: i64,
    #[serde(default)]
    pub down_payment_cents: i64,
    pub installments: u32,
    #[serde(default)]
    pub annual_interest_bps: u32,
    pub frequency: PaymentFrequency,
    pub start_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct SchedulePreview {
    pub financed_amount_cents: i64,
    pub installments: Vec<ScheduledInstallment>,
    pub totals: ScheduleTotals,
}

/// Request body for `POST /api/v1/current-accounts/{id}/payments`.
///
/// `installment_number` targets a specific installment; without it the
/// oldest unpaid one is used. Any surplus spills over to later installments.
#[derive(Debug, Deserialize)]
pub struct RegisterPaymentRequest {
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub installment_number: Option<i32>,
    pub payment_date: Option<NaiveDate>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CurrentAccountFilter {
    pub status: Option<AccountStatus>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CancelAccountRequest {
    pub reason: Option<String>,
}

/// Account with schedule, payments and running totals.
#[derive(Debug, Serialize)]
pub struct CurrentAccountDetail {
    #[serde(flatten)]
    pub account: CurrentAccount,
    pub installments: Vec<Installment>,
    pub payments: Vec<Payment>,
    pub paid_cents: i64,
    pub outstanding_cents: i64,
    pub next_due_date: Option<NaiveDate>,
}

impl CurrentAccountDetail {
    pub fn new(account: CurrentAccount, installments: Vec<Installment>, payments: Vec<Payment>) -> Self {
        let paid_cents = installments.iter().map(|i| i.paid_cents).sum();
        let outstanding_cents = installments
            .iter()
            .map(|i| (i.amount_cents - i.paid_cents).max(0))
            .sum();
        let next_due_date = installments
            .iter()
            .filter(|i| i.status != InstallmentStatus::Paid)
            .map(|i| i.due_date)
            .min();
        Self {
            account,
            installments,
            payments,
            paid_cents,
            outstanding_cents,
            next_due_date,
        }
    }
}

/// Result of registering a payment.
#[derive(Debug, Serialize)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub allocations: Vec<crate::domain::allocation::Allocation>,
    pub account_status: AccountStatus,
    pub outstanding_cents: i64,
}
