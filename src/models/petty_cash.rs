//! Petty cash models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::petty_cash::{DepositStatus, WithdrawalStatus};

/// Cash placed into a branch float.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PettyCashDeposit {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub organization_id: Uuid,
    /// `None` for the organization-wide float.
    pub branch_id: Option<Uuid>,
    pub amount_cents: i64,
    pub description: String,
    pub reference: Option<String>,
    pub deposit_date: NaiveDate,
    pub status: DepositStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Cash handed from a deposit to a person.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PettyCashWithdrawal {
    pub id: Uuid,
    pub deposit_id: Uuid,
    pub recipient_id: Uuid,
    pub amount_cents: i64,
    /// Sum of the spends recorded against this withdrawal.
    pub justified_cents: i64,
    pub withdrawal_date: NaiveDate,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
}

/// Expense justifying (part of) a withdrawal.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PettyCashSpend {
    pub id: Uuid,
    pub withdrawal_id: Uuid,
    pub motive: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    /// Storage key of the scanned ticket, if uploaded.
    pub ticket_key: Option<String>,
    pub spend_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateDepositRequest {
    pub branch_id: Option<Uuid>,
    pub amount_cents: i64,
    pub description: String,
    pub reference: Option<String>,
    pub deposit_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateWithdrawalRequest {
    pub recipient_id: Uuid,
    pub amount_cents: i64,
    pub withdrawal_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSpendRequest {
    pub motive: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub ticket_key: Option<String>,
    pub spend_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DepositFilter {
    pub branch_id: Option<Uuid>,
    pub status: Option<DepositStatus>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalWithSpends {
    #[serde(flatten)]
    pub withdrawal: PettyCashWithdrawal,
    pub spends: Vec<PettyCashSpend>,
}

/// Deposit with its withdrawals and spends.
#[derive(Debug, Serialize)]
pub struct DepositDetail {
    #[serde(flatten)]
    pub deposit: PettyCashDeposit,
    pub withdrawals: Vec<WithdrawalWithSpends>,
    pub withdrawn_cents: i64,
    pub available_cents: i64,
}

/// Cash position of one branch (or the org-wide float when `branch_id` is null).
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PettyCashBalance {
    pub branch_id: Option<Uuid>,
    pub deposited_cents: i64,
    pub withdrawn_cents: i64,
    pub justified_cents: i64,
    pub available_cents: i64,
}
