//! Current account (installment financing) endpoints.
//!
//! - POST /api/v1/current-accounts/preview - Schedule without saving
//! - GET/POST /api/v1/current-accounts
//! - GET /api/v1/current-accounts/{id}
//! - POST /api/v1/current-accounts/{id}/payments
//! - POST /api/v1/current-accounts/{id}/payments/{payment_id}/annul
//! - POST /api/v1/current-accounts/{id}/cancel

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::tenant::Tenant,
    models::current_account::{
        CancelAccountRequest, CreateCurrentAccountRequest, CurrentAccount, CurrentAccountDetail,
        CurrentAccountFilter, PaymentReceipt, RegisterPaymentRequest, SchedulePreview,
        SchedulePreviewRequest,
    },
    services::current_account_service,
};

/// Compute a schedule without storing anything.
///
/// # Request Body
///
/// ```json
/// {
///   "total_amount_cents": 450000000,
///   "down_payment_cents": 150000000,
///   "installments": 12,
///   "annual_interest_bps": 4500,
///   "frequency": "MONTHLY",
///   "start_date": "2025-04-10"
/// }
/// ```
///
/// # Response
///
/// Financed amount, one row per installment (due date, principal,
/// interest, amount) and totals. Principal always sums to the financed
/// amount; the last installment absorbs rounding.
pub async fn preview_schedule(
    _tenant: Tenant,
    Json(request): Json<SchedulePreviewRequest>,
) -> Result<Json<SchedulePreview>, AppError> {
    Ok(Json(current_account_service::preview(request)?))
}

/// Finance a unit already sold to the client.
pub async fn create_account(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<CreateCurrentAccountRequest>,
) -> Result<(StatusCode, Json<CurrentAccountDetail>), AppError> {
    let account = current_account_service::create(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// Overdue statuses are refreshed before listing.
pub async fn list_accounts(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(filter): Query<CurrentAccountFilter>,
) -> Result<Json<Vec<CurrentAccount>>, AppError> {
    Ok(Json(current_account_service::list(&pool, &tenant, filter).await?))
}

pub async fn get_account(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<CurrentAccountDetail>, AppError> {
    Ok(Json(current_account_service::get(&pool, &tenant, id).await?))
}

/// Register a payment.
///
/// # Request Body
///
/// ```json
/// {
///   "amount_cents": 30000000,
///   "method": "CASH",
///   "installment_number": 3,
///   "reference": "REC-0042"
/// }
/// ```
///
/// The payment goes to `installment_number` (default: oldest unpaid).
/// Whatever exceeds that installment's balance is applied to the next
/// unpaid installments in order.
///
/// # Response
///
/// - **201 Created**: payment, per-installment allocations, new account
///   status and remaining balance
/// - **409**: a completed payment with the same method and reference exists
/// - **422**: account cancelled or paid off, or amount above the balance
pub async fn register_payment(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<RegisterPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentReceipt>), AppError> {
    let receipt = current_account_service::register_payment(&pool, &tenant, id, request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Reverse a payment's allocations and recompute statuses.
pub async fn annul_payment(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path((id, payment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CurrentAccountDetail>, AppError> {
    Ok(Json(
        current_account_service::annul_payment(&pool, &tenant, id, payment_id).await?,
    ))
}

pub async fn cancel_account(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<CancelAccountRequest>,
) -> Result<Json<CurrentAccountDetail>, AppError> {
    Ok(Json(current_account_service::cancel(&pool, &tenant, id, request).await?))
}
