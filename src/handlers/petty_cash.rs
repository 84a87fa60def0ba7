//! Petty cash endpoints.
//!
//! - GET/POST /api/v1/petty-cash/deposits
//! - GET /api/v1/petty-cash/deposits/{id}
//! - POST /api/v1/petty-cash/deposits/{id}/close
//! - POST /api/v1/petty-cash/deposits/{id}/withdrawals
//! - POST /api/v1/petty-cash/withdrawals/{id}/spends
//! - DELETE /api/v1/petty-cash/spends/{id}
//! - GET /api/v1/petty-cash/balance

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
    models::petty_cash::{
        CreateDepositRequest, CreateSpendRequest, CreateWithdrawalRequest, DepositDetail,
        DepositFilter, PettyCashBalance, PettyCashDeposit, PettyCashSpend, PettyCashWithdrawal,
    },
    services::petty_cash_service,
};

pub async fn list_deposits(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(filter): Query<DepositFilter>,
) -> Result<Json<Vec<PettyCashDeposit>>, AppError> {
    Ok(Json(petty_cash_service::list_deposits(&pool, &tenant, filter).await?))
}

pub async fn create_deposit(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<CreateDepositRequest>,
) -> Result<(StatusCode, Json<PettyCashDeposit>), AppError> {
    let deposit = petty_cash_service::create_deposit(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(deposit)))
}

/// Deposit with every withdrawal and its spends.
pub async fn get_deposit(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<DepositDetail>, AppError> {
    Ok(Json(petty_cash_service::get_deposit(&pool, &tenant, id).await?))
}

/// 422 while any withdrawal is not fully justified.
pub async fn close_deposit(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<PettyCashDeposit>, AppError> {
    Ok(Json(petty_cash_service::close_deposit(&pool, &tenant, id).await?))
}

/// Hand cash from an open deposit to a user.
///
/// # Request Body
///
/// ```json
/// { "recipient_id": "…", "amount_cents": 2000000 }
/// ```
///
/// # Response
///
/// - **201 Created**: the withdrawal, PENDING_JUSTIFICATION
/// - **422**: deposit closed, or amount above what is left in it
pub async fn create_withdrawal(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(deposit_id): Path<Uuid>,
    Json(request): Json<CreateWithdrawalRequest>,
) -> Result<(StatusCode, Json<PettyCashWithdrawal>), AppError> {
    let withdrawal = petty_cash_service::create_withdrawal(&pool, &tenant, deposit_id, request).await?;
    Ok((StatusCode::CREATED, Json(withdrawal)))
}

pub async fn create_spend(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(withdrawal_id): Path<Uuid>,
    Json(request): Json<CreateSpendRequest>,
) -> Result<(StatusCode, Json<PettyCashSpend>), AppError> {
    let spend = petty_cash_service::create_spend(&pool, &tenant, withdrawal_id, request).await?;
    Ok((StatusCode::CREATED, Json(spend)))
}

pub async fn delete_spend(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    petty_cash_service::delete_spend(&pool, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn balances(
    State(pool): State<DbPool>,
    tenant: Tenant,
) -> Result<Json<Vec<PettyCashBalance>>, AppError> {
    Ok(Json(petty_cash_service::balances(&pool, &tenant).await?))
}
