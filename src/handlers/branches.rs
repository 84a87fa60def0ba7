//! Branch (sucursal) endpoints.
//!
//! - GET/POST /api/v1/branches
//! - GET/PATCH/DELETE /api/v1/branches/{id}
//! - PUT /api/v1/branches/order

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::tenant::Tenant,
    models::{
        branch::{Branch, CreateBranchRequest, UpdateBranchRequest},
        common::ReorderRequest,
    },
    services::branch_service,
};

pub async fn list_branches(
    State(pool): State<DbPool>,
    tenant: Tenant,
) -> Result<Json<Vec<Branch>>, AppError> {
    Ok(Json(branch_service::list(&pool, &tenant).await?))
}

pub async fn get_branch(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<Branch>, AppError> {
    Ok(Json(branch_service::get(&pool, &tenant, id).await?))
}

/// New branches go last in display order.
pub async fn create_branch(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<CreateBranchRequest>,
) -> Result<(StatusCode, Json<Branch>), AppError> {
    let branch = branch_service::create(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(branch)))
}

pub async fn update_branch(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBranchRequest>,
) -> Result<Json<Branch>, AppError> {
    Ok(Json(branch_service::update(&pool, &tenant, id, request).await?))
}

/// 409 while motorcycles or petty cash still reference the branch.
pub async fn delete_branch(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    branch_service::delete(&pool, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Replace the display order.
///
/// # Request Body
///
/// Every branch id of the organization, in the new order:
///
/// ```json
/// { "ids": ["3f6c…", "a81d…", "07be…"] }
/// ```
///
/// # Response
///
/// - **200 OK**: branches in their new order
/// - **400**: ids missing, repeated, or not all of the organization's
pub async fn reorder_branches(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<Branch>>, AppError> {
    Ok(Json(branch_service::reorder(&pool, &tenant, &request.ids).await?))
}
