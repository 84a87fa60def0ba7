//! Sale endpoints.
//!
//! - POST /api/v1/sales - Sell a unit, optionally financed
//! - GET /api/v1/sales - Sold units in a date range

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};

use crate::{
    db::DbPool,
    error::AppError,
    middleware::tenant::Tenant,
    models::sale::{CreateSaleRequest, SaleFilter, SaleResponse, SaleSummary},
    services::sale_service,
};

/// Sell a motorcycle.
///
/// # Request Body
///
/// See [`CreateSaleRequest`]. `financing` is required when
/// `payment_type` is `FINANCED` and rejected otherwise.
///
/// # Response
///
/// - **201 Created**: the sale, plus the current account and its schedule
///   for financed sales
/// - **404**: unit or client not found in the organization
/// - **422**: unit not in STOCK, or reserved for another client
///
/// # Concurrency
///
/// The unit row is locked (`SELECT ... FOR UPDATE`) until the sale and its
/// account are committed, so two concurrent sales of one unit cannot both
/// succeed.
pub async fn create_sale(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleResponse>), AppError> {
    let sale = sale_service::create(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// `from` and `to` are inclusive; they default to the beginning of time
/// and today.
pub async fn list_sales(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(filter): Query<SaleFilter>,
) -> Result<Json<Vec<SaleSummary>>, AppError> {
    Ok(Json(sale_service::list(&pool, &tenant, filter).await?))
}
