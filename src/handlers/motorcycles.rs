//! Inventory endpoints.
//!
//! - GET/POST /api/v1/motorcycles
//! - POST /api/v1/motorcycles/batch
//! - GET/PATCH/DELETE /api/v1/motorcycles/{id}
//! - POST /api/v1/motorcycles/{id}/state
//! - POST/DELETE /api/v1/motorcycles/{id}/reservation
//! - POST /api/v1/motorcycles/{id}/transfer

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
    models::{
        common::Page,
        motorcycle::{
            BatchCreateMotorcyclesRequest, ChangeStateRequest, CreateMotorcycleRequest,
            Motorcycle, MotorcycleFilter, ReserveRequest, TransferRequest,
            UpdateMotorcycleRequest,
        },
    },
    services::motorcycle_service,
};

/// List units.
///
/// # Query Parameters
///
/// - `state`, `branch_id`, `brand_id`, `model_id`: exact filters
/// - `year_from`, `year_to`: inclusive model year range
/// - `search`: chassis, engine number or plate, case-insensitive
/// - `page` (from 1), `per_page` (max 100)
pub async fn list_motorcycles(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(filter): Query<MotorcycleFilter>,
) -> Result<Json<Page<Motorcycle>>, AppError> {
    Ok(Json(motorcycle_service::list(&pool, &tenant, filter).await?))
}

pub async fn get_motorcycle(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<Motorcycle>, AppError> {
    Ok(Json(motorcycle_service::get(&pool, &tenant, id).await?))
}

pub async fn create_motorcycle(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<CreateMotorcycleRequest>,
) -> Result<(StatusCode, Json<Motorcycle>), AppError> {
    let motorcycle = motorcycle_service::create(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(motorcycle)))
}

/// Create up to 50 units of one model in a single transaction. Either all
/// units are stored or none.
pub async fn create_batch(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<BatchCreateMotorcyclesRequest>,
) -> Result<(StatusCode, Json<Vec<Motorcycle>>), AppError> {
    let created = motorcycle_service::create_batch(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_motorcycle(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMotorcycleRequest>,
) -> Result<Json<Motorcycle>, AppError> {
    Ok(Json(motorcycle_service::update(&pool, &tenant, id, request).await?))
}

/// Move a unit to STOCK, PAUSED, PROCESSING or ELIMINATED.
///
/// RESERVED and SOLD are reached through the reservation and sale
/// endpoints. Invalid transitions answer 422.
pub async fn change_state(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<ChangeStateRequest>,
) -> Result<Json<Motorcycle>, AppError> {
    Ok(Json(motorcycle_service::change_state(&pool, &tenant, id, request).await?))
}

pub async fn reserve(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<ReserveRequest>,
) -> Result<Json<Motorcycle>, AppError> {
    Ok(Json(motorcycle_service::reserve(&pool, &tenant, id, request).await?))
}

pub async fn cancel_reservation(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<Motorcycle>, AppError> {
    Ok(Json(motorcycle_service::cancel_reservation(&pool, &tenant, id).await?))
}

pub async fn transfer(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<Motorcycle>, AppError> {
    Ok(Json(motorcycle_service::transfer(&pool, &tenant, id, request).await?))
}

pub async fn delete_motorcycle(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    motorcycle_service::delete(&pool, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
