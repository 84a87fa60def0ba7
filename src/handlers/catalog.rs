//! Brand and model endpoints.
//!
//! - GET/POST /api/v1/brands, PUT /api/v1/brands/order
//! - GET/PATCH/DELETE /api/v1/brands/{id}
//! - GET/POST /api/v1/brands/{id}/models
//! - GET/PATCH/DELETE /api/v1/models/{id}

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
        catalog::{
            Brand, BrandWithModels, CreateBrandRequest, CreateModelRequest, MotorcycleModel,
            UpdateBrandRequest, UpdateModelRequest,
        },
        common::ReorderRequest,
    },
    services::catalog_service,
};

pub async fn list_brands(
    State(pool): State<DbPool>,
    tenant: Tenant,
) -> Result<Json<Vec<Brand>>, AppError> {
    Ok(Json(catalog_service::list_brands(&pool, &tenant).await?))
}

/// Brand with its models.
pub async fn get_brand(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<BrandWithModels>, AppError> {
    Ok(Json(catalog_service::get_brand_with_models(&pool, &tenant, id).await?))
}

pub async fn create_brand(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<CreateBrandRequest>,
) -> Result<(StatusCode, Json<Brand>), AppError> {
    let brand = catalog_service::create_brand(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(brand)))
}

pub async fn update_brand(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateBrandRequest>,
) -> Result<Json<Brand>, AppError> {
    Ok(Json(catalog_service::update_brand(&pool, &tenant, id, request).await?))
}

pub async fn delete_brand(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog_service::delete_brand(&pool, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reorder_brands(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<ReorderRequest>,
) -> Result<Json<Vec<Brand>>, AppError> {
    Ok(Json(catalog_service::reorder_brands(&pool, &tenant, &request.ids).await?))
}

pub async fn list_models(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(brand_id): Path<Uuid>,
) -> Result<Json<Vec<MotorcycleModel>>, AppError> {
    Ok(Json(catalog_service::list_models(&pool, &tenant, brand_id).await?))
}

pub async fn create_model(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(brand_id): Path<Uuid>,
    Json(request): Json<CreateModelRequest>,
) -> Result<(StatusCode, Json<MotorcycleModel>), AppError> {
    let model = catalog_service::create_model(&pool, &tenant, brand_id, request).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

pub async fn get_model(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<MotorcycleModel>, AppError> {
    Ok(Json(catalog_service::get_model(&pool, &tenant, id).await?))
}

pub async fn update_model(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateModelRequest>,
) -> Result<Json<MotorcycleModel>, AppError> {
    Ok(Json(catalog_service::update_model(&pool, &tenant, id, request).await?))
}

pub async fn delete_model(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    catalog_service::delete_model(&pool, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
