//! Client and supplier endpoints.
//!
//! - GET/POST /api/v1/clients, GET/PATCH/DELETE /api/v1/clients/{id}
//! - GET/POST /api/v1/suppliers, GET/PATCH/DELETE /api/v1/suppliers/{id}
//!
//! Listings accept `search`, `status`, `page` and `per_page`.

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
        party::{
            Client, CreateClientRequest, CreateSupplierRequest, PartyFilter, Supplier,
            UpdateClientRequest, UpdateSupplierRequest,
        },
    },
    services::party_service,
};

pub async fn list_clients(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(filter): Query<PartyFilter>,
) -> Result<Json<Page<Client>>, AppError> {
    Ok(Json(party_service::list_clients(&pool, &tenant, filter).await?))
}

pub async fn get_client(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<Client>, AppError> {
    Ok(Json(party_service::get_client(&pool, &tenant, id).await?))
}

/// 409 when the tax id is already registered in the organization.
pub async fn create_client(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<CreateClientRequest>,
) -> Result<(StatusCode, Json<Client>), AppError> {
    let client = party_service::create_client(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClientRequest>,
) -> Result<Json<Client>, AppError> {
    Ok(Json(party_service::update_client(&pool, &tenant, id, request).await?))
}

/// Clients with sales, reservations or accounts cannot be deleted (409);
/// set them INACTIVE instead.
pub async fn delete_client(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    party_service::delete_client(&pool, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_suppliers(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(filter): Query<PartyFilter>,
) -> Result<Json<Page<Supplier>>, AppError> {
    Ok(Json(party_service::list_suppliers(&pool, &tenant, filter).await?))
}

pub async fn get_supplier(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<Json<Supplier>, AppError> {
    Ok(Json(party_service::get_supplier(&pool, &tenant, id).await?))
}

pub async fn create_supplier(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<Supplier>), AppError> {
    let supplier = party_service::create_supplier(&pool, &tenant, request).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSupplierRequest>,
) -> Result<Json<Supplier>, AppError> {
    Ok(Json(party_service::update_supplier(&pool, &tenant, id, request).await?))
}

pub async fn delete_supplier(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    party_service::delete_supplier(&pool, &tenant, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
