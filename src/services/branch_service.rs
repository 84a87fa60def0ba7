//! Branch (sucursal) management.

use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::validation,
    error::AppError,
    middleware::tenant::Tenant,
    models::branch::{Branch, CreateBranchRequest, UpdateBranchRequest},
    services::ordering::{self, Sortable},
};

const DUPLICATE: &str = "a branch with that name already exists";
const IN_USE: &str = "branch still has motorcycles or petty cash assigned";

pub async fn list(pool: &DbPool, tenant: &Tenant) -> Result<Vec<Branch>, AppError> {
    let branches = sqlx::query_as::<_, Branch>(
        "SELECT * FROM branches WHERE organization_id = $1 ORDER BY display_order, name",
    )
    .bind(tenant.organization_id)
    .fetch_all(pool)
    .await?;
    Ok(branches)
}

pub async fn get(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<Branch, AppError> {
    sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(tenant.organization_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Branch"))
}

/// New branches go to the end of the display order.
pub async fn create(
    pool: &DbPool,
    tenant: &Tenant,
    request: CreateBranchRequest,
) -> Result<Branch, AppError> {
    tenant.require_admin()?;

    let name = validation::required_name("name", &request.name)?;
    let address = validation::optional_text("address", request.address)?;
    let phone = validation::optional_text("phone", request.phone)?;
    let position = ordering::next_position(pool, Sortable::Branches, tenant.organization_id).await?;

    let branch = sqlx::query_as::<_, Branch>(
        r#"
        INSERT INTO branches (organization_id, name, address, phone, display_order)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(tenant.organization_id)
    .bind(&name)
    .bind(&address)
    .bind(&phone)
    .bind(position)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE, IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, branch_id = %branch.id, "branch created");
    Ok(branch)
}

pub async fn update(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: UpdateBranchRequest,
) -> Result<Branch, AppError> {
    tenant.require_admin()?;

    let current = get(pool, tenant, id).await?;
    let name = match request.name {
        Some(name) => validation::required_name("name", &name)?,
        None => current.name,
    };
    let address = match request.address {
        Some(address) => validation::optional_text("address", Some(address))?,
        None => current.address,
    };
    let phone = match request.phone {
        Some(phone) => validation::optional_text("phone", Some(phone))?,
        None => current.phone,
    };

    let branch = sqlx::query_as::<_, Branch>(
        r#"
        UPDATE branches
        SET name = $1, address = $2, phone = $3, updated_at = NOW()
        WHERE id = $4 AND organization_id = $5
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&address)
    .bind(&phone)
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE, IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, branch_id = %id, "branch updated");
    Ok(branch)
}

pub async fn delete(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<(), AppError> {
    tenant.require_admin()?;

    let result = sqlx::query("DELETE FROM branches WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(tenant.organization_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_db(e, DUPLICATE, IN_USE))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Branch"));
    }

    tracing::info!(organization_id = %tenant.organization_id, branch_id = %id, "branch deleted");
    Ok(())
}

pub async fn reorder(pool: &DbPool, tenant: &Tenant, ids: &[Uuid]) -> Result<Vec<Branch>, AppError> {
    tenant.require_admin()?;
    ordering::reorder(pool, Sortable::Branches, tenant.organization_id, ids).await?;
    list(pool, tenant).await
}
