//! Brands and their models.
//!
//! Models carry no organization column. Every model query joins its brand
//! and filters on the brand's `organization_id`.

use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::validation,
    error::AppError,
    middleware::tenant::Tenant,
    models::catalog::{
        Brand, BrandWithModels, CreateBrandRequest, CreateModelRequest, MotorcycleModel,
        UpdateBrandRequest, UpdateModelRequest,
    },
    services::ordering::{self, Sortable},
};

const DUPLICATE_BRAND: &str = "a brand with that name already exists";
const BRAND_IN_USE: &str = "brand still has models or motorcycles";
const DUPLICATE_MODEL: &str = "the brand already has a model with that name";
const MODEL_IN_USE: &str = "model is referenced by motorcycles";

pub async fn list_brands(pool: &DbPool, tenant: &Tenant) -> Result<Vec<Brand>, AppError> {
    let brands = sqlx::query_as::<_, Brand>(
        "SELECT * FROM brands WHERE organization_id = $1 ORDER BY display_order, name",
    )
    .bind(tenant.organization_id)
    .fetch_all(pool)
    .await?;
    Ok(brands)
}

pub async fn get_brand(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<Brand, AppError> {
    sqlx::query_as::<_, Brand>("SELECT * FROM brands WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(tenant.organization_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Brand"))
}

pub async fn get_brand_with_models(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
) -> Result<BrandWithModels, AppError> {
    let brand = get_brand(pool, tenant, id).await?;
    let models = list_models(pool, tenant, id).await?;
    Ok(BrandWithModels { brand, models })
}

pub async fn create_brand(
    pool: &DbPool,
    tenant: &Tenant,
    request: CreateBrandRequest,
) -> Result<Brand, AppError> {
    tenant.require_manager()?;

    let name = validation::required_name("name", &request.name)?;
    let color = validation::hex_color(request.color)?;
    let position = ordering::next_position(pool, Sortable::Brands, tenant.organization_id).await?;

    let brand = sqlx::query_as::<_, Brand>(
        r#"
        INSERT INTO brands (organization_id, name, color, display_order)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(tenant.organization_id)
    .bind(&name)
    .bind(&color)
    .bind(position)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_BRAND, BRAND_IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, brand_id = %brand.id, "brand created");
    Ok(brand)
}

pub async fn update_brand(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: UpdateBrandRequest,
) -> Result<Brand, AppError> {
    tenant.require_manager()?;

    let current = get_brand(pool, tenant, id).await?;
    let name = match request.name {
        Some(name) => validation::required_name("name", &name)?,
        None => current.name,
    };
    let color = match request.color {
        Some(color) => validation::hex_color(Some(color))?,
        None => current.color,
    };

    let brand = sqlx::query_as::<_, Brand>(
        r#"
        UPDATE brands SET name = $1, color = $2, updated_at = NOW()
        WHERE id = $3 AND organization_id = $4
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&color)
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_BRAND, BRAND_IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, brand_id = %id, "brand updated");
    Ok(brand)
}

pub async fn delete_brand(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<(), AppError> {
    tenant.require_manager()?;

    let result = sqlx::query("DELETE FROM brands WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(tenant.organization_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_db(e, DUPLICATE_BRAND, BRAND_IN_USE))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Brand"));
    }

    tracing::info!(organization_id = %tenant.organization_id, brand_id = %id, "brand deleted");
    Ok(())
}

pub async fn reorder_brands(pool: &DbPool, tenant: &Tenant, ids: &[Uuid]) -> Result<Vec<Brand>, AppError> {
    tenant.require_manager()?;
    ordering::reorder(pool, Sortable::Brands, tenant.organization_id, ids).await?;
    list_brands(pool, tenant).await
}

pub async fn list_models(
    pool: &DbPool,
    tenant: &Tenant,
    brand_id: Uuid,
) -> Result<Vec<MotorcycleModel>, AppError> {
    let models = sqlx::query_as::<_, MotorcycleModel>(
        r#"
        SELECT m.*
        FROM models m
        JOIN brands b ON b.id = m.brand_id
        WHERE m.brand_id = $1 AND b.organization_id = $2
        ORDER BY m.name
        "#,
    )
    .bind(brand_id)
    .bind(tenant.organization_id)
    .fetch_all(pool)
    .await?;
    Ok(models)
}

pub async fn get_model(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<MotorcycleModel, AppError> {
    sqlx::query_as::<_, MotorcycleModel>(
        r#"
        SELECT m.*
        FROM models m
        JOIN brands b ON b.id = m.brand_id
        WHERE m.id = $1 AND b.organization_id = $2
        "#,
    )
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Model"))
}

pub async fn create_model(
    pool: &DbPool,
    tenant: &Tenant,
    brand_id: Uuid,
    request: CreateModelRequest,
) -> Result<MotorcycleModel, AppError> {
    tenant.require_manager()?;

    // The brand lookup is the tenant check for the new model.
    get_brand(pool, tenant, brand_id).await?;
    let name = validation::required_name("name", &request.name)?;
    let image_key = validation::optional_text("image_key", request.image_key)?;
    let spec_sheet_key = validation::optional_text("spec_sheet_key", request.spec_sheet_key)?;

    let model = sqlx::query_as::<_, MotorcycleModel>(
        r#"
        INSERT INTO models (brand_id, name, image_key, spec_sheet_key)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(brand_id)
    .bind(&name)
    .bind(&image_key)
    .bind(&spec_sheet_key)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_MODEL, MODEL_IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, model_id = %model.id, "model created");
    Ok(model)
}

pub async fn update_model(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: UpdateModelRequest,
) -> Result<MotorcycleModel, AppError> {
    tenant.require_manager()?;

    let current = get_model(pool, tenant, id).await?;
    let name = match request.name {
        Some(name) => validation::required_name("name", &name)?,
        None => current.name,
    };
    let image_key = match request.image_key {
        Some(key) => validation::optional_text("image_key", Some(key))?,
        None => current.image_key,
    };
    let spec_sheet_key = match request.spec_sheet_key {
        Some(key) => validation::optional_text("spec_sheet_key", Some(key))?,
        None => current.spec_sheet_key,
    };

    let model = sqlx::query_as::<_, MotorcycleModel>(
        r#"
        UPDATE models
        SET name = $1, image_key = $2, spec_sheet_key = $3, updated_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(&name)
    .bind(&image_key)
    .bind(&spec_sheet_key)
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_MODEL, MODEL_IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, model_id = %id, "model updated");
    Ok(model)
}

pub async fn delete_model(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<(), AppError> {
    tenant.require_manager()?;

    let result = sqlx::query(
        r#"
        DELETE FROM models m
        USING brands b
        WHERE m.id = $1 AND b.id = m.brand_id AND b.organization_id = $2
        "#,
    )
    .bind(id)
    .bind(tenant.organization_id)
    .execute(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_MODEL, MODEL_IN_USE))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Model"));
    }

    tracing::info!(organization_id = %tenant.organization_id, model_id = %id, "model deleted");
    Ok(())
}
