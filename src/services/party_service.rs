//! Clients and suppliers.
//!
//! Both are identified inside an organization by their tax id (DNI or
//! CUIT/CUIL). They are never hard-deleted while referenced; set them
//! `INACTIVE` instead.

use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::validation,
    error::AppError,
    middleware::tenant::Tenant,
    models::{
        common::{Page, RecordStatus},
        party::{
            Client, CreateClientRequest, CreateSupplierRequest, PartyFilter, Supplier,
            UpdateClientRequest, UpdateSupplierRequest,
        },
    },
};

const DUPLICATE_CLIENT: &str = "a client with that tax id already exists";
const CLIENT_IN_USE: &str = "client has motorcycles or current accounts; set it INACTIVE instead";
const DUPLICATE_SUPPLIER: &str = "a supplier with that tax id already exists";
const SUPPLIER_IN_USE: &str = "supplier is referenced by motorcycles; set it INACTIVE instead";

/// `%term%` for ILIKE, with LIKE metacharacters escaped.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let term = search.map(str::trim).filter(|s| !s.is_empty())?;
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    Some(format!("%{escaped}%"))
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

pub async fn list_clients(
    pool: &DbPool,
    tenant: &Tenant,
    filter: PartyFilter,
) -> Result<Page<Client>, AppError> {
    let (limit, offset) = validation::pagination(filter.page, filter.per_page);
    let pattern = search_pattern(filter.search.as_deref());

    const WHERE: &str = r#"
        WHERE organization_id = $1
          AND ($2::text IS NULL OR status = $2)
          AND ($3::text IS NULL
               OR first_name ILIKE $3 OR last_name ILIKE $3
               OR (first_name || ' ' || last_name) ILIKE $3
               OR tax_id ILIKE $3)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM clients {WHERE}"))
        .bind(tenant.organization_id)
        .bind(filter.status)
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, Client>(&format!(
        "SELECT * FROM clients {WHERE} ORDER BY last_name, first_name LIMIT $4 OFFSET $5"
    ))
    .bind(tenant.organization_id)
    .bind(filter.status)
    .bind(&pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(Page {
        items,
        total,
        page: offset / limit + 1,
        per_page: limit,
    })
}

pub async fn get_client(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<Client, AppError> {
    sqlx::query_as::<_, Client>("SELECT * FROM clients WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(tenant.organization_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Client"))
}

pub async fn create_client(
    pool: &DbPool,
    tenant: &Tenant,
    request: CreateClientRequest,
) -> Result<Client, AppError> {
    let first_name = validation::required_name("first_name", &request.first_name)?;
    let last_name = validation::required_name("last_name", &request.last_name)?;
    let tax_id = validation::tax_id(&request.tax_id)?;
    let email = validation::optional_email(request.email)?;
    let phone = validation::optional_text("phone", request.phone)?;
    let address = validation::optional_text("address", request.address)?;
    let notes = validation::optional_text("notes", request.notes)?;

    let client = sqlx::query_as::<_, Client>(
        r#"
        INSERT INTO clients (organization_id, first_name, last_name, tax_id, email, phone, address, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(tenant.organization_id)
    .bind(&first_name)
    .bind(&last_name)
    .bind(&tax_id)
    .bind(&email)
    .bind(&phone)
    .bind(&address)
    .bind(&notes)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_CLIENT, CLIENT_IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, client_id = %client.id, "client created");
    Ok(client)
}

pub async fn update_client(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: UpdateClientRequest,
) -> Result<Client, AppError> {
    let current = get_client(pool, tenant, id).await?;

    let first_name = match request.first_name {
        Some(v) => validation::required_name("first_name", &v)?,
        None => current.first_name,
    };
    let last_name = match request.last_name {
        Some(v) => validation::required_name("last_name", &v)?,
        None => current.last_name,
    };
    let tax_id = match request.tax_id {
        Some(v) => validation::tax_id(&v)?,
        None => current.tax_id,
    };
    let email = match request.email {
        Some(v) => validation::optional_email(Some(v))?,
        None => current.email,
    };
    let phone = match request.phone {
        Some(v) => validation::optional_text("phone", Some(v))?,
        None => current.phone,
    };
    let address = match request.address {
        Some(v) => validation::optional_text("address", Some(v))?,
        None => current.address,
    };
    let notes = match request.notes {
        Some(v) => validation::optional_text("notes", Some(v))?,
        None => current.notes,
    };
    let status = request.status.unwrap_or(current.status);

    let client = sqlx::query_as::<_, Client>(
        r#"
        UPDATE clients
        SET first_name = $1, last_name = $2, tax_id = $3, email = $4, phone = $5,
            address = $6, notes = $7, status = $8, updated_at = NOW()
        WHERE id = $9 AND organization_id = $10
        RETURNING *
        "#,
    )
    .bind(&first_name)
    .bind(&last_name)
    .bind(&tax_id)
    .bind(&email)
    .bind(&phone)
    .bind(&address)
    .bind(&notes)
    .bind(status)
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_CLIENT, CLIENT_IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, client_id = %id, "client updated");
    Ok(client)
}

pub async fn delete_client(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<(), AppError> {
    tenant.require_manager()?;

    let result = sqlx::query("DELETE FROM clients WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(tenant.organization_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_db(e, DUPLICATE_CLIENT, CLIENT_IN_USE))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Client"));
    }

    tracing::info!(organization_id = %tenant.organization_id, client_id = %id, "client deleted");
    Ok(())
}

/// Clients that can be sold to or financed.
pub async fn require_active_client(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<Client, AppError> {
    let client = get_client(pool, tenant, id).await?;
    if client.status != RecordStatus::Active {
        return Err(AppError::InvalidStateTransition(format!(
            "client {} is inactive",
            client.full_name()
        )));
    }
    Ok(client)
}

// ---------------------------------------------------------------------------
// Suppliers
// ---------------------------------------------------------------------------

pub async fn list_suppliers(
    pool: &DbPool,
    tenant: &Tenant,
    filter: PartyFilter,
) -> Result<Page<Supplier>, AppError> {
    let (limit, offset) = validation::pagination(filter.page, filter.per_page);
    let pattern = search_pattern(filter.search.as_deref());

    const WHERE: &str = r#"
        WHERE organization_id = $1
          AND ($2::text IS NULL OR status = $2)
          AND ($3::text IS NULL
               OR legal_name ILIKE $3 OR trade_name ILIKE $3 OR tax_id ILIKE $3)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM suppliers {WHERE}"))
        .bind(tenant.organization_id)
        .bind(filter.status)
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

    let items = sqlx::query_as::<_, Supplier>(&format!(
        "SELECT * FROM suppliers {WHERE} ORDER BY legal_name LIMIT $4 OFFSET $5"
    ))
    .bind(tenant.organization_id)
    .bind(filter.status)
    .bind(&pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(Page {
        items,
        total,
        page: offset / limit + 1,
        per_page: limit,
    })
}

pub async fn get_supplier(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<Supplier, AppError> {
    sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(tenant.organization_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Supplier"))
}

pub async fn create_supplier(
    pool: &DbPool,
    tenant: &Tenant,
    request: CreateSupplierRequest,
) -> Result<Supplier, AppError> {
    tenant.require_manager()?;

    let legal_name = validation::required_name("legal_name", &request.legal_name)?;
    let trade_name = validation::optional_text("trade_name", request.trade_name)?;
    let tax_id = validation::tax_id(&request.tax_id)?;
    let contact_name = validation::optional_text("contact_name", request.contact_name)?;
    let email = validation::optional_email(request.email)?;
    let phone = validation::optional_text("phone", request.phone)?;
    let address = validation::optional_text("address", request.address)?;
    let notes = validation::optional_text("notes", request.notes)?;

    let supplier = sqlx::query_as::<_, Supplier>(
        r#"
        INSERT INTO suppliers (organization_id, legal_name, trade_name, tax_id, contact_name,
                               email, phone, address, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(tenant.organization_id)
    .bind(&legal_name)
    .bind(&trade_name)
    .bind(&tax_id)
    .bind(&contact_name)
    .bind(&email)
    .bind(&phone)
    .bind(&address)
    .bind(&notes)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_SUPPLIER, SUPPLIER_IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, supplier_id = %supplier.id, "supplier created");
    Ok(supplier)
}

pub async fn update_supplier(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: UpdateSupplierRequest,
) -> Result<Supplier, AppError> {
    tenant.require_manager()?;

    let current = get_supplier(pool, tenant, id).await?;
    let legal_name = match request.legal_name {
        Some(v) => validation::required_name("legal_name", &v)?,
        None => current.legal_name,
    };
    let trade_name = match request.trade_name {
        Some(v) => validation::optional_text("trade_name", Some(v))?,
        None => current.trade_name,
    };
    let tax_id = match request.tax_id {
        Some(v) => validation::tax_id(&v)?,
        None => current.tax_id,
    };
    let contact_name = match request.contact_name {
        Some(v) => validation::optional_text("contact_name", Some(v))?,
        None => current.contact_name,
    };
    let email = match request.email {
        Some(v) => validation::optional_email(Some(v))?,
        None => current.email,
    };
    let phone = match request.phone {
        Some(v) => validation::optional_text("phone", Some(v))?,
        None => current.phone,
    };
    let address = match request.address {
        Some(v) => validation::optional_text("address", Some(v))?,
        None => current.address,
    };
    let notes = match request.notes {
        Some(v) => validation::optional_text("notes", Some(v))?,
        None => current.notes,
    };
    let status = request.status.unwrap_or(current.status);

    let supplier = sqlx::query_as::<_, Supplier>(
        r#"
        UPDATE suppliers
        SET legal_name = $1, trade_name = $2, tax_id = $3, contact_name = $4, email = $5,
            phone = $6, address = $7, notes = $8, status = $9, updated_at = NOW()
        WHERE id = $10 AND organization_id = $11
        RETURNING *
        "#,
    )
    .bind(&legal_name)
    .bind(&trade_name)
    .bind(&tax_id)
    .bind(&contact_name)
    .bind(&email)
    .bind(&phone)
    .bind(&address)
    .bind(&notes)
    .bind(status)
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_SUPPLIER, SUPPLIER_IN_USE))?;

    tracing::info!(organization_id = %tenant.organization_id, supplier_id = %id, "supplier updated");
    Ok(supplier)
}

pub async fn delete_supplier(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<(), AppError> {
    tenant.require_manager()?;

    let result = sqlx::query("DELETE FROM suppliers WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(tenant.organization_id)
        .execute(pool)
        .await
        .map_err(|e| AppError::from_db(e, DUPLICATE_SUPPLIER, SUPPLIER_IN_USE))?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Supplier"));
    }

    tracing::info!(organization_id = %tenant.organization_id, supplier_id = %id, "supplier deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("   ")), None);
        assert_eq!(search_pattern(Some(" perez ")), Some("%perez%".to_string()));
        assert_eq!(search_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
    }
}
