//! Motorcycle inventory.
//!
//! # State changes
//!
//! Every operation that changes a unit's state locks its row with
//! `SELECT ... FOR UPDATE` inside a transaction, checks the transition with
//! [`MotorcycleState::can_transition_to`] and only then writes. Sales go
//! through `sale_service`, which uses the same lock.

use sqlx::{PgConnection, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::{inventory::MotorcycleState, validation},
    error::AppError,
    middleware::tenant::Tenant,
    models::{
        common::Page,
        motorcycle::{
            BatchCreateMotorcyclesRequest, ChangeStateRequest, CreateMotorcycleRequest,
            Motorcycle, MotorcycleFilter, ReserveRequest, TransferRequest, UpdateMotorcycleRequest,
        },
        user::UserRole,
    },
    services::party_service,
};

/// Largest batch accepted by [`create_batch`].
pub const MAX_BATCH_UNITS: usize = 50;

const DUPLICATE: &str = "chassis or engine number already registered";
const IN_USE: &str = "motorcycle is referenced by a current account";

/// Request fields after normalization.
#[derive(Debug, Clone)]
struct NewMotorcycle {
    branch_id: Uuid,
    brand_id: Uuid,
    model_id: Uuid,
    supplier_id: Option<Uuid>,
    year: i32,
    chassis_number: String,
    engine_number: Option<String>,
    color: Option<String>,
    mileage_km: i32,
    license_plate: Option<String>,
    cost_price_cents: i64,
    retail_price_cents: i64,
    wholesale_price_cents: Option<i64>,
    currency: String,
    image_key: Option<String>,
    observations: Option<String>,
}

fn optional_identifier(field: &str, value: Option<String>) -> Result<Option<String>, AppError> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => validation::identifier(field, v).map(Some),
    }
}

fn currency(value: &str) -> Result<String, AppError> {
    let code = value.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(AppError::InvalidRequest(format!(
            "'{value}' is not a three-letter currency code"
        )));
    }
    Ok(code)
}

fn mileage(value: i32) -> Result<i32, AppError> {
    if value < 0 {
        return Err(AppError::InvalidRequest(
            "mileage_km must not be negative".to_string(),
        ));
    }
    Ok(value)
}

fn optional_cents(field: &str, value: Option<i64>) -> Result<Option<i64>, AppError> {
    value
        .map(|v| validation::non_negative_cents(field, v))
        .transpose()
}

fn normalize(request: CreateMotorcycleRequest) -> Result<NewMotorcycle, AppError> {
    Ok(NewMotorcycle {
        branch_id: request.branch_id,
        brand_id: request.brand_id,
        model_id: request.model_id,
        supplier_id: request.supplier_id,
        year: validation::model_year(request.year)?,
        chassis_number: validation::identifier("chassis_number", &request.chassis_number)?,
        engine_number: optional_identifier("engine_number", request.engine_number)?,
        color: validation::optional_text("color", request.color)?,
        mileage_km: mileage(request.mileage_km)?,
        license_plate: optional_identifier("license_plate", request.license_plate)?,
        cost_price_cents: validation::non_negative_cents("cost_price_cents", request.cost_price_cents)?,
        retail_price_cents: validation::non_negative_cents(
            "retail_price_cents",
            request.retail_price_cents,
        )?,
        wholesale_price_cents: optional_cents("wholesale_price_cents", request.wholesale_price_cents)?,
        currency: currency(&request.currency)?,
        image_key: validation::optional_text("image_key", request.image_key)?,
        observations: validation::optional_text("observations", request.observations)?,
    })
}

/// Chassis and engine numbers must not repeat inside one batch.
fn check_batch_duplicates(units: &[NewMotorcycle]) -> Result<(), AppError> {
    let mut seen = std::collections::HashSet::new();
    for unit in units {
        if !seen.insert(format!("c:{}", unit.chassis_number)) {
            return Err(AppError::InvalidRequest(format!(
                "chassis number {} appears twice in the batch",
                unit.chassis_number
            )));
        }
        if let Some(engine) = &unit.engine_number {
            if !seen.insert(format!("e:{engine}")) {
                return Err(AppError::InvalidRequest(format!(
                    "engine number {engine} appears twice in the batch"
                )));
            }
        }
    }
    Ok(())
}

/// Foreign keys cannot tell tenants apart, so every referenced row is
/// checked against the caller's organization.
async fn check_references(
    conn: &mut PgConnection,
    organization_id: Uuid,
    branch_id: Uuid,
    brand_id: Uuid,
    model_id: Uuid,
    supplier_id: Option<Uuid>,
) -> Result<(), AppError> {
    let (branch_ok, brand_ok, model_ok, supplier_ok): (bool, bool, bool, bool) = sqlx::query_as(
        r#"
        SELECT
            EXISTS(SELECT 1 FROM branches WHERE id = $1 AND organization_id = $5),
            EXISTS(SELECT 1 FROM brands WHERE id = $2 AND organization_id = $5),
            EXISTS(SELECT 1 FROM models WHERE id = $3 AND brand_id = $2),
            ($4::uuid IS NULL OR EXISTS(
                SELECT 1 FROM suppliers WHERE id = $4 AND organization_id = $5))
        "#,
    )
    .bind(branch_id)
    .bind(brand_id)
    .bind(model_id)
    .bind(supplier_id)
    .bind(organization_id)
    .fetch_one(&mut *conn)
    .await?;

    if !branch_ok {
        return Err(AppError::NotFound("Branch"));
    }
    if !brand_ok {
        return Err(AppError::NotFound("Brand"));
    }
    if !model_ok {
        return Err(AppError::InvalidRequest(
            "model does not belong to the selected brand".to_string(),
        ));
    }
    if !supplier_ok {
        return Err(AppError::NotFound("Supplier"));
    }
    Ok(())
}

async fn insert(
    conn: &mut PgConnection,
    organization_id: Uuid,
    unit: &NewMotorcycle,
) -> Result<Motorcycle, AppError> {
    sqlx::query_as::<_, Motorcycle>(
        r#"
        INSERT INTO motorcycles (
            organization_id, branch_id, brand_id, model_id, supplier_id, year,
            chassis_number, engine_number, color, mileage_km, license_plate,
            cost_price_cents, retail_price_cents, wholesale_price_cents, currency,
            image_key, observations
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING *
        "#,
    )
    .bind(organization_id)
    .bind(unit.branch_id)
    .bind(unit.brand_id)
    .bind(unit.model_id)
    .bind(unit.supplier_id)
    .bind(unit.year)
    .bind(&unit.chassis_number)
    .bind(&unit.engine_number)
    .bind(&unit.color)
    .bind(unit.mileage_km)
    .bind(&unit.license_plate)
    .bind(unit.cost_price_cents)
    .bind(unit.retail_price_cents)
    .bind(unit.wholesale_price_cents)
    .bind(&unit.currency)
    .bind(&unit.image_key)
    .bind(&unit.observations)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE, IN_USE))
}

pub async fn create(
    pool: &DbPool,
    tenant: &Tenant,
    request: CreateMotorcycleRequest,
) -> Result<Motorcycle, AppError> {
    tenant.require_manager()?;
    let unit = normalize(request)?;

    let mut tx = pool.begin().await?;
    check_references(
        &mut tx,
        tenant.organization_id,
        unit.branch_id,
        unit.brand_id,
        unit.model_id,
        unit.supplier_id,
    )
    .await?;
    let motorcycle = insert(&mut tx, tenant.organization_id, &unit).await?;
    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        motorcycle_id = %motorcycle.id,
        chassis = %motorcycle.chassis_number,
        "motorcycle created"
    );
    Ok(motorcycle)
}

/// Create 1..=50 units sharing branch, brand, model and prices.
///
/// All or nothing: a duplicate chassis on any unit rolls back the batch.
pub async fn create_batch(
    pool: &DbPool,
    tenant: &Tenant,
    request: BatchCreateMotorcyclesRequest,
) -> Result<Vec<Motorcycle>, AppError> {
    tenant.require_manager()?;

    if request.units.is_empty() || request.units.len() > MAX_BATCH_UNITS {
        return Err(AppError::InvalidRequest(format!(
            "a batch must contain between 1 and {MAX_BATCH_UNITS} units"
        )));
    }

    let units = request
        .into_units()
        .into_iter()
        .map(normalize)
        .collect::<Result<Vec<_>, _>>()?;
    check_batch_duplicates(&units)?;

    let first = &units[0];
    let mut tx = pool.begin().await?;
    check_references(
        &mut tx,
        tenant.organization_id,
        first.branch_id,
        first.brand_id,
        first.model_id,
        first.supplier_id,
    )
    .await?;

    let mut created = Vec::with_capacity(units.len());
    for unit in &units {
        created.push(insert(&mut tx, tenant.organization_id, unit).await?);
    }
    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        count = created.len(),
        model_id = %first.model_id,
        "motorcycle batch created"
    );
    Ok(created)
}

fn push_filters(qb: &mut QueryBuilder<'_, Postgres>, organization_id: Uuid, filter: &MotorcycleFilter) {
    qb.push(" WHERE organization_id = ").push_bind(organization_id);
    if let Some(state) = filter.state {
        qb.push(" AND state = ").push_bind(state);
    }
    if let Some(branch_id) = filter.branch_id {
        qb.push(" AND branch_id = ").push_bind(branch_id);
    }
    if let Some(brand_id) = filter.brand_id {
        qb.push(" AND brand_id = ").push_bind(brand_id);
    }
    if let Some(model_id) = filter.model_id {
        qb.push(" AND model_id = ").push_bind(model_id);
    }
    if let Some(year_from) = filter.year_from {
        qb.push(" AND year >= ").push_bind(year_from);
    }
    if let Some(year_to) = filter.year_to {
        qb.push(" AND year <= ").push_bind(year_to);
    }
    if let Some(pattern) = party_service::search_pattern(filter.search.as_deref()) {
        qb.push(" AND (chassis_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR engine_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR license_plate ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

pub async fn list(
    pool: &DbPool,
    tenant: &Tenant,
    filter: MotorcycleFilter,
) -> Result<Page<Motorcycle>, AppError> {
    if let (Some(from), Some(to)) = (filter.year_from, filter.year_to) {
        if from > to {
            return Err(AppError::InvalidRequest(
                "year_from must not be after year_to".to_string(),
            ));
        }
    }
    let (limit, offset) = validation::pagination(filter.page, filter.per_page);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM motorcycles");
    push_filters(&mut count, tenant.organization_id, &filter);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut select = QueryBuilder::<Postgres>::new("SELECT * FROM motorcycles");
    push_filters(&mut select, tenant.organization_id, &filter);
    select
        .push(" ORDER BY created_at DESC, chassis_number LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let items = select.build_query_as::<Motorcycle>().fetch_all(pool).await?;

    Ok(Page {
        items,
        total,
        page: offset / limit + 1,
        per_page: limit,
    })
}

pub async fn get(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<Motorcycle, AppError> {
    sqlx::query_as::<_, Motorcycle>(
        "SELECT * FROM motorcycles WHERE id = $1 AND organization_id = $2",
    )
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Motorcycle"))
}

/// Lock a unit for the rest of the transaction.
pub async fn lock(conn: &mut PgConnection, tenant: &Tenant, id: Uuid) -> Result<Motorcycle, AppError> {
    sqlx::query_as::<_, Motorcycle>(
        "SELECT * FROM motorcycles WHERE id = $1 AND organization_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Motorcycle"))
}

fn check_transition(current: MotorcycleState, next: MotorcycleState) -> Result<(), AppError> {
    if current.can_transition_to(next) {
        Ok(())
    } else if current.is_terminal() {
        Err(AppError::InvalidStateTransition(format!(
            "motorcycle is {current} and can no longer change state"
        )))
    } else {
        Err(AppError::InvalidStateTransition(format!(
            "motorcycle cannot go from {current} to {next}"
        )))
    }
}

pub async fn update(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: UpdateMotorcycleRequest,
) -> Result<Motorcycle, AppError> {
    tenant.require_manager()?;

    let mut tx = pool.begin().await?;
    let current = lock(&mut tx, tenant, id).await?;
    if current.state == MotorcycleState::Eliminated {
        return Err(AppError::InvalidStateTransition(
            "eliminated motorcycles cannot be edited".to_string(),
        ));
    }

    let brand_id = request.brand_id.unwrap_or(current.brand_id);
    let model_id = request.model_id.unwrap_or(current.model_id);
    let supplier_id = request.supplier_id.or(current.supplier_id);
    if request.brand_id.is_some() || request.model_id.is_some() || request.supplier_id.is_some() {
        check_references(
            &mut tx,
            tenant.organization_id,
            current.branch_id,
            brand_id,
            model_id,
            supplier_id,
        )
        .await?;
    }

    let year = match request.year {
        Some(year) => validation::model_year(year)?,
        None => current.year,
    };
    let chassis_number = match request.chassis_number {
        Some(v) => validation::identifier("chassis_number", &v)?,
        None => current.chassis_number,
    };
    let engine_number = match request.engine_number {
        Some(v) => optional_identifier("engine_number", Some(v))?,
        None => current.engine_number,
    };
    let color = match request.color {
        Some(v) => validation::optional_text("color", Some(v))?,
        None => current.color,
    };
    let mileage_km = match request.mileage_km {
        Some(v) => mileage(v)?,
        None => current.mileage_km,
    };
    let license_plate = match request.license_plate {
        Some(v) => optional_identifier("license_plate", Some(v))?,
        None => current.license_plate,
    };
    let cost_price_cents = match request.cost_price_cents {
        Some(v) => validation::non_negative_cents("cost_price_cents", v)?,
        None => current.cost_price_cents,
    };
    let retail_price_cents = match request.retail_price_cents {
        Some(v) => validation::non_negative_cents("retail_price_cents", v)?,
        None => current.retail_price_cents,
    };
    let wholesale_price_cents = match request.wholesale_price_cents {
        Some(v) => Some(validation::non_negative_cents("wholesale_price_cents", v)?),
        None => current.wholesale_price_cents,
    };
    let image_key = match request.image_key {
        Some(v) => validation::optional_text("image_key", Some(v))?,
        None => current.image_key,
    };
    let observations = match request.observations {
        Some(v) => validation::optional_text("observations", Some(v))?,
        None => current.observations,
    };

    let motorcycle = sqlx::query_as::<_, Motorcycle>(
        r#"
        UPDATE motorcycles
        SET brand_id = $1, model_id = $2, supplier_id = $3, year = $4, chassis_number = $5,
            engine_number = $6, color = $7, mileage_km = $8, license_plate = $9,
            cost_price_cents = $10, retail_price_cents = $11, wholesale_price_cents = $12,
            image_key = $13, observations = $14, updated_at = NOW()
        WHERE id = $15 AND organization_id = $16
        RETURNING *
        "#,
    )
    .bind(brand_id)
    .bind(model_id)
    .bind(supplier_id)
    .bind(year)
    .bind(&chassis_number)
    .bind(&engine_number)
    .bind(&color)
    .bind(mileage_km)
    .bind(&license_plate)
    .bind(cost_price_cents)
    .bind(retail_price_cents)
    .bind(wholesale_price_cents)
    .bind(&image_key)
    .bind(&observations)
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE, IN_USE))?;

    tx.commit().await?;

    tracing::info!(organization_id = %tenant.organization_id, motorcycle_id = %id, "motorcycle updated");
    Ok(motorcycle)
}

/// Move a unit to STOCK, PAUSED, PROCESSING or ELIMINATED.
///
/// Leaving RESERVED this way drops the reservation.
pub async fn change_state(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: ChangeStateRequest,
) -> Result<Motorcycle, AppError> {
    tenant.require_manager()?;

    let next = request.state;
    if !next.is_manual_target() {
        return Err(AppError::InvalidRequest(format!(
            "{next} is set through its own operation, not the state endpoint"
        )));
    }

    let mut tx = pool.begin().await?;
    let current = lock(&mut tx, tenant, id).await?;
    check_transition(current.state, next)?;

    let motorcycle = sqlx::query_as::<_, Motorcycle>(
        r#"
        UPDATE motorcycles
        SET state = $1,
            client_id = CASE WHEN state = 'RESERVED' THEN NULL ELSE client_id END,
            reservation_amount_cents = CASE WHEN state = 'RESERVED' THEN NULL ELSE reservation_amount_cents END,
            updated_at = NOW()
        WHERE id = $2 AND organization_id = $3
        RETURNING *
        "#,
    )
    .bind(next)
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        motorcycle_id = %id,
        from = %current.state,
        to = %next,
        "motorcycle state changed"
    );
    Ok(motorcycle)
}

/// Hold a STOCK unit for a client, optionally with a deposit.
pub async fn reserve(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: ReserveRequest,
) -> Result<Motorcycle, AppError> {
    tenant.require_role(&[UserRole::Admin, UserRole::Manager, UserRole::Seller])?;

    let amount = validation::non_negative_cents("amount_cents", request.amount_cents)?;
    party_service::require_active_client(pool, tenant, request.client_id).await?;

    let mut tx = pool.begin().await?;
    let current = lock(&mut tx, tenant, id).await?;
    check_transition(current.state, MotorcycleState::Reserved)?;

    let motorcycle = sqlx::query_as::<_, Motorcycle>(
        r#"
        UPDATE motorcycles
        SET state = $1, client_id = $2, reservation_amount_cents = $3, updated_at = NOW()
        WHERE id = $4 AND organization_id = $5
        RETURNING *
        "#,
    )
    .bind(MotorcycleState::Reserved)
    .bind(request.client_id)
    .bind(amount)
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        motorcycle_id = %id,
        client_id = %request.client_id,
        "motorcycle reserved"
    );
    Ok(motorcycle)
}

pub async fn cancel_reservation(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<Motorcycle, AppError> {
    tenant.require_role(&[UserRole::Admin, UserRole::Manager, UserRole::Seller])?;

    let mut tx = pool.begin().await?;
    let current = lock(&mut tx, tenant, id).await?;
    if current.state != MotorcycleState::Reserved {
        return Err(AppError::InvalidStateTransition(format!(
            "motorcycle is {} and has no reservation to cancel",
            current.state
        )));
    }

    let motorcycle = sqlx::query_as::<_, Motorcycle>(
        r#"
        UPDATE motorcycles
        SET state = $1, client_id = NULL, reservation_amount_cents = NULL, updated_at = NOW()
        WHERE id = $2 AND organization_id = $3
        RETURNING *
        "#,
    )
    .bind(MotorcycleState::Stock)
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(organization_id = %tenant.organization_id, motorcycle_id = %id, "reservation cancelled");
    Ok(motorcycle)
}

/// Move a STOCK or PAUSED unit to another branch.
pub async fn transfer(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: TransferRequest,
) -> Result<Motorcycle, AppError> {
    tenant.require_manager()?;

    let mut tx = pool.begin().await?;
    let current = lock(&mut tx, tenant, id).await?;
    if !current.state.is_transferable() {
        return Err(AppError::InvalidStateTransition(format!(
            "only STOCK or PAUSED motorcycles can be transferred; this one is {}",
            current.state
        )));
    }
    if current.branch_id == request.branch_id {
        return Err(AppError::InvalidRequest(
            "motorcycle is already in that branch".to_string(),
        ));
    }

    let branch_ok: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1 AND organization_id = $2)",
    )
    .bind(request.branch_id)
    .bind(tenant.organization_id)
    .fetch_one(&mut *tx)
    .await?;
    if !branch_ok {
        return Err(AppError::NotFound("Branch"));
    }

    let motorcycle = sqlx::query_as::<_, Motorcycle>(
        r#"
        UPDATE motorcycles SET branch_id = $1, updated_at = NOW()
        WHERE id = $2 AND organization_id = $3
        RETURNING *
        "#,
    )
    .bind(request.branch_id)
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        motorcycle_id = %id,
        from_branch = %current.branch_id,
        to_branch = %request.branch_id,
        "motorcycle transferred"
    );
    Ok(motorcycle)
}

/// Remove a unit entered by mistake. Sold units are kept for the records;
/// use ELIMINATED for units that left the inventory otherwise.
pub async fn delete(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<(), AppError> {
    tenant.require_manager()?;

    let mut tx = pool.begin().await?;
    let current = lock(&mut tx, tenant, id).await?;
    if current.state == MotorcycleState::Sold {
        return Err(AppError::InvalidStateTransition(
            "sold motorcycles cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM motorcycles WHERE id = $1 AND organization_id = $2")
        .bind(id)
        .bind(tenant.organization_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::from_db(e, DUPLICATE, IN_USE))?;

    tx.commit().await?;

    tracing::info!(organization_id = %tenant.organization_id, motorcycle_id = %id, "motorcycle deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(chassis: &str) -> CreateMotorcycleRequest {
        CreateMotorcycleRequest {
            branch_id: Uuid::nil(),
            brand_id: Uuid::nil(),
            model_id: Uuid::nil(),
            supplier_id: None,
            year: 2024,
            chassis_number: chassis.to_string(),
            engine_number: Some(" ".to_string()),
            color: Some(" Rojo ".to_string()),
            mileage_km: 0,
            license_plate: None,
            cost_price_cents: 100,
            retail_price_cents: 200,
            wholesale_price_cents: None,
            currency: "ars".to_string(),
            image_key: None,
            observations: None,
        }
    }

    #[test]
    fn test_normalize_cleans_fields() {
        let unit = normalize(request("9c2jc4110rr000123")).unwrap();
        assert_eq!(unit.chassis_number, "9C2JC4110RR000123");
        assert_eq!(unit.engine_number, None);
        assert_eq!(unit.color.as_deref(), Some("Rojo"));
        assert_eq!(unit.currency, "ARS");
    }

    #[test]
    fn test_normalize_rejects_bad_values() {
        let mut bad_year = request("A1");
        bad_year.year = 1850;
        assert!(normalize(bad_year).is_err());

        let mut negative = request("A1");
        negative.retail_price_cents = -1;
        assert!(normalize(negative).is_err());

        let mut bad_currency = request("A1");
        bad_currency.currency = "PESOS".into();
        assert!(normalize(bad_currency).is_err());

        let mut bad_mileage = request("A1");
        bad_mileage.mileage_km = -5;
        assert!(normalize(bad_mileage).is_err());
    }

    #[test]
    fn test_batch_duplicates_detected() {
        let a = normalize(request("A1")).unwrap();
        let b = normalize(request("A2")).unwrap();
        assert!(check_batch_duplicates(&[a.clone(), b]).is_ok());
        assert!(check_batch_duplicates(&[a.clone(), a]).is_err());

        let mut c = normalize(request("C1")).unwrap();
        c.engine_number = Some("E1".into());
        let mut d = normalize(request("D1")).unwrap();
        d.engine_number = Some("E1".into());
        assert!(check_batch_duplicates(&[c, d]).is_err());
    }

    #[test]
    fn test_transition_errors_name_the_states() {
        let err = check_transition(MotorcycleState::Paused, MotorcycleState::Processing).unwrap_err();
        assert_eq!(err.to_string(), "motorcycle cannot go from PAUSED to PROCESSING");
        let err = check_transition(MotorcycleState::Sold, MotorcycleState::Stock).unwrap_err();
        assert_eq!(err.to_string(), "motorcycle is SOLD and can no longer change state");
        assert!(check_transition(MotorcycleState::Stock, MotorcycleState::Paused).is_ok());
    }
}
