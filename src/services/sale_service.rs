//! Sales.
//!
//! A sale marks a unit SOLD to a client. The unit row is locked for the
//! whole operation so two sellers cannot sell the same unit, and financed
//! sales create their current account in the same transaction.

use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::{inventory::MotorcycleState, validation},
    error::AppError,
    middleware::tenant::Tenant,
    models::{
        common::DateRange,
        sale::{CreateSaleRequest, SaleFilter, SalePaymentType, SaleResponse, SaleSummary},
        user::UserRole,
    },
    services::{
        current_account_service::{self, FinancingTerms},
        motorcycle_service, party_service,
    },
};

const SALE_SELECT: &str = r#"
    SELECT m.id AS motorcycle_id, m.chassis_number,
           b.name AS brand_name, md.name AS model_name, br.name AS branch_name,
           c.id AS client_id, c.first_name || ' ' || c.last_name AS client_name,
           m.sale_price_cents, m.currency, m.payment_type, m.seller_id, m.sold_at
    FROM motorcycles m
    JOIN brands b ON b.id = m.brand_id
    JOIN models md ON md.id = m.model_id
    JOIN branches br ON br.id = m.branch_id
    JOIN clients c ON c.id = m.client_id
"#;

/// Financing must be present exactly when the sale is financed.
fn check_payment_type(request: &CreateSaleRequest) -> Result<(), AppError> {
    match (request.payment_type, request.financing.is_some()) {
        (SalePaymentType::Financed, false) => Err(AppError::InvalidRequest(
            "financed sales require a financing plan".to_string(),
        )),
        (SalePaymentType::Financed, true) => Ok(()),
        (_, true) => Err(AppError::InvalidRequest(
            "financing is only accepted for FINANCED sales".to_string(),
        )),
        (_, false) => Ok(()),
    }
}

/// Sell a STOCK unit, or a RESERVED one to the client holding it.
///
/// # Errors
///
/// - `InvalidRequest`: bad price or financing shape
/// - `InvalidStateTransition`: unit not for sale, or reserved for someone else
/// - `NotFound`: unit or client outside the organization
pub async fn create(
    pool: &DbPool,
    tenant: &Tenant,
    request: CreateSaleRequest,
) -> Result<SaleResponse, AppError> {
    tenant.require_role(&[UserRole::Admin, UserRole::Manager, UserRole::Seller])?;

    validation::positive_cents("sale_price_cents", request.sale_price_cents)?;
    check_payment_type(&request)?;
    let observations = validation::optional_text("observations", request.observations.clone())?;
    party_service::require_active_client(pool, tenant, request.client_id).await?;

    let terms = request
        .financing
        .as_ref()
        .map(|f| {
            FinancingTerms::new(
                request.sale_price_cents,
                f.down_payment_cents,
                f.installments,
                f.annual_interest_bps,
                f.frequency,
                f.start_date,
            )
        })
        .transpose()?;

    let mut tx = pool.begin().await?;

    let motorcycle = motorcycle_service::lock(&mut tx, tenant, request.motorcycle_id).await?;
    match motorcycle.state {
        MotorcycleState::Stock => {}
        MotorcycleState::Reserved if motorcycle.client_id == Some(request.client_id) => {}
        MotorcycleState::Reserved => {
            return Err(AppError::InvalidStateTransition(
                "motorcycle is reserved for another client".to_string(),
            ));
        }
        other => {
            return Err(AppError::InvalidStateTransition(format!(
                "motorcycle is {other} and cannot be sold"
            )));
        }
    }

    sqlx::query(
        r#"
        UPDATE motorcycles
        SET state = $1, client_id = $2, sale_price_cents = $3, payment_type = $4,
            seller_id = $5, sold_at = NOW(),
            observations = COALESCE($6, observations), updated_at = NOW()
        WHERE id = $7 AND organization_id = $8
        "#,
    )
    .bind(MotorcycleState::Sold)
    .bind(request.client_id)
    .bind(request.sale_price_cents)
    .bind(request.payment_type)
    .bind(tenant.user_id)
    .bind(&observations)
    .bind(motorcycle.id)
    .bind(tenant.organization_id)
    .execute(&mut *tx)
    .await?;

    let current_account = match (&terms, &request.financing) {
        (Some(terms), Some(financing)) => Some(
            current_account_service::insert_account(
                &mut tx,
                tenant.organization_id,
                request.client_id,
                motorcycle.id,
                terms,
                &motorcycle.currency,
                validation::optional_text("notes", financing.notes.clone())?,
            )
            .await?,
        ),
        _ => None,
    };

    let sale = sqlx::query_as::<_, SaleSummary>(&format!(
        "{SALE_SELECT} WHERE m.id = $1 AND m.organization_id = $2"
    ))
    .bind(motorcycle.id)
    .bind(tenant.organization_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        motorcycle_id = %motorcycle.id,
        client_id = %request.client_id,
        seller_id = %tenant.user_id,
        payment_type = ?request.payment_type,
        sale_price_cents = request.sale_price_cents,
        "motorcycle sold"
    );

    Ok(SaleResponse {
        sale,
        current_account,
    })
}

/// Sold units, newest first, with `sold_at` inside the range.
pub async fn list(pool: &DbPool, tenant: &Tenant, filter: SaleFilter) -> Result<Vec<SaleSummary>, AppError> {
    let (from, to) = DateRange {
        from: filter.from,
        to: filter.to,
    }
    .resolve(current_account_service::today());
    if from > to {
        return Err(AppError::InvalidRequest("from must not be after to".to_string()));
    }

    let sales = sqlx::query_as::<_, SaleSummary>(&format!(
        r#"{SALE_SELECT}
        WHERE m.organization_id = $1
          AND m.state = 'SOLD'
          AND m.sold_at::date BETWEEN $2 AND $3
          AND ($4::uuid IS NULL OR m.branch_id = $4)
          AND ($5::uuid IS NULL OR m.seller_id = $5)
        ORDER BY m.sold_at DESC
        "#
    ))
    .bind(tenant.organization_id)
    .bind(from)
    .bind(to)
    .bind(filter.branch_id)
    .bind(filter.seller_id)
    .fetch_all(pool)
    .await?;

    Ok(sales)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{domain::amortization::PaymentFrequency, models::sale::FinancingRequest};
    use chrono::NaiveDate;

    fn sale(payment_type: SalePaymentType, financed: bool) -> CreateSaleRequest {
        CreateSaleRequest {
            motorcycle_id: Uuid::nil(),
            client_id: Uuid::nil(),
            sale_price_cents: 1_000_000,
            payment_type,
            financing: financed.then(|| FinancingRequest {
                down_payment_cents: 100_000,
                installments: 6,
                annual_interest_bps: 0,
                frequency: PaymentFrequency::Monthly,
                start_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
                notes: None,
            }),
            observations: None,
        }
    }

    #[test]
    fn test_financing_required_only_for_financed_sales() {
        assert!(check_payment_type(&sale(SalePaymentType::Financed, true)).is_ok());
        assert!(check_payment_type(&sale(SalePaymentType::Financed, false)).is_err());
        assert!(check_payment_type(&sale(SalePaymentType::Cash, false)).is_ok());
        assert!(check_payment_type(&sale(SalePaymentType::Card, true)).is_err());
    }
}
