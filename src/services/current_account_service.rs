//! Current accounts: installment financing of a sold motorcycle.
//!
//! # Payments
//!
//! A payment is applied inside one transaction:
//!
//! 1. Lock the account row, then its installments, in that order
//! 2. Insert the payment, so a duplicate gateway reference fails before
//!    anything is computed from balances another delivery already changed
//! 3. Split the amount with [`allocate_payment`] and write one allocation
//!    row per installment touched
//! 4. Re-derive installment and account statuses as of today, not the
//!    payment date, so a back-dated payment cannot hide a current arrear
//!
//! Annulling a payment walks the same path backwards. Statuses are always
//! derived from `paid_cents` and due dates, never edited directly, so an
//! annulment can take a `PAID_OFF` account back to `ACTIVE` or `OVERDUE`.

use chrono::{NaiveDate, Utc};
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::{
        allocation::{
            AccountStatus, InstallmentBalance, InstallmentStatus, account_status,
            allocate_payment, installment_status,
        },
        amortization::{FinancingPlan, PaymentFrequency, build_schedule, totals},
        inventory::MotorcycleState,
        validation,
    },
    error::AppError,
    middleware::tenant::Tenant,
    models::{
        current_account::{
            CancelAccountRequest, CreateCurrentAccountRequest, CurrentAccount,
            CurrentAccountDetail, CurrentAccountFilter, Installment, Payment, PaymentAllocation,
            PaymentMethod, PaymentReceipt, PaymentStatus, RegisterPaymentRequest,
            SchedulePreview, SchedulePreviewRequest,
        },
        user::UserRole,
    },
    services::{motorcycle_service, party_service},
};

const DUPLICATE_ACCOUNT: &str = "the motorcycle already has a current account";
const DUPLICATE_REFERENCE: &str = "a payment with that reference was already recorded";
const IN_USE: &str = "current account is still referenced";

/// Roles that may take payments.
pub const COLLECTORS: &[UserRole] = &[UserRole::Admin, UserRole::Manager, UserRole::Cashier];

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Validated financing terms.
#[derive(Debug, Clone, Copy)]
pub struct FinancingTerms {
    pub total_amount_cents: i64,
    pub down_payment_cents: i64,
    pub plan: FinancingPlan,
}

impl FinancingTerms {
    pub fn new(
        total_amount_cents: i64,
        down_payment_cents: i64,
        installments: u32,
        annual_interest_bps: u32,
        frequency: PaymentFrequency,
        start_date: NaiveDate,
    ) -> Result<Self, AppError> {
        validation::positive_cents("total_amount_cents", total_amount_cents)?;
        validation::non_negative_cents("down_payment_cents", down_payment_cents)?;
        if down_payment_cents >= total_amount_cents {
            return Err(AppError::InvalidRequest(
                "down payment must be smaller than the total amount".to_string(),
            ));
        }
        Ok(Self {
            total_amount_cents,
            down_payment_cents,
            plan: FinancingPlan {
                financed_cents: total_amount_cents - down_payment_cents,
                installments,
                annual_interest_bps,
                frequency,
                start_date,
            },
        })
    }
}

/// Schedule for a plan without saving anything.
pub fn preview(request: SchedulePreviewRequest) -> Result<SchedulePreview, AppError> {
    let terms = FinancingTerms::new(
        request.total_amount_cents,
        request.down_payment_cents,
        request.installments,
        request.annual_interest_bps,
        request.frequency,
        request.start_date,
    )?;
    let installments = build_schedule(&terms.plan)?;
    let totals = totals(&installments);
    Ok(SchedulePreview {
        financed_amount_cents: terms.plan.financed_cents,
        installments,
        totals,
    })
}

/// Insert an account and its schedule on an open transaction.
///
/// Shared by standalone account creation and financed sales.
pub async fn insert_account(
    conn: &mut PgConnection,
    organization_id: Uuid,
    client_id: Uuid,
    motorcycle_id: Uuid,
    terms: &FinancingTerms,
    currency: &str,
    notes: Option<String>,
) -> Result<CurrentAccountDetail, AppError> {
    let schedule = build_schedule(&terms.plan)?;
    let first_amount = schedule.first().map(|i| i.amount_cents).unwrap_or_default();

    let account = sqlx::query_as::<_, CurrentAccount>(
        r#"
        INSERT INTO current_accounts (
            organization_id, client_id, motorcycle_id, total_amount_cents,
            down_payment_cents, financed_amount_cents, annual_interest_bps,
            number_of_installments, installment_amount_cents, payment_frequency,
            start_date, currency, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(organization_id)
    .bind(client_id)
    .bind(motorcycle_id)
    .bind(terms.total_amount_cents)
    .bind(terms.down_payment_cents)
    .bind(terms.plan.financed_cents)
    .bind(terms.plan.annual_interest_bps as i32)
    .bind(terms.plan.installments as i32)
    .bind(first_amount)
    .bind(terms.plan.frequency)
    .bind(terms.plan.start_date)
    .bind(currency)
    .bind(&notes)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_ACCOUNT, IN_USE))?;

    for row in &schedule {
        sqlx::query(
            r#"
            INSERT INTO installments (
                current_account_id, number, due_date, principal_cents, interest_cents,
                amount_cents, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id)
        .bind(row.number as i32)
        .bind(row.due_date)
        .bind(row.principal_cents)
        .bind(row.interest_cents)
        .bind(row.amount_cents)
        .bind(InstallmentStatus::Pending)
        .execute(&mut *conn)
        .await?;
    }

    let (installments, account) = recompute(conn, account, today()).await?;

    tracing::info!(
        organization_id = %organization_id,
        current_account_id = %account.id,
        motorcycle_id = %motorcycle_id,
        installments = installments.len(),
        financed_cents = terms.plan.financed_cents,
        "current account created"
    );
    Ok(CurrentAccountDetail::new(account, installments, Vec::new()))
}

/// Open an account for a unit already sold to the client.
pub async fn create(
    pool: &DbPool,
    tenant: &Tenant,
    request: CreateCurrentAccountRequest,
) -> Result<CurrentAccountDetail, AppError> {
    tenant.require_role(&[UserRole::Admin, UserRole::Manager, UserRole::Seller])?;

    let terms = FinancingTerms::new(
        request.total_amount_cents,
        request.down_payment_cents,
        request.installments,
        request.annual_interest_bps,
        request.frequency,
        request.start_date,
    )?;
    let notes = validation::optional_text("notes", request.notes)?;
    party_service::require_active_client(pool, tenant, request.client_id).await?;

    let mut tx = pool.begin().await?;
    let motorcycle = motorcycle_service::lock(&mut tx, tenant, request.motorcycle_id).await?;
    if motorcycle.state != MotorcycleState::Sold || motorcycle.client_id != Some(request.client_id) {
        return Err(AppError::InvalidStateTransition(
            "current accounts can only be opened for a motorcycle sold to the same client"
                .to_string(),
        ));
    }

    let detail = insert_account(
        &mut tx,
        tenant.organization_id,
        request.client_id,
        request.motorcycle_id,
        &terms,
        &motorcycle.currency,
        notes,
    )
    .await?;
    tx.commit().await?;
    Ok(detail)
}

async fn lock_account(
    conn: &mut PgConnection,
    organization_id: Uuid,
    id: Uuid,
) -> Result<CurrentAccount, AppError> {
    sqlx::query_as::<_, CurrentAccount>(
        "SELECT * FROM current_accounts WHERE id = $1 AND organization_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(organization_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Current account"))
}

async fn load_installments(
    conn: &mut PgConnection,
    account_id: Uuid,
    for_update: bool,
) -> Result<Vec<Installment>, AppError> {
    let sql = if for_update {
        "SELECT * FROM installments WHERE current_account_id = $1 ORDER BY number FOR UPDATE"
    } else {
        "SELECT * FROM installments WHERE current_account_id = $1 ORDER BY number"
    };
    let rows = sqlx::query_as::<_, Installment>(sql)
        .bind(account_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(rows)
}

async fn load_payments(conn: &mut PgConnection, account_id: Uuid) -> Result<Vec<Payment>, AppError> {
    let rows = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE current_account_id = $1 ORDER BY payment_date DESC, created_at DESC",
    )
    .bind(account_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows)
}

/// Re-derive installment and account statuses as of `today`, writing only
/// the rows that changed.
async fn recompute(
    conn: &mut PgConnection,
    mut account: CurrentAccount,
    today: NaiveDate,
) -> Result<(Vec<Installment>, CurrentAccount), AppError> {
    let mut installments = load_installments(conn, account.id, false).await?;

    for installment in installments.iter_mut() {
        let status = installment_status(
            installment.amount_cents,
            installment.paid_cents,
            installment.due_date,
            today,
        );
        if status != installment.status {
            sqlx::query("UPDATE installments SET status = $1 WHERE id = $2")
                .bind(status)
                .bind(installment.id)
                .execute(&mut *conn)
                .await?;
            installment.status = status;
        }
    }

    let statuses: Vec<InstallmentStatus> = installments.iter().map(|i| i.status).collect();
    let status = account_status(account.status, &statuses);
    if status != account.status {
        account = sqlx::query_as::<_, CurrentAccount>(
            "UPDATE current_accounts SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING *",
        )
        .bind(status)
        .bind(account.id)
        .fetch_one(&mut *conn)
        .await?;
    }

    Ok((installments, account))
}

/// Account with schedule and payments. Statuses are refreshed first so
/// installments that fell due since the last write show as overdue.
pub async fn get(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<CurrentAccountDetail, AppError> {
    let mut tx = pool.begin().await?;
    let account = lock_account(&mut tx, tenant.organization_id, id).await?;
    let (installments, account) = recompute(&mut tx, account, today()).await?;
    let payments = load_payments(&mut tx, id).await?;
    tx.commit().await?;
    Ok(CurrentAccountDetail::new(account, installments, payments))
}

/// Flag every installment of the organization that fell due unpaid, and
/// the accounts holding them.
pub async fn mark_overdue(pool: &DbPool, organization_id: Uuid, today: NaiveDate) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;

    let flagged = sqlx::query(
        r#"
        UPDATE installments i
        SET status = 'OVERDUE'
        FROM current_accounts a
        WHERE a.id = i.current_account_id
          AND a.organization_id = $1
          AND a.status IN ('ACTIVE', 'OVERDUE')
          AND i.due_date < $2
          AND i.paid_cents < i.amount_cents
          AND i.status <> 'OVERDUE'
        "#,
    )
    .bind(organization_id)
    .bind(today)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query(
        r#"
        UPDATE current_accounts a
        SET status = 'OVERDUE', updated_at = NOW()
        WHERE a.organization_id = $1
          AND a.status = 'ACTIVE'
          AND EXISTS (
              SELECT 1 FROM installments i
              WHERE i.current_account_id = a.id AND i.status = 'OVERDUE'
          )
        "#,
    )
    .bind(organization_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    if flagged > 0 {
        tracing::info!(organization_id = %organization_id, installments = flagged, "installments marked overdue");
    }
    Ok(flagged)
}

pub async fn list(
    pool: &DbPool,
    tenant: &Tenant,
    filter: CurrentAccountFilter,
) -> Result<Vec<CurrentAccount>, AppError> {
    mark_overdue(pool, tenant.organization_id, today()).await?;

    let accounts = sqlx::query_as::<_, CurrentAccount>(
        r#"
        SELECT * FROM current_accounts
        WHERE organization_id = $1
          AND ($2::text IS NULL OR status = $2)
          AND ($3::uuid IS NULL OR client_id = $3)
        ORDER BY created_at DESC
        "#,
    )
    .bind(tenant.organization_id)
    .bind(filter.status)
    .bind(filter.client_id)
    .fetch_all(pool)
    .await?;
    Ok(accounts)
}

/// Payment as it reaches [`apply_payment`], from a cashier or a webhook.
#[derive(Debug, Clone)]
pub struct IncomingPayment {
    pub amount_cents: i64,
    pub method: PaymentMethod,
    pub installment_number: Option<i32>,
    pub payment_date: NaiveDate,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: Option<Uuid>,
}

/// Record a payment on an account. See the module docs for the steps.
pub async fn apply_payment(
    pool: &DbPool,
    organization_id: Uuid,
    account_id: Uuid,
    payment: IncomingPayment,
) -> Result<PaymentReceipt, AppError> {
    validation::positive_cents("amount_cents", payment.amount_cents)?;

    let mut tx = pool.begin().await?;

    let account = lock_account(&mut tx, organization_id, account_id).await?;
    if !account.status.accepts_payments() {
        return Err(AppError::InvalidStateTransition(format!(
            "account is {:?} and does not accept payments",
            account.status
        )));
    }

    let installments = load_installments(&mut tx, account.id, true).await?;

    let recorded = sqlx::query_as::<_, Payment>(
        r#"
        INSERT INTO payments (
            organization_id, current_account_id, amount_cents, method, payment_date,
            reference, notes, recorded_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(organization_id)
    .bind(account.id)
    .bind(payment.amount_cents)
    .bind(payment.method)
    .bind(payment.payment_date)
    .bind(&payment.reference)
    .bind(&payment.notes)
    .bind(payment.recorded_by)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| AppError::from_db(e, DUPLICATE_REFERENCE, IN_USE))?;

    let balances: Vec<InstallmentBalance> = installments.iter().map(InstallmentBalance::from).collect();
    let allocations = allocate_payment(&balances, payment.amount_cents, payment.installment_number)?;

    for allocation in &allocations {
        sqlx::query("UPDATE installments SET paid_cents = paid_cents + $1 WHERE id = $2")
            .bind(allocation.amount_cents)
            .bind(allocation.installment_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO payment_allocations (payment_id, installment_id, amount_cents) VALUES ($1, $2, $3)",
        )
        .bind(recorded.id)
        .bind(allocation.installment_id)
        .bind(allocation.amount_cents)
        .execute(&mut *tx)
        .await?;
    }

    let (installments, account) = recompute(&mut tx, account, today()).await?;
    tx.commit().await?;

    let outstanding_cents = installments
        .iter()
        .map(|i| (i.amount_cents - i.paid_cents).max(0))
        .sum();

    tracing::info!(
        organization_id = %organization_id,
        current_account_id = %account.id,
        payment_id = %recorded.id,
        amount_cents = recorded.amount_cents,
        method = ?recorded.method,
        installments = allocations.len(),
        "payment registered"
    );

    Ok(PaymentReceipt {
        payment: recorded,
        allocations,
        account_status: account.status,
        outstanding_cents,
    })
}

pub async fn register_payment(
    pool: &DbPool,
    tenant: &Tenant,
    account_id: Uuid,
    request: RegisterPaymentRequest,
) -> Result<PaymentReceipt, AppError> {
    tenant.require_role(COLLECTORS)?;

    let today = today();
    let payment_date = request.payment_date.unwrap_or(today);
    if payment_date > today {
        return Err(AppError::InvalidRequest(
            "payment_date cannot be in the future".to_string(),
        ));
    }
    let reference = validation::optional_text("reference", request.reference)?;
    let notes = validation::optional_text("notes", request.notes)?;

    apply_payment(
        pool,
        tenant.organization_id,
        account_id,
        IncomingPayment {
            amount_cents: request.amount_cents,
            method: request.method,
            installment_number: request.installment_number,
            payment_date,
            reference,
            notes,
            recorded_by: Some(tenant.user_id),
        },
    )
    .await
}

/// Reverse a completed payment and give its allocations back.
pub async fn annul_payment(
    pool: &DbPool,
    tenant: &Tenant,
    account_id: Uuid,
    payment_id: Uuid,
) -> Result<CurrentAccountDetail, AppError> {
    tenant.require_manager()?;

    let mut tx = pool.begin().await?;
    let account = lock_account(&mut tx, tenant.organization_id, account_id).await?;
    if account.status == AccountStatus::Cancelled {
        return Err(AppError::InvalidStateTransition(
            "payments of a cancelled account cannot be annulled".to_string(),
        ));
    }

    let payment = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE id = $1 AND current_account_id = $2 FOR UPDATE",
    )
    .bind(payment_id)
    .bind(account.id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Payment"))?;
    if payment.status == PaymentStatus::Annulled {
        return Err(AppError::InvalidStateTransition(
            "payment is already annulled".to_string(),
        ));
    }

    // The account lock already serializes this against apply_payment.
    load_installments(&mut tx, account.id, true).await?;

    let allocations = sqlx::query_as::<_, PaymentAllocation>(
        "SELECT * FROM payment_allocations WHERE payment_id = $1",
    )
    .bind(payment.id)
    .fetch_all(&mut *tx)
    .await?;

    for allocation in &allocations {
        sqlx::query("UPDATE installments SET paid_cents = paid_cents - $1 WHERE id = $2")
            .bind(allocation.amount_cents)
            .bind(allocation.installment_id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("UPDATE payments SET status = $1, annulled_at = NOW() WHERE id = $2")
        .bind(PaymentStatus::Annulled)
        .bind(payment.id)
        .execute(&mut *tx)
        .await?;

    let (installments, account) = recompute(&mut tx, account, today()).await?;
    let payments = load_payments(&mut tx, account.id).await?;
    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        current_account_id = %account.id,
        payment_id = %payment.id,
        amount_cents = payment.amount_cents,
        "payment annulled"
    );
    Ok(CurrentAccountDetail::new(account, installments, payments))
}

/// Close an account for good. Paid-off accounts stay paid off.
pub async fn cancel(
    pool: &DbPool,
    tenant: &Tenant,
    id: Uuid,
    request: CancelAccountRequest,
) -> Result<CurrentAccountDetail, AppError> {
    tenant.require_manager()?;
    let reason = validation::optional_text("reason", request.reason)?;

    let mut tx = pool.begin().await?;
    let account = lock_account(&mut tx, tenant.organization_id, id).await?;
    match account.status {
        AccountStatus::Cancelled => {
            return Err(AppError::InvalidStateTransition(
                "account is already cancelled".to_string(),
            ));
        }
        AccountStatus::PaidOff => {
            return Err(AppError::InvalidStateTransition(
                "a paid-off account cannot be cancelled".to_string(),
            ));
        }
        AccountStatus::Active | AccountStatus::Overdue => {}
    }

    let notes = match (account.notes.as_deref(), reason.as_deref()) {
        (Some(existing), Some(reason)) => Some(format!("{existing}\nCancelled: {reason}")),
        (None, Some(reason)) => Some(format!("Cancelled: {reason}")),
        (existing, None) => existing.map(str::to_string),
    };

    let account = sqlx::query_as::<_, CurrentAccount>(
        r#"
        UPDATE current_accounts SET status = $1, notes = $2, updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(AccountStatus::Cancelled)
    .bind(&notes)
    .bind(account.id)
    .fetch_one(&mut *tx)
    .await?;

    let installments = load_installments(&mut tx, account.id, false).await?;
    let payments = load_payments(&mut tx, account.id).await?;
    tx.commit().await?;

    tracing::info!(organization_id = %tenant.organization_id, current_account_id = %id, "current account cancelled");
    Ok(CurrentAccountDetail::new(account, installments, payments))
}

/// Installment and what it still owes, for online and terminal charges.
pub async fn installment_for_charge(
    pool: &DbPool,
    organization_id: Uuid,
    installment_id: Uuid,
) -> Result<(Installment, CurrentAccount), AppError> {
    let installment = sqlx::query_as::<_, Installment>(
        r#"
        SELECT i.*
        FROM installments i
        JOIN current_accounts a ON a.id = i.current_account_id
        WHERE i.id = $1 AND a.organization_id = $2
        "#,
    )
    .bind(installment_id)
    .bind(organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Installment"))?;

    let account = sqlx::query_as::<_, CurrentAccount>(
        "SELECT * FROM current_accounts WHERE id = $1",
    )
    .bind(installment.current_account_id)
    .fetch_one(pool)
    .await?;

    if !account.status.accepts_payments() {
        return Err(AppError::InvalidStateTransition(format!(
            "account is {:?} and does not accept payments",
            account.status
        )));
    }
    if installment.paid_cents >= installment.amount_cents {
        return Err(AppError::InvalidStateTransition(format!(
            "installment {} is already paid",
            installment.number
        )));
    }
    Ok((installment, account))
}

/// `installment:<uuid>`, the external reference sent to MercadoPago.
pub fn installment_reference(installment_id: Uuid) -> String {
    format!("installment:{installment_id}")
}

pub fn parse_installment_reference(reference: &str) -> Option<Uuid> {
    reference
        .strip_prefix("installment:")
        .and_then(|id| Uuid::parse_str(id).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_terms_reject_down_payment_covering_total() {
        let err = FinancingTerms::new(1_000, 1_000, 3, 0, PaymentFrequency::Monthly, date(2025, 1, 10))
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert!(FinancingTerms::new(0, 0, 3, 0, PaymentFrequency::Monthly, date(2025, 1, 10)).is_err());
        assert!(FinancingTerms::new(1_000, -1, 3, 0, PaymentFrequency::Monthly, date(2025, 1, 10)).is_err());
    }

    #[test]
    fn test_preview_zero_interest() {
        let preview = preview(SchedulePreviewRequest {
            total_amount_cents: 1_000_000,
            down_payment_cents: 100_000,
            installments: 4,
            annual_interest_bps: 0,
            frequency: PaymentFrequency::Monthly,
            start_date: date(2025, 1, 31),
        })
        .unwrap();

        assert_eq!(preview.financed_amount_cents, 900_000);
        assert_eq!(preview.installments.len(), 4);
        assert_eq!(preview.totals.principal_cents, 900_000);
        assert_eq!(preview.totals.interest_cents, 0);
        assert_eq!(preview.installments[1].due_date, date(2025, 2, 28));
    }

    #[test]
    fn test_preview_with_interest_sums_principal() {
        let preview = preview(SchedulePreviewRequest {
            total_amount_cents: 4_500_000_00,
            down_payment_cents: 1_500_000_00,
            installments: 12,
            annual_interest_bps: 4_500,
            frequency: PaymentFrequency::Monthly,
            start_date: date(2025, 4, 10),
        })
        .unwrap();

        assert_eq!(preview.totals.principal_cents, 3_000_000_00);
        assert!(preview.totals.interest_cents > 0);
        assert_eq!(
            preview.totals.total_cents,
            preview.totals.principal_cents + preview.totals.interest_cents
        );
    }

    #[test]
    fn test_installment_reference_round_trip() {
        let id = Uuid::from_u128(42);
        let reference = installment_reference(id);
        assert_eq!(parse_installment_reference(&reference), Some(id));
        assert_eq!(parse_installment_reference("sale:123"), None);
        assert_eq!(parse_installment_reference("installment:not-a-uuid"), None);
    }
}
