//! Petty cash: deposits, withdrawals and spends.
//!
//! Rules live in `domain::petty_cash`; this module loads the figures they
//! need under row locks and persists the result. Locks are always taken
//! deposit first: withdrawals and closes lock it `FOR UPDATE`, spends lock
//! it `FOR SHARE` and then their withdrawal `FOR UPDATE`. A close therefore
//! never runs beside a spend that changes what it checks.

use uuid::Uuid;

use crate::{
    db::DbPool,
    domain::{
        petty_cash::{
            DepositStatus, WithdrawalStatus, check_close, check_spend, check_withdrawal,
            withdrawal_status,
        },
        validation,
    },
    error::AppError,
    middleware::tenant::Tenant,
    models::{
        common::DateRange,
        petty_cash::{
            CreateDepositRequest, CreateSpendRequest, CreateWithdrawalRequest, DepositDetail,
            DepositFilter, PettyCashBalance, PettyCashDeposit, PettyCashSpend,
            PettyCashWithdrawal, WithdrawalWithSpends,
        },
        user::UserRole,
    },
    services::current_account_service::today,
};

const CASH_HANDLERS: &[UserRole] = &[UserRole::Admin, UserRole::Manager, UserRole::Cashier];

pub async fn create_deposit(
    pool: &DbPool,
    tenant: &Tenant,
    request: CreateDepositRequest,
) -> Result<PettyCashDeposit, AppError> {
    tenant.require_role(CASH_HANDLERS)?;

    let amount = validation::positive_cents("amount_cents", request.amount_cents)?;
    let description = validation::required_name("description", &request.description)?;
    let reference = validation::optional_text("reference", request.reference)?;
    let deposit_date = request.deposit_date.unwrap_or_else(today);

    if let Some(branch_id) = request.branch_id {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM branches WHERE id = $1 AND organization_id = $2)",
        )
        .bind(branch_id)
        .bind(tenant.organization_id)
        .fetch_one(pool)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Branch"));
        }
    }

    let deposit = sqlx::query_as::<_, PettyCashDeposit>(
        r#"
        INSERT INTO petty_cash_deposits (
            organization_id, branch_id, amount_cents, description, reference, deposit_date, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(tenant.organization_id)
    .bind(request.branch_id)
    .bind(amount)
    .bind(&description)
    .bind(&reference)
    .bind(deposit_date)
    .bind(tenant.user_id)
    .fetch_one(pool)
    .await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        deposit_id = %deposit.id,
        amount_cents = amount,
        "petty cash deposit created"
    );
    Ok(deposit)
}

pub async fn list_deposits(
    pool: &DbPool,
    tenant: &Tenant,
    filter: DepositFilter,
) -> Result<Vec<PettyCashDeposit>, AppError> {
    let (from, to) = DateRange {
        from: filter.from,
        to: filter.to,
    }
    .resolve(today());

    let deposits = sqlx::query_as::<_, PettyCashDeposit>(
        r#"
        SELECT * FROM petty_cash_deposits
        WHERE organization_id = $1
          AND ($2::uuid IS NULL OR branch_id = $2)
          AND ($3::text IS NULL OR status = $3)
          AND deposit_date BETWEEN $4 AND $5
        ORDER BY deposit_date DESC, created_at DESC
        "#,
    )
    .bind(tenant.organization_id)
    .bind(filter.branch_id)
    .bind(filter.status)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;
    Ok(deposits)
}

pub async fn get_deposit(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<DepositDetail, AppError> {
    let deposit = sqlx::query_as::<_, PettyCashDeposit>(
        "SELECT * FROM petty_cash_deposits WHERE id = $1 AND organization_id = $2",
    )
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Deposit"))?;

    let withdrawals = sqlx::query_as::<_, PettyCashWithdrawal>(
        "SELECT * FROM petty_cash_withdrawals WHERE deposit_id = $1 ORDER BY withdrawal_date, created_at",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let spends = sqlx::query_as::<_, PettyCashSpend>(
        r#"
        SELECT s.*
        FROM petty_cash_spends s
        JOIN petty_cash_withdrawals w ON w.id = s.withdrawal_id
        WHERE w.deposit_id = $1
        ORDER BY s.spend_date, s.created_at
        "#,
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let withdrawn_cents: i64 = withdrawals.iter().map(|w| w.amount_cents).sum();
    let withdrawals = withdrawals
        .into_iter()
        .map(|withdrawal| {
            let spends = spends
                .iter()
                .filter(|s| s.withdrawal_id == withdrawal.id)
                .cloned()
                .collect();
            WithdrawalWithSpends { withdrawal, spends }
        })
        .collect();

    Ok(DepositDetail {
        available_cents: deposit.amount_cents - withdrawn_cents,
        deposit,
        withdrawals,
        withdrawn_cents,
    })
}

/// Hand part of an open deposit to a user of the organization.
pub async fn create_withdrawal(
    pool: &DbPool,
    tenant: &Tenant,
    deposit_id: Uuid,
    request: CreateWithdrawalRequest,
) -> Result<PettyCashWithdrawal, AppError> {
    tenant.require_role(CASH_HANDLERS)?;

    let recipient_ok: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = $1 AND organization_id = $2 AND is_active = true)",
    )
    .bind(request.recipient_id)
    .bind(tenant.organization_id)
    .fetch_one(pool)
    .await?;
    if !recipient_ok {
        return Err(AppError::NotFound("User"));
    }

    let mut tx = pool.begin().await?;

    let (status, amount): (DepositStatus, i64) = sqlx::query_as(
        "SELECT status, amount_cents FROM petty_cash_deposits WHERE id = $1 AND organization_id = $2 FOR UPDATE",
    )
    .bind(deposit_id)
    .bind(tenant.organization_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Deposit"))?;

    let withdrawn: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_cents), 0)::bigint FROM petty_cash_withdrawals WHERE deposit_id = $1",
    )
    .bind(deposit_id)
    .fetch_one(&mut *tx)
    .await?;

    check_withdrawal(status, amount, withdrawn, request.amount_cents)?;

    let withdrawal = sqlx::query_as::<_, PettyCashWithdrawal>(
        r#"
        INSERT INTO petty_cash_withdrawals (deposit_id, recipient_id, amount_cents, withdrawal_date, status)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(deposit_id)
    .bind(request.recipient_id)
    .bind(request.amount_cents)
    .bind(request.withdrawal_date.unwrap_or_else(today))
    .bind(WithdrawalStatus::PendingJustification)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        deposit_id = %deposit_id,
        withdrawal_id = %withdrawal.id,
        amount_cents = withdrawal.amount_cents,
        "petty cash withdrawal created"
    );
    Ok(withdrawal)
}

/// Withdrawal plus the status of its deposit.
///
/// Locks the deposit `FOR SHARE` before the withdrawal `FOR UPDATE`, the
/// same order as withdrawals and closes take. Spends on one deposit still
/// run side by side, but a close waits for them and sees their result.
async fn lock_withdrawal(
    conn: &mut sqlx::PgConnection,
    organization_id: Uuid,
    withdrawal_id: Uuid,
) -> Result<(PettyCashWithdrawal, DepositStatus), AppError> {
    let (deposit_id, status): (Uuid, DepositStatus) = sqlx::query_as(
        r#"
        SELECT d.id, d.status
        FROM petty_cash_deposits d
        JOIN petty_cash_withdrawals w ON w.deposit_id = d.id
        WHERE w.id = $1 AND d.organization_id = $2
        FOR SHARE OF d
        "#,
    )
    .bind(withdrawal_id)
    .bind(organization_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::NotFound("Withdrawal"))?;

    let withdrawal = sqlx::query_as::<_, PettyCashWithdrawal>(
        "SELECT * FROM petty_cash_withdrawals WHERE id = $1 AND deposit_id = $2 FOR UPDATE",
    )
    .bind(withdrawal_id)
    .bind(deposit_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok((withdrawal, status))
}

/// Write `justified_cents` and the status derived from it.
async fn store_justification(
    conn: &mut sqlx::PgConnection,
    withdrawal: &PettyCashWithdrawal,
    justified_cents: i64,
) -> Result<(), AppError> {
    sqlx::query("UPDATE petty_cash_withdrawals SET justified_cents = $1, status = $2 WHERE id = $3")
        .bind(justified_cents)
        .bind(withdrawal_status(withdrawal.amount_cents, justified_cents))
        .bind(withdrawal.id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Justify part of a withdrawal. Recipients record their own spends;
/// cash handlers may record them for anyone.
pub async fn create_spend(
    pool: &DbPool,
    tenant: &Tenant,
    withdrawal_id: Uuid,
    request: CreateSpendRequest,
) -> Result<PettyCashSpend, AppError> {
    let motive = validation::required_name("motive", &request.motive)?;
    let description = validation::optional_text("description", request.description)?;
    let ticket_key = validation::optional_text("ticket_key", request.ticket_key)?;

    let mut tx = pool.begin().await?;
    let (withdrawal, deposit_status) = lock_withdrawal(&mut tx, tenant.organization_id, withdrawal_id).await?;
    if withdrawal.recipient_id != tenant.user_id {
        tenant.require_role(CASH_HANDLERS)?;
    }

    check_spend(
        deposit_status,
        withdrawal.amount_cents,
        withdrawal.justified_cents,
        request.amount_cents,
    )?;

    let spend = sqlx::query_as::<_, PettyCashSpend>(
        r#"
        INSERT INTO petty_cash_spends (withdrawal_id, motive, description, amount_cents, ticket_key, spend_date)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(withdrawal.id)
    .bind(&motive)
    .bind(&description)
    .bind(request.amount_cents)
    .bind(&ticket_key)
    .bind(request.spend_date.unwrap_or_else(today))
    .fetch_one(&mut *tx)
    .await?;

    store_justification(&mut tx, &withdrawal, withdrawal.justified_cents + spend.amount_cents).await?;
    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        withdrawal_id = %withdrawal.id,
        spend_id = %spend.id,
        amount_cents = spend.amount_cents,
        "petty cash spend recorded"
    );
    Ok(spend)
}

/// Remove a spend and re-derive its withdrawal's status.
pub async fn delete_spend(pool: &DbPool, tenant: &Tenant, spend_id: Uuid) -> Result<(), AppError> {
    tenant.require_role(CASH_HANDLERS)?;

    let mut tx = pool.begin().await?;

    let withdrawal_id: Uuid = sqlx::query_scalar(
        r#"
        SELECT s.withdrawal_id
        FROM petty_cash_spends s
        JOIN petty_cash_withdrawals w ON w.id = s.withdrawal_id
        JOIN petty_cash_deposits d ON d.id = w.deposit_id
        WHERE s.id = $1 AND d.organization_id = $2
        "#,
    )
    .bind(spend_id)
    .bind(tenant.organization_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Spend"))?;

    let (withdrawal, deposit_status) = lock_withdrawal(&mut tx, tenant.organization_id, withdrawal_id).await?;
    if deposit_status == DepositStatus::Closed {
        return Err(AppError::InvalidStateTransition(
            "spends of a closed deposit cannot be deleted".to_string(),
        ));
    }

    sqlx::query("DELETE FROM petty_cash_spends WHERE id = $1")
        .bind(spend_id)
        .execute(&mut *tx)
        .await?;

    let justified: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(amount_cents), 0)::bigint FROM petty_cash_spends WHERE withdrawal_id = $1",
    )
    .bind(withdrawal.id)
    .fetch_one(&mut *tx)
    .await?;

    store_justification(&mut tx, &withdrawal, justified).await?;
    tx.commit().await?;

    tracing::info!(
        organization_id = %tenant.organization_id,
        withdrawal_id = %withdrawal.id,
        spend_id = %spend_id,
        "petty cash spend deleted"
    );
    Ok(())
}

/// Close a deposit whose withdrawals are all justified.
pub async fn close_deposit(pool: &DbPool, tenant: &Tenant, id: Uuid) -> Result<PettyCashDeposit, AppError> {
    tenant.require_manager()?;

    let mut tx = pool.begin().await?;

    let status: DepositStatus = sqlx::query_scalar(
        "SELECT status FROM petty_cash_deposits WHERE id = $1 AND organization_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(tenant.organization_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Deposit"))?;
    if status == DepositStatus::Closed {
        return Err(AppError::InvalidStateTransition(
            "deposit is already closed".to_string(),
        ));
    }

    let statuses: Vec<WithdrawalStatus> =
        sqlx::query_scalar("SELECT status FROM petty_cash_withdrawals WHERE deposit_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;
    check_close(&statuses)?;

    let deposit = sqlx::query_as::<_, PettyCashDeposit>(
        "UPDATE petty_cash_deposits SET status = $1 WHERE id = $2 RETURNING *",
    )
    .bind(DepositStatus::Closed)
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(organization_id = %tenant.organization_id, deposit_id = %id, "petty cash deposit closed");
    Ok(deposit)
}

/// Cash position per branch over open deposits. A `null` branch is the
/// organization-wide float.
pub async fn balances(pool: &DbPool, tenant: &Tenant) -> Result<Vec<PettyCashBalance>, AppError> {
    let rows = sqlx::query_as::<_, PettyCashBalance>(
        r#"
        SELECT d.branch_id,
               SUM(d.amount_cents)::bigint AS deposited_cents,
               COALESCE(SUM(w.withdrawn), 0)::bigint AS withdrawn_cents,
               COALESCE(SUM(w.justified), 0)::bigint AS justified_cents,
               (SUM(d.amount_cents) - COALESCE(SUM(w.withdrawn), 0))::bigint AS available_cents
        FROM petty_cash_deposits d
        LEFT JOIN (
            SELECT deposit_id,
                   SUM(amount_cents) AS withdrawn,
                   SUM(justified_cents) AS justified
            FROM petty_cash_withdrawals
            GROUP BY deposit_id
        ) w ON w.deposit_id = d.id
        WHERE d.organization_id = $1 AND d.status = 'OPEN'
        GROUP BY d.branch_id
        ORDER BY d.branch_id NULLS FIRST
        "#,
    )
    .bind(tenant.organization_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
