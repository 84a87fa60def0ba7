//! Petty cash locking against a migrated database.

mod common;

use std::time::Duration;

use sqlx::PgPool;
use uuid::Uuid;

use moto_backoffice::{
    domain::petty_cash::{DepositStatus, WithdrawalStatus},
    error::AppError,
    middleware::tenant::Tenant,
    models::petty_cash::{CreateDepositRequest, CreateSpendRequest, CreateWithdrawalRequest},
    services::petty_cash_service,
};

/// Open deposit with one withdrawal fully justified by a single spend.
async fn justified_withdrawal(pool: &PgPool, tenant: &Tenant) -> (Uuid, Uuid, Uuid) {
    let deposit = petty_cash_service::create_deposit(
        pool,
        tenant,
        CreateDepositRequest {
            branch_id: None,
            amount_cents: 50_000,
            description: "Caja chica octubre".to_string(),
            reference: None,
            deposit_date: None,
        },
    )
    .await
    .unwrap();
    let withdrawal = petty_cash_service::create_withdrawal(
        pool,
        tenant,
        deposit.id,
        CreateWithdrawalRequest {
            recipient_id: tenant.user_id,
            amount_cents: 20_000,
            withdrawal_date: None,
        },
    )
    .await
    .unwrap();
    let spend = petty_cash_service::create_spend(
        pool,
        tenant,
        withdrawal.id,
        CreateSpendRequest {
            motive: "Combustible".to_string(),
            description: None,
            amount_cents: 20_000,
            ticket_key: None,
            spend_date: None,
        },
    )
    .await
    .unwrap();
    (deposit.id, withdrawal.id, spend.id)
}

async fn withdrawal_state(pool: &PgPool, id: Uuid) -> (i64, WithdrawalStatus) {
    sqlx::query_as("SELECT justified_cents, status FROM petty_cash_withdrawals WHERE id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
async fn test_spend_deletion_waits_for_a_close_in_progress(pool: PgPool) {
    let org = common::organization(&pool, "petty-close").await;
    let tenant = org.admin();
    let (deposit_id, withdrawal_id, spend_id) = justified_withdrawal(&pool, &tenant).await;

    // Same lock and write a close takes, held open.
    let mut closing = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM petty_cash_deposits WHERE id = $1 FOR UPDATE")
        .bind(deposit_id)
        .execute(&mut *closing)
        .await
        .unwrap();

    let deleting = tokio::spawn({
        let pool = pool.clone();
        let tenant = tenant.clone();
        async move { petty_cash_service::delete_spend(&pool, &tenant, spend_id).await }
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!deleting.is_finished());

    sqlx::query("UPDATE petty_cash_deposits SET status = 'CLOSED' WHERE id = $1")
        .bind(deposit_id)
        .execute(&mut *closing)
        .await
        .unwrap();
    closing.commit().await.unwrap();

    let result = deleting.await.unwrap();
    assert!(matches!(result, Err(AppError::InvalidStateTransition(_))));
    assert_eq!(
        withdrawal_state(&pool, withdrawal_id).await,
        (20_000, WithdrawalStatus::Justified)
    );
}

#[sqlx::test]
async fn test_close_waits_for_a_spend_in_progress(pool: PgPool) {
    let org = common::organization(&pool, "petty-spend").await;
    let tenant = org.admin();
    let (deposit_id, withdrawal_id, spend_id) = justified_withdrawal(&pool, &tenant).await;

    // A spend deletion that has taken its locks but not committed yet.
    let mut spending = pool.begin().await.unwrap();
    sqlx::query("SELECT id FROM petty_cash_deposits WHERE id = $1 FOR SHARE")
        .bind(deposit_id)
        .execute(&mut *spending)
        .await
        .unwrap();
    sqlx::query("DELETE FROM petty_cash_spends WHERE id = $1")
        .bind(spend_id)
        .execute(&mut *spending)
        .await
        .unwrap();
    sqlx::query(
        "UPDATE petty_cash_withdrawals SET justified_cents = 0, status = 'PENDING_JUSTIFICATION' WHERE id = $1",
    )
    .bind(withdrawal_id)
    .execute(&mut *spending)
    .await
    .unwrap();

    let closing = tokio::spawn({
        let pool = pool.clone();
        let tenant = tenant.clone();
        async move { petty_cash_service::close_deposit(&pool, &tenant, deposit_id).await }
    });
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!closing.is_finished());

    spending.commit().await.unwrap();

    let result = closing.await.unwrap();
    assert!(matches!(result, Err(AppError::InvalidStateTransition(_))));
    let status: DepositStatus = sqlx::query_scalar("SELECT status FROM petty_cash_deposits WHERE id = $1")
        .bind(deposit_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, DepositStatus::Open);
}

#[sqlx::test]
async fn test_close_succeeds_once_every_withdrawal_is_justified(pool: PgPool) {
    let org = common::organization(&pool, "petty-ok").await;
    let tenant = org.admin();
    let (deposit_id, _, spend_id) = justified_withdrawal(&pool, &tenant).await;

    let closed = petty_cash_service::close_deposit(&pool, &tenant, deposit_id).await.unwrap();
    assert_eq!(closed.status, DepositStatus::Closed);

    let late = petty_cash_service::delete_spend(&pool, &tenant, spend_id).await;
    assert!(matches!(late, Err(AppError::InvalidStateTransition(_))));
}
