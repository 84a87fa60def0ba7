//! Payment registration and annulment against a migrated database.
//!
//! Run with `DATABASE_URL` pointing at a Postgres server; `sqlx::test`
//! creates a fresh database per test.

mod common;

use chrono::Duration;
use sqlx::PgPool;

use moto_backoffice::{
    domain::allocation::{AccountStatus, InstallmentStatus},
    error::AppError,
    models::{
        current_account::{PaymentMethod, PaymentStatus, RegisterPaymentRequest},
        mercadopago::Settlement,
    },
    services::{
        current_account_service::{self, IncomingPayment, today},
        mercadopago_service::{self, GatewayPayment},
    },
};

fn cash(amount_cents: i64, installment_number: Option<i32>) -> RegisterPaymentRequest {
    RegisterPaymentRequest {
        amount_cents,
        method: PaymentMethod::Cash,
        installment_number,
        payment_date: None,
        reference: None,
        notes: None,
    }
}

fn gateway(amount_cents: i64, method: PaymentMethod, reference: &str) -> IncomingPayment {
    IncomingPayment {
        amount_cents,
        method,
        installment_number: None,
        payment_date: today(),
        reference: Some(reference.to_string()),
        notes: None,
        recorded_by: None,
    }
}

#[sqlx::test]
async fn test_annulling_the_last_payment_reopens_a_paid_off_account(pool: PgPool) {
    let org = common::organization(&pool, "annul").await;
    let tenant = org.admin();
    let account = common::account(&pool, org.id, "AN0001").await;

    let receipt = current_account_service::register_payment(&pool, &tenant, account.account.id, cash(300_000, None))
        .await
        .unwrap();
    assert_eq!(receipt.account_status, AccountStatus::PaidOff);
    assert_eq!(receipt.outstanding_cents, 0);
    assert_eq!(receipt.allocations.len(), 3);

    let detail = current_account_service::annul_payment(&pool, &tenant, account.account.id, receipt.payment.id)
        .await
        .unwrap();

    assert_eq!(detail.account.status, AccountStatus::Active);
    assert_eq!(detail.paid_cents, 0);
    assert_eq!(detail.outstanding_cents, 300_000);
    for installment in &detail.installments {
        assert_eq!(installment.paid_cents, 0);
        assert_eq!(installment.status, InstallmentStatus::Pending);
    }
    assert_eq!(detail.payments.len(), 1);
    assert_eq!(detail.payments[0].status, PaymentStatus::Annulled);

    let again = current_account_service::annul_payment(&pool, &tenant, account.account.id, receipt.payment.id).await;
    assert!(matches!(again, Err(AppError::InvalidStateTransition(_))));
}

#[sqlx::test]
async fn test_surplus_over_the_target_installment_goes_to_the_oldest_open_one(pool: PgPool) {
    let org = common::organization(&pool, "surplus").await;
    let tenant = org.admin();
    let account = common::account(&pool, org.id, "SP0001").await;

    let receipt = current_account_service::register_payment(&pool, &tenant, account.account.id, cash(150_000, Some(2)))
        .await
        .unwrap();

    let applied: Vec<(i32, i64)> = receipt.allocations.iter().map(|a| (a.number, a.amount_cents)).collect();
    assert_eq!(applied, vec![(2, 100_000), (1, 50_000)]);
    assert_eq!(receipt.account_status, AccountStatus::Active);
    assert_eq!(receipt.outstanding_cents, 150_000);

    let stored: Vec<(i32, i64)> = sqlx::query_as(
        r#"
        SELECT i.number, pa.amount_cents
        FROM payment_allocations pa
        JOIN installments i ON i.id = pa.installment_id
        WHERE pa.payment_id = $1
        ORDER BY i.number
        "#,
    )
    .bind(receipt.payment.id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(stored, vec![(1, 50_000), (2, 100_000)]);

    let detail = current_account_service::get(&pool, &tenant, account.account.id).await.unwrap();
    let statuses: Vec<(i64, InstallmentStatus)> = detail
        .installments
        .iter()
        .map(|i| (i.paid_cents, i.status))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (50_000, InstallmentStatus::Partial),
            (100_000, InstallmentStatus::Paid),
            (0, InstallmentStatus::Pending),
        ]
    );

    let over = current_account_service::register_payment(&pool, &tenant, account.account.id, cash(150_001, None)).await;
    assert!(matches!(over, Err(AppError::InsufficientFunds(_))));
}

#[sqlx::test]
async fn test_gateway_reference_is_unique_across_checkout_and_terminal(pool: PgPool) {
    let org = common::organization(&pool, "gateway").await;
    let account = common::account(&pool, org.id, "GW0001").await;
    let id = account.account.id;

    current_account_service::apply_payment(&pool, org.id, id, gateway(50_000, PaymentMethod::Mercadopago, "98765"))
        .await
        .unwrap();

    let twin = current_account_service::apply_payment(&pool, org.id, id, gateway(50_000, PaymentMethod::Point, "98765")).await;
    assert!(matches!(twin, Err(AppError::Conflict(_))));

    let settlement = mercadopago_service::record_gateway_payment(
        &pool,
        org.id,
        GatewayPayment {
            installment_id: account.installments[0].id,
            reference: "98765".to_string(),
            amount_cents: 50_000,
            method: PaymentMethod::Point,
        },
    )
    .await
    .unwrap();
    assert!(matches!(settlement, Settlement::AlreadyRecorded));

    // Manual references live in their own namespace.
    current_account_service::apply_payment(&pool, org.id, id, gateway(10_000, PaymentMethod::Transfer, "98765"))
        .await
        .unwrap();

    let paid: i64 = sqlx::query_scalar("SELECT SUM(paid_cents)::bigint FROM installments WHERE current_account_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(paid, 60_000);
}

#[sqlx::test]
async fn test_simultaneous_gateway_deliveries_record_one_payment(pool: PgPool) {
    let org = common::organization(&pool, "race").await;
    let account = common::account(&pool, org.id, "RC0001").await;
    let installment_id = account.installments[0].id;

    let delivery = |method| {
        mercadopago_service::record_gateway_payment(
            &pool,
            org.id,
            GatewayPayment {
                installment_id,
                reference: "55555".to_string(),
                amount_cents: 100_000,
                method,
            },
        )
    };
    let (webhook, poll) = tokio::join!(delivery(PaymentMethod::Mercadopago), delivery(PaymentMethod::Point));

    let outcomes = [webhook.unwrap(), poll.unwrap()];
    let registered = outcomes
        .iter()
        .filter(|s| matches!(s, Settlement::Registered { .. }))
        .count();
    let duplicates = outcomes
        .iter()
        .filter(|s| matches!(s, Settlement::AlreadyRecorded))
        .count();
    assert_eq!((registered, duplicates), (1, 1));

    let completed: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payments WHERE current_account_id = $1 AND status = 'COMPLETED'",
    )
    .bind(account.account.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(completed, 1);
}

#[sqlx::test]
async fn test_back_dated_payment_keeps_a_current_arrear_visible(pool: PgPool) {
    let org = common::organization(&pool, "arrear").await;
    let tenant = org.admin();
    let account = common::account_from(&pool, org.id, "AR0001", today() - Duration::days(40)).await;

    let mut request = cash(100_000, Some(1));
    request.payment_date = Some(today() - Duration::days(45));
    let receipt = current_account_service::register_payment(&pool, &tenant, account.account.id, request)
        .await
        .unwrap();

    // On the payment date nothing was due yet; today the second installment is late.
    assert_eq!(receipt.account_status, AccountStatus::Overdue);
    let detail = current_account_service::get(&pool, &tenant, account.account.id).await.unwrap();
    let statuses: Vec<InstallmentStatus> = detail.installments.iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![InstallmentStatus::Paid, InstallmentStatus::Overdue, InstallmentStatus::Pending]
    );
}
