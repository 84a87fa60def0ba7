//! Fixtures for tests that run against a migrated database.
//!
//! Rows are inserted with plain SQL so each test only exercises the service
//! it is about.

#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use sqlx::PgPool;
use uuid::Uuid;

use moto_backoffice::{
    domain::amortization::PaymentFrequency,
    middleware::tenant::Tenant,
    models::{current_account::CurrentAccountDetail, user::UserRole},
    services::current_account_service::{self, FinancingTerms, today},
};

pub struct Organization {
    pub id: Uuid,
    pub admin_id: Uuid,
}

impl Organization {
    pub fn tenant(&self, role: UserRole) -> Tenant {
        Tenant {
            organization_id: self.id,
            user_id: self.admin_id,
            role,
        }
    }

    pub fn admin(&self) -> Tenant {
        self.tenant(UserRole::Admin)
    }
}

pub async fn organization(pool: &PgPool, slug: &str) -> Organization {
    let id: Uuid = sqlx::query_scalar("INSERT INTO organizations (name, slug) VALUES ($1, $1) RETURNING id")
        .bind(slug)
        .fetch_one(pool)
        .await
        .unwrap();
    let admin_id = user(pool, id, &format!("admin@{slug}.test"), UserRole::Admin).await;
    Organization { id, admin_id }
}

pub async fn user(pool: &PgPool, organization_id: Uuid, email: &str, role: UserRole) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO users (organization_id, email, name, password_hash, role) VALUES ($1, $2, $2, 'x', $3) RETURNING id",
    )
    .bind(organization_id)
    .bind(email)
    .bind(role)
    .fetch_one(pool)
    .await
    .unwrap()
}

/// A client and a unit sold to them.
pub async fn sold_motorcycle(pool: &PgPool, organization_id: Uuid, chassis: &str) -> (Uuid, Uuid) {
    let branch_id: Uuid = sqlx::query_scalar(
        "INSERT INTO branches (organization_id, name) VALUES ($1, 'Centro') ON CONFLICT (organization_id, name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(organization_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let brand_id: Uuid = sqlx::query_scalar(
        "INSERT INTO brands (organization_id, name) VALUES ($1, 'Honda') ON CONFLICT (organization_id, name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(organization_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let model_id: Uuid = sqlx::query_scalar(
        "INSERT INTO models (brand_id, name) VALUES ($1, 'CB 190R') ON CONFLICT (brand_id, name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(brand_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let client_id: Uuid = sqlx::query_scalar(
        "INSERT INTO clients (organization_id, first_name, last_name, tax_id) VALUES ($1, 'Ana', 'Gomez', $2) RETURNING id",
    )
    .bind(organization_id)
    .bind(format!("20-{chassis}-3"))
    .fetch_one(pool)
    .await
    .unwrap();
    let motorcycle_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO motorcycles (
            organization_id, branch_id, brand_id, model_id, year, chassis_number,
            retail_price_cents, state, client_id, sale_price_cents, sold_at
        )
        VALUES ($1, $2, $3, $4, 2024, $5, 300000, 'SOLD', $6, 300000, NOW())
        RETURNING id
        "#,
    )
    .bind(organization_id)
    .bind(branch_id)
    .bind(brand_id)
    .bind(model_id)
    .bind(chassis)
    .bind(client_id)
    .fetch_one(pool)
    .await
    .unwrap();
    (client_id, motorcycle_id)
}

/// Interest-free account of three monthly installments of 100000 cents,
/// the first one due in a month.
pub async fn account(pool: &PgPool, organization_id: Uuid, chassis: &str) -> CurrentAccountDetail {
    account_from(pool, organization_id, chassis, today() + Duration::days(30)).await
}

pub async fn account_from(
    pool: &PgPool,
    organization_id: Uuid,
    chassis: &str,
    first_due: NaiveDate,
) -> CurrentAccountDetail {
    let (client_id, motorcycle_id) = sold_motorcycle(pool, organization_id, chassis).await;
    let terms = FinancingTerms::new(300_000, 0, 3, 0, PaymentFrequency::Monthly, first_due).unwrap();

    let mut tx = pool.begin().await.unwrap();
    let detail = current_account_service::insert_account(
        &mut tx,
        organization_id,
        client_id,
        motorcycle_id,
        &terms,
        "ARS",
        None,
    )
    .await
    .unwrap();
    tx.commit().await.unwrap();
    detail
}
