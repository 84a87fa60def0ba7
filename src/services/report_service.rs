//! Report queries.
//!
//! Every report is a handful of aggregate queries scoped to the tenant.
//! Rendering lives in `crate::reports`.

use chrono::Utc;

use crate::{
    db::DbPool,
    domain::allocation::AccountStatus,
    error::AppError,
    middleware::tenant::Tenant,
    models::report::{
        AccountReportRow, CurrentAccountsReport, InventoryReport, InventoryRow, PettyCashMovement,
        PettyCashReport, ReportQuery, SalesGroupRow, SalesReport,
    },
    models::user::UserRole,
    services::current_account_service::{self, today},
};

const FINANCE_READERS: &[UserRole] = &[UserRole::Admin, UserRole::Manager, UserRole::Cashier];

fn resolve_range(query: &ReportQuery) -> Result<(chrono::NaiveDate, chrono::NaiveDate), AppError> {
    let (from, to) = query.range().resolve(today());
    if from > to {
        return Err(AppError::InvalidRequest("from must not be after to".to_string()));
    }
    Ok((from, to))
}

/// Units and their cost/retail value by branch and state.
pub async fn inventory(pool: &DbPool, tenant: &Tenant, query: &ReportQuery) -> Result<InventoryReport, AppError> {
    tenant.require_manager()?;

    let rows = sqlx::query_as::<_, InventoryRow>(
        r#"
        SELECT br.name AS branch_name, m.state, m.currency,
               COUNT(*)::bigint AS units,
               COALESCE(SUM(m.cost_price_cents), 0)::bigint AS cost_cents,
               COALESCE(SUM(m.retail_price_cents), 0)::bigint AS retail_cents
        FROM motorcycles m
        JOIN branches br ON br.id = m.branch_id
        WHERE m.organization_id = $1
          AND m.state <> 'ELIMINATED'
          AND ($2::uuid IS NULL OR m.branch_id = $2)
        GROUP BY br.display_order, br.name, m.state, m.currency
        ORDER BY br.display_order, br.name, m.state
        "#,
    )
    .bind(tenant.organization_id)
    .bind(query.branch_id)
    .fetch_all(pool)
    .await?;

    let total_units = rows.iter().map(|r| r.units).sum();
    Ok(InventoryReport {
        generated_at: Utc::now(),
        rows,
        total_units,
    })
}

/// Units sold and revenue by brand and by branch.
pub async fn sales(pool: &DbPool, tenant: &Tenant, query: &ReportQuery) -> Result<SalesReport, AppError> {
    tenant.require_manager()?;
    let (from, to) = resolve_range(query)?;

    let grouped = |join: &str, name: &str| {
        format!(
            r#"
            SELECT {name} AS name, m.currency,
                   COUNT(*)::bigint AS units,
                   COALESCE(SUM(m.sale_price_cents), 0)::bigint AS revenue_cents
            FROM motorcycles m
            {join}
            WHERE m.organization_id = $1
              AND m.state = 'SOLD'
              AND m.sold_at::date BETWEEN $2 AND $3
              AND ($4::uuid IS NULL OR m.branch_id = $4)
            GROUP BY {name}, m.currency
            ORDER BY revenue_cents DESC, name
            "#
        )
    };

    let by_brand = sqlx::query_as::<_, SalesGroupRow>(&grouped("JOIN brands b ON b.id = m.brand_id", "b.name"))
        .bind(tenant.organization_id)
        .bind(from)
        .bind(to)
        .bind(query.branch_id)
        .fetch_all(pool)
        .await?;

    let by_branch =
        sqlx::query_as::<_, SalesGroupRow>(&grouped("JOIN branches br ON br.id = m.branch_id", "br.name"))
            .bind(tenant.organization_id)
            .bind(from)
            .bind(to)
            .bind(query.branch_id)
            .fetch_all(pool)
            .await?;

    let total_units = by_brand.iter().map(|r| r.units).sum();
    Ok(SalesReport {
        generated_at: Utc::now(),
        from,
        to,
        by_brand,
        by_branch,
        total_units,
    })
}

/// Open accounts with what is outstanding and what is already late.
pub async fn current_accounts(pool: &DbPool, tenant: &Tenant) -> Result<CurrentAccountsReport, AppError> {
    tenant.require_role(FINANCE_READERS)?;

    let as_of = today();
    current_account_service::mark_overdue(pool, tenant.organization_id, as_of).await?;

    let rows = sqlx::query_as::<_, AccountReportRow>(
        r#"
        SELECT ca.id AS account_id,
               c.last_name || ', ' || c.first_name AS client_name,
               m.chassis_number,
               ca.status,
               ca.currency,
               COALESCE(SUM(i.paid_cents), 0)::bigint AS paid_cents,
               COALESCE(SUM(i.amount_cents - i.paid_cents), 0)::bigint AS outstanding_cents,
               COALESCE(SUM(i.amount_cents - i.paid_cents)
                   FILTER (WHERE i.due_date < $2 AND i.paid_cents < i.amount_cents), 0)::bigint AS overdue_cents,
               COUNT(i.id) FILTER (WHERE i.due_date < $2 AND i.paid_cents < i.amount_cents) AS overdue_installments
        FROM current_accounts ca
        JOIN clients c ON c.id = ca.client_id
        JOIN motorcycles m ON m.id = ca.motorcycle_id
        LEFT JOIN installments i ON i.current_account_id = ca.id
        WHERE ca.organization_id = $1
          AND ca.status IN ('ACTIVE', 'OVERDUE')
        GROUP BY ca.id, c.last_name, c.first_name, m.chassis_number
        ORDER BY overdue_cents DESC, client_name
        "#,
    )
    .bind(tenant.organization_id)
    .bind(as_of)
    .fetch_all(pool)
    .await?;

    let overdue_accounts = rows.iter().filter(|r| r.status == AccountStatus::Overdue).count();
    Ok(CurrentAccountsReport {
        generated_at: Utc::now(),
        as_of,
        open_accounts: rows.len(),
        overdue_accounts,
        rows,
    })
}

/// Deposits, withdrawals and spends dated inside the range.
pub async fn petty_cash(pool: &DbPool, tenant: &Tenant, query: &ReportQuery) -> Result<PettyCashReport, AppError> {
    tenant.require_role(FINANCE_READERS)?;
    let (from, to) = resolve_range(query)?;

    let movements = sqlx::query_as::<_, PettyCashMovement>(
        r#"
        SELECT d.deposit_date AS date, 'DEPOSIT' AS kind, br.name AS branch_name,
               d.description AS detail, d.amount_cents
        FROM petty_cash_deposits d
        LEFT JOIN branches br ON br.id = d.branch_id
        WHERE d.organization_id = $1
          AND d.deposit_date BETWEEN $2 AND $3
          AND ($4::uuid IS NULL OR d.branch_id = $4)

        UNION ALL

        SELECT w.withdrawal_date, 'WITHDRAWAL', br.name, u.name, w.amount_cents
        FROM petty_cash_withdrawals w
        JOIN petty_cash_deposits d ON d.id = w.deposit_id
        JOIN users u ON u.id = w.recipient_id
        LEFT JOIN branches br ON br.id = d.branch_id
        WHERE d.organization_id = $1
          AND w.withdrawal_date BETWEEN $2 AND $3
          AND ($4::uuid IS NULL OR d.branch_id = $4)

        UNION ALL

        SELECT s.spend_date, 'SPEND', br.name, s.motive, s.amount_cents
        FROM petty_cash_spends s
        JOIN petty_cash_withdrawals w ON w.id = s.withdrawal_id
        JOIN petty_cash_deposits d ON d.id = w.deposit_id
        LEFT JOIN branches br ON br.id = d.branch_id
        WHERE d.organization_id = $1
          AND s.spend_date BETWEEN $2 AND $3
          AND ($4::uuid IS NULL OR d.branch_id = $4)

        ORDER BY date, kind
        "#,
    )
    .bind(tenant.organization_id)
    .bind(from)
    .bind(to)
    .bind(query.branch_id)
    .fetch_all(pool)
    .await?;

    Ok(PettyCashReport::new(Utc::now(), from, to, movements))
}
