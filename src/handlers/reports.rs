//! Report endpoints.
//!
//! - GET /api/v1/reports/inventory
//! - GET /api/v1/reports/sales
//! - GET /api/v1/reports/current-accounts
//! - GET /api/v1/reports/petty-cash
//!
//! Every report accepts `format=json` (default) or `format=pdf`; PDFs are
//! sent as attachments.

use axum::{
    Json,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    db::DbPool,
    error::AppError,
    middleware::tenant::Tenant,
    models::report::{ReportFormat, ReportQuery},
    reports::{ReportDocument, pdf},
    services::report_service,
};

/// Send the report as JSON or render it to PDF.
fn respond<R>(format: ReportFormat, report: R) -> Result<Response, AppError>
where
    R: Serialize,
    for<'a> ReportDocument: From<&'a R>,
{
    match format {
        ReportFormat::Json => Ok(Json(report).into_response()),
        ReportFormat::Pdf => {
            let document = ReportDocument::from(&report);
            let bytes = pdf::render(&document)?;
            let disposition = format!("attachment; filename=\"{}\"", document.file_name());
            Ok((
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
    }
}

/// Units grouped by state and branch, with cost and list-price totals.
///
/// # Query Parameters
///
/// - `branch_id`: restrict to one branch
/// - `format`: `json` or `pdf`
pub async fn inventory(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let report = report_service::inventory(&pool, &tenant, &query).await?;
    respond(query.format, report)
}

/// Units sold and revenue by brand and by branch between `from` and `to`
/// (inclusive).
pub async fn sales(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let report = report_service::sales(&pool, &tenant, &query).await?;
    respond(query.format, report)
}

/// Open accounts with their outstanding and overdue balances.
pub async fn current_accounts(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let report = report_service::current_accounts(&pool, &tenant).await?;
    respond(query.format, report)
}

pub async fn petty_cash(
    State(pool): State<DbPool>,
    tenant: Tenant,
    Query(query): Query<ReportQuery>,
) -> Result<Response, AppError> {
    let report = report_service::petty_cash(&pool, &tenant, &query).await?;
    respond(query.format, report)
}
