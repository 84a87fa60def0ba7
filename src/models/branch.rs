//! Branch (sucursal) models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Physical location of the dealership. Motorcycles and petty cash
/// deposits belong to a branch.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Branch {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub organization_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Position in selectors and reports, lowest first.
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBranchRequest {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBranchRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}
