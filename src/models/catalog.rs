//! Brand and model catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Brand {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub organization_id: Uuid,
    pub name: String,
    /// `#rrggbb`, used as the brand accent in listings.
    pub color: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBrandRequest {
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBrandRequest {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// A model of a brand (e.g. "XR 150L" for Honda).
///
/// Models have no organization column; they are scoped through their brand.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct MotorcycleModel {
    pub id: Uuid,
    pub brand_id: Uuid,
    pub name: String,
    /// Storage key of the catalog picture.
    pub image_key: Option<String>,
    /// Storage key of the technical sheet (PDF).
    pub spec_sheet_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateModelRequest {
    pub name: String,
    pub image_key: Option<String>,
    pub spec_sheet_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateModelRequest {
    pub name: Option<String>,
    pub image_key: Option<String>,
    pub spec_sheet_key: Option<String>,
}

/// Brand with its models, as returned by `GET /api/v1/brands/{id}`.
#[derive(Debug, Serialize)]
pub struct BrandWithModels {
    #[serde(flatten)]
    pub brand: Brand,
    pub models: Vec<MotorcycleModel>,
}
