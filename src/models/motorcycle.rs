//! Motorcycle inventory models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::inventory::MotorcycleState;
use crate::models::sale::SalePaymentType;

/// Represents a motorcycle unit from the database.
///
/// # Database Table
///
/// Maps to the `motorcycles` table. Each unit:
/// - Belongs to one organization and sits in one branch
/// - References its brand and model (and optionally its supplier)
/// - Has a chassis number unique within the organization
/// - Stores prices as `i64` cents
///
/// Sale columns (`client_id`, `sale_price_cents`, `sold_at`, ...) are filled
/// when the unit is reserved or sold.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Motorcycle {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub organization_id: Uuid,
    pub branch_id: Uuid,
    pub brand_id: Uuid,
    pub model_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub year: i32,
    pub chassis_number: String,
    pub engine_number: Option<String>,
    pub color: Option<String>,
    pub mileage_km: i32,
    pub license_plate: Option<String>,
    pub cost_price_cents: i64,
    pub retail_price_cents: i64,
    pub wholesale_price_cents: Option<i64>,
    pub currency: String,
    pub state: MotorcycleState,
    pub client_id: Option<Uuid>,
    pub reservation_amount_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub payment_type: Option<SalePaymentType>,
    pub seller_id: Option<Uuid>,
    pub sold_at: Option<DateTime<Utc>>,
    pub image_key: Option<String>,
    pub observations: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "ARS".to_string()
}

/// Request body for creating a single unit.
///
/// ```json
/// {
///   "branch_id": "…", "brand_id": "…", "model_id": "…",
///   "year": 2024,
///   "chassis_number": "9C2JC4110RR000123",
///   "engine_number": "JC41E-1234567",
///   "color": "Rojo",
///   "retail_price_cents": 450000000,
///   "cost_price_cents": 380000000
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMotorcycleRequest {
    pub branch_id: Uuid,
    pub brand_id: Uuid,
    pub model_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub year: i32,
    pub chassis_number: String,
    pub engine_number: Option<String>,
    pub color: Option<String>,
    #[serde(default)]
    pub mileage_km: i32,
    pub license_plate: Option<String>,
    #[serde(default)]
    pub cost_price_cents: i64,
    pub retail_price_cents: i64,
    pub wholesale_price_cents: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub image_key: Option<String>,
    pub observations: Option<String>,
}

/// Identifiers that differ between units of a batch.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchUnit {
    pub chassis_number: String,
    pub engine_number: Option<String>,
    pub color: Option<String>,
}

/// Several units of the same model entering stock together.
#[derive(Debug, Deserialize)]
pub struct BatchCreateMotorcyclesRequest {
    pub branch_id: Uuid,
    pub brand_id: Uuid,
    pub model_id: Uuid,
    pub supplier_id: Option<Uuid>,
    pub year: i32,
    #[serde(default)]
    pub cost_price_cents: i64,
    pub retail_price_cents: i64,
    pub wholesale_price_cents: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub observations: Option<String>,
    pub units: Vec<BatchUnit>,
}

impl BatchCreateMotorcyclesRequest {
    /// Expand into one create request per unit.
    pub fn into_units(self) -> Vec<CreateMotorcycleRequest> {
        let Self {
            branch_id,
            brand_id,
            model_id,
            supplier_id,
            year,
            cost_price_cents,
            retail_price_cents,
            wholesale_price_cents,
            currency,
            observations,
            units,
        } = self;

        units
            .into_iter()
            .map(|unit| CreateMotorcycleRequest {
                branch_id,
                brand_id,
                model_id,
                supplier_id,
                year,
                chassis_number: unit.chassis_number,
                engine_number: unit.engine_number,
                color: unit.color,
                mileage_km: 0,
                license_plate: None,
                cost_price_cents,
                retail_price_cents,
                wholesale_price_cents,
                currency: currency.clone(),
                image_key: None,
                observations: observations.clone(),
            })
            .collect()
    }
}

/// Partial update of descriptive fields. State, branch and sale data change
/// through their own operations.
#[derive(Debug, Deserialize)]
pub struct UpdateMotorcycleRequest {
    pub brand_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub supplier_id: Option<Uuid>,
    pub year: Option<i32>,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub color: Option<String>,
    pub mileage_km: Option<i32>,
    pub license_plate: Option<String>,
    pub cost_price_cents: Option<i64>,
    pub retail_price_cents: Option<i64>,
    pub wholesale_price_cents: Option<i64>,
    pub image_key: Option<String>,
    pub observations: Option<String>,
}

/// Query string for `GET /api/v1/motorcycles`.
#[derive(Debug, Default, Deserialize)]
pub struct MotorcycleFilter {
    pub state: Option<MotorcycleState>,
    pub branch_id: Option<Uuid>,
    pub brand_id: Option<Uuid>,
    pub model_id: Option<Uuid>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    /// Case-insensitive match on chassis, engine number or plate.
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStateRequest {
    pub state: MotorcycleState,
}

#[derive(Debug, Deserialize)]
pub struct ReserveRequest {
    pub client_id: Uuid,
    #[serde(default)]
    pub amount_cents: i64,
}

#[derive(Debug, Deserialize)]
pub struct TransferRequest {
    pub branch_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_expands_shared_fields() {
        let batch = BatchCreateMotorcyclesRequest {
            branch_id: Uuid::from_u128(1),
            brand_id: Uuid::from_u128(2),
            model_id: Uuid::from_u128(3),
            supplier_id: None,
            year: 2024,
            cost_price_cents: 100,
            retail_price_cents: 200,
            wholesale_price_cents: None,
            currency: "ARS".into(),
            observations: Some("lote marzo".into()),
            units: vec![
                BatchUnit {
                    chassis_number: "A1".into(),
                    engine_number: None,
                    color: Some("Negro".into()),
                },
                BatchUnit {
                    chassis_number: "A2".into(),
                    engine_number: Some("E2".into()),
                    color: None,
                },
            ],
        };

        let units = batch.into_units();
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].chassis_number, "A2");
        assert_eq!(units[1].engine_number.as_deref(), Some("E2"));
        assert!(units.iter().all(|u| u.year == 2024 && u.retail_price_cents == 200));
        assert_eq!(units[0].observations.as_deref(), Some("lote marzo"));
    }

    #[test]
    fn test_create_request_defaults() {
        let json = serde_json::json!({
            "branch_id": Uuid::nil(),
            "brand_id": Uuid::nil(),
            "model_id": Uuid::nil(),
            "year": 2023,
            "chassis_number": "X",
            "retail_price_cents": 1
        });
        let req: CreateMotorcycleRequest = serde_json::from_value(json).unwrap();
        assert_eq!(req.currency, "ARS");
        assert_eq!(req.mileage_km, 0);
        assert_eq!(req.cost_price_cents, 0);
    }
}
