use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use std::collections::HashMap;
use uuid::Uuid;

/// Per-category, per-subtype card rates: `category -> subtype -> rate`.
pub type CategoryRates = HashMap<String, HashMap<String, f64>>;

/// Singleton payout configuration consumed by the calculator.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ConversionConfig {
    pub id: Uuid,
    pub r_rate: f64,
    pub service_fee: f64,
    pub ngn_rate: f64,
    pub ghc_rate: f64,
    pub category_rates: Json<CategoryRates>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateConversionConfig {
    pub r_rate: Option<f64>,
    pub service_fee: Option<f64>,
    pub ngn_rate: Option<f64>,
    pub ghc_rate: Option<f64>,
    pub category_rates: Option<CategoryRates>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub amount: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    pub payout: i64,
    pub category_rate: f64,
    pub service_fee: f64,
    pub multiplier: f64,
    pub currency: String,
}
