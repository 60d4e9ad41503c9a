use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tracked currency with its rate expressed in units of the base
/// currency per one unit of this currency.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: Uuid,
    pub currency: String,
    pub symbol: String,
    pub rate: f64,
    pub change: f64,
    pub change_percent: f64,
    pub is_primary: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewExchangeRate {
    pub currency: String,
    pub symbol: String,
    pub rate: f64,
    #[serde(default)]
    pub is_primary: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExchangeRate {
    pub currency: Option<String>,
    pub rate: Option<f64>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseCurrencyUpdate {
    pub base_currency: String,
}
