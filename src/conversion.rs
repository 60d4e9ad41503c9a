//! Payout arithmetic shared by the public calculator and the admin preview.

use crate::models::{CalculateRequest, CalculateResponse, ConversionConfig};
use crate::{AppError, Result};

/// Floored integer payout for a card trade.
///
/// `service_fee` is a fraction (0.03 means 3%), `multiplier` the regional
/// rate for the destination currency. Truncation towards zero is the
/// observed production behavior and is kept as-is.
pub fn payout(amount: f64, category_rate: f64, service_fee: f64, multiplier: f64) -> i64 {
    (amount * category_rate * (1.0 - service_fee) * multiplier).floor() as i64
}

/// Resolves the category rate and regional multiplier from config and
/// evaluates [`payout`] for one request.
pub fn calculate(config: &ConversionConfig, req: &CalculateRequest) -> Result<CalculateResponse> {
    if !req.amount.is_finite() || req.amount <= 0.0 {
        return Err(AppError::Validation("amount must be positive".to_string()));
    }
    let category_rate = category_rate(config, req.category.as_deref(), req.subtype.as_deref());
    let multiplier = regional_multiplier(config, &req.currency);
    Ok(CalculateResponse {
        payout: payout(req.amount, category_rate, config.service_fee, multiplier),
        category_rate,
        service_fee: config.service_fee,
        multiplier,
        currency: req.currency.to_uppercase(),
    })
}

/// Category/subtype-specific rate, falling back to the general R rate.
fn category_rate(config: &ConversionConfig, category: Option<&str>, subtype: Option<&str>) -> f64 {
    category
        .and_then(|c| config.category_rates.get(c))
        .and_then(|subtypes| subtype.and_then(|s| subtypes.get(s)))
        .copied()
        .unwrap_or(config.r_rate)
}

fn regional_multiplier(config: &ConversionConfig, currency: &str) -> f64 {
    match currency.to_uppercase().as_str() {
        "NGN" => config.ngn_rate,
        "GHC" => config.ghc_rate,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;
    use std::collections::HashMap;
    use uuid::Uuid;

    fn config() -> ConversionConfig {
        let mut rates: HashMap<String, HashMap<String, f64>> = HashMap::new();
        rates.insert(
            "itunes".to_string(),
            HashMap::from([("us".to_string(), 6.5), ("uk".to_string(), 6.2)]),
        );
        ConversionConfig {
            id: Uuid::new_v4(),
            r_rate: 7.13,
            service_fee: 0.03,
            ngn_rate: 200.0,
            ghc_rate: 13.0,
            category_rates: Json(rates),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn naira_payout_example() {
        // 100 USD card at rate 7.13, 3% fee, NGN multiplier 200
        assert_eq!(payout(100.0, 7.13, 0.03, 200.0), 138_322);
    }

    #[test]
    fn payout_is_floored() {
        assert_eq!(payout(1.0, 1.0, 0.0, 1.5), 1);
        assert_eq!(payout(3.0, 1.0, 0.5, 1.0), 1);
    }

    #[test]
    fn payout_is_deterministic() {
        let a = payout(57.3, 6.5, 0.03, 200.0);
        let b = payout(57.3, 6.5, 0.03, 200.0);
        assert_eq!(a, b);
    }

    #[test]
    fn calculate_uses_category_rate() {
        let cfg = config();
        let req = CalculateRequest {
            amount: 100.0,
            category: Some("itunes".to_string()),
            subtype: Some("us".to_string()),
            currency: "NGN".to_string(),
        };
        let res = calculate(&cfg, &req).unwrap();
        assert_eq!(res.category_rate, 6.5);
        assert_eq!(res.multiplier, 200.0);
        assert_eq!(res.payout, payout(100.0, 6.5, 0.03, 200.0));
    }

    #[test]
    fn calculate_falls_back_to_r_rate() {
        let cfg = config();
        let req = CalculateRequest {
            amount: 100.0,
            category: Some("steam".to_string()),
            subtype: None,
            currency: "USD".to_string(),
        };
        let res = calculate(&cfg, &req).unwrap();
        assert_eq!(res.category_rate, 7.13);
        assert_eq!(res.multiplier, 1.0);
    }

    #[test]
    fn calculate_rejects_bad_amount() {
        let cfg = config();
        for amount in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let req = CalculateRequest {
                amount,
                category: None,
                subtype: None,
                currency: "NGN".to_string(),
            };
            assert!(calculate(&cfg, &req).is_err());
        }
    }
}
