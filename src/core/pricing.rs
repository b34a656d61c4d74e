//! Catalog response parsing and price validation.
//!
//! A catalog product is a JSON document shaped like
//! `{"terms": {"OnDemand": {"<term>": {"priceDimensions": {"<dim>": {"pricePerUnit": {"USD": "0.0104"}}}}}}}`.

use crate::domain::model::PriceFilters;
use crate::utils::error::{Result, SweepError};
use serde_json::Value;

pub const DEFAULT_MIN_PRICE: f64 = 0.01;
pub const REFERENCE_CURRENCY: &str = "USD";

/// Zero, negative and sub-threshold placeholder prices are rejected.
pub fn is_usable_price(price: f64, min_price: f64) -> bool {
    price.is_finite() && price > 0.0 && price >= min_price
}

/// Steps from a raw price list to a trusted price: empty list, unparsable
/// entry and unusable value all become `None`.
pub fn price_from_catalog(
    service_code: &str,
    filters: &PriceFilters,
    price_list: &[String],
    min_price: f64,
) -> Option<f64> {
    let Some(first) = price_list.first() else {
        tracing::warn!(
            "No pricing information found for {} with filters {:?}",
            service_code,
            filters
        );
        return None;
    };

    let price = match parse_on_demand_price(first) {
        Ok(price) => price,
        Err(e) => {
            tracing::error!("Error parsing pricing for {}: {}", service_code, e);
            return None;
        }
    };

    if !is_usable_price(price, min_price) {
        tracing::warn!(
            "Received invalid price for {} with filters {:?}: {}",
            service_code,
            filters,
            price
        );
        return None;
    }

    Some(price)
}

pub fn parse_on_demand_price(product_json: &str) -> Result<f64> {
    let product: Value = serde_json::from_str(product_json)?;
    let term = first_entry(&product["terms"]["OnDemand"], "terms.OnDemand")?;
    let dimension = first_entry(&term["priceDimensions"], "priceDimensions")?;
    let unit = &dimension["pricePerUnit"][REFERENCE_CURRENCY];

    match unit {
        Value::String(raw) => raw.trim().parse::<f64>().map_err(|e| malformed(
            "pricePerUnit",
            format!("'{}' is not a number: {}", raw, e),
        )),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| malformed("pricePerUnit", "number out of range".to_string())),
        _ => Err(malformed(
            "pricePerUnit",
            format!("no {} price", REFERENCE_CURRENCY),
        )),
    }
}

fn first_entry<'a>(value: &'a Value, field: &str) -> Result<&'a Value> {
    value
        .as_object()
        .and_then(|map| map.values().next())
        .ok_or_else(|| malformed(field, "missing or empty".to_string()))
}

fn malformed(field: &str, detail: String) -> SweepError {
    SweepError::ProviderError {
        message: format!("malformed catalog entry at {}: {}", field, detail),
    }
}
