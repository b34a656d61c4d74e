use crate::adapters::sdk::{load_sdk_config, provider_error};
use crate::config::Settings;
use crate::core::pricing::price_from_catalog;
use crate::domain::model::PriceFilters;
use crate::domain::ports::PriceSource;
use crate::utils::error::{Result, SweepError};
use aws_sdk_pricing::types::{Filter, FilterType};
use aws_sdk_pricing::Client as PricingClient;

/// Price List API adapter. Queries are exact-match on every filter attribute.
#[derive(Debug, Clone)]
pub struct AwsPricingClient {
    client: PricingClient,
    min_price: f64,
}

impl AwsPricingClient {
    pub fn new(client: PricingClient, min_price: f64) -> Self {
        Self { client, min_price }
    }

    pub async fn from_settings(settings: &Settings) -> Self {
        let sdk_config = load_sdk_config(
            settings.aws.profile.as_deref(),
            Some(&settings.pricing.region),
            settings.pricing.timeout,
        )
        .await;

        let mut builder = aws_sdk_pricing::config::Builder::from(&sdk_config);
        if let Some(url) = &settings.pricing.endpoint_url {
            builder = builder.endpoint_url(url);
        }

        tracing::debug!("Pricing client targets region {}", settings.pricing.region);
        Self::new(
            PricingClient::from_conf(builder.build()),
            settings.pricing.min_price,
        )
    }

    async fn query(&self, service_code: &str, filters: &PriceFilters) -> Result<Vec<String>> {
        let constraints = term_match_filters(filters)?;

        let output = self
            .client
            .get_products()
            .service_code(service_code)
            .set_filters(Some(constraints))
            .format_version("aws_v1")
            .max_results(1)
            .send()
            .await
            .map_err(|e| provider_error("GetProducts failed", e))?;

        tracing::debug!(
            "Pricing API returned {} product(s) for {}",
            output.price_list().len(),
            service_code
        );
        Ok(output.price_list().to_vec())
    }
}

/// One exact-match constraint per filter attribute.
fn term_match_filters(filters: &PriceFilters) -> Result<Vec<Filter>> {
    filters
        .iter()
        .map(|(field, value)| {
            Filter::builder()
                .r#type(FilterType::TermMatch)
                .field(field)
                .value(value)
                .build()
                .map_err(|e| SweepError::ProviderError {
                    message: format!("invalid pricing filter {}: {}", field, e),
                })
        })
        .collect()
}

impl PriceSource for AwsPricingClient {
    async fn fetch_price(&self, service_code: &str, filters: &PriceFilters) -> Option<f64> {
        match self.query(service_code, filters).await {
            Ok(price_list) => price_from_catalog(service_code, filters, &price_list, self.min_price),
            Err(e) => {
                tracing::error!("Error retrieving pricing for {}: {}", service_code, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::ResourceType;

    #[test]
    fn test_every_attribute_becomes_a_term_match() {
        let filters = ResourceType::Rds.price_filters(Some("db.m5.large")).unwrap();
        let constraints = term_match_filters(&filters).unwrap();

        assert_eq!(constraints.len(), filters.len());
        for (constraint, (field, value)) in constraints.iter().zip(filters.iter()) {
            assert_eq!(constraint.r#type(), &FilterType::TermMatch);
            assert_eq!(constraint.field(), field);
            assert_eq!(constraint.value(), value);
        }
        assert!(constraints
            .iter()
            .any(|c| c.field() == "instanceType" && c.value() == "db.m5.large"));
    }

    #[test]
    fn test_empty_filters_produce_no_constraints() {
        let constraints = term_match_filters(&PriceFilters::default()).unwrap();
        assert!(constraints.is_empty());
    }
}
