use crate::domain::model::{Finding, PriceFilters, ResourceType, VolumeRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Provider catalog lookup. Every failure mode collapses to `None`.
pub trait PriceSource: Send + Sync {
    fn fetch_price(
        &self,
        service_code: &str,
        filters: &PriceFilters,
    ) -> impl std::future::Future<Output = Option<f64>> + Send;
}

/// Authenticated access to one account/region.
pub trait Session: Send + Sync {
    fn account_id(&self) -> &str;
    fn region(&self) -> &str;
    fn clients(&self) -> &dyn ClientFactory;
}

pub trait ClientFactory: Send + Sync {
    fn volumes(&self) -> Result<Arc<dyn VolumeInventory>>;
}

#[async_trait]
pub trait VolumeInventory: Send + Sync {
    async fn describe_volumes(&self) -> Result<Vec<VolumeRecord>>;
}

/// A resource scanner. `scan` never fails: provider errors are logged and
/// produce an empty result.
#[async_trait]
pub trait Scanner: Send + Sync {
    /// Stable selector, e.g. `ebs-volumes`.
    fn argument_name(&self) -> &str;
    fn label(&self) -> &str;
    fn resource_type(&self) -> ResourceType;
    async fn scan(&self, session: &dyn Session) -> Vec<Finding>;
}
