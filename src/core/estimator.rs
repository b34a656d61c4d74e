use crate::core::cache::PriceCache;
use crate::core::pricing::{is_usable_price, DEFAULT_MIN_PRICE};
use crate::domain::model::{CacheKey, CostBreakdown, PriceFilters, ResourceType};
use crate::domain::ports::PriceSource;
use crate::utils::error::{Result, SweepError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Prices resources through a shared [`PriceCache`], falling back to the
/// provider catalog on a miss.
///
/// Concurrent misses for the same key are single-flighted: one caller
/// fetches, the others wait on the key's gate and then read the cache.
pub struct CostEstimator<P: PriceSource> {
    source: P,
    cache: Arc<PriceCache>,
    gates: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
    min_price: f64,
    fetch_timeout: Duration,
}

impl<P: PriceSource> CostEstimator<P> {
    pub fn new(source: P, cache: Arc<PriceCache>) -> Self {
        Self {
            source,
            cache,
            gates: Mutex::new(HashMap::new()),
            min_price: DEFAULT_MIN_PRICE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_min_price(mut self, min_price: f64) -> Self {
        self.min_price = min_price;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &Arc<PriceCache> {
        &self.cache
    }

    /// String entry point. An unknown `resource_type` fails before any cache
    /// or network access.
    pub async fn calculate_cost(
        &self,
        resource_type: &str,
        resource_size: Option<&str>,
        hours_running: f64,
    ) -> Result<Option<CostBreakdown>> {
        let resource_type: ResourceType = resource_type.parse()?;
        self.estimate(resource_type, resource_size, hours_running).await
    }

    pub async fn estimate(
        &self,
        resource_type: ResourceType,
        resource_size: Option<&str>,
        hours_running: f64,
    ) -> Result<Option<CostBreakdown>> {
        if !hours_running.is_finite() || hours_running < 0.0 {
            return Err(SweepError::InvalidHoursRunning {
                hours: hours_running,
            });
        }

        let Some(filters) = resource_type.price_filters(resource_size) else {
            tracing::warn!(
                "Could not calculate cost for {}: resource size is required",
                resource_type
            );
            return Ok(None);
        };

        let service_code = resource_type.service_code();
        let key = CacheKey::new(service_code, &filters);

        match self.price_for(&key, service_code, &filters).await {
            Some(price_per_hour) => Ok(Some(CostBreakdown::from_hourly(
                price_per_hour,
                hours_running,
            ))),
            None => {
                tracing::warn!(
                    "Could not calculate cost for {} of size {:?}",
                    resource_type,
                    resource_size
                );
                Ok(None)
            }
        }
    }

    async fn price_for(
        &self,
        key: &CacheKey,
        service_code: &str,
        filters: &PriceFilters,
    ) -> Option<f64> {
        if let Some(price) = self.cached_price(key) {
            tracing::debug!("Cache hit for {} with filters {:?}", service_code, filters);
            return Some(price);
        }

        let gate = self.gate(key);
        let price = {
            let _guard = gate.lock().await;
            self.fetch_and_store(key, service_code, filters).await
        };
        self.release_gate(key, gate);
        price
    }

    async fn fetch_and_store(
        &self,
        key: &CacheKey,
        service_code: &str,
        filters: &PriceFilters,
    ) -> Option<f64> {
        // 等待期間其他呼叫者可能已經寫入
        if let Some(price) = self.cached_price(key) {
            tracing::debug!("Cache filled while waiting for {}", key);
            return Some(price);
        }

        tracing::debug!(
            "Cache miss for {} with filters {:?}, fetching from pricing API",
            service_code,
            filters
        );
        let fetched =
            match tokio::time::timeout(self.fetch_timeout, self.source.fetch_price(service_code, filters))
                .await
            {
                Ok(fetched) => fetched,
                Err(_) => {
                    tracing::warn!(
                        "Pricing lookup for {} timed out after {:?}",
                        service_code,
                        self.fetch_timeout
                    );
                    None
                }
            };

        let price = fetched?;
        if !is_usable_price(price, self.min_price) {
            tracing::warn!(
                "Received invalid price for {} with filters {:?}: {}",
                service_code,
                filters,
                price
            );
            return None;
        }

        // put 為同步呼叫，取消不會中斷寫入
        self.cache.put(key.clone(), price);
        Some(price)
    }

    /// Cached prices under `min_price` are treated as a miss and refetched.
    fn cached_price(&self, key: &CacheKey) -> Option<f64> {
        let price = self.cache.get(key)?;
        if is_usable_price(price, self.min_price) {
            Some(price)
        } else {
            tracing::warn!("Ignoring unusable cached price {} for {}", price, key);
            None
        }
    }

    fn gate(&self, key: &CacheKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        gates.entry(key.clone()).or_default().clone()
    }

    /// Drops the key's gate once no other caller holds it.
    fn release_gate(&self, key: &CacheKey, gate: Arc<tokio::sync::Mutex<()>>) {
        let mut gates = self.gates.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = gates
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &gate) && Arc::strong_count(&gate) == 2);
        if idle {
            gates.remove(key);
        }
    }

    #[cfg(test)]
    fn gate_count(&self) -> usize {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedPrice {
        price: Option<f64>,
        calls: Arc<AtomicUsize>,
    }

    impl PriceSource for FixedPrice {
        async fn fetch_price(&self, _service_code: &str, _filters: &PriceFilters) -> Option<f64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.price
        }
    }

    struct Hanging;

    impl PriceSource for Hanging {
        async fn fetch_price(&self, _service_code: &str, _filters: &PriceFilters) -> Option<f64> {
            std::future::pending::<()>().await;
            None
        }
    }

    fn estimator(price: Option<f64>) -> (CostEstimator<FixedPrice>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let source = FixedPrice {
            price,
            calls: calls.clone(),
        };
        (
            CostEstimator::new(source, Arc::new(PriceCache::in_memory())),
            calls,
        )
    }

    #[test]
    fn test_negative_hours_is_rejected() {
        let (estimator, calls) = estimator(Some(1.0));
        let result = tokio_test::block_on(estimator.estimate(ResourceType::Eip, None, -1.0));
        assert!(matches!(result, Err(SweepError::InvalidHoursRunning { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_instance_type_skips_lookup() {
        let (estimator, calls) = estimator(Some(1.0));
        let result = estimator.estimate(ResourceType::Ec2, None, 1.0).await.unwrap();
        assert!(result.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_custom_min_price_accepts_sub_cent() {
        let (estimator, _) = estimator(Some(0.005));
        let estimator = estimator.with_min_price(0.001);
        let cost = estimator.estimate(ResourceType::Eip, None, 0.0).await.unwrap();
        assert!(cost.is_some());
        assert_eq!(estimator.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_unusable_cached_price_is_refetched() {
        let (estimator, calls) = estimator(Some(0.25));
        let filters = ResourceType::Eip.price_filters(None).unwrap();
        let key = CacheKey::new(ResourceType::Eip.service_code(), &filters);
        estimator.cache().put(key.clone(), 0.0);

        let cost = estimator.estimate(ResourceType::Eip, None, 10.0).await.unwrap();
        assert_eq!(cost.unwrap().lifetime.to_string(), "$2.50");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(estimator.cache().get(&key), Some(0.25));
    }

    #[tokio::test]
    async fn test_gates_are_released_after_lookup() {
        let (estimator, calls) = estimator(None);
        for size in ["t3.micro", "t3.small", "t3.large"] {
            let cost = estimator.estimate(ResourceType::Ec2, Some(size), 1.0).await.unwrap();
            assert!(cost.is_none());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(estimator.gate_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_source_times_out_to_absent() {
        let estimator = CostEstimator::new(Hanging, Arc::new(PriceCache::in_memory()))
            .with_fetch_timeout(Duration::from_secs(2));
        let cost = estimator.estimate(ResourceType::Eip, None, 1.0).await.unwrap();
        assert!(cost.is_none());
        assert!(estimator.cache().is_empty());
    }
}
