pub mod cache;
pub mod engine;
pub mod estimator;
pub mod pricing;
pub mod registry;

pub use crate::domain::model::{CacheKey, CostBreakdown, Finding, PriceFilters, ResourceType};
pub use crate::domain::ports::{ClientFactory, PriceSource, Scanner, Session, VolumeInventory};
pub use crate::utils::error::Result;
