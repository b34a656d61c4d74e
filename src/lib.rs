pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

#[cfg(feature = "aws")]
pub use adapters::{AwsPricingClient, AwsSession};

pub use app::scanners::{default_registry, EbsVolumeScanner};
pub use config::Settings;
pub use core::{
    cache::PriceCache, engine::ScanEngine, estimator::CostEstimator, registry::ScannerRegistry,
};
pub use domain::model::{CacheKey, CostBreakdown, Finding, PriceFilters, ResourceType, Usd};
pub use utils::error::{Result, SweepError};
