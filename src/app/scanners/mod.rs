pub mod ebs_volumes;

pub use ebs_volumes::EbsVolumeScanner;

use crate::core::registry::ScannerRegistry;
use crate::utils::error::Result;

/// Registry holding every built-in scanner.
pub fn default_registry(days_threshold: i64) -> Result<ScannerRegistry> {
    let mut registry = ScannerRegistry::new();
    registry.register(EbsVolumeScanner::new(days_threshold))?;
    Ok(registry)
}
