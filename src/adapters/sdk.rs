use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_pricing::config::Region;
use std::time::Duration;

use crate::utils::error::SweepError;

/// Shared SDK configuration; every operation is bounded by `timeout`.
pub async fn load_sdk_config(
    profile: Option<&str>,
    region: Option<&str>,
    timeout: Duration,
) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(
        TimeoutConfig::builder()
            .operation_timeout(timeout)
            .build(),
    );

    if let Some(profile) = profile {
        loader = loader.profile_name(profile);
    }
    if let Some(region) = region {
        loader = loader.region(Region::new(region.to_string()));
    }

    loader.load().await
}

pub(crate) fn provider_error<E: std::error::Error>(context: &str, err: E) -> SweepError {
    SweepError::ProviderError {
        message: format!(
            "{}: {}",
            context,
            aws_sdk_pricing::error::DisplayErrorContext(&err)
        ),
    }
}
