use crate::app::report::OutputFormat;
use crate::config::toml_config::TomlConfig;
use crate::core::pricing::DEFAULT_MIN_PRICE;
use crate::utils::error::{Result, SweepError};
use crate::utils::validation::{
    validate_aws_region, validate_non_empty_string, validate_non_negative_price, validate_path,
    validate_range, validate_url, Validate,
};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DAYS_THRESHOLD: i64 = 30;
pub const DEFAULT_CACHE_FILE: &str = "cost_estimator.json";
pub const DEFAULT_PRICING_REGION: &str = "us-east-1";
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Effective configuration after merging file values, CLI flags and defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub days_threshold: i64,
    /// Empty means every registered scanner.
    pub scanners: Vec<String>,
    pub concurrency: usize,
    pub pricing: PricingSettings,
    pub aws: AwsSettings,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingSettings {
    pub enabled: bool,
    pub cache_file: PathBuf,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub min_price: f64,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AwsSettings {
    pub profile: Option<String>,
    /// Empty means the region resolved by the SDK's default chain.
    pub regions: Vec<String>,
    pub account_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_file_config(TomlConfig::default())
    }
}

impl Settings {
    pub fn from_file_config(file: TomlConfig) -> Self {
        let TomlConfig {
            scan,
            pricing,
            aws,
            output,
        } = file;

        Self {
            days_threshold: scan.days_threshold.unwrap_or(DEFAULT_DAYS_THRESHOLD),
            scanners: scan.scanners.unwrap_or_default(),
            concurrency: scan.concurrency.unwrap_or(DEFAULT_CONCURRENCY),
            pricing: PricingSettings {
                enabled: pricing.enabled.unwrap_or(true),
                cache_file: PathBuf::from(
                    pricing
                        .cache_file
                        .unwrap_or_else(|| DEFAULT_CACHE_FILE.to_string()),
                ),
                region: pricing
                    .region
                    .unwrap_or_else(|| DEFAULT_PRICING_REGION.to_string()),
                endpoint_url: pricing.endpoint_url,
                min_price: pricing.min_price.unwrap_or(DEFAULT_MIN_PRICE),
                timeout: Duration::from_secs(
                    pricing.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
                ),
            },
            aws: AwsSettings {
                profile: aws.profile,
                regions: aws.regions.unwrap_or_default(),
                account_id: aws.account_id,
            },
            format: output.format.unwrap_or_default(),
        }
    }

    /// CLI flags win over file values.
    #[cfg(feature = "cli")]
    pub fn apply_cli(&mut self, cli: &crate::config::cli::CliConfig) {
        if !cli.scanners.is_empty() {
            self.scanners = cli.scanners.clone();
        }
        if let Some(days) = cli.days_threshold {
            self.days_threshold = days;
        }
        if let Some(concurrency) = cli.concurrency {
            self.concurrency = concurrency;
        }
        if let Some(cache_file) = &cli.cache_file {
            self.pricing.cache_file = PathBuf::from(cache_file);
        }
        if cli.no_pricing {
            self.pricing.enabled = false;
        }
        if !cli.regions.is_empty() {
            self.aws.regions = cli.regions.clone();
        }
        if cli.profile.is_some() {
            self.aws.profile = cli.profile.clone();
        }
        if cli.account_id.is_some() {
            self.aws.account_id = cli.account_id.clone();
        }
        if let Some(format) = cli.format {
            self.format = format;
        }
    }

    /// Loads the optional config file, applies the CLI and validates the result.
    #[cfg(feature = "cli")]
    pub fn resolve(cli: &crate::config::cli::CliConfig) -> Result<Self> {
        let file = match &cli.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };
        let mut settings = Self::from_file_config(file);
        settings.apply_cli(cli);
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        if self.days_threshold < 0 {
            return Err(SweepError::InvalidConfigValueError {
                field: "scan.days_threshold".to_string(),
                value: self.days_threshold.to_string(),
                reason: "Threshold cannot be negative".to_string(),
            });
        }
        validate_range("scan.concurrency", self.concurrency, 1, 64)?;
        for name in &self.scanners {
            validate_non_empty_string("scan.scanners", name)?;
        }

        let cache_file = self.pricing.cache_file.to_string_lossy();
        validate_path("pricing.cache_file", &cache_file)?;
        validate_aws_region("pricing.region", &self.pricing.region)?;
        if let Some(url) = &self.pricing.endpoint_url {
            validate_url("pricing.endpoint_url", url)?;
        }
        validate_non_negative_price("pricing.min_price", self.pricing.min_price)?;
        validate_range("pricing.timeout_seconds", self.pricing.timeout.as_secs(), 1, 300)?;

        for region in &self.aws.regions {
            validate_aws_region("aws.regions", region)?;
        }
        if let Some(account_id) = &self.aws.account_id {
            validate_non_empty_string("aws.account_id", account_id)?;
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.days_threshold, 30);
        assert_eq!(settings.pricing.cache_file, PathBuf::from("cost_estimator.json"));
        assert_eq!(settings.pricing.region, "us-east-1");
        assert_eq!(settings.pricing.min_price, 0.01);
        assert!(settings.pricing.enabled);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.days_threshold = -1;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.concurrency = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.aws.regions = vec!["Mars-1".to_string()];
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.pricing.min_price = -0.01;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.pricing.timeout = Duration::from_secs(0);
        assert!(settings.validate().is_err());
    }

    #[cfg(feature = "cli")]
    #[test]
    fn test_cli_overrides_file() {
        use crate::config::cli::CliConfig;
        use clap::Parser;

        let file = TomlConfig::from_toml_str(
            "[scan]\ndays_threshold = 90\n[aws]\nregions = [\"eu-west-1\"]\n",
        )
        .unwrap();
        let cli = CliConfig::parse_from([
            "cloudsweep",
            "--days-threshold",
            "7",
            "--scanners",
            "ebs-volumes",
            "--no-pricing",
            "--format",
            "json",
        ]);

        let mut settings = Settings::from_file_config(file);
        settings.apply_cli(&cli);

        assert_eq!(settings.days_threshold, 7);
        assert_eq!(settings.scanners, vec!["ebs-volumes".to_string()]);
        assert_eq!(settings.aws.regions, vec!["eu-west-1".to_string()]);
        assert!(!settings.pricing.enabled);
        assert_eq!(settings.format, OutputFormat::Json);
    }
}
