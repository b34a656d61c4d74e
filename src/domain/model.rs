use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::utils::error::SweepError;

/// Billable resource categories the estimator knows how to price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    #[serde(rename = "EBS-Volumes")]
    EbsVolumes,
    #[serde(rename = "EC2")]
    Ec2,
    #[serde(rename = "EBS-Snapshots")]
    EbsSnapshots,
    #[serde(rename = "RDS")]
    Rds,
    #[serde(rename = "DynamoDB")]
    DynamoDb,
    #[serde(rename = "EIP")]
    Eip,
    #[serde(rename = "LoadBalancer")]
    LoadBalancer,
}

/// One attribute constraint in a pricing filter template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValue {
    Fixed(&'static str),
    /// Filled in with the caller's resource size (e.g. an instance type).
    ResourceSize,
}

impl ResourceType {
    pub const ALL: [ResourceType; 7] = [
        ResourceType::EbsVolumes,
        ResourceType::Ec2,
        ResourceType::EbsSnapshots,
        ResourceType::Rds,
        ResourceType::DynamoDb,
        ResourceType::Eip,
        ResourceType::LoadBalancer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::EbsVolumes => "EBS-Volumes",
            ResourceType::Ec2 => "EC2",
            ResourceType::EbsSnapshots => "EBS-Snapshots",
            ResourceType::Rds => "RDS",
            ResourceType::DynamoDb => "DynamoDB",
            ResourceType::Eip => "EIP",
            ResourceType::LoadBalancer => "LoadBalancer",
        }
    }

    pub fn service_code(&self) -> &'static str {
        match self {
            ResourceType::EbsVolumes
            | ResourceType::Ec2
            | ResourceType::EbsSnapshots
            | ResourceType::Eip => "AmazonEC2",
            ResourceType::Rds => "AmazonRDS",
            ResourceType::DynamoDb => "AmazonDynamoDB",
            ResourceType::LoadBalancer => "ElasticLoadBalancing",
        }
    }

    pub fn filter_template(&self) -> &'static [(&'static str, FilterValue)] {
        use FilterValue::{Fixed, ResourceSize};

        match self {
            ResourceType::EbsVolumes => &[
                ("productFamily", Fixed("Storage")),
                ("volumeType", Fixed("General Purpose")),
            ],
            ResourceType::Ec2 => &[
                ("productFamily", Fixed("Compute Instance")),
                ("instanceType", ResourceSize),
            ],
            ResourceType::EbsSnapshots => &[("productFamily", Fixed("Storage Snapshot"))],
            ResourceType::Rds => &[
                ("productFamily", Fixed("Database Instance")),
                ("instanceType", ResourceSize),
            ],
            ResourceType::DynamoDb => &[("productFamily", Fixed("Non-relational Database"))],
            ResourceType::Eip => &[("productFamily", Fixed("IP Address"))],
            ResourceType::LoadBalancer => &[("productFamily", Fixed("Load Balancer"))],
        }
    }

    /// Returns `None` when the template needs a resource size and none was given.
    pub fn price_filters(&self, resource_size: Option<&str>) -> Option<PriceFilters> {
        let mut filters = PriceFilters::default();
        for (field, value) in self.filter_template() {
            let value = match value {
                FilterValue::Fixed(v) => *v,
                FilterValue::ResourceSize => resource_size.filter(|s| !s.trim().is_empty())?,
            };
            filters.insert(*field, value);
        }
        Some(filters)
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = SweepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|rt| rt.as_str() == s)
            .ok_or_else(|| SweepError::UnsupportedResourceType {
                resource_type: s.to_string(),
            })
    }
}

/// Attribute name -> exact-match value, kept sorted by attribute name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceFilters(BTreeMap<String, String>);

impl PriceFilters {
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.0.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PriceFilters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut filters = PriceFilters::default();
        for (k, v) in iter {
            filters.insert(k, v);
        }
        filters
    }
}

/// Deterministic cache identifier for a `(service code, filters)` pair.
///
/// Rendered as `{service}_{"a": "x", "b": "y"}` with attribute names sorted,
/// so cache files written by earlier tooling keep matching.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(service_code: &str, filters: &PriceFilters) -> Self {
        let body = filters
            .iter()
            .map(|(k, v)| format!("{}: {}", json_string(k), json_string(v)))
            .collect::<Vec<_>>()
            .join(", ");
        CacheKey(format!("{}_{{{}}}", service_code, body))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

/// JSON string literal with non-ASCII characters written as `\uXXXX`
/// (surrogate pairs above the BMP), matching keys in existing cache files.
fn json_string(s: &str) -> String {
    let quoted = serde_json::Value::String(s.to_string()).to_string();
    if quoted.is_ascii() {
        return quoted;
    }

    let mut escaped = String::with_capacity(quoted.len() + 8);
    for c in quoted.chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    escaped
}

/// A resource a scanner flagged as idle or orphaned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub account_id: String,
    pub region: String,
    pub resource_id: String,
    pub name: String,
    pub resource_type: ResourceType,
    /// Instance type for compute resources, GiB for volumes.
    pub resource_size: Option<String>,
    pub state: String,
    pub created_at: DateTime<Utc>,
    pub reason: String,
}

impl Finding {
    pub fn hours_running(&self, now: DateTime<Utc>) -> f64 {
        let seconds = (now - self.created_at).num_seconds().max(0);
        seconds as f64 / 3600.0
    }
}

/// Volume state as reported by the compute API.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeRecord {
    pub volume_id: String,
    pub tags: BTreeMap<String, String>,
    pub state: String,
    pub size_gib: i32,
    pub created_at: DateTime<Utc>,
    pub attachment_count: usize,
}

impl VolumeRecord {
    pub fn name(&self) -> &str {
        self.tags.get("Name").map(String::as_str).unwrap_or("Unnamed")
    }

    pub fn is_attached(&self) -> bool {
        self.attachment_count > 0
    }
}

/// Dollar amount rendered as `$1,234.56`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Usd(pub f64);

impl Usd {
    pub fn amount(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fixed = format!("{:.2}", self.0.abs());
        let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if self.0 < 0.0 { "-" } else { "" };
        write!(f, "${}{}.{}", sign, grouped, cents)
    }
}

impl Serialize for Usd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub hourly: Usd,
    pub daily: Usd,
    pub monthly: Usd,
    pub yearly: Usd,
    pub lifetime: Usd,
}

impl CostBreakdown {
    /// A month is 30 days, a year 365.
    pub fn from_hourly(price_per_hour: f64, hours_running: f64) -> Self {
        let daily = price_per_hour * 24.0;
        Self {
            hourly: Usd(price_per_hour),
            daily: Usd(daily),
            monthly: Usd(daily * 30.0),
            yearly: Usd(daily * 365.0),
            lifetime: Usd(price_per_hour * hours_running),
        }
    }
}
