use crate::domain::model::{Finding, ResourceType, VolumeRecord};
use crate::domain::ports::{Scanner, Session};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Flags volumes that have been unattached for at least `days_threshold` days.
pub struct EbsVolumeScanner {
    days_threshold: i64,
}

impl EbsVolumeScanner {
    pub const ARGUMENT_NAME: &'static str = "ebs-volumes";
    pub const LABEL: &'static str = "EBS Volumes";

    pub fn new(days_threshold: i64) -> Self {
        Self { days_threshold }
    }

    async fn collect(&self, session: &dyn Session) -> Result<Vec<Finding>> {
        let inventory = session.clients().volumes()?;
        let volumes = inventory.describe_volumes().await?;
        tracing::debug!("Checking {} EBS volumes for usage", volumes.len());

        Ok(unused_volumes(
            &volumes,
            Utc::now(),
            self.days_threshold,
            session.account_id(),
            session.region(),
        ))
    }
}

#[async_trait]
impl Scanner for EbsVolumeScanner {
    fn argument_name(&self) -> &str {
        Self::ARGUMENT_NAME
    }

    fn label(&self) -> &str {
        Self::LABEL
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::EbsVolumes
    }

    async fn scan(&self, session: &dyn Session) -> Vec<Finding> {
        tracing::debug!("Retrieving EBS volumes...");
        match self.collect(session).await {
            Ok(findings) => {
                tracing::info!("Found {} unused EBS volumes", findings.len());
                findings
            }
            Err(e) => {
                tracing::error!("Error retrieving EBS volumes: {}", e);
                Vec::new()
            }
        }
    }
}

pub fn unused_volumes(
    volumes: &[VolumeRecord],
    now: DateTime<Utc>,
    days_threshold: i64,
    account_id: &str,
    region: &str,
) -> Vec<Finding> {
    volumes
        .iter()
        .filter(|volume| !volume.is_attached())
        .filter_map(|volume| {
            let days = (now - volume.created_at).num_days();
            if days < days_threshold {
                return None;
            }

            tracing::info!("EBS volume {} ({}) is unused", volume.volume_id, volume.name());
            Some(Finding {
                account_id: account_id.to_string(),
                region: region.to_string(),
                resource_id: volume.volume_id.clone(),
                name: volume.name().to_string(),
                resource_type: ResourceType::EbsVolumes,
                resource_size: Some(volume.size_gib.to_string()),
                state: volume.state.clone(),
                created_at: volume.created_at,
                reason: format!(
                    "Volume has been unattached for {} days, exceeding the threshold of {} days",
                    days, days_threshold
                ),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::collections::BTreeMap;

    fn volume(id: &str, age_days: i64, attachments: usize, now: DateTime<Utc>) -> VolumeRecord {
        VolumeRecord {
            volume_id: id.to_string(),
            tags: BTreeMap::new(),
            state: if attachments == 0 { "available" } else { "in-use" }.to_string(),
            size_gib: 100,
            created_at: now - Duration::days(age_days) - Duration::hours(1),
            attachment_count: attachments,
        }
    }

    #[test]
    fn test_unused_volumes_applies_threshold() {
        let now = Utc::now();
        let volumes = vec![
            volume("vol-old", 45, 0, now),
            volume("vol-young", 3, 0, now),
            volume("vol-attached", 400, 1, now),
            volume("vol-edge", 30, 0, now),
        ];

        let findings = unused_volumes(&volumes, now, 30, "123456789012", "us-west-2");
        let ids: Vec<&str> = findings.iter().map(|f| f.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["vol-old", "vol-edge"]);

        let old = &findings[0];
        assert_eq!(old.name, "Unnamed");
        assert_eq!(old.account_id, "123456789012");
        assert_eq!(old.resource_size.as_deref(), Some("100"));
        assert_eq!(
            old.reason,
            "Volume has been unattached for 45 days, exceeding the threshold of 30 days"
        );
    }

    #[test]
    fn test_zero_threshold_flags_every_unattached_volume() {
        let now = Utc::now();
        let mut fresh = volume("vol-new", 0, 0, now);
        fresh.tags.insert("Name".to_string(), "build-cache".to_string());

        let findings = unused_volumes(&[fresh], now, 0, "1", "eu-west-1");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "build-cache");
    }
}
