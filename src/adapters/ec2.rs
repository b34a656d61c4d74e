use crate::adapters::sdk::{load_sdk_config, provider_error};
use crate::config::AwsSettings;
use crate::domain::model::VolumeRecord;
use crate::domain::ports::{ClientFactory, Session, VolumeInventory};
use crate::utils::error::{Result, SweepError};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::types::Volume;
use aws_sdk_ec2::Client as Ec2Client;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// One account/region, backed by SDK clients built from a shared profile.
pub struct AwsSession {
    account_id: String,
    region: String,
    clients: AwsClients,
}

pub struct AwsClients {
    ec2: Ec2Client,
}

impl AwsSession {
    /// `region = None` uses the region from the SDK's default chain.
    pub async fn connect(aws: &AwsSettings, region: Option<&str>, timeout: Duration) -> Result<Self> {
        let sdk_config = load_sdk_config(aws.profile.as_deref(), region, timeout).await;

        let region = sdk_config
            .region()
            .map(|r| r.to_string())
            .ok_or_else(|| SweepError::MissingConfigError {
                field: "aws.regions".to_string(),
            })?;

        let account_id = match &aws.account_id {
            Some(id) => id.clone(),
            None => resolve_account_id(&sdk_config).await?,
        };

        tracing::info!("Connected to account {} in {}", account_id, region);
        Ok(Self {
            account_id,
            region,
            clients: AwsClients {
                ec2: Ec2Client::new(&sdk_config),
            },
        })
    }
}

impl Session for AwsSession {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn clients(&self) -> &dyn ClientFactory {
        &self.clients
    }
}

impl ClientFactory for AwsClients {
    fn volumes(&self) -> Result<Arc<dyn VolumeInventory>> {
        Ok(Arc::new(Ec2VolumeInventory::new(self.ec2.clone())))
    }
}

async fn resolve_account_id(sdk_config: &SdkConfig) -> Result<String> {
    let sts = aws_sdk_sts::Client::new(sdk_config);
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .map_err(|e| provider_error("GetCallerIdentity failed", e))?;

    identity
        .account()
        .map(str::to_string)
        .ok_or_else(|| SweepError::ProviderError {
            message: "caller identity has no account id".to_string(),
        })
}

pub struct Ec2VolumeInventory {
    client: Ec2Client,
}

impl Ec2VolumeInventory {
    pub fn new(client: Ec2Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VolumeInventory for Ec2VolumeInventory {
    async fn describe_volumes(&self) -> Result<Vec<VolumeRecord>> {
        let mut pages = self.client.describe_volumes().into_paginator().send();
        let mut records = Vec::new();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| provider_error("DescribeVolumes failed", e))?;
            for volume in page.volumes() {
                match to_record(volume) {
                    Some(record) => records.push(record),
                    None => tracing::debug!("Skipping volume without id or create time"),
                }
            }
        }

        Ok(records)
    }
}

fn to_record(volume: &Volume) -> Option<VolumeRecord> {
    let volume_id = volume.volume_id()?.to_string();
    let create_time = volume.create_time()?;
    let created_at = DateTime::<Utc>::from_timestamp(create_time.secs(), create_time.subsec_nanos())?;

    let tags = volume
        .tags()
        .iter()
        .filter_map(|tag| {
            Some((
                tag.key()?.to_string(),
                tag.value().unwrap_or_default().to_string(),
            ))
        })
        .collect();

    Some(VolumeRecord {
        volume_id,
        tags,
        state: volume
            .state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
        size_gib: volume.size().unwrap_or(0),
        created_at,
        attachment_count: volume.attachments().len(),
    })
}
