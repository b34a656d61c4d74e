use async_trait::async_trait;
use chrono::{Duration, Utc};
use cloudsweep::domain::model::VolumeRecord;
use cloudsweep::domain::ports::{ClientFactory, PriceSource, Scanner, Session, VolumeInventory};
use cloudsweep::{
    CostEstimator, EbsVolumeScanner, Finding, PriceCache, PriceFilters, ResourceType, ScanEngine,
    SweepError,
};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

enum Inventory {
    Volumes(Vec<VolumeRecord>),
    ApiDown,
    NoClient,
}

struct StubSession {
    account_id: String,
    inventory: Arc<StubInventory>,
}

struct StubInventory {
    mode: Inventory,
    calls: AtomicUsize,
}

impl StubSession {
    fn new(account_id: &str, mode: Inventory) -> Self {
        Self {
            account_id: account_id.to_string(),
            inventory: Arc::new(StubInventory {
                mode,
                calls: AtomicUsize::new(0),
            }),
        }
    }
}

impl Session for StubSession {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn region(&self) -> &str {
        "us-east-1"
    }

    fn clients(&self) -> &dyn ClientFactory {
        self
    }
}

impl ClientFactory for StubSession {
    fn volumes(&self) -> cloudsweep::Result<Arc<dyn VolumeInventory>> {
        match self.inventory.mode {
            Inventory::NoClient => Err(SweepError::ProviderError {
                message: "no credentials".to_string(),
            }),
            _ => Ok(self.inventory.clone()),
        }
    }
}

#[async_trait]
impl VolumeInventory for StubInventory {
    async fn describe_volumes(&self) -> cloudsweep::Result<Vec<VolumeRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            Inventory::Volumes(volumes) => Ok(volumes.clone()),
            _ => Err(SweepError::ProviderError {
                message: "RequestLimitExceeded".to_string(),
            }),
        }
    }
}

struct PanickingScanner;

#[async_trait]
impl Scanner for PanickingScanner {
    fn argument_name(&self) -> &str {
        "panics"
    }

    fn label(&self) -> &str {
        "Always panics"
    }

    fn resource_type(&self) -> ResourceType {
        ResourceType::Eip
    }

    async fn scan(&self, _session: &dyn Session) -> Vec<Finding> {
        panic!("scanner bug");
    }
}

struct CountingPricing {
    calls: Arc<AtomicUsize>,
}

impl PriceSource for CountingPricing {
    async fn fetch_price(&self, _service_code: &str, _filters: &PriceFilters) -> Option<f64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Some(0.1)
    }
}

fn volume(id: &str, age_days: i64, attached: bool) -> VolumeRecord {
    let mut tags = BTreeMap::new();
    tags.insert("Name".to_string(), format!("{}-name", id));
    VolumeRecord {
        volume_id: id.to_string(),
        tags,
        state: if attached { "in-use" } else { "available" }.to_string(),
        size_gib: 50,
        created_at: Utc::now() - Duration::days(age_days) - Duration::minutes(5),
        attachment_count: usize::from(attached),
    }
}

fn healthy_session() -> StubSession {
    StubSession::new(
        "111111111111",
        Inventory::Volumes(vec![
            volume("vol-a", 60, false),
            volume("vol-b", 2, false),
            volume("vol-c", 90, true),
            volume("vol-d", 31, false),
        ]),
    )
}

#[tokio::test]
async fn test_ebs_scanner_reports_unattached_volumes() {
    let session = healthy_session();
    let findings = EbsVolumeScanner::new(30).scan(&session).await;

    let ids: Vec<&str> = findings.iter().map(|f| f.resource_id.as_str()).collect();
    assert_eq!(ids, vec!["vol-a", "vol-d"]);
    assert!(findings.iter().all(|f| f.account_id == "111111111111"));
    assert_eq!(findings[0].name, "vol-a-name");
    assert_eq!(findings[0].resource_type, ResourceType::EbsVolumes);
}

#[tokio::test]
async fn test_ebs_scanner_swallows_api_errors() {
    let session = StubSession::new("222222222222", Inventory::ApiDown);
    let scanner = EbsVolumeScanner::new(30);

    assert!(scanner.scan(&session).await.is_empty());
    assert!(scanner.scan(&session).await.is_empty());
    assert_eq!(session.inventory.calls.load(Ordering::SeqCst), 2);

    let session = StubSession::new("333333333333", Inventory::NoClient);
    assert!(scanner.scan(&session).await.is_empty());
}

#[tokio::test]
async fn test_engine_continues_past_failing_scanners() {
    let sessions: Vec<Arc<dyn Session>> = vec![
        Arc::new(StubSession::new("222222222222", Inventory::ApiDown)),
        Arc::new(healthy_session()),
    ];
    let scanners: Vec<Arc<dyn Scanner>> = vec![
        Arc::new(PanickingScanner),
        Arc::new(EbsVolumeScanner::new(30)),
    ];

    let engine = ScanEngine::<CountingPricing>::new(2);
    let reports = engine.run(&sessions, &scanners).await.unwrap();

    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].account_id, "222222222222");
    assert!(reports[0].findings.is_empty());
    assert_eq!(reports[1].account_id, "111111111111");
    assert_eq!(reports[1].scanner, "ebs-volumes");
    assert_eq!(reports[1].findings.len(), 2);
    assert!(reports[1].findings.iter().all(|f| f.cost.is_none()));
}

#[tokio::test]
async fn test_engine_prices_findings_through_shared_cache() {
    let calls = Arc::new(AtomicUsize::new(0));
    let estimator = Arc::new(CostEstimator::new(
        CountingPricing {
            calls: calls.clone(),
        },
        Arc::new(PriceCache::in_memory()),
    ));

    let sessions: Vec<Arc<dyn Session>> = vec![Arc::new(healthy_session())];
    let scanners: Vec<Arc<dyn Scanner>> = vec![Arc::new(EbsVolumeScanner::new(30))];

    let engine = ScanEngine::new(4).with_estimator(estimator);
    let reports = engine.run(&sessions, &scanners).await.unwrap();

    let findings = &reports[0].findings;
    assert_eq!(findings.len(), 2);
    for priced in findings {
        let cost = priced.cost.expect("volume should be priced");
        assert_eq!(cost.monthly.to_string(), "$72.00");
        assert!(cost.lifetime.amount() > 0.0);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
