use crate::core::estimator::CostEstimator;
use crate::domain::model::{CostBreakdown, Finding};
use crate::domain::ports::{PriceSource, Scanner, Session};
use crate::utils::error::{Result, SweepError};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Debug, Clone, Serialize)]
pub struct PricedFinding {
    #[serde(flatten)]
    pub finding: Finding,
    pub cost: Option<CostBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub scanner: String,
    pub label: String,
    pub account_id: String,
    pub region: String,
    pub findings: Vec<PricedFinding>,
}

/// Runs every (session, scanner) pair as its own task and optionally prices
/// the findings. Reports come back in session-then-scanner order.
pub struct ScanEngine<P: PriceSource + 'static> {
    estimator: Option<Arc<CostEstimator<P>>>,
    concurrency: usize,
}

impl<P: PriceSource + 'static> ScanEngine<P> {
    pub fn new(concurrency: usize) -> Self {
        Self {
            estimator: None,
            concurrency: concurrency.max(1),
        }
    }

    pub fn with_estimator(mut self, estimator: Arc<CostEstimator<P>>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    pub async fn run(
        &self,
        sessions: &[Arc<dyn Session>],
        scanners: &[Arc<dyn Scanner>],
    ) -> Result<Vec<ScanReport>> {
        tracing::info!(
            "Starting scan: {} scanner(s) across {} session(s)",
            scanners.len(),
            sessions.len()
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (session_idx, session) in sessions.iter().enumerate() {
            for (scanner_idx, scanner) in scanners.iter().enumerate() {
                let session = Arc::clone(session);
                let scanner = Arc::clone(scanner);
                let estimator = self.estimator.clone();
                let semaphore = Arc::clone(&semaphore);

                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;

                    tracing::debug!(
                        "Running {} in {}/{}",
                        scanner.argument_name(),
                        session.account_id(),
                        session.region()
                    );
                    let findings = scanner.scan(session.as_ref()).await;
                    let findings = price_findings(estimator.as_deref(), findings).await?;

                    Ok::<_, SweepError>((
                        (session_idx, scanner_idx),
                        ScanReport {
                            scanner: scanner.argument_name().to_string(),
                            label: scanner.label().to_string(),
                            account_id: session.account_id().to_string(),
                            region: session.region().to_string(),
                            findings,
                        },
                    ))
                });
            }
        }

        let mut reports = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => {
                    tracing::error!("❌ Scan aborted: {}", e);
                    tasks.abort_all();
                    return Err(e);
                }
                // 單一掃描器崩潰不影響其他掃描器
                Err(e) => tracing::error!("Scanner task failed: {}", e),
            }
        }

        reports.sort_by_key(|(order, _)| *order);
        let reports: Vec<ScanReport> = reports.into_iter().map(|(_, report)| report).collect();

        tracing::info!(
            "✅ Scan finished with {} finding(s)",
            reports.iter().map(|r| r.findings.len()).sum::<usize>()
        );
        Ok(reports)
    }
}

async fn price_findings<P: PriceSource>(
    estimator: Option<&CostEstimator<P>>,
    findings: Vec<Finding>,
) -> Result<Vec<PricedFinding>> {
    let Some(estimator) = estimator else {
        return Ok(findings
            .into_iter()
            .map(|finding| PricedFinding {
                finding,
                cost: None,
            })
            .collect());
    };

    let now = Utc::now();
    let mut priced = Vec::with_capacity(findings.len());
    for finding in findings {
        let cost = estimator
            .estimate(
                finding.resource_type,
                finding.resource_size.as_deref(),
                finding.hours_running(now),
            )
            .await?;
        priced.push(PricedFinding { finding, cost });
    }
    Ok(priced)
}
