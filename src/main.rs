use clap::Parser;
use cloudsweep::app::report;
use cloudsweep::domain::ports::Session;
use cloudsweep::utils::error::ErrorSeverity;
use cloudsweep::utils::logger;
use cloudsweep::{
    default_registry, AwsPricingClient, AwsSession, CliConfig, CostEstimator, PriceCache,
    ScanEngine, Settings, SweepError,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose, cli.json_logs);
    tracing::info!("Starting cloudsweep");

    let settings = Settings::resolve(&cli).unwrap_or_else(|e| exit_with(e));
    tracing::debug!("Effective settings: {:?}", settings);

    let registry = default_registry(settings.days_threshold).unwrap_or_else(|e| exit_with(e));
    if cli.list_scanners {
        for scanner in registry.all() {
            println!("{:<16} {}", scanner.argument_name(), scanner.label());
        }
        return Ok(());
    }
    let scanners = registry
        .select(&settings.scanners)
        .unwrap_or_else(|e| exit_with(e));

    let sessions = connect_sessions(&settings).await?;

    let mut engine = ScanEngine::new(settings.concurrency);
    if settings.pricing.enabled {
        let cache = Arc::new(PriceCache::load(&settings.pricing.cache_file));
        let source = AwsPricingClient::from_settings(&settings).await;
        let estimator = CostEstimator::new(source, cache)
            .with_min_price(settings.pricing.min_price)
            .with_fetch_timeout(settings.pricing.timeout);
        engine = engine.with_estimator(Arc::new(estimator));
    }

    let reports = engine
        .run(&sessions, &scanners)
        .await
        .unwrap_or_else(|e| exit_with(e));

    print!("{}", report::render(&reports, settings.format)?);
    tracing::info!("✅ Scan completed");
    Ok(())
}

async fn connect_sessions(settings: &Settings) -> anyhow::Result<Vec<Arc<dyn Session>>> {
    let regions: Vec<Option<&str>> = if settings.aws.regions.is_empty() {
        vec![None]
    } else {
        settings.aws.regions.iter().map(|r| Some(r.as_str())).collect()
    };

    let mut sessions: Vec<Arc<dyn Session>> = Vec::with_capacity(regions.len());
    for region in regions {
        match AwsSession::connect(&settings.aws, region, settings.pricing.timeout).await {
            Ok(session) => sessions.push(Arc::new(session)),
            Err(e) => tracing::error!("❌ Could not open session for {:?}: {}", region, e),
        }
    }

    if sessions.is_empty() {
        anyhow::bail!("no AWS session could be established");
    }
    Ok(sessions)
}

fn exit_with(e: SweepError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}
