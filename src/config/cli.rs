use crate::app::report::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "cloudsweep")]
#[command(about = "Find idle and orphaned cloud resources and estimate their cost")]
pub struct CliConfig {
    #[arg(long, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, value_delimiter = ',', help = "Scanners to run (default: all)")]
    pub scanners: Vec<String>,

    #[arg(long)]
    pub days_threshold: Option<i64>,

    #[arg(long)]
    pub cache_file: Option<String>,

    #[arg(long, value_delimiter = ',')]
    pub regions: Vec<String>,

    #[arg(long)]
    pub profile: Option<String>,

    #[arg(long)]
    pub account_id: Option<String>,

    #[arg(long)]
    pub concurrency: Option<usize>,

    #[arg(long, help = "Skip cost estimation")]
    pub no_pricing: bool,

    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    #[arg(long, help = "Print registered scanners and exit")]
    pub list_scanners: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}
