use crate::core::engine::ScanReport;
use crate::domain::model::Usd;
use crate::utils::error::{Result, SweepError};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

pub fn render(reports: &[ScanReport], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(reports)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(reports)?),
        OutputFormat::Csv => render_csv(reports),
    }
}

/// Sum of the monthly estimates of every priced finding.
pub fn monthly_total(reports: &[ScanReport]) -> Usd {
    Usd(reports
        .iter()
        .flat_map(|r| &r.findings)
        .filter_map(|f| f.cost.map(|c| c.monthly.amount()))
        .sum())
}

fn render_table(reports: &[ScanReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(
            out,
            "== {} ({}) {}/{}: {} finding(s)",
            report.label,
            report.scanner,
            report.account_id,
            report.region,
            report.findings.len()
        );
        for priced in &report.findings {
            let f = &priced.finding;
            let _ = write!(out, "  {} {} [{}] {}", f.resource_id, f.name, f.state, f.reason);
            match &priced.cost {
                Some(cost) => {
                    let _ = writeln!(out, " | monthly {} lifetime {}", cost.monthly, cost.lifetime);
                }
                None => {
                    let _ = writeln!(out, " | cost unavailable");
                }
            }
        }
    }
    let _ = writeln!(out, "Estimated monthly total: {}", monthly_total(reports));
    out
}

fn render_csv(reports: &[ScanReport]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record([
        "scanner",
        "account_id",
        "region",
        "resource_id",
        "name",
        "resource_type",
        "resource_size",
        "state",
        "created_at",
        "reason",
        "hourly",
        "daily",
        "monthly",
        "yearly",
        "lifetime",
    ])?;

    for report in reports {
        for priced in &report.findings {
            let f = &priced.finding;
            let costs = match &priced.cost {
                Some(c) => [c.hourly, c.daily, c.monthly, c.yearly, c.lifetime].map(|u| u.to_string()),
                None => Default::default(),
            };
            let mut record = vec![
                report.scanner.clone(),
                f.account_id.clone(),
                f.region.clone(),
                f.resource_id.clone(),
                f.name.clone(),
                f.resource_type.to_string(),
                f.resource_size.clone().unwrap_or_default(),
                f.state.clone(),
                f.created_at.to_rfc3339(),
                f.reason.clone(),
            ];
            record.extend(costs);
            writer.write_record(&record)?;
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SweepError::IoError(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
