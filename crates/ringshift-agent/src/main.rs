//! ringshift: Amide proton shift outliers and aromatic ring contacts.
//! Entry point for the batch binary.

mod batch;
mod config;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ringshift_ranker::report::render_table;
use ringshift_ranker::{Aggregation, BatchReport};

#[derive(Serialize)]
struct JsonReport<'a> {
    report: &'a BatchReport,
    tables: &'a Aggregation,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ringshift=debug,info")),
        )
        .init();

    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // A missing file means defaults; a broken one stops the run
    let path = config::Config::path();
    let config = if std::path::Path::new(&path).exists() {
        let c = config::Config::load()?;
        info!(
            %path,
            numbering = ?c.analysis.numbering,
            reference_table = ?c.analysis.reference_table,
            outlier_sigma = c.analysis.outlier_sigma,
            "Configuration loaded"
        );
        c
    } else {
        warn!("Could not find {path}, running with default settings.");
        config::Config::default()
    };

    let outcome = batch::run_batch(&config.analysis).await?;

    println!("{}", outcome.report);
    if config.report.print_tables {
        println!("{}", render_table("Amide–aromatic pairs", &outcome.aggregation.pairs));
        println!("{}", render_table("Amide protons", &outcome.aggregation.amides));
    }

    if let Some(path) = &config.report.json_path {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&JsonReport {
            report: &outcome.report,
            tables: &outcome.aggregation,
        })?;
        std::fs::write(path, json).with_context(|| format!("Cannot write {}", path.display()))?;
        info!(path = %path.display(), "Report written");
    }

    Ok(())
}
