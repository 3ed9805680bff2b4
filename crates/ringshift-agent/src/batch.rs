//! Batch driver: fuse every entry on a bounded pool of blocking workers,
//! then classify and tally the whole set.

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use ringshift_common::analysis_config::{AnalysisConfig, EntryId};
use ringshift_ingestion::sources::csv_bundle::{CsvBundleSource, PrecomputedBundles};
use ringshift_model::{
    build_entry, CachedBuilder, EntryCache, EntryFailure, EntryInputs, EntryOutcome, EntrySet,
};
use ringshift_ranker::{aggregate, Aggregation, BatchReport};

pub struct BatchOutcome {
    pub entries: EntrySet,
    pub aggregation: Aggregation,
    pub report: BatchReport,
}

/// Entries named in the configuration, or every bundle in the data directory.
pub fn select_entries(config: &AnalysisConfig) -> anyhow::Result<Vec<EntryId>> {
    if !config.execution.entries.is_empty() {
        return Ok(config.execution.entries.clone());
    }
    PrecomputedBundles::new(&config.execution.data_dir).list_entries()
}

pub async fn run_batch(config: &AnalysisConfig) -> anyhow::Result<BatchOutcome> {
    let entries = select_entries(config)?;
    let workers = config.execution.workers.max(1);
    info!(
        entries = entries.len(),
        workers,
        data_dir = %config.execution.data_dir.display(),
        "Starting batch"
    );
    let started = Instant::now();

    let source = Arc::new(CsvBundleSource::new(PrecomputedBundles::new(
        &config.execution.data_dir,
    )));
    let builder = Arc::new(CachedBuilder::new(
        EntryCache::new(&config.execution.cache_dir),
        config.execution.build_anyway,
    ));
    let shared = Arc::new(config.clone());

    let mut results = stream::iter(entries)
        .map(|entry| {
            let source = Arc::clone(&source);
            let builder = Arc::clone(&builder);
            let config = Arc::clone(&shared);
            let id = entry.clone();
            async move {
                let joined = tokio::task::spawn_blocking(move || {
                    builder.get_or_build(&entry, || {
                        let inputs = EntryInputs::load(&entry, &*source, &*source, &*source);
                        build_entry(&entry, inputs, &config)
                    })
                })
                .await;
                (id, joined)
            }
        })
        .buffer_unordered(workers);

    let mut set = EntrySet::new();
    while let Some((entry, joined)) = results.next().await {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(entry = %entry, error = %e, "Entry worker did not finish");
                EntryOutcome::Failure(EntryFailure::Other(format!("Worker failed: {e}")))
            }
        };
        set.insert(entry, outcome);
    }

    let aggregation = aggregate(&set, config);
    let report = BatchReport::from_entries(&set, config);
    info!(
        entries = report.entries,
        usable = report.usable_entries,
        defined_pairs = report.defined_pairs,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Batch complete"
    );

    Ok(BatchOutcome {
        entries: set,
        aggregation,
        report,
    })
}
