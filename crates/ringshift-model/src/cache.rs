//! Per-entry JSON dumps of built outcomes.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use ringshift_common::analysis_config::EntryId;

use crate::failure::EntryOutcome;

/// Bumped whenever the dumped model layout changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CachedEntry {
    format_version: u32,
    built_at: DateTime<Utc>,
    entry: EntryId,
    outcome: EntryOutcome,
}

/// Directory of `<pdb>_<bmrb>.json` dumps, failures included.
#[derive(Debug, Clone)]
pub struct EntryCache {
    cache_dir: PathBuf,
}

impl EntryCache {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self, entry: &EntryId) -> PathBuf {
        self.cache_dir.join(format!("{}.json", entry.stem()))
    }

    /// The dumped outcome of `entry`, `None` when nothing usable is cached.
    ///
    /// Dumps written under another format version count as absent; files
    /// that cannot be read or parsed are errors.
    pub fn load(&self, entry: &EntryId) -> Result<Option<EntryOutcome>> {
        let file_path = self.path(entry);
        if !file_path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&file_path)
            .with_context(|| format!("Cannot read cached entry {:?}", file_path))?;
        let cached: CachedEntry = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt cached entry {:?}", file_path))?;
        if cached.format_version != CACHE_FORMAT_VERSION {
            debug!(entry = %entry, version = cached.format_version, "Stale cache format");
            return Ok(None);
        }
        debug!(entry = %entry, built_at = %cached.built_at, "Entry found in cache");
        Ok(Some(cached.outcome))
    }

    /// Dump `outcome`, replacing any previous dump atomically.
    pub fn store(&self, entry: &EntryId, outcome: &EntryOutcome) -> Result<PathBuf> {
        fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("Cannot create cache dir {:?}", self.cache_dir))?;
        let cached = CachedEntry {
            format_version: CACHE_FORMAT_VERSION,
            built_at: Utc::now(),
            entry: entry.clone(),
            outcome: outcome.clone(),
        };
        let file_path = self.path(entry);
        let tmp_path = file_path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_vec_pretty(&cached)?)?;
        fs::rename(&tmp_path, &file_path)?;
        Ok(file_path)
    }
}

/// Wraps a builder with the cache: reuse a dump when present, otherwise
/// build and dump.
#[derive(Debug, Clone)]
pub struct CachedBuilder {
    cache: EntryCache,
    build_anyway: bool,
}

impl CachedBuilder {
    pub fn new(cache: EntryCache, build_anyway: bool) -> Self {
        Self { cache, build_anyway }
    }

    pub fn cache(&self) -> &EntryCache {
        &self.cache
    }

    pub fn get_or_build<F>(&self, entry: &EntryId, build: F) -> EntryOutcome
    where
        F: FnOnce() -> EntryOutcome,
    {
        if !self.build_anyway {
            match self.cache.load(entry) {
                Ok(Some(outcome)) => return outcome,
                Ok(None) => {}
                Err(e) => warn!(entry = %entry, error = %e, "Rebuilding unreadable cached entry"),
            }
        }
        let outcome = build();
        if let Err(e) = self.cache.store(entry, &outcome) {
            warn!(entry = %entry, error = %e, "Failed to cache entry");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tempfile::tempdir;

    use crate::failure::EntryFailure;

    #[test]
    fn test_failure_outcome_cached() {
        let dir = tempdir().unwrap();
        let builder = CachedBuilder::new(EntryCache::new(dir.path()), false);
        let entry = EntryId::new("1abc", "4001");
        let calls = Cell::new(0);
        let build = || {
            calls.set(calls.get() + 1);
            EntryOutcome::Failure(EntryFailure::NonProteinEntry)
        };

        let first = builder.get_or_build(&entry, build);
        let second = builder.get_or_build(&entry, build);
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
        assert!(dir.path().join("1abc_4001.json").exists());
    }

    #[test]
    fn test_build_anyway_ignores_dump() {
        let dir = tempdir().unwrap();
        let builder = CachedBuilder::new(EntryCache::new(dir.path()), true);
        let entry = EntryId::new("1abc", "4001");
        builder.get_or_build(&entry, || EntryOutcome::Failure(EntryFailure::NoPairsFound));
        let rebuilt = builder.get_or_build(&entry, || EntryOutcome::Failure(EntryFailure::NoAromaticResidues));
        assert_eq!(rebuilt, EntryOutcome::Failure(EntryFailure::NoAromaticResidues));
    }

    #[test]
    fn test_corrupt_dump_rebuilt() {
        let dir = tempdir().unwrap();
        let cache = EntryCache::new(dir.path());
        let entry = EntryId::new("1abc", "4001");
        fs::write(cache.path(&entry), "{ not json").unwrap();
        assert!(cache.load(&entry).is_err());

        let builder = CachedBuilder::new(cache.clone(), false);
        let outcome = builder.get_or_build(&entry, || EntryOutcome::Failure(EntryFailure::NoPairsFound));
        assert_eq!(outcome, EntryOutcome::Failure(EntryFailure::NoPairsFound));
        assert_eq!(cache.load(&entry).unwrap(), Some(outcome));
    }
}
