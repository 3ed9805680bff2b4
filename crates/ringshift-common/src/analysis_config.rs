//! Analysis configuration for a batch run.
//!
//! Every value has a default matching the published survey, so an empty
//! TOML/YAML/JSON document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, RingshiftError};
use crate::outlier::ReferenceTableKind;
use crate::residue::{AromaticResidue, NumberingConvention};

/// Complete analysis configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Numbering scheme used for shift, coordinate and restraint keys alike
    #[serde(default)]
    pub numbering: NumberingConvention,

    /// Reference population for outlier scoring
    #[serde(default)]
    pub reference_table: ReferenceTableKind,

    /// Z-score magnitude at which an amide proton is an outlier
    #[serde(default = "default_outlier_sigma")]
    pub outlier_sigma: f64,

    #[serde(default)]
    pub fusion: FusionConfig,

    #[serde(default)]
    pub pairing: PairingConfig,

    #[serde(default)]
    pub restraints: RestraintConfig,

    #[serde(default)]
    pub tiers: TierThresholds,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,
}

fn default_outlier_sigma() -> f64 { 2.0 }

// ── Fusion ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Representative conformer taken from multi-model coordinate sets
    #[serde(default = "default_model_number")]
    pub model_number: u32,

    /// Fraction of amides allowed to miss coordinates before the whole
    /// entry is rejected as a severe index mismatch
    #[serde(default = "default_max_unresolved_fraction")]
    pub max_unresolved_fraction: f64,
}

fn default_model_number() -> u32 { 1 }
fn default_max_unresolved_fraction() -> f64 { 0.5 }

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            model_number: default_model_number(),
            max_unresolved_fraction: default_max_unresolved_fraction(),
        }
    }
}

// ── Pairing ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Hard cutoff (Å) between the amide proton and the closest ring atom
    #[serde(default = "default_distance_threshold")]
    pub distance_threshold: f64,

    /// Minimum sequence separation between amide and ring residue on the
    /// same chain; 1 excludes only the ring residue's own amide
    #[serde(default = "default_min_sequence_separation")]
    pub min_sequence_separation: u32,
}

fn default_distance_threshold() -> f64 { 8.0 }
fn default_min_sequence_separation() -> u32 { 1 }

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            distance_threshold: default_distance_threshold(),
            min_sequence_separation: default_min_sequence_separation(),
        }
    }
}

// ── Restraints ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestraintConfig {
    /// Restraint lists longer than this are treated as corrupt
    #[serde(default = "default_max_restraints")]
    pub max_restraints: usize,
}

fn default_max_restraints() -> usize { 3500 }

impl Default for RestraintConfig {
    fn default() -> Self {
        Self {
            max_restraints: default_max_restraints(),
        }
    }
}

// ── Confidence tiers ──────────────────────────────────────────────────────────

/// Count thresholds mapping a pair's restraint evidence to a tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    #[serde(default = "default_high_min_restraints")]
    pub high_min_restraints: usize,

    /// Strong restraints that on their own promote a pair to high
    #[serde(default = "default_high_min_strong")]
    pub high_min_strong: usize,

    #[serde(default = "default_intermediate_min_restraints")]
    pub intermediate_min_restraints: usize,

    /// Strong restraints that on their own promote a pair to intermediate
    #[serde(default = "default_intermediate_min_strong")]
    pub intermediate_min_strong: usize,

    #[serde(default = "default_low_min_restraints")]
    pub low_min_restraints: usize,

    /// Upper bound (Å) at or below which an atom-specific restraint is strong
    #[serde(default = "default_strong_upper_bound")]
    pub strong_upper_bound: f64,
}

fn default_high_min_restraints() -> usize { 3 }
fn default_high_min_strong() -> usize { 2 }
fn default_intermediate_min_restraints() -> usize { 2 }
fn default_intermediate_min_strong() -> usize { 1 }
fn default_low_min_restraints() -> usize { 1 }
fn default_strong_upper_bound() -> f64 { 5.0 }

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high_min_restraints: default_high_min_restraints(),
            high_min_strong: default_high_min_strong(),
            intermediate_min_restraints: default_intermediate_min_restraints(),
            intermediate_min_strong: default_intermediate_min_strong(),
            low_min_restraints: default_low_min_restraints(),
            strong_upper_bound: default_strong_upper_bound(),
        }
    }
}

impl TierThresholds {
    /// Thresholds must be ordered high ≥ intermediate ≥ low ≥ 1.
    pub fn validate(&self) -> bool {
        self.low_min_restraints >= 1
            && self.intermediate_min_restraints >= self.low_min_restraints
            && self.high_min_restraints >= self.intermediate_min_restraints
            && self.intermediate_min_strong >= 1
            && self.high_min_strong >= self.intermediate_min_strong
            && self.strong_upper_bound > 0.0
    }
}

// ── Aggregation ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Exemplar pairs retained per results-table cell
    #[serde(default = "default_max_exemplars")]
    pub max_exemplars: usize,

    /// Leave amides of residues missing from the reference table out of the
    /// tally instead of counting them as non-outliers
    #[serde(default)]
    pub exclude_unscoreable: bool,

    /// Tie-break order when evidence is split between residue labels
    #[serde(default = "default_label_priority")]
    pub label_priority: Vec<AromaticResidue>,
}

fn default_max_exemplars() -> usize { 10 }
fn default_label_priority() -> Vec<AromaticResidue> { AromaticResidue::ALL.to_vec() }

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_exemplars: default_max_exemplars(),
            exclude_unscoreable: false,
            label_priority: default_label_priority(),
        }
    }
}

// ── Execution ─────────────────────────────────────────────────────────────────

/// One (structure, shift set) entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryId {
    pub pdb_id: String,
    pub bmrb_id: String,
}

impl EntryId {
    pub fn new(pdb_id: impl Into<String>, bmrb_id: impl Into<String>) -> Self {
        Self {
            pdb_id: pdb_id.into(),
            bmrb_id: bmrb_id.into(),
        }
    }

    /// `<pdb>_<bmrb>`, used for bundle directories and cache files.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.pdb_id, self.bmrb_id)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pdb_id, self.bmrb_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Directory holding one pre-computed bundle per entry
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory for fused entry dumps
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Number of entries fused concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Rebuild entries even when a cached dump exists
    #[serde(default)]
    pub build_anyway: bool,

    /// Entries to process; empty means every bundle found in `data_dir`
    #[serde(default)]
    pub entries: Vec<EntryId>,
}

fn default_data_dir() -> PathBuf { PathBuf::from("data/entries") }
fn default_cache_dir() -> PathBuf { PathBuf::from("proteins") }
fn default_workers() -> usize { 4 }

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_dir: default_cache_dir(),
            workers: default_workers(),
            build_anyway: false,
            entries: vec![],
        }
    }
}

// ── Helper Methods ─────────────────────────────────────────────────────────────

impl AnalysisConfig {
    /// Load from a TOML, YAML or JSON file, chosen by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| RingshiftError::Config(e.to_string()))?,
            Some("json") => serde_json::from_str(&content)?,
            _ => toml::from_str(&content).map_err(|e| RingshiftError::Config(e.to_string()))?,
        };
        config.validate()?;
        debug!(path = %path.display(), "Loaded analysis configuration");
        Ok(config)
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if !(self.outlier_sigma > 0.0) {
            return Err(RingshiftError::Config(format!(
                "outlier_sigma must be positive, got {}",
                self.outlier_sigma
            )));
        }
        if !(self.pairing.distance_threshold > 0.0) {
            return Err(RingshiftError::Config(
                "pairing.distance_threshold must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.fusion.max_unresolved_fraction) {
            return Err(RingshiftError::Config(
                "fusion.max_unresolved_fraction must lie in [0, 1]".to_string(),
            ));
        }
        if !self.tiers.validate() {
            return Err(RingshiftError::Config(format!(
                "tier thresholds are not ordered: {:?}",
                self.tiers
            )));
        }
        if self.execution.workers == 0 {
            return Err(RingshiftError::Config("execution.workers must be ≥ 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_survey() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.pairing.distance_threshold, 8.0);
        assert_eq!(cfg.restraints.max_restraints, 3500);
        assert_eq!(cfg.fusion.model_number, 1);
        assert_eq!(cfg.numbering, NumberingConvention::Label);
        assert_eq!(cfg.reference_table, ReferenceTableKind::Filtered);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let cfg: AnalysisConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.outlier_sigma, 2.0);
        assert_eq!(cfg.aggregation.label_priority, AromaticResidue::ALL.to_vec());
    }

    #[test]
    fn test_toml_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
numbering = "auth"
reference_table = "full"
outlier_sigma = 1.5

[tiers]
high_min_restraints = 4

[[execution.entries]]
pdb_id = "1WYO"
bmrb_id = "11086"
"#
        )
        .unwrap();
        let cfg = AnalysisConfig::from_path(file.path()).unwrap();
        assert_eq!(cfg.numbering, NumberingConvention::Auth);
        assert_eq!(cfg.reference_table, ReferenceTableKind::Full);
        assert_eq!(cfg.tiers.high_min_restraints, 4);
        assert_eq!(cfg.tiers.low_min_restraints, 1);
        assert_eq!(cfg.execution.entries, vec![EntryId::new("1WYO", "11086")]);
    }

    #[test]
    fn test_unordered_tiers_rejected() {
        let mut cfg = AnalysisConfig::default();
        cfg.tiers.intermediate_min_restraints = 5;
        assert!(cfg.validate().is_err());

        let mut cfg = AnalysisConfig::default();
        cfg.tiers.intermediate_min_strong = 3;
        assert!(cfg.validate().is_err());

        cfg.tiers.high_min_strong = 3;
        assert!(cfg.validate().is_ok());
    }
}
