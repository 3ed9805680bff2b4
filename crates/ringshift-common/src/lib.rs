//! ringshift-common: Shared identity types, errors, reference tables and
//! configuration used across all ringshift crates.

pub mod error;
pub mod residue;
pub mod outlier;
pub mod analysis_config;

// Re-export commonly used types
pub use analysis_config::{
    AggregationConfig, AnalysisConfig, EntryId, ExecutionConfig, FusionConfig, PairingConfig,
    RestraintConfig, TierThresholds,
};
pub use error::{Result, RingshiftError};
pub use outlier::{OutlierScorer, ReferenceTable, ReferenceTableKind};
pub use residue::{AromaticResidue, AtomKey, NumberingConvention, Position, ResidueKey};
